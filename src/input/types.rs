//! YAML-readable types

use std::convert::TryFrom;
use yaml_rust::yaml::Yaml;
use evalexpr::{HashMapContext, eval_number_with_context};

/// Types that can be parsed from a YAML-formatted file
pub trait FromYaml: Sized {
    /// Describes the type in error messages, e.g. "a number"
    const EXPECTED: &'static str;

    /// Attempt to parse the YAML field as the specified type, using the supplied context for named variables and constants.
    fn from_yaml(arg: &Yaml, ctx: &HashMapContext) -> Option<Self>;
}

impl FromYaml for bool {
    const EXPECTED: &'static str = "a boolean";

    fn from_yaml(arg: &Yaml, _ctx: &HashMapContext) -> Option<Self> {
        arg.as_bool()
    }
}

impl FromYaml for String {
    const EXPECTED: &'static str = "a string";

    fn from_yaml(arg: &Yaml, _ctx: &HashMapContext) -> Option<Self> {
        match arg {
            Yaml::String(s) | Yaml::Real(s) => Some(s.clone()),
            Yaml::Integer(i) => Some(i.to_string()),
            Yaml::Boolean(b) => Some(b.to_string()),
            // a bare NULL or ~
            Yaml::Null => Some("NULL".to_owned()),
            _ => None,
        }
    }
}

// Numbers: f64, i64, usize

impl FromYaml for f64 {
    const EXPECTED: &'static str = "a number";

    fn from_yaml(arg: &Yaml, ctx: &HashMapContext) -> Option<Self> {
        match arg {
            Yaml::Real(s) => s.parse::<f64>().ok(),
            Yaml::Integer(i) => Some(*i as f64),
            Yaml::String(s) => eval_number_with_context(s, ctx).ok(),
            _ => None,
        }
    }
}

impl FromYaml for i64 {
    const EXPECTED: &'static str = "an integer";

    fn from_yaml(arg: &Yaml, _ctx: &HashMapContext) -> Option<Self> {
        arg.as_i64()
    }
}

impl FromYaml for usize {
    const EXPECTED: &'static str = "a non-negative integer";

    fn from_yaml(arg: &Yaml, ctx: &HashMapContext) -> Option<Self> {
        let i: i64 = FromYaml::from_yaml(arg, ctx)?;
        usize::try_from(i).ok()
    }
}

/// Renders a YAML value for error messages.
pub(crate) fn describe(arg: &Yaml) -> String {
    match arg {
        Yaml::String(s) | Yaml::Real(s) => format!("`{}`", s),
        Yaml::Integer(i) => format!("`{}`", i),
        Yaml::Boolean(b) => format!("`{}`", b),
        Yaml::Null => "null".to_owned(),
        Yaml::Array(_) => "a list".to_owned(),
        Yaml::Hash(_) => "a section".to_owned(),
        _ => "an unrecognised value".to_owned(),
    }
}

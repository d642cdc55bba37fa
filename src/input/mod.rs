//! Parse input configuration file

use std::path::Path;
use yaml_rust::{YamlLoader, yaml::Yaml};
use evalexpr::*;

use crate::constants::*;

mod error;
mod types;

pub use error::*;
pub use types::*;
use types::describe;

/// Represents the input configuration, which defines values
/// for simulation parameters, and any automatic values
/// for those parameters.
#[derive(Debug)]
pub struct Config {
    input: Yaml,
    ctx: HashMapContext,
}

impl Config {
    /// Loads a configuration file.
    /// Fails if the file cannot be opened or if it is not
    /// YAML-formatted.
    pub fn from_file(path: &Path) -> Result<Self, InputError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| InputError::file(&e.to_string()))?;
        Self::from_string(&contents)
    }

    /// Loads a YAML configuration from a string.
    /// Fails if the string is not formatted correctly.
    pub fn from_string(s: &str) -> Result<Self, InputError> {
        let input = YamlLoader::load_from_str(s)
            .map_err(|e| InputError::file(&e.to_string()))?;
        let input = input.first()
            .ok_or_else(|| InputError::file("empty document"))?;

        Ok(Config {
            input: input.clone(),
            ctx: HashMapContext::new(),
        })
    }

    /// Loads automatic values for constants, units and functions.
    /// Also loads and evaluates mathematical expressions
    /// that are given in the specified `section`.
    pub fn with_context(&mut self, section: &str) -> Result<&mut Self, InputError> {
        use helper::context_function;

        let mut ctx = context_map! {
            "pi" => std::f64::consts::PI,
            "degree" => std::f64::consts::PI / 180.0,
            "angstrom" => ANGSTROM,
            "nm" => NANOMETRE,
            "keV" => KEV,
            "eV" => EV,
            "hc" => HC_KEV_ANGSTROM,
            "ppm" => PPM,
        }.map_err(|e| InputError::invalid(section, &e.to_string()))?;

        context_function!(ctx, section, "sqrt", f64::sqrt);
        context_function!(ctx, section, "abs",  f64::abs);
        context_function!(ctx, section, "exp",  f64::exp);
        context_function!(ctx, section, "ln",   f64::ln);
        context_function!(ctx, section, "sin",  f64::sin);
        context_function!(ctx, section, "cos",  f64::cos);
        context_function!(ctx, section, "tan",  f64::tan);
        context_function!(ctx, section, "asin", f64::asin);
        context_function!(ctx, section, "acos", f64::acos);
        context_function!(ctx, section, "atan", f64::atan);

        // wavenumber of a photon, given its energy in keV
        context_function!(ctx, section, "photon_k", photon_wavenumber);
        // wavenumber of a neutron, given its energy in meV
        context_function!(ctx, section, "neutron_k", neutron_wavenumber);

        self.ctx = ctx;

        // Read in from 'constants' block if it exists
        if self.input[section].is_badvalue() {
            return Ok(self);
        }

        let block = self.input[section].as_hash()
            .ok_or_else(|| InputError::conversion(section, &describe(&self.input[section]), "a section"))?;

        for (a, b) in block {
            // grab the value, if possible
            let (key, value) = match (a, b) {
                (Yaml::String(k), Yaml::Integer(i)) => (Some(k), Some(*i as f64)),
                (Yaml::String(k), Yaml::Real(s)) => (Some(k), s.parse::<f64>().ok()),
                (Yaml::String(k), Yaml::String(s)) => (Some(k), eval_number_with_context(s, &self.ctx).ok()),
                _ => (None, None),
            };

            // insert it into the context so it's available for the next read
            match (key, value) {
                (Some(k), Some(v)) => {
                    self.ctx.set_value(k.clone(), Value::from(v))
                        .map_err(|e| InputError::invalid(&format!("{}:{}", section, k), &e.to_string()))?;
                },
                // found a key, value pair but parsing failed
                (Some(k), None) => {
                    let path = format!("{}:{}", section, k);
                    return Err(InputError::conversion(&path, &describe(b), "a number"));
                },
                _ => {},
            }
        }

        Ok(self)
    }

    /// Locates a key-value pair in the configuration file and attempts
    /// to parse the value as the specified type.
    /// The path to the key-value pair is specified by a string of colon-separated
    /// sections, e.g. `'section:subsection:subsubsection:key'`.
    pub fn read<T, S>(&self, path: S) -> Result<T, InputError>
    where
        T: FromYaml,
        S: AsRef<str>,
    {
        let path = path.as_ref();
        let address: Vec<&str> = path.split(':').collect();
        let value = address.iter()
            .try_fold(&self.input, |y, s| {
                if y[*s].is_badvalue() {
                    Err(InputError::location(path, s))
                } else {
                    Ok(&y[*s])
                }
            })?;
        T::from_yaml(value, &self.ctx)
            .ok_or_else(|| InputError::conversion(path, &describe(value), T::EXPECTED))
    }

    /// Like `Config::read`, but returns `default` if the key-value pair
    /// is absent. A value that is present but cannot be converted is
    /// still an error.
    pub fn read_or<T, S>(&self, path: S, default: T) -> Result<T, InputError>
    where
        T: FromYaml,
        S: AsRef<str>,
    {
        match self.read(path) {
            Err(e) if e.kind() == InputErrorKind::Location => Ok(default),
            other => other,
        }
    }

    /// Parses a string argument and evaluates it using the default context.
    /// Extends `arg.parse::<f64>()` to handle mathematical expressions,
    /// e.g. `"hc / 8.048"`.
    pub fn evaluate<S: AsRef<str>>(&self, arg: S) -> Option<f64> {
        eval_number_with_context(arg.as_ref(), &self.ctx).ok()
    }
}

mod helper {
    macro_rules! context_function {
        ($ctx:expr, $section:expr, $name:literal, $func:expr) => {
            $ctx.set_function(
                $name.to_string(),
                Function::new(|arg| {
                    let x = arg.as_number()?;
                    Ok(Value::Float($func(x)))
                })
            ).map_err(|e| InputError::invalid($section, &e.to_string()))?
        };
    }

    pub(super) use context_function;
}

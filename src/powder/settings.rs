//! Powder parameters read from the input file

use std::f64::consts;

use crate::input::{Config, FromYaml, InputError, InputErrorKind};
use super::*;

/// Everything needed to set up coherent scattering by a powder:
/// how to load the reflections and how to cache the cross section.
#[derive(Debug,Clone)]
pub struct PowderSettings {
    pub reflections: String,
    pub verbose: bool,
    pub packing: f64,
    pub cell_volume: Option<f64>,
    /// Largest scattering angle 2θ, radians
    pub max_scattering_angle: f64,
    pub columns: ColumnMap,
    pub bins: usize,
    /// Cached wavenumber range, 1/Å
    pub k_range: Option<(f64, f64)>,
}

impl Default for PowderSettings {
    fn default() -> Self {
        PowderSettings {
            reflections: "NULL".to_owned(),
            verbose: false,
            packing: 1.0,
            cell_volume: None,
            max_scattering_angle: consts::PI,
            columns: ColumnMap::new(),
            bins: DEFAULT_BINS,
            k_range: None,
        }
    }
}

/// Reads `path`, distinguishing an absent value from a malformed one.
fn optional<T: FromYaml>(config: &Config, path: &str) -> Result<Option<T>, InputError> {
    match config.read(path) {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == InputErrorKind::Location => Ok(None),
        Err(e) => Err(e),
    }
}

impl PowderSettings {
    /// Reads the powder parameters in `section` of the configuration.
    /// Only the name of the reflection file is mandatory.
    pub fn from_config(config: &Config, section: &str) -> Result<Self, InputError> {
        let defaults = Self::default();
        let key = |name: &str| format!("{}:{}", section, name);

        let reflections: String = config.read(key("reflections"))?;
        let verbose = config.read_or(key("verbose"), defaults.verbose)?;
        let packing = config.read_or(key("packing"), defaults.packing)?;
        let cell_volume: Option<f64> = optional(config, &key("cell_volume"))?;
        let max_scattering_angle = config.read_or(key("max_scattering_angle"), defaults.max_scattering_angle)?;

        let mut columns = ColumnMap::new();
        for role in ColumnRole::ALL.iter() {
            let number: usize = config.read_or(key(&format!("columns:{}", role.config_name())), 0)?;
            columns.set(*role, number);
        }

        let bins = config.read_or(key("cache:bins"), defaults.bins)?;

        let wavenumbers = (
            optional::<f64>(config, &key("cache:k_min"))?,
            optional::<f64>(config, &key("cache:k_max"))?,
        );
        let wavelengths = (
            optional::<f64>(config, &key("cache:lambda_min"))?,
            optional::<f64>(config, &key("cache:lambda_max"))?,
        );

        let k_range = match (wavenumbers, wavelengths) {
            ((Some(k_min), Some(k_max)), _) => Some((k_min, k_max)),
            (_, (Some(lambda_min), Some(lambda_max))) => {
                use crate::constants::wavenumber;
                Some((wavenumber(lambda_max), wavenumber(lambda_min)))
            },
            ((None, None), (None, None)) => None,
            _ => return Err(InputError::invalid(&key("cache"), "range needs both a lower and an upper bound")),
        };

        Ok(PowderSettings {
            reflections,
            verbose,
            packing,
            cell_volume,
            max_scattering_angle,
            columns,
            bins,
            k_range,
        })
    }

    /// A loader configured by these settings.
    pub fn loader(&self) -> LineLoader {
        let loader = LineLoader::from_file(&self.reflections)
            .with_columns(self.columns)
            .with_packing(self.packing)
            .with_verbose(self.verbose);

        match self.cell_volume {
            Some(v) => loader.with_cell_volume(v),
            None => loader,
        }
    }

    /// An empty cache configured by these settings. Without a
    /// wavenumber range, the cache is disabled.
    pub fn cache(&self) -> CrossSectionCache {
        let cache = match self.k_range {
            Some((k_min, k_max)) => CrossSectionCache::new(k_min, k_max, self.bins),
            None => CrossSectionCache::disabled(),
        };
        cache.with_max_scattering_angle(self.max_scattering_angle)
    }
}

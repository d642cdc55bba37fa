//! Coherent scattering by a powder: the list of Bragg reflections
//! and the cross section it implies at a given wavenumber.

use std::f64::consts;
use rand::prelude::*;
use rand_distr::StandardNormal;

use crate::sampling::select_from_distribution;

mod error;
mod table;
mod columns;
mod loader;
mod cache;
mod settings;

pub use error::*;
pub use table::*;
pub use columns::*;
pub use loader::*;
pub use cache::*;
pub use settings::*;

/// A single Bragg reflection, or a group of equivalent ones
#[derive(Debug,Copy,Clone,PartialEq)]
pub struct DiffractionLine {
    /// Scattering vector magnitude, 1/Å
    pub q: f64,
    pub multiplicity: u32,
    /// Squared structure factor |F|^2
    pub structure_factor_sqd: f64,
    pub debye_waller: f64,
    /// Intrinsic relative width Δd/d
    pub width: f64,
    pub strain_ppm: f64,
}

impl DiffractionLine {
    pub fn new(q: f64, multiplicity: u32, structure_factor_sqd: f64) -> Self {
        Self {
            q,
            multiplicity,
            structure_factor_sqd,
            debye_waller: 1.0,
            width: 0.0,
            strain_ppm: 0.0,
        }
    }

    pub fn with_debye_waller(self, debye_waller: f64) -> Self {
        DiffractionLine {
            debye_waller,
            ..self
        }
    }

    pub fn with_width(self, width: f64) -> Self {
        DiffractionLine {
            width,
            ..self
        }
    }

    /// Lines with no multiplicity or zero scattering vector cannot scatter
    pub fn is_valid(&self) -> bool {
        self.multiplicity > 0 && self.q > 0.0
    }

    pub fn d_spacing(&self) -> f64 {
        2.0 * consts::PI / self.q
    }

    /// j |F|^2 DW
    pub fn intensity(&self) -> f64 {
        (self.multiplicity as f64) * self.structure_factor_sqd * self.debye_waller
    }

    /// The Bragg angle θ at which a particle with wavenumber `k` is
    /// scattered by this line, i.e. q = 2 k sin θ, or `None` if it
    /// cannot be.
    pub fn bragg_angle(&self, k: f64) -> Option<f64> {
        let sin_theta = self.q / (2.0 * k);
        if sin_theta <= 1.0 {
            Some(sin_theta.asin())
        } else {
            None
        }
    }

    /// Pseudorandomly samples the scattering vector of a particular
    /// scattering event, broadened by the intrinsic width of the line.
    pub fn sample_q<R: Rng>(&self, rng: &mut R) -> f64 {
        if self.width > 0.0 {
            let z: f64 = rng.sample(StandardNormal);
            self.q * (1.0 + self.width * z)
        } else {
            self.q
        }
    }
}

/// Reflections sorted by ascending q, each with a precomputed
/// scattering weight.
#[derive(Debug,Clone,Default)]
pub struct LineList {
    lines: Vec<DiffractionLine>,
    weights: Vec<f64>,
    cumulative: Vec<f64>,
}

impl LineList {
    /// A list without any reflections, i.e. incoherent scattering only
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds the list from arbitrarily ordered `lines`, dropping
    /// invalid ones. Each weight is `prefactor * j |F|^2 DW / q`.
    /// Lines with equal q keep their relative order.
    pub fn new(mut lines: Vec<DiffractionLine>, prefactor: f64) -> Self {
        lines.retain(DiffractionLine::is_valid);
        lines.sort_by(|a, b| a.q.total_cmp(&b.q));

        let weights: Vec<f64> = lines.iter()
            .map(|line| prefactor * line.intensity() / line.q)
            .collect();

        let cumulative = weights.iter()
            .scan(0.0, |sum, w| {
                *sum += w;
                Some(*sum)
            })
            .collect();

        LineList {
            lines,
            weights,
            cumulative,
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item=&DiffractionLine> {
        self.lines.iter()
    }

    pub fn get(&self, i: usize) -> Option<&DiffractionLine> {
        self.lines.get(i)
    }

    pub fn q(&self, i: usize) -> f64 {
        self.lines[i].q
    }

    pub fn weight(&self, i: usize) -> f64 {
        self.weights[i]
    }

    pub fn total_weight(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Given the lines that contribute to scattering at the current
    /// wavenumber, pseudorandomly selects one of them with probability
    /// proportional to its weight.
    ///
    /// Returns `None` if no line contributes.
    pub fn select_line<R: Rng>(&self, contribution: Contribution, rng: &mut R) -> Option<usize> {
        let count = contribution.count.min(self.len());
        if count == 0 || !(self.cumulative[count - 1] > 0.0) {
            return None;
        }
        Some(select_from_distribution(&self.cumulative[..count], rng))
    }
}

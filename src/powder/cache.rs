//! Amortized evaluation of the coherent cross section

use super::LineList;

/// Default number of wavenumber bins
pub const DEFAULT_BINS: usize = 1024;

/// The lines that can scatter a particle of given wavenumber:
/// the first `count` lines of the list, with summed weight `weight`.
#[derive(Debug,Copy,Clone,PartialEq,Default)]
pub struct Contribution {
    pub count: usize,
    pub weight: f64,
}

/// Diagnostic counters
#[derive(Debug,Copy,Clone,PartialEq,Eq,Default)]
pub struct CacheStats {
    /// Queries answered
    pub calls: usize,
    /// Bins populated by a full scan
    pub computed: usize,
    /// Queries that started from an already populated bin
    pub reused: usize,
}

#[derive(Debug,Copy,Clone)]
struct Entry {
    k: f64,
    contribution: Contribution,
}

/// Caches, for each bin of a discretized wavenumber axis, the lines
/// that contribute at the lower edge of that bin, so that a query
/// only needs to scan the few lines between the bin edge and the
/// actual wavenumber.
///
/// The cache must only be used with the [`LineList`] it was first
/// queried with. It is mutated by every query: each worker thread
/// should own its own, see [`CrossSectionCache::replicate`].
#[derive(Debug,Clone)]
pub struct CrossSectionCache {
    k_min: f64,
    k_max: f64,
    step: f64,
    /// 2 sin(θ_max / 2)
    reach: f64,
    bins: Vec<Option<Entry>>,
    stats: CacheStats,
}

impl CrossSectionCache {
    /// Creates a cache covering wavenumbers between `k_min` and `k_max`
    /// (1/Å), divided into `bins` equal bins. If the range is empty or
    /// `bins` is zero, the cache is disabled and every query performs
    /// a full scan.
    pub fn new(k_min: f64, k_max: f64, bins: usize) -> Self {
        let bins = if k_max > k_min && k_min >= 0.0 && k_max.is_finite() { bins } else { 0 };
        let step = if bins > 0 { (k_max - k_min) / (bins as f64) } else { 0.0 };
        CrossSectionCache {
            k_min,
            k_max,
            step,
            reach: 2.0,
            bins: vec![None; bins],
            stats: CacheStats::default(),
        }
    }

    /// Creates a cache covering the wavenumbers of particles with
    /// wavelengths between `lambda_min` and `lambda_max` (Å).
    pub fn from_wavelengths(lambda_min: f64, lambda_max: f64, bins: usize) -> Self {
        use crate::constants::wavenumber;
        Self::new(wavenumber(lambda_max), wavenumber(lambda_min), bins)
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(0.0, 0.0, 0)
    }

    /// Restricts scattering to angles (2θ) smaller than `angle` (radians).
    /// By default, scattering up to π is permitted.
    pub fn with_max_scattering_angle(self, angle: f64) -> Self {
        let angle = angle.max(0.0).min(std::f64::consts::PI);
        CrossSectionCache {
            reach: 2.0 * (0.5 * angle).sin(),
            bins: vec![None; self.bins.len()],
            stats: CacheStats::default(),
            ..self
        }
    }

    /// An empty cache with the same binning, for use by another worker.
    pub fn replicate(&self) -> Self {
        CrossSectionCache {
            bins: vec![None; self.bins.len()],
            stats: CacheStats::default(),
            ..*self
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.bins.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Largest scattering vector reachable by a particle with wavenumber `k`
    pub fn q_max(&self, k: f64) -> f64 {
        self.reach * k
    }

    /// Finds the lines that contribute to scattering at wavenumber `k`,
    /// i.e. those with q ≤ 2 k sin(θ_max / 2), and their summed weight.
    pub fn query(&mut self, k: f64, lines: &LineList) -> Contribution {
        self.stats.calls += 1;

        let start = match self.bin(k) {
            Some(i) => {
                let cached = self.bins[i];
                let entry = match cached {
                    Some(entry) => {
                        self.stats.reused += 1;
                        entry
                    },
                    None => {
                        let k_bin = self.k_min + (i as f64) * self.step;
                        let entry = Entry {
                            k: k_bin,
                            contribution: scan(lines, Contribution::default(), self.q_max(k_bin)),
                        };
                        self.bins[i] = Some(entry);
                        self.stats.computed += 1;
                        entry
                    }
                };
                // rounding can put the bin edge a hair above k
                if entry.k <= k { entry.contribution } else { Contribution::default() }
            },
            None => Contribution::default(),
        };

        scan(lines, start, self.q_max(k))
    }

    /// Finds the contributing lines without using or populating the cache.
    pub fn full_scan(&self, k: f64, lines: &LineList) -> Contribution {
        scan(lines, Contribution::default(), self.q_max(k))
    }

    /// Coherent cross section at wavenumber `k`, in the units fixed by the
    /// weight prefactor of `lines`.
    pub fn cross_section(&mut self, k: f64, lines: &LineList) -> f64 {
        let contribution = self.query(k, lines);
        if contribution.count > 0 {
            contribution.weight / (k * k)
        } else {
            0.0
        }
    }

    fn bin(&self, k: f64) -> Option<usize> {
        if self.bins.is_empty() || !(k >= self.k_min && k <= self.k_max) {
            return None;
        }
        let i = ((k - self.k_min) / self.step) as usize;
        Some(i.min(self.bins.len() - 1))
    }
}

/// Advances `start` over every further line with q ≤ `q_max`.
fn scan(lines: &LineList, start: Contribution, q_max: f64) -> Contribution {
    let mut count = start.count;
    let mut weight = start.weight;
    while count < lines.len() && lines.q(count) <= q_max {
        weight += lines.weight(count);
        count += 1;
    }
    Contribution { count, weight }
}

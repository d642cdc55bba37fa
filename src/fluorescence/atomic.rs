//! Interface to tabulated atomic data

/// Number of distinct X-ray emission lines an element can have
pub const LINE_COUNT: usize = 383;

/// Identifies one X-ray emission line, in the order KL1, KL2, KL3, KM1, ...
/// used by standard atomic databases.
#[derive(Debug,Copy,Clone,PartialEq,Eq,Hash)]
pub struct EmissionLine(pub usize);

impl EmissionLine {
    /// Iterates over every emission line
    pub fn all() -> impl Iterator<Item=EmissionLine> {
        (0..LINE_COUNT).map(EmissionLine)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Atomic shells whose level widths are queried. Fluorescence line
/// widths are approximated by the K-shell width, so no other shell
/// is needed.
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum Shell {
    K,
}

/// Source of the atomic cross sections and line data used to pick
/// an interaction and, if fluorescence, the emitted photon energy.
///
/// Elements are identified by atomic number `z`, energies are in keV
/// and cross sections in barn/atom. Implementations must be pure:
/// the same arguments always give the same result.
pub trait AtomicData {
    /// Partial fluorescence cross section of `line` for an incident
    /// photon of energy `energy`. Zero if the line is inactive.
    fn fluorescence_line_cross_section(&self, z: u32, line: EmissionLine, energy: f64) -> f64;

    /// Coherent (Rayleigh) scattering cross section
    fn rayleigh_cross_section(&self, z: u32, energy: f64) -> f64;

    /// Incoherent (Compton) scattering cross section
    fn compton_cross_section(&self, z: u32, energy: f64) -> f64;

    /// Energy of the emitted photon. Zero if the line is inactive.
    fn line_energy(&self, z: u32, line: EmissionLine) -> f64;

    /// Natural width of the given atomic level
    fn atomic_level_width(&self, z: u32, shell: Shell) -> f64;
}

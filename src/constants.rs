//! Physical constants and unit conversions.
//!
//! Lengths are in angstrom, energies in keV, wavenumbers in 1/angstrom.

/// Base length unit
pub const ANGSTROM: f64 = 1.0;
/// Nanometre, in angstrom
pub const NANOMETRE: f64 = 10.0;
/// Base energy unit
pub const KEV: f64 = 1.0;
/// Electronvolt, in keV
pub const EV: f64 = 1.0e-3;
/// Planck constant times the speed of light, units of keV Å
pub const HC_KEV_ANGSTROM: f64 = 12.398419843;
/// Reduced Planck constant times the speed of light, units of keV Å
pub const HBARC_KEV_ANGSTROM: f64 = 1.973269804;
/// Neutron energy per squared wavenumber, hbar^2 / 2 m_n, units of meV Å^2
pub const NEUTRON_MEV_ANGSTROM_SQD: f64 = 2.072124;
/// One part per million
pub const PPM: f64 = 1.0e-6;

/// Wavenumber of a photon with energy `energy` (keV), units of 1/Å
pub fn photon_wavenumber(energy: f64) -> f64 {
    energy / HBARC_KEV_ANGSTROM
}

/// Wavenumber of a neutron with kinetic energy `energy` (meV), units of 1/Å
pub fn neutron_wavenumber(energy: f64) -> f64 {
    (energy / NEUTRON_MEV_ANGSTROM_SQD).sqrt()
}

/// Wavenumber corresponding to a wavelength `lambda` (Å)
pub fn wavenumber(lambda: f64) -> f64 {
    2.0 * std::f64::consts::PI / lambda
}

//! Photon interactions with atoms: choosing between fluorescence,
//! coherent and incoherent scattering, and picking the energy of
//! the fluorescence photon.

use rand::prelude::*;
use rand_distr::Cauchy;

use crate::sampling::{accumulate, select_from_distribution};

mod atomic;
pub use atomic::*;

/// The interactions a photon can undergo at a scattering site
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum Interaction {
    Fluorescence,
    Rayleigh,
    Compton,
}

impl Interaction {
    const ALL: [Interaction; 3] = [
        Interaction::Fluorescence,
        Interaction::Rayleigh,
        Interaction::Compton,
    ];

    pub fn index(&self) -> usize {
        match self {
            Interaction::Fluorescence => 0,
            Interaction::Rayleigh => 1,
            Interaction::Compton => 2,
        }
    }
}

/// Interaction cross sections of one element at one energy, in barn/atom
#[derive(Debug,Copy,Clone,PartialEq,Default)]
pub struct CrossSections {
    pub fluorescence: f64,
    pub rayleigh: f64,
    pub compton: f64,
}

impl CrossSections {
    pub fn new(fluorescence: f64, rayleigh: f64, compton: f64) -> Self {
        Self { fluorescence, rayleigh, compton }
    }

    /// Total interaction cross section
    pub fn total(&self) -> f64 {
        self.fluorescence + self.rayleigh + self.compton
    }

    pub fn get(&self, interaction: Interaction) -> f64 {
        match interaction {
            Interaction::Fluorescence => self.fluorescence,
            Interaction::Rayleigh => self.rayleigh,
            Interaction::Compton => self.compton,
        }
    }
}

/// Evaluates the fluorescence, Rayleigh and Compton cross sections
/// of element `z` for a photon of energy `energy` (keV).
///
/// The fluorescence cross section is the sum over all emission lines,
/// so the total converges to the tabulated interaction cross section.
pub fn cross_sections<A: AtomicData>(data: &A, z: u32, energy: f64) -> CrossSections {
    let fluorescence = EmissionLine::all()
        .map(|line| data.fluorescence_line_cross_section(z, line, energy))
        .sum();

    CrossSections {
        fluorescence,
        rayleigh: data.rayleigh_cross_section(z, energy),
        compton: data.compton_cross_section(z, energy),
    }
}

/// Pseudorandomly selects the type of interaction, with probability
/// proportional to the partial cross sections `xs`.
///
/// Returns `None` if every cross section is zero, in which case
/// the photon should be transmitted.
pub fn select_interaction<R: Rng>(xs: &CrossSections, rng: &mut R) -> Option<Interaction> {
    // leading zero is never selected if the total is positive
    let mut cumsum = [0.0; 4];
    let total = accumulate(Interaction::ALL.iter().map(|i| xs.get(*i)), &mut cumsum[1..]);

    let slot = select_from_distribution(&cumsum, rng);

    if total > 0.0 && slot > 0 {
        Some(Interaction::ALL[slot - 1])
    } else {
        None
    }
}

/// A fluorescence photon, as selected by [`select_fluorescence_energy`]
#[derive(Debug,Copy,Clone,PartialEq)]
pub struct FluorescenceLine {
    pub line: EmissionLine,
    /// Energy of the line, in keV
    pub energy: f64,
    /// Natural width of the line (FWHM), in keV
    pub width: f64,
}

impl FluorescenceLine {
    /// Pseudorandomly samples the energy of the emitted photon from
    /// the Lorentzian profile of the line.
    pub fn sample_energy<R: Rng>(&self, rng: &mut R) -> f64 {
        if self.width > 0.0 {
            Cauchy::new(self.energy, 0.5 * self.width)
                .map(|profile| rng.sample(profile))
                .map(|e| e.max(0.0))
                .unwrap_or(self.energy)
        } else {
            self.energy
        }
    }
}

/// Given that a photon with energy `energy` (keV) has been absorbed by
/// element `z` and fluorescence occurs, pseudorandomly selects the
/// emission line, with probability proportional to its partial
/// cross section.
///
/// The width of the line is approximated by the K-shell level width.
/// Returns `None` if no line is active at this energy.
pub fn select_fluorescence_energy<A, R>(data: &A, z: u32, energy: f64, rng: &mut R) -> Option<FluorescenceLine>
where A: AtomicData, R: Rng {
    let mut cumsum = [0.0; LINE_COUNT];
    let total = accumulate(
        EmissionLine::all().map(|line| data.fluorescence_line_cross_section(z, line, energy)),
        &mut cumsum,
    );

    if !(total > 0.0) {
        return None;
    }

    let line = EmissionLine(select_from_distribution(&cumsum, rng));

    Some(FluorescenceLine {
        line,
        energy: data.line_energy(z, line),
        width: data.atomic_level_width(z, Shell::K),
    })
}

#[cfg(test)]
mod tests {
    use rand_xoshiro::*;
    use crate::sampling::Fixed;
    use super::*;

    const K_EDGE: f64 = 8.979;
    const L_EDGE: f64 = 0.933;

    /// Copper, more or less: two K lines and one L line
    struct ToyCopper;

    impl AtomicData for ToyCopper {
        fn fluorescence_line_cross_section(&self, _z: u32, line: EmissionLine, energy: f64) -> f64 {
            match line.index() {
                0 if energy > K_EDGE => 1.0,
                1 if energy > K_EDGE => 2.0,
                30 if energy > L_EDGE => 0.5,
                _ => 0.0,
            }
        }

        fn rayleigh_cross_section(&self, _z: u32, energy: f64) -> f64 {
            if energy > 0.1 { 3.0 } else { 0.0 }
        }

        fn compton_cross_section(&self, _z: u32, energy: f64) -> f64 {
            if energy > 0.1 { 1.0 } else { 0.0 }
        }

        fn line_energy(&self, _z: u32, line: EmissionLine) -> f64 {
            match line.index() {
                0 => 8.028,
                1 => 8.048,
                30 => 0.930,
                _ => 0.0,
            }
        }

        fn atomic_level_width(&self, _z: u32, shell: Shell) -> f64 {
            match shell {
                Shell::K => 1.55e-3,
            }
        }
    }

    #[test]
    fn summed_cross_sections() {
        let xs = cross_sections(&ToyCopper, 29, 10.0);
        assert_eq!(xs, CrossSections::new(3.5, 3.0, 1.0));
        assert_eq!(xs.total(), 7.5);

        let xs = cross_sections(&ToyCopper, 29, 5.0);
        assert_eq!(xs.fluorescence, 0.5);
    }

    #[test]
    fn compton_only() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(0);
        let xs = CrossSections::new(0.0, 0.0, 2.7);
        for _i in 0..10_000 {
            assert_eq!(select_interaction(&xs, &mut rng), Some(Interaction::Compton));
        }
        assert_eq!(select_interaction(&xs, &mut Fixed(0.0)), Some(Interaction::Compton));
        assert_eq!(select_interaction(&xs, &mut Fixed(0.999999)), Some(Interaction::Compton));
    }

    #[test]
    fn no_interaction() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(0);
        let xs = CrossSections::default();
        for _i in 0..100 {
            assert_eq!(select_interaction(&xs, &mut rng), None);
        }
    }

    #[test]
    fn interaction_frequencies() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(0);
        let xs = cross_sections(&ToyCopper, 29, 10.0);
        let n = 500_000;
        let mut counts = [0usize; 3];
        for _i in 0..n {
            let interaction = select_interaction(&xs, &mut rng).unwrap();
            counts[interaction.index()] += 1;
        }

        for interaction in Interaction::ALL.iter() {
            let expected = xs.get(*interaction) / xs.total();
            let got = (counts[interaction.index()] as f64) / (n as f64);
            let sigma = (expected * (1.0 - expected) / (n as f64)).sqrt();
            println!("{:?}: expected {:.4}, got {:.4}", interaction, expected, got);
            assert!((got - expected).abs() < 5.0 * sigma);
        }
    }

    #[test]
    fn fluorescence_lines() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(0);
        let n = 350_000;
        let mut counts = [0usize; 3];

        for _i in 0..n {
            let fl = select_fluorescence_energy(&ToyCopper, 29, 10.0, &mut rng).unwrap();
            assert_eq!(fl.width, 1.55e-3);
            assert!(fl.energy > 0.0);
            match fl.line.index() {
                0 => counts[0] += 1,
                1 => counts[1] += 1,
                30 => counts[2] += 1,
                i => panic!("selected inactive line {}", i),
            }
        }

        for (c, w) in counts.iter().zip([1.0, 2.0, 0.5].iter()) {
            let expected = w / 3.5;
            let got = (*c as f64) / (n as f64);
            let sigma = (expected * (1.0 - expected) / (n as f64)).sqrt();
            println!("expected {:.4}, got {:.4}", expected, got);
            assert!((got - expected).abs() < 5.0 * sigma);
        }

        // Below the K edge only the L line remains
        for _i in 0..1000 {
            let fl = select_fluorescence_energy(&ToyCopper, 29, 5.0, &mut rng).unwrap();
            assert_eq!(fl.line, EmissionLine(30));
            assert_eq!(fl.energy, 0.930);
        }
    }

    #[test]
    fn no_active_lines() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(0);
        assert!(select_fluorescence_energy(&ToyCopper, 29, 0.5, &mut rng).is_none());
    }

    #[test]
    fn lorentzian_profile() {
        let mut rng = Xoshiro256StarStar::seed_from_u64(0);
        let fl = FluorescenceLine { line: EmissionLine(1), energy: 8.048, width: 2.0e-3 };

        let n = 100_000;
        let mut energies: Vec<f64> = (0..n).map(|_| fl.sample_energy(&mut rng)).collect();
        energies.sort_by(|a, b| a.total_cmp(b));

        // median and half width at half maximum of a Cauchy distribution
        let median = energies[n / 2];
        let hwhm = 0.5 * (energies[3 * n / 4] - energies[n / 4]);
        println!("median = {:.6} keV, hwhm = {:.3e} keV", median, hwhm);
        assert!((median - fl.energy).abs() < 2.0e-5);
        assert!((hwhm - 0.5 * fl.width).abs() / (0.5 * fl.width) < 0.02);

        let sharp = FluorescenceLine { width: 0.0, ..fl };
        assert_eq!(sharp.sample_energy(&mut rng), 8.048);
    }
}

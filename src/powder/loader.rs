//! Loading a list of Bragg reflections from a tabulated file

use std::f64::consts;
use std::path::{Path, PathBuf};

use colored::Colorize;

use super::*;
use crate::constants::PPM;
use crate::{report, Diagnostic};

/// Strains this large (in ppm) are assumed to be garbage and ignored
const STRAIN_LIMIT: f64 = 1.0e6;

/// Relative tolerance within which consecutive rows are considered
/// to describe the same reflection
const DUPLICATE_TOLERANCE: f64 = 1.0e-4;

/// Source names that mean "no reflection list"
const PLACEHOLDERS: [&str; 3] = ["", "0", "NULL"];

/// Scalar properties of the crystal, read from the header
/// of a reflection file.
#[derive(Debug,Copy,Clone,PartialEq,Default)]
pub struct CrystalData {
    /// Unit cell volume, Å^3
    pub cell_volume: Option<f64>,
    /// Absorption cross section per unit cell, barn
    pub sigma_abs: Option<f64>,
    /// Incoherent cross section per unit cell, barn
    pub sigma_inc: Option<f64>,
    /// Density, g/cm^3
    pub density: Option<f64>,
    /// Molar weight, g/mol
    pub molar_weight: Option<f64>,
    pub atoms_per_cell: Option<f64>,
    /// Debye-Waller factor applied to lines that lack their own
    pub debye_waller: Option<f64>,
    /// Relative width Δd/d applied to lines that lack their own
    pub width: Option<f64>,
    /// Strain (ppm) applied to lines that lack their own
    pub strain_ppm: Option<f64>,
}

impl CrystalData {
    pub fn from_header(table: &Table) -> Self {
        fn lookup(table: &Table, keys: &[&str]) -> Option<f64> {
            keys.iter().filter_map(|k| table.header_value(k)).next()
        }

        CrystalData {
            cell_volume: lookup(table, &["Vc", "V_0"]),
            sigma_abs: lookup(table, &["sigma_abs", "sigma_a"]),
            sigma_inc: lookup(table, &["sigma_inc", "sigma_i"]),
            density: lookup(table, &["density"]),
            molar_weight: lookup(table, &["weight"]),
            atoms_per_cell: lookup(table, &["nb_atoms"]),
            debye_waller: lookup(table, &["DW", "Debye_Waller"]),
            width: lookup(table, &["delta_d/d"]),
            strain_ppm: lookup(table, &["Epsilon"]),
        }
    }
}

/// The outcome of a successful load
#[derive(Debug,Clone,Default)]
pub struct LoadedLines {
    pub lines: LineList,
    pub crystal: CrystalData,
    /// Rows skipped because they could not be read or were unphysical
    pub rejected: usize,
    /// Runs of repeated rows whose multiplicity was reset to 1
    pub collapsed: usize,
}

impl LoadedLines {
    /// Nothing loaded: incoherent scattering only
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A row that passed the sanity checks
#[derive(Copy,Clone)]
struct Row {
    index: usize,
    line: DiffractionLine,
}

/// Consecutive rows that describe the same reflection
struct Run {
    first: Row,
    last: usize,
    len: u32,
    multiplicity: u32,
}

fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= DUPLICATE_TOLERANCE * a.abs().max(b.abs())
}

impl Run {
    fn start(row: Row) -> Self {
        Run {
            first: row,
            last: row.index,
            len: 1,
            multiplicity: row.line.multiplicity,
        }
    }

    fn contains(&self, line: &DiffractionLine) -> bool {
        let reference = &self.first.line;
        is_close(reference.q, line.q)
            && is_close(reference.structure_factor_sqd, line.structure_factor_sqd)
            && is_close(reference.multiplicity as f64, line.multiplicity as f64)
    }

    fn extend(&mut self, row: &Row) {
        self.last = row.index;
        self.len += 1;
        self.multiplicity = self.multiplicity.saturating_add(row.line.multiplicity);
    }

    /// Collapses the run into a single line. If the rows repeat as many
    /// times as the multiplicity they record, the repetition is the
    /// multiplicity, and the recorded value is reset to 1; the second
    /// return value says whether that happened.
    fn finish(self, source: &str) -> (DiffractionLine, bool) {
        let mut line = self.first.line;
        let collapsed = self.len > 1 && self.len == line.multiplicity;
        if collapsed {
            report!(
                Diagnostic::Warning,
                "{}: rows {}-{} (d = {:.5} Å) repeat one reflection {} times, setting its multiplicity to 1.",
                source, self.first.index, self.last, line.d_spacing(), self.len,
            );
            line.multiplicity = 1;
        } else if self.len > 1 {
            line.multiplicity = self.multiplicity;
        }
        (line, collapsed)
    }
}

/// Builds a [`LineList`] from a reflection file, e.g.
/// ```no_run
/// use fluopowder::powder::*;
/// let loaded = LineLoader::from_file("Al.laz")
///     .with_columns(ColumnMap::new().with(ColumnRole::Multiplicity, 4))
///     .with_verbose(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug,Clone)]
pub struct LineLoader {
    source: Option<PathBuf>,
    columns: ColumnMap,
    cell_volume: Option<f64>,
    packing: f64,
    verbose: bool,
}

impl LineLoader {
    /// Prepares to load reflections from `filename`. The placeholders
    /// `NULL`, `0` and the empty string mean that there is no file,
    /// and loading produces an empty list.
    pub fn from_file(filename: &str) -> Self {
        let trimmed = filename.trim();
        let source = if PLACEHOLDERS.iter().any(|p| trimmed.eq_ignore_ascii_case(p)) {
            None
        } else {
            Some(PathBuf::from(trimmed))
        };

        Self {
            source,
            columns: ColumnMap::new(),
            cell_volume: None,
            packing: 1.0,
            verbose: false,
        }
    }

    /// A loader that produces no reflections.
    pub fn incoherent_only() -> Self {
        Self::from_file("NULL")
    }

    /// Column assignments used where the file header does not give one.
    pub fn with_columns(self, columns: ColumnMap) -> Self {
        LineLoader {
            columns,
            ..self
        }
    }

    /// Unit cell volume (Å^3), used if the header does not give one.
    pub fn with_cell_volume(self, cell_volume: f64) -> Self {
        LineLoader {
            cell_volume: Some(cell_volume),
            ..self
        }
    }

    /// Volume fraction of the sample occupied by the powder.
    pub fn with_packing(self, packing: f64) -> Self {
        LineLoader {
            packing,
            ..self
        }
    }

    /// Reports progress while importing. Warnings and errors are
    /// printed regardless.
    pub fn with_verbose(self, verbose: bool) -> Self {
        LineLoader {
            verbose,
            ..self
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Reads the file as plain text. See [`LineLoader::build_with`].
    pub fn build(&self) -> Result<LoadedLines, LoadError> {
        self.build_with(&TextTableReader)
    }

    /// Reads the file with `reader` and converts it to a sorted,
    /// deduplicated list of reflections.
    ///
    /// Fails if the file cannot be read, or if every reflection has
    /// zero structure factor.
    pub fn build_with<T: TableReader>(&self, reader: &T) -> Result<LoadedLines, LoadError> {
        let path = match self.source {
            Some(ref path) => path,
            None => {
                report!(Diagnostic::Info, self.verbose, "no reflection list given, coherent scattering disabled.");
                return Ok(LoadedLines::empty());
            }
        };

        let name = path.display().to_string();

        if self.verbose {
            println!("{} reflections from {}...", "Importing".bold().cyan(), name.bold().blue());
        }

        let table = reader.read_table(path)?;
        self.from_table(&table, &name)
    }

    /// As [`LineLoader::build_with`], for a table that has already been
    /// read. `source` names it in diagnostics.
    pub fn from_table(&self, table: &Table, source: &str) -> Result<LoadedLines, LoadError> {
        let crystal = CrystalData::from_header(table);
        let columns = ColumnMap::from_header(table).or(&self.columns);

        for role in [ColumnRole::Multiplicity, ColumnRole::StructureFactorSqd].iter() {
            let missing = columns.get(*role).is_none()
                && !(*role == ColumnRole::StructureFactorSqd && columns.get(ColumnRole::StructureFactor).is_some());
            if missing {
                report!(Diagnostic::Warning, "{}: no column holds the {}, assuming zero.", source, role);
            }
        }

        for (number, text) in table.malformed() {
            report!(Diagnostic::Warning, "{}: line {} rejected, \"{}\" is not a list of numbers.", source, number, text);
        }

        let mut rows = Vec::with_capacity(table.rows());
        for index in 0..table.rows() {
            match derive_line(table, &columns, &crystal, index) {
                Ok(line) => rows.push(Row { index, line }),
                Err(cause) => report!(Diagnostic::Warning, "{}: row {} rejected, {}.", source, index, cause),
            }
        }

        let total = table.rows() + table.malformed().len();
        let rejected = total - rows.len();

        if rows.is_empty() {
            report!(Diagnostic::Error, "{}: none of {} rows could be used, disabling coherent scattering.", source, total);
            return Err(LoadError::degenerate(source, &format!("none of {} rows could be used", total)));
        }

        let f2_sum: f64 = rows.iter().map(|row| row.line.structure_factor_sqd).sum();
        if f2_sum == 0.0 {
            report!(Diagnostic::Error, "{}: all {} accepted reflections are null, disabling coherent scattering.", source, rows.len());
            return Err(LoadError::degenerate(source, &format!("all {} accepted rows have zero structure factor", rows.len())));
        }

        let (lines, collapsed) = merge_duplicates(rows, source);

        let prefactor = match crystal.cell_volume.or(self.cell_volume).filter(|v| *v > 0.0) {
            Some(v) => 4.0 * consts::PI.powi(3) * self.packing / (v * v),
            None => {
                report!(Diagnostic::Warning, "{}: unit cell volume unknown, cross sections are relative.", source);
                1.0
            }
        };

        let lines = LineList::new(lines, prefactor);

        if self.verbose {
            println!("{} import, {} reflections.", "Completed".bold().bright_green(), lines.len());
        }

        Ok(LoadedLines {
            lines,
            crystal,
            rejected,
            collapsed,
        })
    }
}

/// Converts one row of the table into a reflection, or explains
/// why it cannot be used.
fn derive_line(table: &Table, columns: &ColumnMap, crystal: &CrystalData, row: usize) -> Result<DiffractionLine, &'static str> {
    let read = |role| columns.read(table, row, role);

    let d = read(ColumnRole::DSpacing);
    let inv2d = read(ColumnRole::InverseTwoD);
    let mut q = if d > 0.0 {
        2.0 * consts::PI / d
    } else if inv2d > 0.0 {
        4.0 * consts::PI * inv2d
    } else {
        read(ColumnRole::MomentumTransfer)
    };

    let structure_factor_sqd = if columns.get(ColumnRole::StructureFactorSqd).is_some() {
        read(ColumnRole::StructureFactorSqd)
    } else {
        read(ColumnRole::StructureFactor).powi(2)
    };

    let debye_waller = Some(read(ColumnRole::DebyeWaller))
        .filter(|dw| *dw > 0.0)
        .or(crystal.debye_waller.filter(|dw| *dw > 0.0))
        .unwrap_or(1.0);

    let width = if columns.get(ColumnRole::Width).is_some() {
        read(ColumnRole::Width)
    } else {
        crystal.width.unwrap_or(0.0)
    };

    let strain_ppm = if columns.get(ColumnRole::StrainPpm).is_some() {
        read(ColumnRole::StrainPpm)
    } else if columns.get(ColumnRole::Strain).is_some() {
        read(ColumnRole::Strain) / PPM
    } else {
        crystal.strain_ppm.unwrap_or(0.0)
    };

    if strain_ppm != 0.0 && strain_ppm.abs() < STRAIN_LIMIT {
        q -= strain_ppm * PPM * q;
    }

    let multiplicity = read(ColumnRole::Multiplicity).round();

    if !(multiplicity >= 1.0) {
        return Err("multiplicity is not positive");
    }

    if !(q > 0.0) {
        return Err("scattering vector is not positive");
    }

    Ok(DiffractionLine {
        q,
        multiplicity: multiplicity as u32,
        structure_factor_sqd,
        debye_waller,
        width,
        strain_ppm,
    })
}

/// Single forward pass over `rows`, in file order, collapsing each
/// run of consecutive duplicates into one line. Also counts the runs
/// whose multiplicity was reset.
fn merge_duplicates(rows: Vec<Row>, source: &str) -> (Vec<DiffractionLine>, usize) {
    let mut lines = Vec::with_capacity(rows.len());
    let mut collapsed = 0;
    let mut run: Option<Run> = None;

    let mut finish = |run: Run, lines: &mut Vec<DiffractionLine>| {
        let (line, reset) = run.finish(source);
        if reset {
            collapsed += 1;
        }
        lines.push(line);
    };

    for row in rows {
        let continues = run.as_ref().map_or(false, |r| r.contains(&row.line));
        if continues {
            if let Some(r) = run.as_mut() {
                r.extend(&row);
            }
        } else if let Some(finished) = run.replace(Run::start(row)) {
            finish(finished, &mut lines);
        }
    }

    if let Some(finished) = run {
        finish(finished, &mut lines);
    }

    (lines, collapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> Result<LoadedLines, LoadError> {
        LineLoader::from_file("test.laz")
            .with_verbose(true)
            .from_table(&Table::parse(text), "test.laz")
    }

    fn qs(lines: &LineList) -> Vec<f64> {
        lines.iter().map(|l| l.q).collect()
    }

    fn multiplicities(lines: &LineList) -> Vec<u32> {
        lines.iter().map(|l| l.multiplicity).collect()
    }

    #[test]
    fn no_source() {
        for name in ["NULL", "null", "0", "", "  "].iter() {
            let loader = LineLoader::from_file(name);
            assert!(loader.source().is_none());
            let loaded = loader.build().unwrap();
            assert!(loaded.lines.is_empty());
            assert_eq!(loaded.lines.len(), 0);
        }
        assert!(LineLoader::incoherent_only().build().unwrap().lines.is_empty());
    }

    #[test]
    fn missing_file() {
        let err = LineLoader::from_file("no/such/reflections.laz").build().unwrap_err();
        println!("{}", err);
        assert_eq!(err.kind(), LoadErrorKind::Unreadable);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn merges_repeated_rows() {
        let loaded = load("
            # column_q 1
            # column_j 2
            # column_F2 3
            0.5 1 4.0
            1.0 1 9.0
            1.0 1 9.0
            1.0 1 9.0
            2.0 1 16.0
        ").unwrap();

        assert_eq!(qs(&loaded.lines), vec![0.5, 1.0, 2.0]);
        assert_eq!(multiplicities(&loaded.lines), vec![1, 3, 1]);
    }

    #[test]
    fn repetition_is_multiplicity() {
        let loaded = load("
            # column_q 1
            # column_j 2
            # column_F2 3
            1.0 2 9.0
            1.0 2 9.0
            2.0 6 4.0
            2.0 6 4.0
            2.0 6 4.0
        ").unwrap();

        assert_eq!(qs(&loaded.lines), vec![1.0, 2.0]);
        // two rows with j = 2: reset. three rows with j = 6: summed
        assert_eq!(multiplicities(&loaded.lines), vec![1, 18]);
    }

    #[test]
    fn near_duplicates() {
        let loaded = load("
            # column_q 1
            # column_j 2
            # column_F2 3
            1.00000 1 9.0
            1.00005 1 9.0005
            1.00200 1 9.0
            1.0 1 9.0
        ").unwrap();

        // within 0.01% merge, otherwise not; only consecutive rows merge
        assert_eq!(multiplicities(&loaded.lines), vec![2, 1, 1]);
        assert_eq!(qs(&loaded.lines), vec![1.0, 1.0, 1.002]);
    }

    #[test]
    fn rejects_invalid_rows() {
        let loaded = load("
            # column_d 1
            # column_j 2
            # column_F2 3
            3.0 4 1.0
            0.0 4 1.0
            1.0 0 1.0
            2.0 8 2.0
            1.5 0.2 1.0
        ").unwrap();

        assert_eq!(loaded.lines.len(), 2);
        let q = qs(&loaded.lines);
        assert!(q.windows(2).all(|w| w[0] <= w[1]));
        assert!((q[0] - 2.0 * consts::PI / 3.0).abs() < 1.0e-12);
        assert!((q[1] - consts::PI).abs() < 1.0e-12);
        assert!(loaded.lines.iter().all(|l| l.is_valid()));
    }

    #[test]
    fn all_null() {
        let err = load("
            # column_d 1
            # column_j 2
            # column_F2 3
            3.0 4 0.0
            2.0 8 0.0
        ").unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::Degenerate);
        assert!(err.is_recoverable());

        // no structure factor column at all
        let err = load("
            # column_d 1
            # column_j 2
            3.0 4
        ").unwrap_err();
        assert_eq!(err.kind(), LoadErrorKind::Degenerate);
    }

    #[test]
    fn scattering_vector_sources() {
        let loaded = load("
            # column_d 1
            # column_inv2d 2
            # column_q 3
            # column_j 4
            # column_F2 5
            6.283185307179586 0.0  5.0 1 1.0
            0.0               0.25 7.0 1 2.0
            0.0               0.0  9.0 1 3.0
        ").unwrap();

        let q = qs(&loaded.lines);
        // d takes precedence over q
        assert!((q[0] - 1.0).abs() < 1.0e-12);
        // 1/2d = 0.25 means d = 2
        assert!((q[1] - consts::PI).abs() < 1.0e-12);
        assert_eq!(q[2], 9.0);
    }

    #[test]
    fn strain_correction() {
        let loaded = load("
            # Epsilon 100
            # column_q 1
            # column_j 2
            # column_F2 3
            # column_ppm 4
            1.0 1 1.0
            2.0 1 1.0 -50
            3.0 1 1.0 2e6
        ").unwrap();

        let lines: Vec<&DiffractionLine> = loaded.lines.iter().collect();
        // the ppm column is assigned, so an empty cell means no strain
        assert_eq!(lines[0].q, 1.0);
        assert!((lines[1].q - 2.0 * (1.0 + 50.0e-6)).abs() < 1.0e-12);
        // implausible strain ignored
        assert_eq!(lines[2].q, 3.0);

        let loaded = load("
            # Epsilon 100
            # column_q 1
            # column_j 2
            # column_F2 3
            1.0 1 1.0
        ").unwrap();
        let line = loaded.lines.get(0).unwrap();
        assert!((line.q - (1.0 - 100.0e-6)).abs() < 1.0e-12);
        assert_eq!(line.strain_ppm, 100.0);
    }

    #[test]
    fn header_defaults_and_structure_factor() {
        let loaded = load("
            # Vc 10.0 DW 0.9 delta_d/d 1e-3 sigma_inc 0.008
            # column_q 1
            # column_j 2
            # column_F 3
            # column_DW 4
            1.0 6 3.0 0.5
            2.0 6 2.0 0.0
        ").unwrap();

        let a = loaded.lines.get(0).unwrap();
        let b = loaded.lines.get(1).unwrap();
        assert_eq!(a.structure_factor_sqd, 9.0);
        assert_eq!(a.debye_waller, 0.5);
        assert_eq!(b.debye_waller, 0.9);
        assert_eq!(a.width, 1.0e-3);

        assert_eq!(loaded.crystal.cell_volume, Some(10.0));
        assert_eq!(loaded.crystal.sigma_inc, Some(0.008));
        assert_eq!(loaded.crystal.sigma_abs, None);

        let prefactor = 4.0 * consts::PI.powi(3) / 100.0;
        let expected = prefactor * 6.0 * 9.0 * 0.5 / 1.0;
        assert!((loaded.lines.weight(0) - expected).abs() < 1.0e-12 * expected);
    }

    #[test]
    fn caller_columns() {
        let text = "
            # column_F2 3
            2.0 4 1.5
            1.0 2 0.5
        ";

        // nothing says where the multiplicity is
        assert!(load(text).is_err());

        let loaded = LineLoader::from_file("test.laz")
            .with_columns(
                ColumnMap::new()
                    .with(ColumnRole::DSpacing, 1)
                    .with(ColumnRole::Multiplicity, 2)
                    .with(ColumnRole::StructureFactorSqd, 1)
            )
            .with_cell_volume(2.0)
            .with_packing(0.5)
            .from_table(&Table::parse(text), "test.laz")
            .unwrap();

        // header assignment of F2 wins over the caller's
        assert_eq!(multiplicities(&loaded.lines), vec![4, 2]);
        assert_eq!(loaded.lines.get(0).unwrap().structure_factor_sqd, 1.5);
        assert!((loaded.lines.q(0) - consts::PI).abs() < 1.0e-12);

        let prefactor = 4.0 * consts::PI.powi(3) * 0.5 / 4.0;
        let expected = prefactor * 4.0 * 1.5 / consts::PI;
        assert!((loaded.lines.weight(0) - expected).abs() < 1.0e-12 * expected);
    }

    #[test]
    fn quiet_loader_still_counts() {
        // no verbose flag
        let loaded = LineLoader::from_file("test.laz")
            .from_table(&Table::parse("
                # column_q 1
                # column_j 2
                # column_F2 3
                0.0 1 4.0
                1.0 0 9.0
                2.0 2 9.0
                2.0 2 9.0
                3.0 1 1.0 # (220)
                4.0 1 1.0 (311)
            "), "test.laz")
            .unwrap();

        assert_eq!(qs(&loaded.lines), vec![2.0, 3.0]);
        assert_eq!(multiplicities(&loaded.lines), vec![1, 1]);
        // q = 0, j = 0 and the unreadable last line
        assert_eq!(loaded.rejected, 3);
        assert_eq!(loaded.collapsed, 1);
    }

    #[test]
    fn nothing_usable_vs_all_null() {
        let err = load("
            # column_d 1
            # column_F2 3
            3.0 4 1.0
            2.0 8 2.0
        ").unwrap_err();
        println!("{}", err);
        assert_eq!(err.kind(), LoadErrorKind::Degenerate);
        assert!(err.to_string().contains("none of 2 rows"));

        let err = load("
            # column_d 1
            # column_j 2
            # column_F2 3
            3.0 4 0.0
            2.0 8 0.0
        ").unwrap_err();
        println!("{}", err);
        assert!(err.to_string().contains("zero structure factor"));
    }

    #[test]
    fn huge_multiplicities() {
        let loaded = load("
            # column_q 1
            # column_j 2
            # column_F2 3
            1.0 1e10 1.0
            1.0 1e10 1.0
        ").unwrap();
        assert_eq!(multiplicities(&loaded.lines), vec![u32::MAX]);
    }

    #[test]
    fn from_text_file() {
        let path = std::env::temp_dir().join("fluopowder-loader-test.laz");
        std::fs::write(&path, "
            # TITLE Al [Fm-3m]
            # Vc 66.4
            # column_d 1
            # column_j 5
            # column_F2 6
            2.338 1 1 1 8 102.01
            2.025 2 0 0 6 93.12
            1.432 2 2 0 12 74.30
        ").unwrap();

        let loaded = LineLoader::from_file(path.to_str().unwrap())
            .with_verbose(true)
            .build()
            .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.lines.len(), 3);
        assert_eq!(multiplicities(&loaded.lines), vec![8, 6, 12]);
        assert_eq!(loaded.crystal.cell_volume, Some(66.4));
    }
}

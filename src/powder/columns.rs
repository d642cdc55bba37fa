//! Which column of a reflection table holds which physical quantity

use std::fmt;

use super::Table;

/// The physical quantities a reflection table can provide
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum ColumnRole {
    /// Number of equivalent reflections, j
    Multiplicity,
    /// Lattice spacing d, in Å
    DSpacing,
    /// Squared structure factor |F|^2
    StructureFactorSqd,
    /// Structure factor |F|, used if |F|^2 is not given
    StructureFactor,
    /// Debye-Waller factor
    DebyeWaller,
    /// Intrinsic relative line width, Δd/d
    Width,
    /// Inverse of twice the lattice spacing, 1/(2d), in 1/Å
    InverseTwoD,
    /// Scattering vector magnitude q, in 1/Å
    MomentumTransfer,
    /// Dimensionless strain
    Strain,
    /// Strain in parts per million
    StrainPpm,
}

impl ColumnRole {
    pub const COUNT: usize = 10;

    pub const ALL: [ColumnRole; ColumnRole::COUNT] = [
        ColumnRole::Multiplicity,
        ColumnRole::DSpacing,
        ColumnRole::StructureFactorSqd,
        ColumnRole::StructureFactor,
        ColumnRole::DebyeWaller,
        ColumnRole::Width,
        ColumnRole::InverseTwoD,
        ColumnRole::MomentumTransfer,
        ColumnRole::Strain,
        ColumnRole::StrainPpm,
    ];

    fn index(&self) -> usize {
        match self {
            ColumnRole::Multiplicity => 0,
            ColumnRole::DSpacing => 1,
            ColumnRole::StructureFactorSqd => 2,
            ColumnRole::StructureFactor => 3,
            ColumnRole::DebyeWaller => 4,
            ColumnRole::Width => 5,
            ColumnRole::InverseTwoD => 6,
            ColumnRole::MomentumTransfer => 7,
            ColumnRole::Strain => 8,
            ColumnRole::StrainPpm => 9,
        }
    }

    /// Header keys that announce the (1-based) column number of this quantity
    pub fn header_keys(&self) -> &'static [&'static str] {
        match self {
            ColumnRole::Multiplicity => &["column_j"],
            ColumnRole::DSpacing => &["column_d"],
            ColumnRole::StructureFactorSqd => &["column_F2"],
            ColumnRole::StructureFactor => &["column_F"],
            ColumnRole::DebyeWaller => &["column_DW"],
            ColumnRole::Width => &["column_Dd"],
            ColumnRole::InverseTwoD => &["column_inv2d", "column_1/2d"],
            ColumnRole::MomentumTransfer => &["column_q"],
            ColumnRole::Strain => &["column_strain"],
            ColumnRole::StrainPpm => &["column_ppm"],
        }
    }

    /// Key used in the input file
    pub fn config_name(&self) -> &'static str {
        match self {
            ColumnRole::Multiplicity => "multiplicity",
            ColumnRole::DSpacing => "d_spacing",
            ColumnRole::StructureFactorSqd => "f2",
            ColumnRole::StructureFactor => "f",
            ColumnRole::DebyeWaller => "debye_waller",
            ColumnRole::Width => "width",
            ColumnRole::InverseTwoD => "inv2d",
            ColumnRole::MomentumTransfer => "q",
            ColumnRole::Strain => "strain",
            ColumnRole::StrainPpm => "strain_ppm",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.config_name())
    }
}

/// Assigns zero-based table columns to physical quantities.
/// Unassigned quantities read as zero.
#[derive(Debug,Copy,Clone,PartialEq,Eq,Default)]
pub struct ColumnMap {
    columns: [Option<usize>; ColumnRole::COUNT],
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the 1-based column `number` to `role`, following the
    /// numbering used in reflection-file headers. Zero unassigns.
    pub fn with(mut self, role: ColumnRole, number: usize) -> Self {
        self.set(role, number);
        self
    }

    pub fn set(&mut self, role: ColumnRole, number: usize) {
        self.columns[role.index()] = number.checked_sub(1);
    }

    /// The zero-based column holding `role`, if any.
    pub fn get(&self, role: ColumnRole) -> Option<usize> {
        self.columns[role.index()]
    }

    /// Reads column assignments from the header of `table`.
    pub fn from_header(table: &Table) -> Self {
        let mut map = Self::new();
        for role in ColumnRole::ALL.iter() {
            let number = role.header_keys()
                .iter()
                .filter_map(|key| table.header_value(key))
                .next();
            if let Some(n) = number.filter(|n| *n >= 1.0) {
                map.set(*role, n as usize);
            }
        }
        map
    }

    /// Resolves each role from `self`, falling back to `fallback`
    /// where `self` leaves it unassigned.
    pub fn or(&self, fallback: &ColumnMap) -> Self {
        let mut columns = self.columns;
        for (c, f) in columns.iter_mut().zip(fallback.columns.iter()) {
            if c.is_none() {
                *c = *f;
            }
        }
        ColumnMap { columns }
    }

    /// Reads the value of `role` in the given row of `table`,
    /// or zero if the role is unassigned.
    pub fn read(&self, table: &Table, row: usize, role: ColumnRole) -> f64 {
        self.get(role).map_or(0.0, |col| table.cell(row, col))
    }
}

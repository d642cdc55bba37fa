//! Numeric tables with a free-form text header

use std::path::Path;

use super::LoadError;

/// A table of numbers read from a text file, together with the
/// comment lines that preceded (or were interleaved with) the data.
#[derive(Debug,Clone,Default)]
pub struct Table {
    header: Vec<String>,
    columns: usize,
    data: Vec<f64>,
    malformed: Vec<(usize, String)>,
}

/// Splits off a trailing `#` or `!` annotation, e.g. `2.338 8 102.01 # (111)`.
fn strip_annotation(line: &str) -> &str {
    match line.find(|c: char| c == '#' || c == '!') {
        Some(i) => line[..i].trim_end(),
        None => line,
    }
}

fn tokens(line: &str) -> impl Iterator<Item=&str> {
    line.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|s| !s.is_empty())
}

impl Table {
    /// Parses a table from text. Lines that start with `#`, or whose
    /// first entry is not a number, form the header. Numbers are
    /// separated by whitespace, commas or semicolons, and may be
    /// followed by a `#` or `!` annotation. A line that starts with a
    /// number but contains something else is malformed: it is neither
    /// data nor header. Short rows are padded with zeros to the width
    /// of the widest row.
    pub fn parse(text: &str) -> Self {
        let mut header = Vec::new();
        let mut rows: Vec<Vec<f64>> = Vec::new();
        let mut malformed = Vec::new();

        for (number, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let numeric = strip_annotation(trimmed);
            let starts_with_number = tokens(numeric)
                .next()
                .map_or(false, |s| s.parse::<f64>().is_ok());

            if trimmed.starts_with('#') || !starts_with_number {
                header.push(trimmed.trim_start_matches('#').to_owned());
                continue;
            }

            let row: Option<Vec<f64>> = tokens(numeric)
                .map(|s| s.parse::<f64>().ok())
                .collect();

            match row {
                Some(row) => rows.push(row),
                None => malformed.push((number + 1, trimmed.to_owned())),
            }
        }

        let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut data = Vec::with_capacity(columns * rows.len());
        for row in rows.iter() {
            data.extend_from_slice(row);
            data.extend(std::iter::repeat(0.0).take(columns - row.len()));
        }

        Table {
            header,
            columns,
            data,
            malformed,
        }
    }

    pub fn rows(&self) -> usize {
        if self.columns == 0 { 0 } else { self.data.len() / self.columns }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// The value at `row` and `col` (both zero-based), or zero if
    /// either is out of range.
    pub fn cell(&self, row: usize, col: usize) -> f64 {
        if col < self.columns && row < self.rows() {
            self.data[row * self.columns + col]
        } else {
            0.0
        }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Lines that started like data but could not be read as numbers,
    /// with their (1-based) line numbers in the source text.
    pub fn malformed(&self) -> &[(usize, String)] {
        &self.malformed
    }

    /// Looks for `key` in the header and parses the number that follows
    /// it, skipping any `:` or `=` separators, e.g. `# Vc: 66.4`.
    /// The key must be a whole word: `column_F` does not match
    /// `column_F2`.
    pub fn header_value(&self, key: &str) -> Option<f64> {
        self.header.iter()
            .filter_map(|line| value_after_key(line, key))
            .next()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn value_after_key(line: &str, key: &str) -> Option<f64> {
    let mut search = 0;
    while let Some(offset) = line[search..].find(key) {
        let start = search + offset;
        let end = start + key.len();
        search = end;

        let before_ok = line[..start].chars().next_back().map_or(true, |c| !is_word_char(c));
        let after_ok = line[end..].chars().next().map_or(true, |c| !is_word_char(c));
        if !(before_ok && after_ok) {
            continue;
        }

        let rest = line[end..].trim_start_matches(|c: char| c.is_whitespace() || c == ':' || c == '=');
        let token: String = rest.chars()
            .take_while(|c| c.is_ascii_digit() || "+-.eE".contains(*c))
            .collect();
        if let Ok(value) = token.parse::<f64>() {
            return Some(value);
        }
    }
    None
}

/// Reads tables from files.
pub trait TableReader {
    fn read_table(&self, path: &Path) -> Result<Table, LoadError>;
}

/// Reads plain-text tables, in the format understood by [`Table::parse`].
#[derive(Debug,Copy,Clone,Default)]
pub struct TextTableReader;

impl TableReader for TextTableReader {
    fn read_table(&self, path: &Path) -> Result<Table, LoadError> {
        let name = path.display().to_string();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LoadError::unreadable(&name, &e.to_string()))?;
        let table = Table::parse(&contents);
        if table.rows() == 0 {
            Err(LoadError::unreadable(&name, "no numeric data found"))
        } else {
            Ok(table)
        }
    }
}

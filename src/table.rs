//! In-memory tabular data shared by the loader and the exporter.

use crate::{EtlError, EtlResult};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Cell {
    #[default]
    Missing,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// NaN floats count as missing, same as an absent value.
    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Missing => true,
            Cell::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Cell::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Textual form used when writing delimited output. Missing cells become empty fields.
    pub fn to_field(&self) -> String {
        match self {
            _ if self.is_missing() => String::new(),
            Cell::Int(v) => v.to_string(),
            Cell::Float(f) => format_float(*f),
            Cell::Text(s) => s.clone(),
            Cell::Missing => String::new(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            return write!(f, "<NA>");
        }
        write!(f, "{}", self.to_field())
    }
}

// Whole floats keep a trailing ".0" so they read back as floats, at any magnitude.
pub fn format_float(value: f64) -> String {
    let mut text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        text.push_str(".0");
    }
    text
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
    Text,
}

impl ColumnType {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Int => "INTEGER",
            ColumnType::Float => "REAL",
            ColumnType::Text => "TEXT",
        }
    }

    /// Maps a declared SQLite column type back using SQLite's affinity rules.
    pub fn from_sql_decl(decl: Option<&str>) -> Self {
        let decl = decl.unwrap_or_default().to_ascii_uppercase();
        if decl.contains("INT") {
            ColumnType::Int
        } else if decl.contains("REAL") || decl.contains("FLOA") || decl.contains("DOUB") {
            ColumnType::Float
        } else {
            ColumnType::Text
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSummary {
    pub name: String,
    pub non_null: usize,
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    types: Vec<ColumnType>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>, types: Vec<ColumnType>) -> EtlResult<Self> {
        if columns.len() != types.len() {
            return Err(EtlError::RowArity {
                expected: columns.len(),
                found: types.len(),
            });
        }
        Ok(Self {
            columns,
            types,
            rows: Vec::new(),
        })
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> EtlResult<()> {
        if row.len() != self.columns.len() {
            return Err(EtlError::RowArity {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_types(&self) -> &[ColumnType] {
        &self.types
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.column_index(name).map(|idx| self.types[idx])
    }

    pub fn column_values(&self, name: &str) -> Option<impl Iterator<Item = &Cell>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Removes every row holding a missing value in any column. Returns how many were removed.
    pub fn drop_incomplete(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| !row.iter().any(Cell::is_missing));
        before - self.rows.len()
    }

    /// Rewrites one column cell by cell and records its new type.
    /// On error the table is left partially converted.
    pub fn retype_column<F>(&mut self, idx: usize, column_type: ColumnType, mut convert: F) -> EtlResult<()>
    where
        F: FnMut(Cell) -> EtlResult<Cell>,
    {
        for row in &mut self.rows {
            let cell = std::mem::take(&mut row[idx]);
            row[idx] = convert(cell)?;
        }
        self.types[idx] = column_type;
        Ok(())
    }

    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            types: self.types.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    pub fn summary(&self) -> Vec<ColumnSummary> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, name)| ColumnSummary {
                name: name.clone(),
                non_null: self.rows.iter().filter(|row| !row[idx].is_missing()).count(),
                column_type: self.types[idx],
            })
            .collect()
    }
}

// Fixed-width preview, right aligned
impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                rendered
                    .iter()
                    .map(|row| row[idx].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(name, &width)| format!("{name:>width$}"))
            .collect();
        writeln!(f, "{}", header.join("  "))?;

        for row in &rendered {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(value, &width)| format!("{value:>width$}"))
                .collect();
            writeln!(f, "{}", line.join("  "))?;
        }
        Ok(())
    }
}

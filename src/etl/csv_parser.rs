use crate::table::{Cell, ColumnType, Table};
use crate::{EtlError, EtlResult};
use csv::StringRecord;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Field values read as missing rather than as text.
pub const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_na_token(value: &str) -> bool {
    NA_TOKENS.contains(&value)
}

/// Reads delimited text into a [`Table`], inferring one type per column from every row.
pub struct CSVParser {
    delimiter: u8,
    has_headers: bool,
}

impl Default for CSVParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CSVParser {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    // Non-ASCII characters cannot delimit; the comma is kept
    pub fn with_custom_delimiter(mut self, delimiter: char) -> Self {
        if delimiter.is_ascii() {
            self.delimiter = delimiter as u8;
        }
        self
    }

    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> EtlResult<Table> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EtlError::SourceNotFound(path.to_path_buf()),
            _ => EtlError::Io(e),
        })?;
        self.parse_table(file)
    }

    pub fn parse_table<R: Read>(&self, reader: R) -> EtlResult<Table> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_headers)
            .from_reader(reader);

        let records = csv_reader.records().collect::<Result<Vec<StringRecord>, _>>()?;

        let columns: Vec<String> = if self.has_headers {
            unique_headers(csv_reader.headers()?.iter())
        } else {
            let width = records.first().map_or(0, StringRecord::len);
            (0..width).map(|i| i.to_string()).collect()
        };
        if columns.is_empty() {
            return Err(EtlError::NoColumns);
        }

        let types: Vec<ColumnType> = (0..columns.len())
            .map(|idx| infer_column(records.iter().filter_map(|r| r.get(idx))))
            .collect();

        let mut table = Table::new(columns, types.clone())?;
        for record in &records {
            let row = record
                .iter()
                .zip(&types)
                .map(|(field, ty)| to_cell(field, *ty))
                .collect();
            table.push_row(row)?;
        }

        debug!(rows = table.len(), columns = table.columns().len(), "Parsed CSV");
        Ok(table)
    }
}

// Blank names become "Unnamed: {idx}"; repeats get ".1", ".2", ... suffixes.
fn unique_headers<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let named: Vec<String> = names
        .enumerate()
        .map(|(idx, name)| {
            if name.is_empty() {
                format!("Unnamed: {idx}")
            } else {
                name.to_string()
            }
        })
        .collect();

    let mut taken: HashSet<String> = HashSet::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut columns = Vec::with_capacity(named.len());
    for name in named {
        let mut candidate = name.clone();
        while taken.contains(&candidate) {
            let count = seen.entry(name.clone()).or_insert(0);
            *count += 1;
            candidate = format!("{name}.{count}");
        }
        taken.insert(candidate.clone());
        columns.push(candidate);
    }
    columns
}

fn infer_column<'a>(values: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut present = 0usize;
    let mut all_int = true;
    let mut all_float = true;

    for value in values.filter(|v| !is_na_token(v)) {
        present += 1;
        let value = value.trim();
        if all_int && value.parse::<i64>().is_err() {
            all_int = false;
        }
        if !all_int && value.parse::<f64>().is_err() {
            all_float = false;
            break;
        }
    }

    match (present, all_int, all_float) {
        // all missing
        (0, _, _) => ColumnType::Float,
        (_, true, _) => ColumnType::Int,
        (_, false, true) => ColumnType::Float,
        (_, false, false) => ColumnType::Text,
    }
}

fn to_cell(field: &str, column_type: ColumnType) -> Cell {
    if is_na_token(field) {
        return Cell::Missing;
    }
    match column_type {
        ColumnType::Int => field.trim().parse().map(Cell::Int).unwrap_or(Cell::Missing),
        ColumnType::Float => field.trim().parse().map(Cell::Float).unwrap_or(Cell::Missing),
        ColumnType::Text => Cell::Text(field.to_string()),
    }
}

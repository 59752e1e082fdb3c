use crate::EtlResult;
use crate::table::{Cell, Table};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a [`Table`] as delimited text: one header row, no index column.
pub struct CsvWriter {
    delimiter: u8,
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Creates or truncates `path`. Returns the number of data rows written.
    pub fn write_file<P: AsRef<Path>>(&self, table: &Table, path: P) -> EtlResult<usize> {
        let file = File::create(path)?;
        self.write_table(table, file)
    }

    pub fn write_table<W: Write>(&self, table: &Table, writer: W) -> EtlResult<usize> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);

        csv_writer.write_record(table.columns())?;
        for row in table.rows() {
            csv_writer.write_record(row.iter().map(Cell::to_field))?;
        }
        csv_writer.flush()?;

        Ok(table.len())
    }
}

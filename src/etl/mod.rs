pub mod clean;
pub mod csv_parser;
pub mod csv_writer;
pub mod exporter;
pub mod loader;

pub use clean::{CleanReport, Cleaner, CoercionPlan};
pub use csv_parser::CSVParser;
pub use csv_writer::CsvWriter;
pub use exporter::{ChurnExporter, ExportReport};
pub use loader::{ChurnLoader, LoadReport};

use crate::table::Table;
use tracing::info;

// Row count plus per-column non-null count and type
pub(crate) fn log_summary(label: &str, table: &Table) {
    info!(
        "{}: {} rows x {} columns",
        label,
        table.len(),
        table.columns().len()
    );
    for column in table.summary() {
        info!(
            "  {:<20} {:>10} non-null  {}",
            column.name, column.non_null, column.column_type
        );
    }
}

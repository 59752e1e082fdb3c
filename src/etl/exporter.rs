use crate::config::PipelineConfig;
use crate::engine::ChurnStore;
use crate::etl::csv_writer::CsvWriter;
use crate::EtlResult;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub rows_exported: usize,
    pub output: PathBuf,
}

/// Copies the persisted table, every row and column, to a CSV file.
pub struct ChurnExporter {
    database: PathBuf,
    table_name: String,
    output: PathBuf,
    delimiter: u8,
}

impl ChurnExporter {
    pub fn new(config: &PipelineConfig) -> EtlResult<Self> {
        Ok(Self {
            database: config.paths.database.clone(),
            table_name: config.table.name.clone(),
            output: config.paths.export_csv.clone(),
            delimiter: config.cleaning.delimiter_byte()?,
        })
    }

    pub fn run(&self) -> EtlResult<ExportReport> {
        let store = ChurnStore::open_existing(&self.database)?;

        let table = store.read_table(&self.table_name, None)?;
        info!(
            "Successfully read {} rows from the '{}' table",
            table.len(),
            self.table_name
        );

        info!(path = %self.output.display(), "Exporting data to CSV");
        let rows_exported = CsvWriter::new()
            .with_delimiter(self.delimiter)
            .write_file(&table, &self.output)?;
        info!("Exported {} rows to CSV", rows_exported);

        Ok(ExportReport {
            rows_exported,
            output: self.output.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EtlError;
    use crate::config::PathsConfig;
    use crate::table::{Cell, ColumnType, Table};
    use tempfile::tempdir;

    fn config_in(dir: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            paths: PathsConfig {
                source_csv: dir.join("raw.csv"),
                database: dir.join("churn.db"),
                export_csv: dir.join("export.csv"),
            },
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_export_writes_table() {
        let temp_dir = tempdir().unwrap();
        let config = config_in(temp_dir.path());

        let mut table = Table::new(
            vec!["CustomerID".into(), "Total Spend".into()],
            vec![ColumnType::Int, ColumnType::Float],
        )
        .unwrap();
        table.push_row(vec![Cell::Int(7), Cell::Float(199.5)]).unwrap();
        {
            let mut store = ChurnStore::open(&config.paths.database).unwrap();
            store.replace_table("ChurnData", &table).unwrap();
        }

        let report = ChurnExporter::new(&config).unwrap().run().unwrap();
        assert_eq!(report.rows_exported, 1);
        assert_eq!(
            std::fs::read_to_string(&config.paths.export_csv).unwrap(),
            "CustomerID,Total Spend\n7,199.5\n"
        );
    }

    #[test]
    fn test_missing_database_is_connection_error() {
        let temp_dir = tempdir().unwrap();
        let config = config_in(temp_dir.path());

        let err = ChurnExporter::new(&config).unwrap().run().unwrap_err();
        assert!(matches!(err, EtlError::Connection { .. }));
        assert!(!config.paths.database.exists());
        assert!(!config.paths.export_csv.exists());
    }

    #[test]
    fn test_missing_table_is_reported() {
        let temp_dir = tempdir().unwrap();
        let config = config_in(temp_dir.path());
        {
            let mut store = ChurnStore::open(&config.paths.database).unwrap();
            let table = Table::new(vec!["x".into()], vec![ColumnType::Int]).unwrap();
            store.replace_table("Other", &table).unwrap();
        }

        let err = ChurnExporter::new(&config).unwrap().run().unwrap_err();
        assert!(matches!(err, EtlError::Sqlite(_)));
        assert!(err.to_string().contains("ChurnData"));
    }
}

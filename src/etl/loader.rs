use crate::config::PipelineConfig;
use crate::engine::ChurnStore;
use crate::etl::clean::{CleanReport, Cleaner, CoercionPlan};
use crate::etl::csv_parser::CSVParser;
use crate::etl::log_summary;
use crate::table::Table;
use crate::{EtlError, EtlResult};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub clean: CleanReport,
    pub rows_written: usize,
    // None when the read-back after writing failed
    pub preview: Option<Table>,
}

/// Reads the raw churn CSV, cleans it, and replaces the table in the database.
pub struct ChurnLoader {
    source: PathBuf,
    database: PathBuf,
    table_name: String,
    delimiter: u8,
    preview_rows: usize,
    refilter: bool,
    plan: CoercionPlan,
}

impl ChurnLoader {
    pub fn new(config: &PipelineConfig) -> EtlResult<Self> {
        Ok(Self {
            source: config.paths.source_csv.clone(),
            database: config.paths.database.clone(),
            table_name: config.table.name.clone(),
            delimiter: config.cleaning.delimiter_byte()?,
            preview_rows: config.cleaning.preview_rows,
            refilter: config.cleaning.refilter_after_coercion,
            plan: CoercionPlan::churn(),
        })
    }

    pub fn with_plan(mut self, plan: CoercionPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn run(&self) -> EtlResult<LoadReport> {
        // checked up front so a missing source never opens (or creates) the database
        if !self.source.exists() {
            return Err(EtlError::SourceNotFound(self.source.clone()));
        }

        info!(path = %self.source.display(), "Loading source CSV");
        let raw = CSVParser::new()
            .with_delimiter(self.delimiter)
            .parse_file(&self.source)?;
        log_summary("Initial table", &raw);

        let (cleaned, clean) = Cleaner::new(self.plan.clone())
            .with_refilter(self.refilter)
            .clean(raw)?;
        info!("Removed {} rows with missing values", clean.dropped_incomplete);
        if clean.dropped_after_coercion > 0 {
            info!(
                "Removed {} more rows whose values failed numeric coercion",
                clean.dropped_after_coercion
            );
        }
        log_summary("Cleaned table", &cleaned);

        let mut store = ChurnStore::open(&self.database)?;
        let rows_written = store.replace_table(&self.table_name, &cleaned)?;
        info!(
            "Successfully loaded {} rows into the '{}' table",
            rows_written, self.table_name
        );

        let preview = self.verify(&store);

        Ok(LoadReport {
            clean,
            rows_written,
            preview,
        })
    }

    // Best effort: a failed read-back is logged and does not undo the load.
    fn verify(&self, store: &ChurnStore) -> Option<Table> {
        match store.read_table(&self.table_name, Some(self.preview_rows)) {
            Ok(head) => {
                info!(
                    "First {} rows from the '{}' table:\n{}",
                    head.len(),
                    self.table_name,
                    head
                );
                Some(head)
            }
            Err(e) => {
                warn!("Could not read back the '{}' table: {}", self.table_name, e);
                None
            }
        }
    }
}

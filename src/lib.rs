pub mod args;
pub mod config;
pub mod engine;
pub mod etl;
pub mod table;

use std::path::PathBuf;
use thiserror::Error;

pub use args::{Cli, Commands};
pub use config::PipelineConfig;
pub use engine::ChurnStore;
pub use table::{Cell, ColumnType, Table};

#[derive(Debug, Error)]
pub enum EtlError {
    #[error("source file '{}' was not found", .0.display())]
    SourceNotFound(PathBuf),

    #[error("could not open database '{}': {source}", path.display())]
    Connection {
        path: PathBuf,
        source: rusqlite::Error,
    },

    #[error("source has no columns to parse")]
    NoColumns,

    #[error("column '{0}' is missing from the source data")]
    MissingColumn(String),

    #[error("cannot cast value {value} in column '{column}' to an integer")]
    LossyCast { column: String, value: String },

    #[error("row has {found} fields but the table has {expected} columns")]
    RowArity { expected: usize, found: usize },

    #[error("invalid table name '{0}'")]
    InvalidTableName(String),

    #[error("invalid column name '{0}'")]
    InvalidColumnName(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("configuration error: {0}")]
    ConfigSource(#[from] ::config::ConfigError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// Result type for pipeline operations
pub type EtlResult<T> = Result<T, EtlError>;

use crate::{EtlError, EtlResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Environment overrides look like CHURN__PATHS__DATABASE=/tmp/churn.db
const ENV_PREFIX: &str = "CHURN";
const ENV_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub paths: PathsConfig,
    pub table: TableConfig,
    pub cleaning: CleaningConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub source_csv: PathBuf,
    pub database: PathBuf,
    pub export_csv: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub refilter_after_coercion: bool,
    pub delimiter: char,
    pub preview_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_csv: PathBuf::from("../data/customer_churn_dataset-training-master.csv"),
            database: PathBuf::from("../data/cleaned_churn.db"),
            export_csv: PathBuf::from("../data/cleaned_churn_for_tableau.csv"),
        }
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "ChurnData".into(),
        }
    }
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            refilter_after_coercion: true,
            delimiter: ',',
            preview_rows: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl CleaningConfig {
    pub fn delimiter_byte(&self) -> EtlResult<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(EtlError::Config(format!(
                "delimiter '{}' must be a single ASCII character",
                self.delimiter
            )))
        }
    }
}

impl PipelineConfig {
    /// Layers an optional YAML file under `CHURN__*` environment variables.
    /// A missing file falls back to the defaults.
    pub fn load(path: &Path) -> EtlResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()?;
        let config: PipelineConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> EtlResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> EtlResult<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> EtlResult<()> {
        if self.table.name.trim().is_empty() {
            return Err(EtlError::InvalidTableName(self.table.name.clone()));
        }
        self.cleaning.delimiter_byte()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_data_layout() {
        let config = PipelineConfig::default();
        assert_eq!(config.table.name, "ChurnData");
        assert_eq!(config.paths.database, PathBuf::from("../data/cleaned_churn.db"));
        assert!(config.cleaning.refilter_after_coercion);
        assert_eq!(config.cleaning.preview_rows, 5);
    }

    #[test]
    fn test_save_and_load_yaml() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("churn.yaml");

        let mut config = PipelineConfig::default();
        config.table.name = "Churn2024".into();
        config.cleaning.refilter_after_coercion = false;
        config.save_to_file(&path).unwrap();

        let loaded = PipelineConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.table.name, "Churn2024");
        assert!(!loaded.cleaning.refilter_after_coercion);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("partial.yaml");
        std::fs::write(&path, "paths:\n  database: /tmp/other.db\n").unwrap();

        let loaded = PipelineConfig::load(&path).unwrap();
        assert_eq!(loaded.paths.database, PathBuf::from("/tmp/other.db"));
        assert_eq!(loaded.table.name, "ChurnData");
        assert_eq!(loaded.cleaning.delimiter, ',');
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = tempdir().unwrap();
        let loaded = PipelineConfig::load(&temp_dir.path().join("absent.yaml")).unwrap();
        assert_eq!(loaded.table.name, "ChurnData");
    }

    #[test]
    fn test_rejects_empty_table_name() {
        let mut config = PipelineConfig::default();
        config.table.name = "  ".into();
        assert!(matches!(config.validate(), Err(EtlError::InvalidTableName(_))));
    }

    #[test]
    fn test_rejects_non_ascii_delimiter() {
        let mut config = PipelineConfig::default();
        config.cleaning.delimiter = '§';
        assert!(matches!(config.validate(), Err(EtlError::Config(_))));
    }
}

// Common test utilities for integration tests

use churn_etl::config::{PathsConfig, PipelineConfig};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

pub const CHURN_HEADER: &str = "CustomerID,Age,Gender,Tenure,Usage Frequency,Support Calls,Payment Delay,Subscription Type,Contract Length,Total Spend,Last Interaction,Churn";

// Helper function to create a config pointing into a fresh temp directory
pub fn create_test_config() -> (PipelineConfig, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = PipelineConfig {
        paths: PathsConfig {
            source_csv: temp_dir.path().join("customer_churn.csv"),
            database: temp_dir.path().join("cleaned_churn.db"),
            export_csv: temp_dir.path().join("cleaned_churn_for_tableau.csv"),
        },
        ..PipelineConfig::default()
    };
    (config, temp_dir)
}

// Helper function to write the source CSV with the standard churn header
pub fn write_source_csv(config: &PipelineConfig, rows: &[&str]) -> PathBuf {
    let path = config.paths.source_csv.clone();
    let mut file = File::create(&path).expect("Failed to create CSV file");

    writeln!(file, "{CHURN_HEADER}").expect("Failed to write CSV header");
    for row in rows {
        writeln!(file, "{row}").expect("Failed to write CSV data");
    }

    path
}

// Rows in the layout of the public training file: numbers written as floats
pub fn generate_rows(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            format!(
                "{}.0,{}.0,{},{}.0,{}.0,{}.0,{}.0,{},{},{}.5,{}.0,{}.0",
                i + 1,
                18 + i % 50,
                if i % 2 == 0 { "Female" } else { "Male" },
                1 + i % 60,
                1 + i % 30,
                i % 10,
                i % 30,
                ["Basic", "Standard", "Premium"][i % 3],
                ["Monthly", "Quarterly", "Annual"][i % 3],
                100 + i,
                1 + i % 30,
                i % 2,
            )
        })
        .collect()
}

pub fn read_csv_lines(path: &PathBuf) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("Failed to read CSV")
        .lines()
        .map(str::to_string)
        .collect()
}

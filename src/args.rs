use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "churn")]
#[command(about = "Cleans the customer churn CSV into SQLite and exports it back to CSV.")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    // Configuration file path
    #[arg(short, long, default_value = "churn.yaml", global = true)]
    pub config: PathBuf,

    // Enable debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    // Clean the source CSV and replace the table in the database
    Load,

    // Write the whole table to the export CSV
    Export,

    // Generate default configuration file
    InitConfig {
        #[arg(short, long, default_value = "churn.yaml")]
        output: PathBuf,
    },
}

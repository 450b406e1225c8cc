use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::layout::{ColumnAlignment, DEFAULT_ROW_SLACK, DEFAULT_ROW_TOLERANCE, ParseConfig};

pub const DEFAULT_SOURCE_DIR: &str = "books";
pub const DEFAULT_SCENARIO_PATTERN: &str = "fh-scenario-book-*.pdf";
pub const DEFAULT_SECTION_PATTERN: &str = "fh-section-book-*.pdf";
pub const DEFAULT_COLUMN_THRESHOLD: &str = "200";
pub const DEFAULT_OUTPUT_PATH: &str = "frosthaven_data.json";

#[derive(Parser, Debug)]
#[command(
    name = "fhbooks",
    version,
    about = "Build a linked scenario/section database from Frosthaven book PDFs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Ingest(IngestArgs),
    Status(StatusArgs),
    Blocks(BlocksArgs),
    Find(FindArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = DEFAULT_SOURCE_DIR)]
    pub source_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_SCENARIO_PATTERN)]
    pub scenario_pattern: String,

    #[arg(long, default_value = DEFAULT_SECTION_PATTERN)]
    pub section_pattern: String,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = DEFAULT_SOURCE_DIR)]
    pub source_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_SCENARIO_PATTERN)]
    pub scenario_pattern: String,

    #[arg(long, default_value = DEFAULT_SECTION_PATTERN)]
    pub section_pattern: String,

    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub max_pages_per_doc: Option<usize>,

    #[arg(long, default_value_t = DEFAULT_ROW_TOLERANCE)]
    pub row_tolerance: f64,

    #[arg(long, default_value_t = DEFAULT_ROW_SLACK)]
    pub row_slack: f64,

    /// Let a fragment skip to a higher row whose header lines up within this distance.
    /// Bare `--column-threshold` uses 200.
    #[arg(long, num_args = 0..=1, default_missing_value = DEFAULT_COLUMN_THRESHOLD)]
    pub column_threshold: Option<f64>,

    #[arg(long, value_enum, default_value_t = ColumnAlignment::LeftEdge)]
    pub alignment: ColumnAlignment,
}

impl IngestArgs {
    pub fn parse_config(&self) -> ParseConfig {
        ParseConfig {
            row_tolerance: self.row_tolerance,
            row_slack: self.row_slack,
            column_threshold: self.column_threshold,
            alignment: self.alignment,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    pub database: PathBuf,

    #[arg(long, default_value_t = false)]
    pub rewrite: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BlocksArgs {
    #[arg(long)]
    pub pdf: PathBuf,

    /// 1-based page number.
    #[arg(long)]
    pub page: usize,
}

#[derive(Args, Debug, Clone)]
pub struct FindArgs {
    #[arg(long)]
    pub pdf: PathBuf,

    #[arg(long)]
    pub term: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingest_config(extra: &[&str]) -> ParseConfig {
        let argv = ["fhbooks", "ingest"].iter().chain(extra).copied();
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Ingest(args) => args.parse_config(),
            other => panic!("expected ingest, got {other:?}"),
        }
    }

    #[test]
    fn column_threshold_is_off_unless_requested() {
        assert_eq!(ingest_config(&[]), ParseConfig::default());
        assert_eq!(ingest_config(&["--column-threshold"]).column_threshold, Some(200.0));
        let explicit = ingest_config(&["--column-threshold", "120"]);
        assert_eq!(explicit.column_threshold, Some(120.0));
    }
}

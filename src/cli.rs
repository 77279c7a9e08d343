use std::path::PathBuf;

use clap::{Args, Parser};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Replace a literal string across the text fields of an entity type",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub replace: ReplaceArgs,
}

#[derive(Debug, Args)]
pub struct ReplaceArgs {
    /// Entity type whose text fields are searched (e.g. `node`)
    pub entity_type: String,
    /// Literal text to search for (case-sensitive)
    pub search: String,
    /// Literal replacement text
    pub replace: String,
    /// Restrict to this comma-separated list of bundles
    #[arg(long = "bundles", action = clap::ArgAction::Append)]
    pub bundles: Vec<String>,
    /// Restrict to this comma-separated list of field names
    #[arg(long = "fields", action = clap::ArgAction::Append)]
    pub fields: Vec<String>,
    /// Report how many rows would change without writing anything
    #[arg(long = "dry-run")]
    pub dry_run: bool,
    /// List the ids of matching entities (implies --dry-run)
    #[arg(long = "show-ids")]
    pub show_ids: bool,
    /// SQLite database holding the field tables
    #[arg(short = 'd', long = "database", env = "FIELD_REPLACE_DATABASE")]
    pub database: PathBuf,
    /// YAML catalog describing entity types, bundles, and fields
    #[arg(short = 'c', long = "catalog", env = "FIELD_REPLACE_CATALOG")]
    pub catalog: PathBuf,
    /// Completion journal (defaults to `<database>.replace-journal.jsonl`)
    #[arg(long = "journal")]
    pub journal: Option<PathBuf>,
    /// Skip the confirmation prompts
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,
}

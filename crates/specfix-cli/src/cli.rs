use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "specfix",
    about = "Record hand corrections to a generated API description and replay them after regeneration",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "debug")]
    pub quiet: bool,

    /// Log engine decisions to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Configuration file (default: ./specfix.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Record the differences between the original and the fixed document
    Update(UpdateArgs),
    /// Apply recorded fixes to the original document
    Fix(FixArgs),
    /// Check that the recorded fixes reproduce the fixed document
    Verify(VerifyArgs),
    /// Print the content hash of a document or one of its values
    Hash(HashArgs),
}

#[derive(Args)]
pub struct UpdateArgs {
    #[arg(long)]
    pub original: Option<PathBuf>,
    #[arg(long)]
    pub fixed: Option<PathBuf>,
    /// Edit set to create or extend
    #[arg(long)]
    pub fixes: Option<PathBuf>,
    /// Show the new edits without writing them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct FixArgs {
    #[arg(long)]
    pub original: Option<PathBuf>,
    #[arg(long)]
    pub fixes: Option<PathBuf>,
    /// Where to write the patched document (default: the fixed document path)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct VerifyArgs {
    #[arg(long)]
    pub original: Option<PathBuf>,
    #[arg(long)]
    pub fixed: Option<PathBuf>,
    #[arg(long)]
    pub fixes: Option<PathBuf>,
}

#[derive(Args)]
pub struct HashArgs {
    pub file: PathBuf,
    /// Encoded path of the value to hash, e.g. `paths|/pets|get|parameters|0`
    #[arg(long)]
    pub path: Option<String>,
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use composer::{StructuralResolver, build, serialize};

/// Interactive prompt composer with `@` mentions and `/` commands.
#[derive(Debug, Parser)]
#[command(name = "composer-tui", version, about)]
pub struct Cli {
    /// Directory whose files and folders are offered as mentions.
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Initial composer value in `@[id]` token form.
    #[arg(long)]
    pub value: Option<String>,

    /// Settings file; defaults to the user config directory.
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Writes logs to this file. Without it nothing is logged.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Builds a composer tree from `value` and prints it serialized again.
    Roundtrip { value: String },
}

/// Returns `value` after a build and serialize pass.
pub fn roundtrip(value: &str) -> String {
    serialize(&build(value, &StructuralResolver))
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::data::LogLevel;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Generate and read .slnx solution manifests")]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,

    #[clap(long, short, default_value = "warn", value_enum, global = true)]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Write the .slnx manifest (and its aggregator project) for a solution description
    Generate {
        /// YAML solution description
        description: PathBuf,

        /// Manifest path; defaults to `obj/<name>.slnx` next to the description
        #[clap(long, short)]
        out: Option<PathBuf>,
    },
    /// Print the absolute path of every existing project referenced by a manifest
    Projects {
        /// The .slnx manifest to read
        manifest: PathBuf,

        /// Directory project paths are relative to; defaults to the manifest's parent directory's parent
        #[clap(long, short)]
        base: Option<PathBuf>,
    },
}

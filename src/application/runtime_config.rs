use std::path::{Path, PathBuf};

use crate::{
    cli::{Cli, CliCommand},
    codec::{MANIFEST_EXTENSION, default_base_dir},
};

const OUTPUT_DIR_NAME: &str = "obj";

/// A fully resolved command: every optional CLI path has been defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeConfig {
    Generate {
        description: PathBuf,
        manifest: PathBuf,
    },
    Projects {
        manifest: PathBuf,
        base_dir: PathBuf,
    },
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        match cli.command {
            CliCommand::Generate { description, out } => {
                let manifest = out.unwrap_or_else(|| default_manifest_path(&description));
                RuntimeConfig::Generate {
                    description,
                    manifest,
                }
            }
            CliCommand::Projects { manifest, base } => {
                let base_dir = base.unwrap_or_else(|| default_base_dir(&manifest));
                RuntimeConfig::Projects { manifest, base_dir }
            }
        }
    }
}

/// `<description dir>/obj/<name>.slnx`, where `<name>` is the description's
/// file name up to its first dot.
fn default_manifest_path(description: &Path) -> PathBuf {
    let file_name = description
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match file_name.split('.').next() {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => "solution".to_string(),
    };

    description
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(OUTPUT_DIR_NAME)
        .join(format!("{stem}.{MANIFEST_EXTENSION}"))
}

use std::path::{Path, PathBuf};

use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info};

use crate::aggregator;
use crate::application::RuntimeConfig;
use crate::codec::{DecodeError, decode_projects};
use crate::config::{SolutionScript, SolutionScriptError};
use crate::solution::SolutionError;

pub struct Application;

impl Application {
    pub async fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let app_config: RuntimeConfig = app_config.into();
        debug!("Resolved runtime config: {:?}", app_config);

        match app_config {
            RuntimeConfig::Generate {
                description,
                manifest,
            } => {
                let written = Self::generate(&description, &manifest).await?;
                println!("{}", written.display());
            }
            RuntimeConfig::Projects { manifest, base_dir } => {
                for project in Self::projects(&manifest, &base_dir)? {
                    println!("{}", project.display());
                }
            }
        }

        Ok(())
    }

    /// Writes the manifest for `description`, then refreshes the aggregator.
    /// Only the manifest write can fail the call.
    pub async fn generate(
        description: &Path,
        manifest: &Path,
    ) -> Result<PathBuf, ApplicationError> {
        let script = SolutionScript::from_path(description)
            .await
            .context(SolutionScriptSnafu)?;

        let written = script
            .builder()
            .write(manifest)
            .context(ManifestWriteSnafu)?;
        info!("Generated manifest: {}", written.display());

        if let Some(aggregator) = aggregator::generate_best_effort(&written) {
            info!("Generated aggregator: {}", aggregator.display());
        }

        Ok(written)
    }

    pub fn projects(manifest: &Path, base_dir: &Path) -> Result<Vec<PathBuf>, ApplicationError> {
        decode_projects(manifest, base_dir).context(ManifestDecodeSnafu)
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while loading the solution description"))]
    SolutionScriptError { source: SolutionScriptError },
    #[snafu(display("Critical failure encountered while writing the manifest"))]
    ManifestWriteError { source: SolutionError },
    #[snafu(display("Critical failure encountered while reading the manifest"))]
    ManifestDecodeError { source: DecodeError },
}

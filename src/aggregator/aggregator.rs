use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use snafu::{ResultExt, Snafu};
use tracing::{debug, warn};

use crate::codec::{
    DecodeError, default_base_dir, read_project_references, resolve_project_references,
    spaced_empty,
};
use crate::ext::BestEffortPathExt;
use crate::solution::path::{absolutize, to_forward_slashes};

const AGGREGATOR_EXTENSION: &str = "proj";
const NO_TARGETS_SDK: &str = "Microsoft.Build.NoTargets/3.6.0";
const INDENT_SIZE: usize = 2;

/// `<manifest>.proj`, next to the manifest.
pub fn aggregator_path(manifest: &Path) -> PathBuf {
    let mut path = OsString::from(manifest.as_os_str());
    path.push(".");
    path.push(AGGREGATOR_EXTENSION);
    PathBuf::from(path)
}

/// Writes the aggregator for `manifest` and returns its path, or `None` when
/// the manifest references no existing project. In that case no file is
/// left behind, including one from an earlier run.
pub fn synthesize(manifest: &Path) -> Result<Option<PathBuf>, AggregatorError> {
    let manifest = absolutize(manifest);
    let base_dir = default_base_dir(&manifest);
    let target = aggregator_path(&manifest);

    let references = read_project_references(&manifest).context(DecodeSnafu)?;
    let includes: Vec<String> = resolve_project_references(&references, &base_dir)
        .into_iter()
        .filter(|candidate| candidate.exists)
        .map(|candidate| include_path(&candidate.path, &base_dir))
        .collect();

    if includes.is_empty() {
        debug!(
            "No projects to aggregate in {}",
            manifest.best_effort_path_display()
        );
        if target.is_file() {
            fs::remove_file(&target).context(RemoveStaleSnafu {
                path: target.clone(),
            })?;
            debug!("Removed stale aggregator: {}", target.display());
        }
        return Ok(None);
    }

    let bytes = render(&includes).context(EncodeSnafu)?;
    fs::write(&target, bytes).context(WriteSnafu {
        path: target.clone(),
    })?;
    debug!("Created aggregator: {}", target.display());

    Ok(Some(target))
}

/// Like [`synthesize`], but failures only produce a warning.
pub fn generate_best_effort(manifest: &Path) -> Option<PathBuf> {
    match synthesize(manifest) {
        Ok(path) => path,
        Err(e) => {
            warn!("Failed to create aggregator project: {e}");
            None
        }
    }
}

/// Relative to `base_dir` with forward slashes; absolute when the project
/// lives outside of it.
fn include_path(project: &Path, base_dir: &Path) -> String {
    let relative = project.strip_prefix(base_dir).unwrap_or(project);
    to_forward_slashes(&relative.to_string_lossy())
}

fn render(includes: &[String]) -> io::Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE);

    let mut project = BytesStart::new("Project");
    project.push_attribute(("Sdk", NO_TARGETS_SDK));
    writer.write_event(Event::Start(project))?;
    writer.write_event(Event::Start(BytesStart::new("ItemGroup")))?;
    for include in includes {
        let mut reference = BytesStart::new("ProjectReference");
        reference.push_attribute(("Include", include.as_str()));
        writer.write_event(spaced_empty(reference))?;
    }
    writer.write_event(Event::End(BytesEnd::new("ItemGroup")))?;
    writer.write_event(Event::End(BytesEnd::new("Project")))?;

    let mut bytes = writer.into_inner();
    bytes.write_all(b"\n")?;
    Ok(bytes)
}

#[derive(Debug, Snafu)]
pub enum AggregatorError {
    #[snafu(display("Failed to read projects from the manifest"))]
    Decode { source: DecodeError },
    #[snafu(display("Failed to encode the aggregator project"))]
    Encode { source: std::io::Error },
    #[snafu(display("Failed to write the aggregator project to {}", path.best_effort_path_display()))]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to remove the stale aggregator project {}", path.best_effort_path_display()))]
    RemoveStale {
        path: PathBuf,
        source: std::io::Error,
    },
}

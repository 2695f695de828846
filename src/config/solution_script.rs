use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::{debug, warn};

use crate::{
    ext::BestEffortPathExt,
    solution::{FolderBuilder, SolutionBuilder, SolutionError},
};

const PROJECTS_KEY: &str = "projects";
const FOLDERS_KEY: &str = "folders";
const FILES_KEY: &str = "files";
const NAME_KEY: &str = "name";

/// A declarative solution description, loaded from YAML:
///
/// ```yaml
/// folders:
///   - name: /Solution Items
///     files: [Directory.Build.props]
/// projects:
///   - src/A/A.csproj
/// ```
#[derive(Debug, Clone)]
pub struct SolutionScript {
    builder: SolutionBuilder,
}

/// Folder as read from the description, before it reaches the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FolderDescription {
    name: String,
    files: Vec<String>,
    folders: Vec<FolderDescription>,
}

impl FolderDescription {
    fn populate(&self, folder: &mut FolderBuilder) {
        folder.files(&self.files);
        for child in &self.folders {
            folder.folder(&child.name, |nested| child.populate(nested));
        }
    }
}

impl SolutionScript {
    pub async fn from_path(path: &Path) -> Result<Self, SolutionScriptError> {
        debug!(
            "Opening solution description: {}",
            path.best_effort_path_display()
        );
        let bytes = compio::fs::read(path).await.context(ReadSnafu {
            file_path: path.to_path_buf(),
        })?;
        debug!("Successfully read solution description: {} bytes", bytes.len());

        let contents = String::from_utf8(bytes).context(EncodingSnafu {
            file_path: path.to_path_buf(),
        })?;
        contents.as_str().try_into()
    }

    pub fn builder(&self) -> &SolutionBuilder {
        &self.builder
    }

    fn parse_projects(
        top_level: &LinkedHashMap<Yaml, Yaml>,
    ) -> Result<Vec<String>, SolutionScriptError> {
        let projects = sequence_section(top_level, PROJECTS_KEY)?
            .iter()
            .filter_map(|item| match item.as_str() {
                Some(path) => Some(path.to_string()),
                None => {
                    warn!("Skipping invalid project entry: {:?}", item);
                    None
                }
            })
            .collect();
        Ok(projects)
    }

    fn parse_folders(
        container: &LinkedHashMap<Yaml, Yaml>,
    ) -> Result<Vec<FolderDescription>, SolutionScriptError> {
        sequence_section(container, FOLDERS_KEY)?
            .iter()
            .filter_map(|item| match item.as_mapping() {
                Some(folder_data) => Some(folder_data),
                None => {
                    warn!("Skipping invalid folder entry: {:?}", item);
                    None
                }
            })
            .filter_map(|folder_data| {
                let name = folder_data.get(&key(NAME_KEY)).and_then(|v| v.as_str());
                if name.is_none() {
                    warn!("Skipping folder entry without a name");
                }
                name.map(|name| (name.to_string(), folder_data))
            })
            .map(|(name, folder_data)| -> Result<FolderDescription, SolutionScriptError> {
                let files = sequence_section(folder_data, FILES_KEY)?
                    .iter()
                    .filter_map(|item| match item.as_str() {
                        Some(path) => Some(path.to_string()),
                        None => {
                            warn!("Skipping invalid file entry in '{}': {:?}", name, item);
                            None
                        }
                    })
                    .collect();
                let folders = Self::parse_folders(folder_data)?;
                Ok(FolderDescription {
                    name,
                    files,
                    folders,
                })
            })
            .collect()
    }
}

impl TryFrom<&str> for SolutionScript {
    type Error = SolutionScriptError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let contents_vec = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let contents = contents_vec
            .first()
            .ok_or(SolutionScriptError::MalformedDescription)?;

        let top_level = contents
            .as_mapping()
            .ok_or(SolutionScriptError::TopLevelNotMap)?;

        let folders = Self::parse_folders(top_level)?;
        let projects = Self::parse_projects(top_level)?;
        debug!(
            "Description lists {} folder(s) and {} project(s)",
            folders.len(),
            projects.len()
        );

        let mut builder = SolutionBuilder::new();
        for folder in &folders {
            builder
                .folder(&folder.name, |nested| folder.populate(nested))
                .context(InvalidEntrySnafu)?;
        }
        for project in &projects {
            builder.project(project).context(InvalidEntrySnafu)?;
        }

        Ok(SolutionScript { builder })
    }
}

fn key<'input>(name: &'static str) -> Yaml<'input> {
    Yaml::Value(Scalar::String(Cow::Borrowed(name)))
}

/// An absent or null section reads as empty; anything but a sequence is an
/// error.
fn sequence_section<'a, 'input>(
    container: &'a LinkedHashMap<Yaml<'input>, Yaml<'input>>,
    section: &'static str,
) -> Result<&'a [Yaml<'input>], SolutionScriptError> {
    match container.get(&key(section)) {
        None | Some(Yaml::Value(Scalar::Null)) => Ok(&[]),
        Some(value) => value
            .as_sequence()
            .map(|sequence| sequence.as_slice())
            .ok_or(SolutionScriptError::SectionNotSequence { section }),
    }
}

#[derive(Debug, Snafu)]
pub enum SolutionScriptError {
    #[snafu(display("Failed to read the solution description: {}", file_path.best_effort_path_display()))]
    ReadError {
        file_path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Solution description is not valid UTF-8: {}", file_path.best_effort_path_display()))]
    EncodingError {
        file_path: PathBuf,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the solution description"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Improperly formatted solution description"))]
    MalformedDescription,
    #[snafu(display("Top level of the solution description should be a map"))]
    TopLevelNotMap,
    #[snafu(display("'{}' section should be a list", section))]
    SectionNotSequence { section: &'static str },
    #[snafu(display("Solution description contains an invalid entry"))]
    InvalidEntry { source: SolutionError },
}

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use snafu::{ResultExt, Snafu, ensure};
use tracing::debug;

use crate::codec::{MANIFEST_EXTENSION, SolutionDocument};
use crate::ext::BestEffortPathExt;
use crate::solution::entry::{Entry, FileEntry, FolderEntry, ProjectEntry};
use crate::solution::path::absolutize;

/// Accumulates projects and folders for a single manifest.
///
/// Entries are kept in insertion order; de-duplication and ordering happen
/// in [`SolutionBuilder::build`], so adding the same project twice is cheap
/// and harmless (the first one wins).
#[derive(Debug, Clone, Default)]
pub struct SolutionBuilder {
    entries: Vec<Entry>,
}

impl SolutionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a project reference. `path` may use either separator style.
    pub fn project(&mut self, path: &str) -> Result<&mut Self, SolutionError> {
        ensure!(!path.trim().is_empty(), EmptyProjectPathSnafu);

        let project = ProjectEntry::new(path);
        debug!("Adding project '{}'", project.path());
        self.entries.push(Entry::Project(project));
        Ok(self)
    }

    /// Adds a logical folder, populated synchronously by `populate`.
    pub fn folder<F>(&mut self, name: &str, populate: F) -> Result<&mut Self, SolutionError>
    where
        F: FnOnce(&mut FolderBuilder),
    {
        ensure!(!name.trim().is_empty(), EmptyFolderNameSnafu);

        let mut folder = FolderBuilder::new(name);
        populate(&mut folder);
        let folder = folder.build();
        debug!(
            "Adding folder '{}' with {} file(s) and {} subfolder(s)",
            folder.name(),
            folder.files().len(),
            folder.subfolders().len()
        );
        self.entries.push(Entry::Folder(folder));
        Ok(self)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Produces the canonical document without touching the disk.
    pub fn build(&self) -> SolutionDocument {
        SolutionDocument::from_entries(&self.entries)
    }

    /// Writes the canonical document and returns the path actually written.
    ///
    /// The manifest extension is appended when missing and the parent
    /// directory is created. An existing file is overwritten.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<PathBuf, SolutionError> {
        let path = with_manifest_extension(path.as_ref());
        let document = self.build();

        if let Some(parent) = absolutize(&path).parent() {
            fs::create_dir_all(parent).context(CreateDirectorySnafu {
                path: parent.to_path_buf(),
            })?;
        }

        let bytes = document.to_bytes().context(EncodeSnafu)?;
        fs::write(&path, bytes).context(WriteManifestSnafu { path: path.clone() })?;
        debug!("Wrote manifest to {}", path.best_effort_path_display());

        Ok(path)
    }
}

fn with_manifest_extension(path: &Path) -> PathBuf {
    let suffix = format!(".{MANIFEST_EXTENSION}");
    if path
        .to_string_lossy()
        .to_lowercase()
        .ends_with(suffix.as_str())
    {
        return path.to_path_buf();
    }

    let mut extended = OsString::from(path.as_os_str());
    extended.push(suffix);
    PathBuf::from(extended)
}

/// Scoped builder handed to folder population closures.
#[derive(Debug)]
pub struct FolderBuilder {
    name: String,
    files: Vec<FileEntry>,
    folders: Vec<FolderEntry>,
}

impl FolderBuilder {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            files: Vec::new(),
            folders: Vec::new(),
        }
    }

    pub fn file(&mut self, path: &str) -> &mut Self {
        self.files.push(FileEntry::new(path));
        self
    }

    pub fn files<I, S>(&mut self, paths: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            self.file(path.as_ref());
        }
        self
    }

    /// Adds a child folder. Siblings sharing a name are all kept.
    pub fn folder<F>(&mut self, name: &str, populate: F) -> &mut Self
    where
        F: FnOnce(&mut FolderBuilder),
    {
        let mut child = FolderBuilder::new(name);
        populate(&mut child);
        self.folders.push(child.build());
        self
    }

    fn build(self) -> FolderEntry {
        let mut seen = HashSet::new();
        let files = self
            .files
            .into_iter()
            .filter(|file| seen.insert(file.path().to_string()))
            .collect();

        FolderEntry::new(&self.name, files, self.folders)
    }
}

#[derive(Debug, Snafu)]
pub enum SolutionError {
    #[snafu(display("Project path required"))]
    EmptyProjectPath,
    #[snafu(display("Folder name required"))]
    EmptyFolderName,
    #[snafu(display("Failed to create directory {}", path.best_effort_path_display()))]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to encode the solution manifest"))]
    Encode { source: std::io::Error },
    #[snafu(display("Failed to write the solution manifest to {}", path.best_effort_path_display()))]
    WriteManifest {
        path: PathBuf,
        source: std::io::Error,
    },
}

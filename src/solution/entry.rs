use std::cmp::Ordering;

use crate::solution::path::normalize_separators;

/// Separator appended to every folder display name.
pub const FOLDER_NAME_SUFFIX: char = '/';

/// One node of a solution description.
///
/// Top-level solutions only ever hold `Project` and `Folder`; `File` lives
/// inside a folder. The variant still participates in the shared key scheme
/// so that ordering stays consistent if it ever shows up at the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Folder(FolderEntry),
    Project(ProjectEntry),
    File(FileEntry),
}

impl Entry {
    /// Identity used to collapse duplicates. Distinct per kind.
    pub fn dedup_key(&self) -> String {
        match self {
            Entry::Folder(folder) => format!("F|{}", folder.name),
            Entry::Project(project) => format!("P|{}", project.path),
            Entry::File(file) => format!("FI|{}", file.path),
        }
    }

    /// Folders rank before projects, projects before files; within a rank
    /// entries order by their case-folded label. Folder labels are the name as
    /// supplied, without the display suffix.
    pub fn sort_key(&self) -> String {
        format!("{}|{}", self.rank(), self.label().to_lowercase())
    }

    /// The path or name the entry is identified by.
    pub fn label(&self) -> &str {
        match self {
            Entry::Folder(folder) => &folder.name,
            Entry::Project(project) => &project.path,
            Entry::File(file) => &file.path,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Entry::Folder(_) => 0,
            Entry::Project(_) => 1,
            Entry::File(_) => 2,
        }
    }

    /// Canonical ordering: sort key first, then the exact label so that
    /// labels differing only in case still order the same way every time.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.label().cmp(other.label()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEntry {
    path: String,
}

impl ProjectEntry {
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize_separators(path),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    path: String,
}

impl FileEntry {
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize_separators(path),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderEntry {
    name: String,
    files: Vec<FileEntry>,
    subfolders: Vec<FolderEntry>,
}

impl FolderEntry {
    pub fn new(name: &str, files: Vec<FileEntry>, subfolders: Vec<FolderEntry>) -> Self {
        Self {
            name: name.to_string(),
            files,
            subfolders,
        }
    }

    /// The name as supplied. Identity and ordering use this form.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name as written to a manifest, always ending with `/`.
    pub fn display_name(&self) -> String {
        if self.name.ends_with(FOLDER_NAME_SUFFIX) {
            self.name.clone()
        } else {
            format!("{}{FOLDER_NAME_SUFFIX}", self.name)
        }
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn subfolders(&self) -> &[FolderEntry] {
        &self.subfolders
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.subfolders.is_empty()
    }

    /// Returns a copy with files ordered by path (ordinal) and subfolders by
    /// name (case-insensitive, stable), recursively. Nothing is deduplicated.
    pub fn sorted(&self) -> Self {
        let mut files = self.files.clone();
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let mut subfolders: Vec<FolderEntry> =
            self.subfolders.iter().map(FolderEntry::sorted).collect();
        subfolders.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });

        Self {
            name: self.name.clone(),
            files,
            subfolders,
        }
    }
}

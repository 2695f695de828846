use std::collections::HashSet;
use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use super::{
    FILE_ELEMENT, FOLDER_ELEMENT, NAME_ATTRIBUTE, PATH_ATTRIBUTE, PROJECT_ELEMENT, ROOT_ELEMENT,
    spaced_empty,
};
use crate::solution::{Entry, FolderEntry};

const INDENT_SIZE: usize = 2;

/// De-duplicated, canonically ordered view of a solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolutionDocument {
    entries: Vec<Entry>,
}

impl SolutionDocument {
    /// Keeps the first entry per dedup key, sorts the survivors and sorts
    /// every folder subtree.
    pub fn from_entries(entries: &[Entry]) -> Self {
        let mut seen = HashSet::new();
        let mut entries: Vec<Entry> = entries
            .iter()
            .filter(|entry| seen.insert(entry.dedup_key()))
            .map(|entry| match entry {
                Entry::Folder(folder) => Entry::Folder(folder.sorted()),
                other => other.clone(),
            })
            .collect();
        entries.sort_by(Entry::canonical_cmp);

        Self { entries }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn write_to<W: Write>(&self, inner: W) -> io::Result<W> {
        let mut writer = Writer::new_with_indent(inner, b' ', INDENT_SIZE);
        writer.write_event(Event::Decl(BytesDecl::new(
            "1.0",
            Some("utf-8"),
            Some("yes"),
        )))?;

        if self.entries.is_empty() {
            writer.write_event(spaced_empty(BytesStart::new(ROOT_ELEMENT)))?;
        } else {
            writer.write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))?;
            for entry in &self.entries {
                write_entry(&mut writer, entry)?;
            }
            writer.write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))?;
        }

        let mut inner = writer.into_inner();
        inner.write_all(b"\n")?;
        Ok(inner)
    }

    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        self.write_to(Vec::new())
    }

    pub fn to_xml_string(&self) -> io::Result<String> {
        String::from_utf8(self.to_bytes()?)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

fn write_entry<W: Write>(writer: &mut Writer<W>, entry: &Entry) -> io::Result<()> {
    match entry {
        Entry::Folder(folder) => write_folder(writer, folder),
        Entry::Project(project) => write_path_element(writer, PROJECT_ELEMENT, project.path()),
        Entry::File(file) => write_path_element(writer, FILE_ELEMENT, file.path()),
    }
}

fn write_path_element<W: Write>(
    writer: &mut Writer<W>,
    element: &str,
    path: &str,
) -> io::Result<()> {
    let mut start = BytesStart::new(element);
    start.push_attribute((PATH_ATTRIBUTE, path));
    writer.write_event(spaced_empty(start))
}

fn write_folder<W: Write>(writer: &mut Writer<W>, folder: &FolderEntry) -> io::Result<()> {
    let mut start = BytesStart::new(FOLDER_ELEMENT);
    start.push_attribute((NAME_ATTRIBUTE, folder.display_name().as_str()));

    if folder.is_empty() {
        return writer.write_event(spaced_empty(start));
    }

    writer.write_event(Event::Start(start))?;
    for file in folder.files() {
        write_path_element(writer, FILE_ELEMENT, file.path())?;
    }
    for subfolder in folder.subfolders() {
        write_folder(writer, subfolder)?;
    }
    writer.write_event(Event::End(BytesEnd::new(FOLDER_ELEMENT)))
}

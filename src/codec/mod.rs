//! Canonical `.slnx` manifest codec.
//!
//! Encoding turns builder entries into a deterministic document; decoding
//! reads the top-level project references back out of one.

use quick_xml::events::{BytesStart, Event};

mod decode;
mod encode;

pub use decode::{
    DecodeError, decode_projects, default_base_dir, read_project_references,
    resolve_project_references,
};
pub use encode::SolutionDocument;

pub const MANIFEST_EXTENSION: &str = "slnx";

const ROOT_ELEMENT: &str = "Solution";
const FOLDER_ELEMENT: &str = "Folder";
const FILE_ELEMENT: &str = "File";
const PROJECT_ELEMENT: &str = "Project";
const NAME_ATTRIBUTE: &str = "Name";
const PATH_ATTRIBUTE: &str = "Path";

/// A self-closing element written as `<Name attr="v" />`, the form existing
/// manifests and MSBuild project files use.
pub(crate) fn spaced_empty(start: BytesStart<'_>) -> Event<'static> {
    let name_len = start.name().as_ref().len();
    let mut content = String::from_utf8_lossy(&start).into_owned();
    content.push(' ');
    Event::Empty(BytesStart::from_content(content, name_len))
}

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use snafu::{ResultExt, Snafu, ensure};
use tracing::{debug, info, warn};

use super::{PATH_ATTRIBUTE, PROJECT_ELEMENT, ROOT_ELEMENT};
use crate::ext::BestEffortPathExt;
use crate::solution::path::{absolutize, lexically_normalize, normalize_separators};

/// A top-level project reference resolved against a base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProject {
    pub path: PathBuf,
    pub exists: bool,
}

/// The directory project paths are authored against: one level above the
/// directory holding the manifest (which conventionally lives in `obj/`).
pub fn default_base_dir(manifest: &Path) -> PathBuf {
    let manifest = absolutize(manifest);
    match manifest.parent() {
        Some(manifest_dir) => lexically_normalize(&manifest_dir.join("..")),
        None => manifest,
    }
}

/// Decodes the manifest and returns the absolute paths of every top-level
/// project that exists on disk, in document order.
///
/// Projects that are referenced but missing are logged and left out; they
/// never make the decode fail.
pub fn decode_projects(manifest: &Path, base_dir: &Path) -> Result<Vec<PathBuf>, DecodeError> {
    let raw = read_project_references(manifest)?;
    for reference in &raw {
        info!(
            "[slncs-parse] Found entry Path='{}'",
            reference.as_deref().unwrap_or_default()
        );
    }

    let candidates = resolve_project_references(&raw, base_dir);
    for candidate in &candidates {
        info!(
            "[slncs-parse] Candidate '{}' Exists={}",
            candidate.path.display(),
            candidate.exists
        );
    }

    let projects: Vec<PathBuf> = candidates
        .into_iter()
        .filter(|candidate| candidate.exists)
        .map(|candidate| candidate.path)
        .collect();
    debug!(
        "Parsed {} project(s) from {}",
        projects.len(),
        manifest.best_effort_path_display()
    );

    Ok(projects)
}

/// Reads the raw `Path` attribute of every top-level `Project` element.
/// Elements without the attribute yield `None`.
pub fn read_project_references(manifest: &Path) -> Result<Vec<Option<String>>, DecodeError> {
    ensure!(
        manifest.is_file(),
        NotFoundSnafu {
            path: manifest.to_path_buf()
        }
    );

    let contents = fs::read_to_string(manifest).context(ReadSnafu {
        path: manifest.to_path_buf(),
    })?;

    parse_project_references(&contents).context(ParseSnafu {
        path: manifest.to_path_buf(),
    })
}

/// Drops blank references, de-duplicates the rest case-insensitively
/// (first occurrence wins) and resolves them against `base_dir`. Non-blank
/// values are used as written, surrounding whitespace included.
pub fn resolve_project_references(
    references: &[Option<String>],
    base_dir: &Path,
) -> Vec<ResolvedProject> {
    let base_dir = absolutize(base_dir);
    let mut seen = HashSet::new();

    references
        .iter()
        .flatten()
        .filter(|reference| !reference.trim().is_empty())
        .map(|reference| normalize_separators(reference))
        .filter(|reference| seen.insert(reference.to_lowercase()))
        .map(|reference| {
            let path = lexically_normalize(&base_dir.join(reference));
            let exists = path.is_file();
            ResolvedProject { path, exists }
        })
        .collect()
}

fn parse_project_references(xml: &str) -> Result<Vec<Option<String>>, SyntaxError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut references = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        match reader.read_event().context(XmlSnafu)? {
            Event::Start(element) => {
                visit_element(&element, depth, &mut seen_root, &mut references)?;
                depth += 1;
            }
            Event::Empty(element) => {
                visit_element(&element, depth, &mut seen_root, &mut references)?;
            }
            Event::End(_) => {
                depth = depth.checked_sub(1).ok_or(SyntaxError::UnexpectedClose)?;
            }
            Event::Text(_) | Event::CData(_) if depth == 0 => {
                return Err(SyntaxError::TextOutsideRoot);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    ensure!(seen_root, MissingRootSnafu);
    ensure!(depth == 0, UnclosedElementSnafu);

    Ok(references)
}

fn visit_element(
    element: &BytesStart,
    depth: usize,
    seen_root: &mut bool,
    references: &mut Vec<Option<String>>,
) -> Result<(), SyntaxError> {
    if depth == 0 {
        ensure!(!*seen_root, MultipleRootsSnafu);
        *seen_root = true;
        if element.name().as_ref() != ROOT_ELEMENT.as_bytes() {
            warn!(
                "Unexpected manifest root element '{}'",
                String::from_utf8_lossy(element.name().as_ref())
            );
        }
    } else if depth == 1 && element.name().as_ref() == PROJECT_ELEMENT.as_bytes() {
        references.push(path_attribute(element)?);
    }
    Ok(())
}

fn path_attribute(element: &BytesStart) -> Result<Option<String>, SyntaxError> {
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| SyntaxError::InvalidAttribute {
            reason: e.to_string(),
        })?;
        if attribute.key.as_ref() == PATH_ATTRIBUTE.as_bytes() {
            let value = attribute
                .unescape_value()
                .map_err(|e| SyntaxError::InvalidAttribute {
                    reason: e.to_string(),
                })?;
            return Ok(Some(value.to_string()));
        }
    }
    Ok(None)
}

#[derive(Debug, Snafu)]
pub enum DecodeError {
    #[snafu(display("Slnx file not found: {}", path.best_effort_path_display()))]
    NotFound { path: PathBuf },
    #[snafu(display("Failed to read the slnx file: {}", path.best_effort_path_display()))]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to parse the slnx file: {}", path.best_effort_path_display()))]
    Parse { path: PathBuf, source: SyntaxError },
}

#[derive(Debug, Snafu)]
pub enum SyntaxError {
    #[snafu(display("Malformed xml"))]
    Xml { source: quick_xml::Error },
    #[snafu(display("Invalid attribute: {}", reason))]
    InvalidAttribute { reason: String },
    #[snafu(display("Document has no root element"))]
    MissingRoot,
    #[snafu(display("Document has more than one root element"))]
    MultipleRoots,
    #[snafu(display("Document ends inside an open element"))]
    UnclosedElement,
    #[snafu(display("Closing tag without a matching opening tag"))]
    UnexpectedClose,
    #[snafu(display("Text found outside the root element"))]
    TextOutsideRoot,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::SolutionBuilder;
    use rstest::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("file has a parent"))
            .expect("Failed to create directories");
        fs::write(&path, "<Project />").expect("Failed to create project file");
        path
    }

    fn write_manifest(root: &Path, contents: &str) -> PathBuf {
        let path = root.join("obj").join("test.slnx");
        fs::create_dir_all(path.parent().expect("manifest has a parent"))
            .expect("Failed to create obj directory");
        fs::write(&path, contents).expect("Failed to write manifest");
        path
    }

    #[test]
    fn parses_top_level_projects_only() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<Solution>
  <Folder Name="Items/">
    <File Path="Directory.Build.props" />
    <Project Path="nested/Ignored.csproj" />
  </Folder>
  <Project Path="src/A/A.csproj" />
  <Project Path="src/B/B.csproj" />
</Solution>"#;

        let references = parse_project_references(xml).expect("valid document");
        assert_eq!(
            references,
            vec![
                Some("src/A/A.csproj".to_string()),
                Some("src/B/B.csproj".to_string())
            ]
        );
    }

    #[test]
    fn project_without_path_yields_none() {
        let references =
            parse_project_references("<Solution><Project /></Solution>").expect("valid document");
        assert_eq!(references, vec![None]);
    }

    #[test]
    fn unescapes_attribute_values() {
        let references =
            parse_project_references(r#"<Solution><Project Path="R&amp;D/a.csproj"/></Solution>"#)
                .expect("valid document");
        assert_eq!(references, vec![Some("R&D/a.csproj".to_string())]);
    }

    #[test]
    fn self_closing_root_has_no_projects() {
        let references = parse_project_references("<Solution />").expect("valid document");
        assert!(references.is_empty());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("<Solution>")]
    #[case("<Solution><Project Path=\"a\"></Solution>")]
    #[case("<Solution></Solution><Solution></Solution>")]
    #[case("not xml at all")]
    #[case("<Solution><Project Path=\"a /></Solution>")]
    fn malformed_documents_are_rejected(#[case] xml: &str) {
        assert!(parse_project_references(xml).is_err(), "accepted: {xml:?}");
    }

    #[test]
    fn resolution_dedups_case_insensitively_and_skips_blanks() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let references = vec![
            Some("src/A/A.csproj".to_string()),
            None,
            Some("  ".to_string()),
            Some("SRC/a/a.csproj".to_string()),
            Some("src\\B\\B.csproj".to_string()),
        ];

        let resolved = resolve_project_references(&references, temp_dir.path());

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].path, temp_dir.path().join("src/A/A.csproj"));
        assert_eq!(resolved[1].path, temp_dir.path().join("src/B/B.csproj"));
        assert!(resolved.iter().all(|candidate| !candidate.exists));
    }

    #[test]
    fn resolution_keeps_non_blank_values_as_written() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let references = vec![
            Some(" a.csproj".to_string()),
            Some("\t".to_string()),
            Some("a.csproj".to_string()),
        ];

        let resolved = resolve_project_references(&references, temp_dir.path());

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].path, temp_dir.path().join(" a.csproj"));
        assert_eq!(resolved[1].path, temp_dir.path().join("a.csproj"));
    }

    #[test]
    fn resolution_collapses_dot_segments() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let expected = touch(temp_dir.path(), "src/A/A.csproj");

        let resolved = resolve_project_references(
            &[Some("./src/other/../A/A.csproj".to_string())],
            temp_dir.path(),
        );

        assert_eq!(
            resolved,
            vec![ResolvedProject {
                path: expected,
                exists: true
            }]
        );
    }

    #[test]
    fn default_base_dir_is_parent_of_manifest_dir() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let manifest = temp_dir.path().join("obj").join("test.slnx");
        assert_eq!(default_base_dir(&manifest), temp_dir.path());
    }

    #[test]
    fn decode_returns_existing_projects_in_document_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = touch(temp_dir.path(), "src/A/A.csproj");
        let b = touch(temp_dir.path(), "src/B/B.csproj");

        let mut builder = SolutionBuilder::new();
        builder
            .folder("/Solution Items", |f| {
                f.files(["Directory.Build.props"]);
            })
            .and_then(|s| s.project("src/B/B.csproj"))
            .and_then(|s| s.project("src/A/A.csproj"))
            .expect("valid entries");
        let manifest = builder
            .write(temp_dir.path().join("obj").join("test.slnx"))
            .expect("write should succeed");

        let projects =
            decode_projects(&manifest, &default_base_dir(&manifest)).expect("decode should succeed");
        assert_eq!(projects, vec![a, b]);
    }

    #[test]
    fn decode_drops_missing_projects() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = touch(temp_dir.path(), "src/A/A.csproj");
        let manifest = write_manifest(
            temp_dir.path(),
            r#"<Solution>
  <Project Path="src/A/A.csproj" />
  <Project Path="src/Missing/Missing.csproj" />
</Solution>"#,
        );

        let projects = decode_projects(&manifest, temp_dir.path()).expect("decode should succeed");
        assert_eq!(projects, vec![a]);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("log buffer lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().expect("log buffer lock")).into_owned()
        }
    }

    #[test]
    fn decode_logs_each_entry_and_candidate() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        touch(temp_dir.path(), "src/A/A.csproj");
        let manifest = write_manifest(
            temp_dir.path(),
            r#"<Solution>
  <Project Path="src/A/A.csproj" />
  <Project Path="src/Missing/Missing.csproj" />
</Solution>"#,
        );

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let projects = tracing::subscriber::with_default(subscriber, || {
            decode_projects(&manifest, temp_dir.path())
        })
        .expect("decode should succeed");
        assert_eq!(projects.len(), 1);

        let output = logs.contents();
        assert!(output.contains("Found entry Path='src/A/A.csproj'"), "{output}");
        assert!(
            output.contains("Found entry Path='src/Missing/Missing.csproj'"),
            "{output}"
        );
        assert!(output.contains("Exists=true"), "{output}");
        assert!(output.contains("Exists=false"), "{output}");
        assert_eq!(output.matches("Candidate '").count(), 2, "{output}");
    }

    #[test]
    fn decode_of_nonexistent_manifest_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = decode_projects(&temp_dir.path().join("missing.slnx"), temp_dir.path());
        assert!(matches!(result, Err(DecodeError::NotFound { .. })));
    }

    #[test]
    fn decode_of_malformed_manifest_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let manifest = write_manifest(temp_dir.path(), "<Solution><Project Path=\"a\">");

        let result = decode_projects(&manifest, temp_dir.path());
        assert!(matches!(result, Err(DecodeError::Parse { .. })));
    }

    #[test]
    fn decode_error_names_the_manifest() {
        let error = DecodeError::NotFound {
            path: PathBuf::from("/this/path/does/not/exist.slnx"),
        };
        let message = error.to_string();
        assert!(message.contains("Slnx file not found"));
        assert!(message.contains("/this/path/does/not/exist.slnx"));
    }
}

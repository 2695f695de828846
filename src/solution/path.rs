use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};

/// Rewrites both `/` and `\` to the host's native separator.
pub fn normalize_separators(path: &str) -> String {
    path.chars()
        .map(|c| match c {
            '/' | '\\' => MAIN_SEPARATOR,
            other => other,
        })
        .collect()
}

/// Rewrites every separator to `/`, regardless of host.
pub fn to_forward_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// Resolves `.` and `..` components without consulting the filesystem.
pub fn lexically_normalize(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                // `..` never climbs past a root or prefix
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            _ => components.push(component),
        }
    }

    components.iter().collect()
}

/// Joins a relative path onto the current directory and normalizes it.
pub fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(current_dir) => current_dir.join(path),
            Err(_) => path.to_path_buf(),
        }
    };
    lexically_normalize(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("src/A/A.csproj")]
    #[case("src\\A\\A.csproj")]
    #[case("src/A\\A.csproj")]
    fn normalize_separators_yields_native_form(#[case] input: &str) {
        let expected = format!("src{MAIN_SEPARATOR}A{MAIN_SEPARATOR}A.csproj");
        assert_eq!(normalize_separators(input), expected);
    }

    #[test]
    fn normalize_separators_is_total_on_empty_input() {
        assert_eq!(normalize_separators(""), "");
        assert_eq!(normalize_separators("   "), "   ");
    }

    #[test]
    fn forward_slashes_replace_backslashes() {
        assert_eq!(to_forward_slashes("src\\A\\A.csproj"), "src/A/A.csproj");
        assert_eq!(to_forward_slashes("src/A/A.csproj"), "src/A/A.csproj");
    }

    #[rstest]
    #[case("/a/b/./c", "/a/b/c")]
    #[case("/a/b/../c", "/a/c")]
    #[case("/a/../../c", "/c")]
    #[case("a/../../c", "../c")]
    #[case("./a/b", "a/b")]
    fn lexically_normalize_resolves_dots(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(lexically_normalize(Path::new(input)), PathBuf::from(expected));
    }

    #[test]
    fn absolutize_makes_relative_paths_absolute() {
        let result = absolutize(Path::new("some/relative/../path"));
        assert!(result.is_absolute());
        assert!(result.ends_with("some/path"));
    }
}

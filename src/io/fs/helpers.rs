//! Path helpers for URI-like filesystem addresses.
//!
//! Paths look like `scheme://authority/a/b/c` or plain `/a/b/c`. The helpers here never
//! touch a backend; they only split and join strings.

use crate::io::fs::traits::{DatasetError, DatasetResult, ErrorKind};

const SCHEME_SEP: &str = "://";

/// Split a path into its scheme (if any) and the remainder.
///
/// # Examples
/// - `mem://bucket/a/b` -> `(Some("mem"), "bucket/a/b")`
/// - `/tmp/out` -> `(None, "/tmp/out")`
///
/// # Errors
///
/// Returns an error if the path is empty or the scheme is empty (`://x`).
pub fn parse_path_uri(uri: &str) -> DatasetResult<(Option<&str>, &str)> {
    if uri.is_empty() {
        return Err(DatasetError::new(
            ErrorKind::InvalidInput,
            "Path cannot be empty",
        ));
    }
    match uri.split_once(SCHEME_SEP) {
        Some(("", _)) => Err(DatasetError::new(
            ErrorKind::InvalidInput,
            format!("Invalid path URI format: {uri}"),
        )),
        Some((scheme, rest)) => Ok((Some(scheme), rest)),
        None => Ok((None, uri)),
    }
}

/// Split a path at its last separator into `(parent, name)`.
///
/// Returns `None` when the path has no parent inside its scheme (e.g. `mem://bucket`).
#[must_use]
pub fn split_parent(path: &str) -> Option<(&str, &str)> {
    let trimmed = path.trim_end_matches('/');
    let floor = trimmed.find(SCHEME_SEP).map_or(0, |i| i + SCHEME_SEP.len());
    let idx = trimmed[floor..].rfind('/')? + floor;
    let parent = if idx == 0 { "/" } else { &trimmed[..idx] };
    Some((parent, &trimmed[idx + 1..]))
}

/// The final component of a path.
#[must_use]
pub fn base_name(path: &str) -> &str {
    split_parent(path).map_or_else(|| path.trim_end_matches('/'), |(_, name)| name)
}

/// Join a directory and a child name with exactly one separator.
#[must_use]
pub fn join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// True when the name contains glob metacharacters.
#[must_use]
pub fn is_glob(name: &str) -> bool {
    name.contains(['*', '?', '['])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_uri() {
        let (scheme, rest) = parse_path_uri("mem://bucket/a/b").unwrap();
        assert_eq!(scheme, Some("mem"));
        assert_eq!(rest, "bucket/a/b");

        let (scheme, rest) = parse_path_uri("/tmp/out").unwrap();
        assert_eq!(scheme, None);
        assert_eq!(rest, "/tmp/out");

        assert!(parse_path_uri("").is_err());
        assert!(parse_path_uri("://nothing").is_err());
    }

    #[test]
    fn test_split_parent() {
        assert_eq!(
            split_parent("mem://bucket/dir/file.avro"),
            Some(("mem://bucket/dir", "file.avro"))
        );
        assert_eq!(
            split_parent("mem://bucket/file.avro"),
            Some(("mem://bucket", "file.avro"))
        );
        assert_eq!(split_parent("mem://bucket"), None);
        assert_eq!(split_parent("/out"), Some(("/", "out")));
        assert_eq!(split_parent("/data/out/"), Some(("/data", "out")));
        assert_eq!(split_parent("relative"), None);
    }

    #[test]
    fn test_base_name_and_join() {
        assert_eq!(base_name("mem://b/x/part-0.avro"), "part-0.avro");
        assert_eq!(base_name("relative"), "relative");
        assert_eq!(join("mem://b/x", "y"), "mem://b/x/y");
        assert_eq!(join("/", "y"), "/y");
    }

    #[test]
    fn test_is_glob() {
        assert!(is_glob("part-*"));
        assert!(is_glob("file?.avro"));
        assert!(is_glob("[ab].avro"));
        assert!(!is_glob("plain.avro"));
    }
}

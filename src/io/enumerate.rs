//! Dataset enumeration.
//!
//! A dataset location is a directory, a single file, or a directory path whose last
//! component is a glob (`out/part-*.avro`). [`enumerate`] resolves it through the
//! [`FileSystem`] capability and drops housekeeping entries: anything whose base name
//! starts with `_` (in-progress and marker files such as `_SUCCESS`, `_temporary`) or `.`
//! (hidden and checksum files).
//!
//! # Pattern Syntax
//!
//! Only the final component may contain glob metacharacters; it is matched with
//! [`glob::Pattern`]:
//! - `*` matches any sequence of characters
//! - `?` matches any single character
//! - `[abc]` / `[!abc]` match a character set or its complement
//!
//! # Ordering
//!
//! Entries come back in whatever order the backend lists them. Use [`sorted_paths`] when a
//! deterministic order matters.

use crate::io::compression::CodecRegistry;
use crate::io::fs::helpers::{base_name, is_glob, split_parent};
use crate::io::fs::traits::{DatasetError, DatasetResult, ErrorKind, FileEntry, FileSystem};
use glob::Pattern;
use log::debug;

/// True for names the enumerator never returns.
#[must_use]
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('.')
}

/// Resolve a location to its member files.
///
/// # Errors
///
/// Returns an error if:
/// - The glob pattern is invalid (`InvalidInput`)
/// - The location or its parent directory does not exist (`PathNotFound`)
/// - The backend listing fails (surfaced unchanged)
///
/// A glob that matches nothing is not an error; it yields an empty vector.
pub fn enumerate(
    fs: &dyn FileSystem,
    registry: &CodecRegistry,
    location: &str,
) -> DatasetResult<Vec<FileEntry>> {
    let name = base_name(location);

    let entries = if is_glob(name) {
        let (dir, pattern) = split_parent(location).ok_or_else(|| {
            DatasetError::new(
                ErrorKind::InvalidInput,
                format!("Glob needs a parent directory: {location}"),
            )
        })?;
        let pattern = Pattern::new(pattern).map_err(|e| {
            DatasetError::new(
                ErrorKind::InvalidInput,
                format!("invalid glob pattern: {pattern}: {e}"),
            )
        })?;
        fs.list(dir)?
            .into_iter()
            .filter(|e| !e.is_dir && pattern.matches(e.name()))
            .collect()
    } else {
        resolve_plain(fs, location)?
    };

    Ok(entries
        .into_iter()
        .filter(|e| {
            let hidden = is_hidden(e.name());
            if hidden {
                debug!("skipping housekeeping entry {}", e.path);
            }
            !hidden
        })
        .map(|mut e| {
            e.codec_hint = registry.codec_hint(&e.path);
            e
        })
        .collect())
}

/// A location without glob characters names either a directory or one file.
fn resolve_plain(fs: &dyn FileSystem, location: &str) -> DatasetResult<Vec<FileEntry>> {
    if let Some((dir, name)) = split_parent(location) {
        let siblings = fs.list(dir)?;
        return match siblings.into_iter().find(|e| e.name() == name) {
            Some(e) if e.is_dir => list_files(fs, &e.path),
            Some(e) => Ok(vec![e]),
            None => Err(DatasetError::not_found(location)),
        };
    }
    // No parent inside the scheme (`mem://bucket`, or a bare `output.avro` under a
    // rooted backend): a directory if it lists, otherwise a single file.
    match list_files(fs, location) {
        Ok(entries) => Ok(entries),
        Err(list_err) => match fs.content_length(location) {
            Ok(len) => Ok(vec![FileEntry::file(location, len)]),
            Err(_) => Err(list_err),
        },
    }
}

fn list_files(fs: &dyn FileSystem, dir: &str) -> DatasetResult<Vec<FileEntry>> {
    Ok(fs.list(dir)?.into_iter().filter(|e| !e.is_dir).collect())
}

/// Enumerate and return just the paths, sorted lexicographically.
///
/// # Errors
///
/// Same as [`enumerate`].
pub fn sorted_paths(
    fs: &dyn FileSystem,
    registry: &CodecRegistry,
    location: &str,
) -> DatasetResult<Vec<String>> {
    let mut paths: Vec<String> = enumerate(fs, registry, location)?
        .into_iter()
        .map(|e| e.path)
        .collect();
    paths.sort();
    Ok(paths)
}

/// Like [`sorted_paths`], but zero matches is an error.
///
/// # Errors
///
/// Returns `PathNotFound` when nothing matches, in addition to the errors of
/// [`enumerate`].
pub fn sorted_paths_required(
    fs: &dyn FileSystem,
    registry: &CodecRegistry,
    location: &str,
) -> DatasetResult<Vec<String>> {
    let paths = sorted_paths(fs, registry, location)?;
    if paths.is_empty() {
        return Err(DatasetError::new(
            ErrorKind::PathNotFound,
            format!("no files found matching pattern: {location}"),
        ));
    }
    Ok(paths)
}

//! Assertion functions for testing dataset reads and writes.
//!
//! Collection assertions compare what a read produced with what was written. Dataset
//! assertions inspect the files a write left behind.

use crate::io::compression::CodecRegistry;
use crate::io::enumerate::sorted_paths;
use crate::io::fs::traits::FileSystem;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Assert that two collections are equal in order and content.
///
/// # Panics
///
/// Panics if the collections differ in length or content.
///
/// # Example
///
/// ```
/// use ironshard::testing::assert_collections_equal;
///
/// assert_collections_equal(&[1, 2, 3], &[1, 2, 3]);
/// ```
pub fn assert_collections_equal<T: Debug + PartialEq>(actual: &[T], expected: &[T]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Collection length mismatch:\n  Expected length: {}\n  Actual length: {}\n  Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );

    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert_eq!(
            a, e,
            "Collection mismatch at index {i}:\n  Expected: {e:?}\n  Actual: {a:?}"
        );
    }
}

/// Assert that two collections hold the same elements with the same multiplicities,
/// ignoring order.
///
/// Sharded writes scatter records across files, so reads of a sharded dataset are
/// compared with this rather than [`assert_collections_equal`].
///
/// # Panics
///
/// Panics if an element occurs a different number of times in the two collections.
///
/// # Example
///
/// ```
/// use ironshard::testing::assert_contains_in_any_order;
///
/// assert_contains_in_any_order(&["b", "a", "a"], &["a", "b", "a"]);
/// ```
pub fn assert_contains_in_any_order<T: Debug + Eq + Hash>(actual: &[T], expected: &[T]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Collection length mismatch:\n  Expected length: {}\n  Actual length: {}\n  Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );

    let mut counts: HashMap<&T, isize> = HashMap::new();
    for item in expected {
        *counts.entry(item).or_default() += 1;
    }
    for item in actual {
        *counts.entry(item).or_default() -= 1;
    }

    let missing: Vec<_> = counts.iter().filter(|(_, c)| **c > 0).map(|(k, _)| *k).collect();
    let extra: Vec<_> = counts.iter().filter(|(_, c)| **c < 0).map(|(k, _)| *k).collect();
    assert!(
        missing.is_empty() && extra.is_empty(),
        "Collection content mismatch:\n  Missing elements: {missing:?}\n  Extra elements: {extra:?}"
    );
}

/// Assert that all elements in a collection satisfy a predicate.
///
/// # Panics
///
/// Panics if any element does not satisfy the predicate.
pub fn assert_all<T: Debug>(collection: &[T], predicate: impl Fn(&T) -> bool) {
    for (i, item) in collection.iter().enumerate() {
        assert!(
            predicate(item),
            "Predicate failed for element at index {i}:\n  Element: {item:?}"
        );
    }
}

/// Assert that a dataset location enumerates to exactly these base names (in any order).
///
/// # Panics
///
/// Panics if enumeration fails or the names differ.
///
/// # Example
///
/// ```
/// use ironshard::io::fs::InMemoryFileSystem;
/// use ironshard::testing::assert_dataset_files;
///
/// let fs = InMemoryFileSystem::new();
/// fs.put("mem://b/out/part-0", Vec::new());
/// fs.put("mem://b/out/_SUCCESS", Vec::new());
/// assert_dataset_files(&fs, "mem://b/out", &["part-0"]);
/// ```
pub fn assert_dataset_files(fs: &dyn FileSystem, location: &str, expected: &[&str]) {
    let paths = sorted_paths(fs, &CodecRegistry::default(), location)
        .unwrap_or_else(|e| panic!("Failed to enumerate {location}: {e}"));
    let mut names: Vec<&str> = paths
        .iter()
        .map(|p| crate::io::fs::helpers::base_name(p))
        .collect();
    names.sort_unstable();
    let mut expected = expected.to_vec();
    expected.sort_unstable();
    assert_eq!(
        names, expected,
        "Dataset file mismatch under {location}:\n  Expected: {expected:?}\n  Actual: {names:?}"
    );
}

/// Assert the `avro.codec` header entry of one container file.
///
/// # Panics
///
/// Panics if the header cannot be read or names a different codec.
#[cfg(feature = "io-avro")]
pub fn assert_header_codec(fs: &dyn FileSystem, path: &str, expected: &str) {
    let header = crate::io::avro::AvroRead::from(path)
        .read_header(fs, path)
        .unwrap_or_else(|e| panic!("Failed to read header of {path}: {e}"));
    assert_eq!(
        header.codec().header_name(),
        expected,
        "Codec mismatch in {path}:\n  Expected: {expected}\n  Actual: {}",
        header.codec().header_name()
    );
}

/// Assert that one container file carries a string metadata entry.
///
/// # Panics
///
/// Panics if the header cannot be read, the key is absent, or the value differs.
#[cfg(feature = "io-avro")]
pub fn assert_header_metadata(fs: &dyn FileSystem, path: &str, key: &str, expected: &str) {
    let header = crate::io::avro::AvroRead::from(path)
        .read_header(fs, path)
        .unwrap_or_else(|e| panic!("Failed to read header of {path}: {e}"));
    assert_eq!(
        header.meta_string(key),
        Some(expected),
        "Metadata mismatch for key {key:?} in {path}"
    );
}

//! Shard naming and shard-count resolution.
//!
//! A shard's path is `prefix + template + suffix`, where the template's runs of `S` are
//! replaced by the zero-padded shard index and runs of `N` by the zero-padded shard
//! count, each padded to the run's length:
//!
//! | template            | shard 3 of 12              |
//! |---------------------|----------------------------|
//! | `-SSSSS-of-NNNNN`   | `-00003-of-00012`          |
//! | `.part-SSS`         | `.part-003`                |
//! | `` (empty)          | `` (only valid for 1 shard)|

use crate::io::fs::traits::{DatasetError, DatasetResult, ErrorKind};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const DEFAULT_SHARD_TEMPLATE: &str = "-SSSSS-of-NNNNN";

/// Target bytes per shard when the count is chosen automatically.
pub const AUTO_SHARD_TARGET_BYTES: u64 = 64 * 1024 * 1024;

/// Upper bound on automatically chosen shard counts.
pub const MAX_AUTO_SHARDS: usize = 10_000;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("S+|N+").expect("placeholder regex is valid"));

/// How many shard files a write produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShardCount {
    /// Chosen from the estimated output size.
    #[default]
    Auto,
    /// Exactly this many files, even if some stay empty.
    Fixed(usize),
}

impl ShardCount {
    /// `0` means automatic.
    #[must_use]
    pub fn from_requested(n: usize) -> Self {
        if n == 0 { Self::Auto } else { Self::Fixed(n) }
    }

    /// Concrete count for a write of `estimated_bytes`.
    ///
    /// Automatic selection is `ceil(estimated_bytes / 64 MiB)` clamped to
    /// `1..=10_000`, so the same input size always yields the same count.
    #[must_use]
    pub fn resolve(self, estimated_bytes: u64) -> usize {
        match self {
            Self::Fixed(n) => n,
            Self::Auto => {
                let shards = estimated_bytes.div_ceil(AUTO_SHARD_TARGET_BYTES);
                usize::try_from(shards)
                    .unwrap_or(MAX_AUTO_SHARDS)
                    .clamp(1, MAX_AUTO_SHARDS)
            }
        }
    }
}

/// A parsed shard-name template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardNameTemplate(String);

impl Default for ShardNameTemplate {
    fn default() -> Self {
        Self(DEFAULT_SHARD_TEMPLATE.to_string())
    }
}

impl ShardNameTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the template substitutes the shard index somewhere.
    #[must_use]
    pub fn has_index(&self) -> bool {
        self.0.contains('S')
    }

    /// Check the template can name `shard_count` distinct files.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if more than one shard is requested and the template has
    /// no `S` run, since every shard would get the same name.
    pub fn validate(&self, shard_count: usize) -> DatasetResult<()> {
        if shard_count == 0 {
            return Err(DatasetError::new(
                ErrorKind::InvalidInput,
                "Shard count must be at least 1",
            ));
        }
        if shard_count > 1 && !self.has_index() {
            return Err(DatasetError::new(
                ErrorKind::InvalidInput,
                format!(
                    "Shard template '{}' has no shard index (S) but {shard_count} shards were requested",
                    self.0
                ),
            ));
        }
        Ok(())
    }

    /// Substitute index and count. Injective in `index` when the template has an `S` run.
    #[must_use]
    pub fn substitute(&self, index: usize, count: usize) -> String {
        PLACEHOLDER
            .replace_all(&self.0, |caps: &Captures<'_>| {
                let run = &caps[0];
                let width = run.len();
                let n = if run.starts_with('S') { index } else { count };
                format!("{n:0width$}")
            })
            .into_owned()
    }

    /// Full path of one shard.
    #[must_use]
    pub fn construct_name(&self, prefix: &str, suffix: &str, index: usize, count: usize) -> String {
        format!("{prefix}{}{suffix}", self.substitute(index, count))
    }
}

/// One shard's place in a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardSpec {
    pub prefix: String,
    pub template: ShardNameTemplate,
    pub suffix: String,
    pub shard_count: usize,
    pub shard_index: usize,
}

impl ShardSpec {
    /// # Errors
    ///
    /// Returns `InvalidInput` if `shard_index >= shard_count` or the template cannot
    /// name `shard_count` distinct files.
    pub fn new(
        prefix: impl Into<String>,
        template: ShardNameTemplate,
        suffix: impl Into<String>,
        shard_count: usize,
        shard_index: usize,
    ) -> DatasetResult<Self> {
        template.validate(shard_count)?;
        if shard_index >= shard_count {
            return Err(DatasetError::new(
                ErrorKind::InvalidInput,
                format!("Shard index {shard_index} out of range for {shard_count} shards"),
            ));
        }
        Ok(Self {
            prefix: prefix.into(),
            template,
            suffix: suffix.into(),
            shard_count,
            shard_index,
        })
    }

    #[must_use]
    pub fn path(&self) -> String {
        self.template
            .construct_name(&self.prefix, &self.suffix, self.shard_index, self.shard_count)
    }
}

/// Paths of all shards of a write, in index order.
///
/// # Errors
///
/// Returns `InvalidInput` if the template cannot name `shard_count` distinct files.
pub fn shard_paths(
    prefix: &str,
    template: &ShardNameTemplate,
    suffix: &str,
    shard_count: usize,
) -> DatasetResult<Vec<String>> {
    template.validate(shard_count)?;
    Ok((0..shard_count)
        .map(|i| template.construct_name(prefix, suffix, i, shard_count))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_template() {
        let t = ShardNameTemplate::default();
        assert_eq!(
            t.construct_name("out/prefix", ".avro", 3, 12),
            "out/prefix-00003-of-00012.avro"
        );
    }

    #[test]
    fn test_custom_widths() {
        let t = ShardNameTemplate::new(".part-SSS.NN");
        assert_eq!(t.construct_name("p", "", 7, 4), "p.part-007.04");
        // Wider numbers than the run are printed in full.
        assert_eq!(t.construct_name("p", "", 1234, 2000), "p.part-1234.2000");
    }

    #[test]
    fn test_empty_template_single_shard() {
        let t = ShardNameTemplate::new("");
        assert!(t.validate(1).is_ok());
        assert_eq!(t.construct_name("/tmp/out.avro", "", 0, 1), "/tmp/out.avro");
        assert_eq!(t.validate(2).unwrap_err().kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn test_paths_are_distinct() {
        let paths = shard_paths("x", &ShardNameTemplate::default(), "", 250).unwrap();
        let unique: HashSet<_> = paths.iter().collect();
        assert_eq!(unique.len(), 250);
    }

    #[test]
    fn test_shard_spec_bounds() {
        assert!(ShardSpec::new("p", ShardNameTemplate::default(), "", 4, 3).is_ok());
        assert!(ShardSpec::new("p", ShardNameTemplate::default(), "", 4, 4).is_err());
    }

    #[test]
    fn test_auto_shard_count() {
        assert_eq!(ShardCount::Auto.resolve(0), 1);
        assert_eq!(ShardCount::Auto.resolve(AUTO_SHARD_TARGET_BYTES), 1);
        assert_eq!(ShardCount::Auto.resolve(AUTO_SHARD_TARGET_BYTES + 1), 2);
        assert_eq!(ShardCount::Auto.resolve(u64::MAX), MAX_AUTO_SHARDS);
        assert_eq!(ShardCount::Fixed(7).resolve(u64::MAX), 7);
        assert_eq!(ShardCount::from_requested(0), ShardCount::Auto);
    }
}

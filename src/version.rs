//! Lenient semantic version parsing and ordering.
//!
//! Release tags in the wild are messy (`v1.2`, `1.2.3-rc1`, plain garbage),
//! and a malformed tag must never cost the user an update opportunity.
//! Parsing is therefore total: every input yields a valid version, with
//! unparsable pieces degrading to zero and the remainder kept as the suffix.

use std::cmp::Ordering;
use std::fmt;

/// A parsed semantic version.
///
/// Ordering and equality are defined on the `(major, minor, patch)` triple
/// only. The suffix is carried for display but deliberately ignored when
/// comparing, so `1.2.3-rc1` and `1.2.3-rc2` are equal.
#[derive(Debug, Clone)]
pub struct SemanticVersion {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
    /// Pre-release or build remainder after the first `-`, excluded from
    /// ordering.
    pub suffix: String,
}

impl SemanticVersion {
    /// Create a version from its numeric triple with an empty suffix.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            suffix: String::new(),
        }
    }

    /// Parse a version string. Total: never fails.
    ///
    /// One leading `v` is stripped, the text is split once on the first `-`
    /// into a numeric prefix and a suffix, and up to three `.`-separated
    /// components are parsed from the prefix. Absent or non-numeric
    /// components default to 0. Input with no numeric content at all
    /// degrades to `0.0.0` with the offending text retained as the suffix.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let cleaned = text.strip_prefix('v').unwrap_or(text);
        let (numeric, suffix) = cleaned
            .split_once('-')
            .map_or((cleaned, ""), |(n, s)| (n, s));

        let mut components = numeric
            .split('.')
            .map(|part| part.parse::<u64>().unwrap_or(0));
        let major = components.next().unwrap_or(0);
        let minor = components.next().unwrap_or(0);
        let patch = components.next().unwrap_or(0);

        // Keep fully non-numeric input visible rather than silently erased.
        let suffix = if suffix.is_empty()
            && !numeric.is_empty()
            && numeric.split('.').all(|p| p.parse::<u64>().is_err())
        {
            numeric.to_string()
        } else {
            suffix.to_string()
        };

        Self {
            major,
            minor,
            patch,
            suffix,
        }
    }
}

impl PartialEq for SemanticVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SemanticVersion {}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.suffix.is_empty() {
            write!(f, "-{}", self.suffix)?;
        }
        Ok(())
    }
}

/// Normalize a release tag for display: strip one leading `v` and trim
/// surrounding whitespace.
#[must_use]
pub fn format_tag(tag: &str) -> String {
    tag.strip_prefix('v').unwrap_or(tag).trim().to_string()
}

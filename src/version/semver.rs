use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::version::error::VersionFormatError;

/// A `major.minor.patch` release number.
///
/// Field order matters: the derived `Ord` compares major, then minor, then patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemanticVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SemanticVersion {
    type Err = VersionFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_version(s)
    }
}

/// Parse a version string of exactly three numeric components.
///
/// Surrounding whitespace is ignored, the input is case-insensitive and one
/// leading `v` is accepted. Pre-release and build suffixes are rejected.
///
/// Examples:
/// - "1.2.3" -> (1, 2, 3)
/// - " V10.0.7 " -> (10, 0, 7)
/// - "1.2" / "1.2.3-beta" -> error
pub fn parse_version(version: &str) -> Result<SemanticVersion, VersionFormatError> {
    let normalized = version.trim().to_lowercase();
    let normalized = normalized.strip_prefix('v').unwrap_or(&normalized);

    let components: Vec<&str> = normalized.split('.').collect();
    let [major, minor, patch] = components.as_slice() else {
        return Err(VersionFormatError::ComponentCount {
            input: version.to_string(),
            found: components.len(),
        });
    };

    Ok(SemanticVersion {
        major: parse_component(version, major)?,
        minor: parse_component(version, minor)?,
        patch: parse_component(version, patch)?,
    })
}

fn parse_component(input: &str, component: &str) -> Result<u64, VersionFormatError> {
    let invalid = || VersionFormatError::InvalidComponent {
        input: input.to_string(),
        component: component.to_string(),
    };

    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    component.parse().map_err(|_| invalid())
}

/// Compare two version strings by (major, minor, patch).
///
/// Fails if either side does not parse.
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering, VersionFormatError> {
    Ok(parse_version(a)?.cmp(&parse_version(b)?))
}

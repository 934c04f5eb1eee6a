//! Lenient version parsing and constraint arithmetic
//!
//! Plugin catalogs publish version strings that are rarely strict semver
//! ("1.2", "3.1b", "2.0-SNAPSHOT"). Parsing pads missing components and
//! demotes trailing non-numeric suffixes to prerelease identifiers, so
//! "2.0-SNAPSHOT" orders below "2.0" under semver precedence rules.

use semver::{BuildMetadata, Prerelease, Version};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Parse a version string leniently into a semver [`Version`]
///
/// Accepts an optional leading `v`, fewer than three numeric components,
/// and an arbitrary trailing suffix which becomes a prerelease identifier.
/// Numeric components past the third ("1.8.8.0") are kept as build
/// metadata so distinct catalog versions stay distinct.
pub fn parse_lenient(input: &str) -> Result<Version> {
    let trimmed = input.trim().trim_start_matches('v');
    if trimmed.is_empty() {
        return Err(Error::invalid_version(input));
    }

    // Numeric dotted prefix; everything after it becomes a prerelease tag.
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(trimmed.len());
    let (numeric, rest) = trimmed.split_at(split);

    let mut parts = [0u64; 3];
    let mut count = 0;
    let mut extra: Vec<&str> = Vec::new();
    for piece in numeric.split('.').filter(|p| !p.is_empty()) {
        if count == 3 {
            extra.push(piece);
            continue;
        }
        parts[count] = piece.parse().map_err(|_| Error::invalid_version(input))?;
        count += 1;
    }
    if count == 0 {
        return Err(Error::invalid_version(input));
    }

    let mut version = Version::new(parts[0], parts[1], parts[2]);
    if !extra.is_empty() {
        version.build =
            BuildMetadata::new(&extra.join(".")).map_err(|_| Error::invalid_version(input))?;
    }
    let suffix: String = rest
        .trim_matches(['-', '_', '+', '.'])
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect();
    if !suffix.is_empty() {
        version.pre = Prerelease::new(&suffix).map_err(|_| Error::invalid_version(input))?;
    }
    Ok(version)
}

/// A version requirement attached to a dependency edge
///
/// Bounds are inclusive. `Any` accepts every version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum VersionConstraint {
    Any,
    Exact { version: Version },
    Minimum { version: Version },
    Maximum { version: Version },
    Range { min: Version, max: Version },
}

impl VersionConstraint {
    /// Inclusive lower/upper bounds, `None` meaning unbounded
    fn bounds(&self) -> (Option<&Version>, Option<&Version>) {
        match self {
            Self::Any => (None, None),
            Self::Exact { version } => (Some(version), Some(version)),
            Self::Minimum { version } => (Some(version), None),
            Self::Maximum { version } => (None, Some(version)),
            Self::Range { min, max } => (Some(min), Some(max)),
        }
    }

    fn from_bounds(min: Option<Version>, max: Option<Version>) -> Option<Self> {
        match (min, max) {
            (None, None) => Some(Self::Any),
            (Some(min), None) => Some(Self::Minimum { version: min }),
            (None, Some(max)) => Some(Self::Maximum { version: max }),
            (Some(min), Some(max)) => {
                if min > max {
                    None
                } else if min == max {
                    Some(Self::Exact { version: min })
                } else {
                    Some(Self::Range { min, max })
                }
            }
        }
    }

    /// Whether `version` satisfies this constraint
    pub fn matches(&self, version: &Version) -> bool {
        let (min, max) = self.bounds();
        min.is_none_or(|m| version >= m) && max.is_none_or(|m| version <= m)
    }

    /// Intersect two constraints; `None` when the intersection is empty
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let (a_min, a_max) = self.bounds();
        let (b_min, b_max) = other.bounds();

        let min = match (a_min, b_min) {
            (Some(a), Some(b)) => Some(a.max(b).clone()),
            (a, b) => a.or(b).cloned(),
        };
        let max = match (a_max, b_max) {
            (Some(a), Some(b)) => Some(a.min(b).clone()),
            (a, b) => a.or(b).cloned(),
        };
        Self::from_bounds(min, max)
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Exact { version } => write!(f, "={}", version),
            Self::Minimum { version } => write!(f, ">={}", version),
            Self::Maximum { version } => write!(f, "<={}", version),
            Self::Range { min, max } => write!(f, ">={}, <={}", min, max),
        }
    }
}

impl FromStr for VersionConstraint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() || s == "*" || s.eq_ignore_ascii_case("any") || s.eq_ignore_ascii_case("latest") {
            return Ok(Self::Any);
        }
        if let Some(rest) = s.strip_prefix(">=") {
            return Ok(Self::Minimum {
                version: parse_lenient(rest)?,
            });
        }
        if let Some(rest) = s.strip_prefix("<=") {
            return Ok(Self::Maximum {
                version: parse_lenient(rest)?,
            });
        }
        if let Some((min, max)) = s.split_once("..") {
            let min = parse_lenient(min)?;
            let max = parse_lenient(max)?;
            if min > max {
                return Err(Error::invalid_version(s));
            }
            return Ok(Self::Range { min, max });
        }
        let literal = s.strip_prefix('=').unwrap_or(s);
        Ok(Self::Exact {
            version: parse_lenient(literal)?,
        })
    }
}

//! @ai:module:intent Parse and evaluate API version constraints and ranges
//! @ai:module:layer domain
//! @ai:module:public_api Version, VersionConstraint, Bound
//! @ai:module:depends_on error
//! @ai:module:stateless true

use crate::error::{AnnotationError, ErrorKind, ParseResult};
use regex::Regex;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

const COMPARATORS: &[&str] = &[">=", "<=", ">", "<", "="];

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?$").expect("Invalid regex"))
}

/// @ai:intent A dotted API version; missing components compare as zero
/// @ai:invariant `1.0` and `1.0.0` are equal but keep their written precision for display
#[derive(Debug, Clone, Copy)]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
    components: u8,
}

impl Version {
    /// @ai:intent Parse a bare version such as `1`, `1.1` or `1.1.3`
    /// @ai:example ("1.1") -> Ok(1.1)
    /// @ai:example (">=1.1") -> Err(UnrecognizedVersionSchema)
    /// @ai:effects pure
    pub fn parse(input: &str) -> ParseResult<Self> {
        let trimmed = input.trim();
        let unrecognized = || {
            AnnotationError::new(ErrorKind::UnrecognizedVersionSchema {
                supplied: trimmed.to_string(),
            })
        };

        let captures = version_regex().captures(trimmed).ok_or_else(unrecognized)?;
        let component = |idx: usize| -> ParseResult<Option<u64>> {
            captures
                .get(idx)
                .map(|m| m.as_str().parse::<u64>().map_err(|_| unrecognized()))
                .transpose()
        };

        let major = component(1)?.unwrap_or(0);
        let minor = component(2)?;
        let patch = component(3)?;

        Ok(Self {
            major,
            minor: minor.unwrap_or(0),
            patch: patch.unwrap_or(0),
            components: 1 + u8::from(minor.is_some()) + u8::from(patch.is_some()),
        })
    }

    fn key(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.components {
            1 => write!(f, "{}", self.major),
            2 => write!(f, "{}.{}", self.major, self.minor),
            _ => write!(f, "{}.{}.{}", self.major, self.minor, self.patch),
        }
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// @ai:intent One side of a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Bound {
    pub version: Version,
    pub inclusive: bool,
}

/// @ai:intent Canonical version constraint from an `@api-version` annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionConstraint {
    Exact(Version),
    GreaterThan(Version),
    AtLeast(Version),
    LessThan(Version),
    AtMost(Version),
    Range { from: Version, to: Version },
}

impl VersionConstraint {
    /// @ai:intent Parse a version, comparator-prefixed version, or `lo-hi` range
    /// @ai:post ranges are strictly ascending and comparator-free
    /// @ai:example (">=1.1") -> Ok(AtLeast(1.1))
    /// @ai:example ("1.0-1.2") -> Ok(Range)
    /// @ai:example ("1.0-1.0") -> Err(BadRangeUse, recommended 1.0)
    /// @ai:example ("1.2-1.0") -> Err(LopsidedRange)
    /// @ai:effects pure
    pub fn parse(input: &str) -> ParseResult<Self> {
        let supplied = input.trim();

        if let Some((lo, hi)) = supplied.split_once('-') {
            return Self::parse_range(supplied, lo.trim(), hi.trim());
        }

        let unrecognized = |_| {
            AnnotationError::new(ErrorKind::UnrecognizedVersionSchema {
                supplied: supplied.to_string(),
            })
        };

        for comparator in COMPARATORS {
            if let Some(rest) = supplied.strip_prefix(comparator) {
                let version = Version::parse(rest).map_err(unrecognized)?;
                return Ok(match *comparator {
                    ">=" => VersionConstraint::AtLeast(version),
                    "<=" => VersionConstraint::AtMost(version),
                    ">" => VersionConstraint::GreaterThan(version),
                    "<" => VersionConstraint::LessThan(version),
                    _ => VersionConstraint::Exact(version),
                });
            }
        }

        Version::parse(supplied)
            .map(VersionConstraint::Exact)
            .map_err(unrecognized)
    }

    fn parse_range(supplied: &str, lo: &str, hi: &str) -> ParseResult<Self> {
        let has_operator = |side: &str| side.starts_with(|c: char| "<>=~^!".contains(c));
        if has_operator(lo) || has_operator(hi) {
            return Err(AnnotationError::new(ErrorKind::OperatorsWithinRange {
                supplied: supplied.to_string(),
            }));
        }

        let unrecognized = |_| {
            AnnotationError::new(ErrorKind::UnrecognizedVersionSchema {
                supplied: supplied.to_string(),
            })
        };
        let from = Version::parse(lo).map_err(unrecognized)?;
        let to = Version::parse(hi).map_err(unrecognized)?;

        match from.cmp(&to) {
            Ordering::Equal => Err(AnnotationError::new(ErrorKind::BadRangeUse {
                supplied: supplied.to_string(),
                recommended: from.to_string(),
            })),
            Ordering::Greater => Err(AnnotationError::new(ErrorKind::LopsidedRange {
                supplied: supplied.to_string(),
            })),
            Ordering::Less => Ok(VersionConstraint::Range { from, to }),
        }
    }

    /// @ai:intent Lower bound, or None when unbounded below
    /// @ai:effects pure
    pub fn lower_bound(&self) -> Option<Bound> {
        match *self {
            VersionConstraint::Exact(version)
            | VersionConstraint::AtLeast(version)
            | VersionConstraint::Range { from: version, .. } => Some(Bound {
                version,
                inclusive: true,
            }),
            VersionConstraint::GreaterThan(version) => Some(Bound {
                version,
                inclusive: false,
            }),
            VersionConstraint::LessThan(_) | VersionConstraint::AtMost(_) => None,
        }
    }

    /// @ai:intent Upper bound, or None when unbounded above
    /// @ai:effects pure
    pub fn upper_bound(&self) -> Option<Bound> {
        match *self {
            VersionConstraint::Exact(version)
            | VersionConstraint::AtMost(version)
            | VersionConstraint::Range { to: version, .. } => Some(Bound {
                version,
                inclusive: true,
            }),
            VersionConstraint::LessThan(version) => Some(Bound {
                version,
                inclusive: false,
            }),
            VersionConstraint::GreaterThan(_) | VersionConstraint::AtLeast(_) => None,
        }
    }

    /// @ai:intent Check if a version satisfies the constraint
    /// @ai:effects pure
    pub fn matches(&self, version: &Version) -> bool {
        let above_lower = self.lower_bound().map_or(true, |b| {
            if b.inclusive {
                *version >= b.version
            } else {
                *version > b.version
            }
        });
        let below_upper = self.upper_bound().map_or(true, |b| {
            if b.inclusive {
                *version <= b.version
            } else {
                *version < b.version
            }
        });
        above_lower && below_upper
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::Exact(v) => write!(f, "{}", v),
            VersionConstraint::GreaterThan(v) => write!(f, ">{}", v),
            VersionConstraint::AtLeast(v) => write!(f, ">={}", v),
            VersionConstraint::LessThan(v) => write!(f, "<{}", v),
            VersionConstraint::AtMost(v) => write!(f, "<={}", v),
            VersionConstraint::Range { from, to } => write!(f, "{}-{}", from, to),
        }
    }
}

impl Serialize for VersionConstraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

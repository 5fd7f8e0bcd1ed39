use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::UpdaterError;

/// Tolerant semver-like grammar: an arbitrary non-digit prefix, then
/// `major.minor[.patch][-preRelease][+build]`. Digit groups reject
/// superfluous leading zeros; matching is case-insensitive.
const GRAMMAR: &str = r"(?i)^\D*(0|[1-9]\d*)\.(0|[1-9]\d*)(?:\.(0|[1-9]\d*))?(?:-((?:0|[1-9]\d*|\d*[a-z-][0-9a-z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-z-][0-9a-z-]*))*))?(?:\+([0-9a-z-]+(?:\.[0-9a-z-]+)*))?$";

fn grammar() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(GRAMMAR).expect("version grammar compiles"))
}

/// Whether a version labels a stable release or a pre-release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// No pre-release label.
    Release,
    /// Carries a pre-release label such as `-SNAPSHOT` or `-beta.1`.
    PreRelease,
}

/// Simple `major.minor.patch` version value.
///
/// Ordering and equality consider only the numeric triple; the
/// pre-release and build labels are informational. This is a deliberate
/// simplification over full semver precedence, so `1.2.3-alpha` and
/// `1.2.3+build` compare equal to `1.2.3`.
#[derive(Debug, Clone)]
pub struct Version {
    major: u64,
    minor: u64,
    patch: u64,
    pre_release: Option<String>,
    build: Option<String>,
}

impl Version {
    /// Build a version from its numeric triple.
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre_release: None,
            build: None,
        }
    }

    /// Parse a version string with the tolerant grammar.
    ///
    /// Major and minor are mandatory, so a bare `"1"` does not parse;
    /// a missing patch defaults to `0`.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = grammar().captures(text)?;

        let number = |idx: usize| caps.get(idx).map(|m| m.as_str().parse::<u64>());
        let major = number(1)?.ok()?;
        let minor = number(2)?.ok()?;
        let patch = match number(3) {
            Some(parsed) => parsed.ok()?,
            None => 0,
        };

        Some(Self {
            major,
            minor,
            patch,
            pre_release: caps.get(4).map(|m| m.as_str().to_owned()),
            build: caps.get(5).map(|m| m.as_str().to_owned()),
        })
    }

    /// Whether `text` parses with the version grammar.
    pub fn is_valid(text: &str) -> bool {
        Self::parse(text).is_some()
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    pub fn pre_release(&self) -> Option<&str> {
        self.pre_release.as_deref()
    }

    pub fn build(&self) -> Option<&str> {
        self.build.as_deref()
    }

    /// Classify the version by its pre-release label.
    pub fn release(&self) -> Release {
        match self.pre_release.as_deref() {
            None | Some("") => Release::Release,
            Some(_) => Release::PreRelease,
        }
    }

    fn triple(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.triple() == other.triple()
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
        self.triple().cmp(&other.triple())
    }
}

impl fmt::Display for Version {
    /// Renders only the numeric triple; pre-release and build labels are
    /// dropped (mirrors the parse/compare asymmetry).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = UpdaterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| UpdaterError::InvalidVersion(s.to_owned()))
    }
}

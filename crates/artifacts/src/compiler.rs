//! Compiler identity attached to each compilation unit.

use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which compiler produced a compilation unit, and how.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerVersion {
    /// Compiler name, e.g. `solc` or `vyper`.
    pub compiler: String,
    /// Parsed version, serialized as `"N/A"` when unknown.
    #[serde(default, with = "serde_version")]
    pub version: Option<Version>,
    /// Whether the optimizer was enabled, when known.
    #[serde(default)]
    pub optimized: Option<bool>,
    /// Optimizer run count, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimize_runs: Option<usize>,
}

impl CompilerVersion {
    pub fn new(
        compiler: impl Into<String>,
        version: Option<Version>,
        optimized: Option<bool>,
    ) -> Self {
        Self { compiler: compiler.into(), version, optimized, optimize_runs: None }
    }

    /// Leniently parses a version string, tolerating a leading `v` and commit
    /// suffixes like `0.8.19+commit.7dd6d404`. Malformed versions are logged
    /// and recorded as unknown rather than failing the run.
    pub fn parse_version(version: &str) -> Option<Version> {
        let trimmed = version.trim().trim_start_matches('v');
        match Version::parse(trimmed) {
            Ok(version) => Some(version),
            Err(err) => {
                warn!(version = trimmed, %err, "unparseable compiler version");
                None
            }
        }
    }
}

impl Default for CompilerVersion {
    fn default() -> Self {
        Self { compiler: "N/A".into(), version: None, optimized: Some(false), optimize_runs: None }
    }
}

mod serde_version {
    use semver::Version;
    use serde::{Deserialize, Deserializer, Serializer};

    const NOT_AVAILABLE: &str = "N/A";

    pub fn serialize<S: Serializer>(
        version: &Option<Version>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match version {
            Some(version) => serializer.serialize_str(&version.to_string()),
            None => serializer.serialize_str(NOT_AVAILABLE),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Version>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref() {
            None | Some(NOT_AVAILABLE) => Ok(None),
            Some(raw) => Ok(super::CompilerVersion::parse_version(raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_prefixed_and_suffixed_versions() {
        assert_eq!(
            CompilerVersion::parse_version("v0.8.19"),
            Some(Version::new(0, 8, 19))
        );
        let with_commit = CompilerVersion::parse_version("0.8.19+commit.7dd6d404").unwrap();
        assert_eq!((with_commit.major, with_commit.minor, with_commit.patch), (0, 8, 19));
        assert_eq!(CompilerVersion::parse_version("nightly"), None);
    }

    #[test]
    fn unknown_version_serializes_as_sentinel() {
        let compiler = CompilerVersion::new("solc", None, Some(true));
        let value = serde_json::to_value(&compiler).unwrap();
        assert_eq!(value["version"], "N/A");

        let back: CompilerVersion = serde_json::from_value(value).unwrap();
        assert_eq!(back, compiler);
    }

    #[test]
    fn known_version_round_trips() {
        let compiler =
            CompilerVersion::new("vyper", Some(Version::new(0, 3, 7)), Some(false));
        let value = serde_json::to_value(&compiler).unwrap();
        assert_eq!(value, json!({"compiler": "vyper", "version": "0.3.7", "optimized": false}));
        let back: CompilerVersion = serde_json::from_value(value).unwrap();
        assert_eq!(back, compiler);
    }
}

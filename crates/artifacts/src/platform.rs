//! Platform identification: which build tool produced a compilation.

use serde_repr::{Deserialize_repr, Serialize_repr};
use std::fmt;

/// The build tools a compilation can originate from.
///
/// The numeric values are a stable wire format shared with other tools; they
/// must never be renumbered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u32)]
pub enum PlatformType {
    NotImplemented = 0,
    Solc = 1,
    Truffle = 2,
    Embark = 3,
    Dapp = 4,
    Etherlime = 5,
    Etherscan = 6,
    Vyper = 7,
    Waffle = 8,
    Brownie = 9,
    SolcStandardJson = 10,
    Hardhat = 11,
    Foundry = 12,
    /// A compilation restored from a standard export file.
    Standard = 100,
    /// A compilation restored from a zip archive of export files.
    Archive = 101,
}

impl PlatformType {
    /// Preference order when several platforms could handle the same target.
    /// Lower is more preferable.
    pub fn priority(self) -> u32 {
        match self {
            Self::Foundry => 100,
            Self::Hardhat => 200,
            Self::Truffle | Self::Waffle => 300,
            _ => 1000,
        }
    }
}

impl fmt::Display for PlatformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotImplemented => "N/A",
            Self::Solc => "solc",
            Self::Truffle => "Truffle",
            Self::Embark => "Embark",
            Self::Dapp => "Dapp",
            Self::Etherlime => "Etherlime",
            Self::Etherscan => "Etherscan",
            Self::Vyper => "Vyper",
            Self::Waffle => "Waffle",
            Self::Brownie => "Brownie",
            Self::SolcStandardJson => "solc_standard_json",
            Self::Hardhat => "Hardhat",
            Self::Foundry => "Foundry",
            Self::Standard => "Standard",
            Self::Archive => "Archive",
        };
        f.write_str(name)
    }
}

/// Metadata a build-tool adapter attaches to the compilations it produces.
pub trait Platform {
    /// Human readable platform name.
    fn name(&self) -> &str;

    /// Homepage of the build tool, when it has one.
    fn project_url(&self) -> &str {
        ""
    }

    /// The platform's wire identifier.
    fn platform_type(&self) -> PlatformType;

    /// The target the platform was invoked on (a directory, file, or
    /// address).
    fn target(&self) -> &str;

    /// Whether `path` belongs to a third-party package rather than the
    /// project itself.
    fn is_dependency(&self, _path: &str) -> bool {
        false
    }

    /// Paths that look like unit tests for this platform's conventions.
    fn guessed_tests(&self) -> Vec<String> {
        Vec::new()
    }

    /// The platform the artifacts originally came from. Differs from
    /// [`Platform::platform_type`] for wrappers such as the standard importer,
    /// which re-hosts another platform's output.
    fn platform_type_used(&self) -> PlatformType {
        self.platform_type()
    }

    /// Display name of the originating platform.
    fn platform_name_used(&self) -> String {
        self.platform_type_used().to_string()
    }
}

/// Platform attached to compilations restored from a standard export file.
#[derive(Clone, Debug)]
pub struct StandardPlatform {
    target: String,
    underlying: PlatformType,
    unit_tests: Vec<String>,
}

impl StandardPlatform {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            underlying: PlatformType::Standard,
            unit_tests: Vec::new(),
        }
    }

    /// Records which platform originally produced the imported artifacts.
    pub fn set_underlying(&mut self, underlying: PlatformType) {
        self.underlying = underlying;
    }

    pub fn set_unit_tests(&mut self, unit_tests: Vec<String>) {
        self.unit_tests = unit_tests;
    }
}

impl Platform for StandardPlatform {
    fn name(&self) -> &str {
        "Standard"
    }

    fn platform_type(&self) -> PlatformType {
        PlatformType::Standard
    }

    fn target(&self) -> &str {
        &self.target
    }

    fn guessed_tests(&self) -> Vec<String> {
        self.unit_tests.clone()
    }

    fn platform_type_used(&self) -> PlatformType {
        self.underlying
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_are_stable() {
        assert_eq!(serde_json::to_string(&PlatformType::Solc).unwrap(), "1");
        assert_eq!(serde_json::to_string(&PlatformType::Foundry).unwrap(), "12");
        assert_eq!(serde_json::to_string(&PlatformType::Standard).unwrap(), "100");

        let back: PlatformType = serde_json::from_str("11").unwrap();
        assert_eq!(back, PlatformType::Hardhat);
    }

    #[test]
    fn priority_prefers_foundry() {
        assert!(PlatformType::Foundry.priority() < PlatformType::Hardhat.priority());
        assert!(PlatformType::Hardhat.priority() < PlatformType::Truffle.priority());
        assert_eq!(PlatformType::Truffle.priority(), PlatformType::Waffle.priority());
    }

    #[test]
    fn standard_platform_reports_underlying_type() {
        let mut platform = StandardPlatform::new("out/export.json");
        platform.set_underlying(PlatformType::Foundry);
        assert_eq!(platform.platform_type(), PlatformType::Standard);
        assert_eq!(platform.platform_type_used(), PlatformType::Foundry);
    }
}

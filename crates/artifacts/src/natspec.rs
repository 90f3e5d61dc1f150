//! Natspec documentation (userdoc and devdoc) as emitted by solc.

use serde::{de::Deserializer, Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single method entry of the userdoc `methods` map.
///
/// Old compiler releases emit the notice as a bare string, newer ones wrap it
/// in an object. Both deserialize into the structured form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct UserMethod {
    #[serde(default)]
    pub notice: Option<String>,
}

impl<'de> Deserialize<'de> for UserMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Notice(String),
            Object {
                #[serde(default)]
                notice: Option<String>,
            },
        }
        Ok(match Repr::deserialize(deserializer)? {
            Repr::Notice(notice) => Self { notice: Some(notice) },
            Repr::Object { notice } => Self { notice },
        })
    }
}

/// A single method entry of the devdoc `methods` map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevMethod {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default, rename = "return")]
    pub method_return: Option<String>,
}

/// End-user documentation of a contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDoc {
    #[serde(default)]
    pub methods: BTreeMap<String, UserMethod>,
    #[serde(default)]
    pub notice: Option<String>,
}

/// Developer documentation of a contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevDoc {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub methods: BTreeMap<String, DevMethod>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Combined natspec of a contract.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Natspec {
    pub userdoc: UserDoc,
    pub devdoc: DevDoc,
}

impl Natspec {
    /// Builds natspec from the raw `userdoc` and `devdoc` compiler output.
    ///
    /// Unrecognized shapes degrade to empty documentation rather than failing
    /// the whole compilation.
    pub fn from_values(userdoc: &Value, devdoc: &Value) -> Self {
        Self {
            userdoc: serde_json::from_value(userdoc.clone()).unwrap_or_default(),
            devdoc: serde_json::from_value(devdoc.clone()).unwrap_or_default(),
        }
    }
}

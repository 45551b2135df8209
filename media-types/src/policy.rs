// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Filesystem;

/// Final allocation unit size handed to the format command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClusterSize {
    /// Let the format command pick its own default
    #[default]
    Default,
    Bytes(u64),
}

impl ClusterSize {
    pub fn bytes(self) -> Option<u64> {
        match self {
            ClusterSize::Default => None,
            ClusterSize::Bytes(bytes) => Some(bytes),
        }
    }
}

impl fmt::Display for ClusterSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterSize::Default => f.write_str("DEFAULT"),
            ClusterSize::Bytes(bytes) => write!(f, "{bytes}"),
        }
    }
}

// Reports carry either the byte count or the string "DEFAULT".
impl Serialize for ClusterSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ClusterSize::Default => serializer.serialize_str("DEFAULT"),
            ClusterSize::Bytes(bytes) => serializer.serialize_u64(*bytes),
        }
    }
}

impl<'de> Deserialize<'de> for ClusterSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bytes(u64),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Bytes(bytes) => Ok(ClusterSize::Bytes(bytes)),
            Repr::Name(name) if name.eq_ignore_ascii_case("default") => Ok(ClusterSize::Default),
            Repr::Name(name) => Err(serde::de::Error::custom(format!(
                "invalid cluster size: {name}"
            ))),
        }
    }
}

/// Policy derived once per run from the request and the target's size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPolicy {
    pub filesystem: Filesystem,
    pub cluster: ClusterSize,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cluster_size_wire_format() {
        assert_eq!(
            serde_json::to_string(&ClusterSize::Default).unwrap(),
            "\"DEFAULT\""
        );
        assert_eq!(
            serde_json::to_string(&ClusterSize::Bytes(32768)).unwrap(),
            "32768"
        );
        let parsed: ClusterSize = serde_json::from_str("\"DEFAULT\"").unwrap();
        assert_eq!(parsed, ClusterSize::Default);
        let parsed: ClusterSize = serde_json::from_str("131072").unwrap();
        assert_eq!(parsed, ClusterSize::Bytes(131072));
    }
}

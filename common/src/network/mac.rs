//! Link-layer address helpers.
//!
//! MAC addresses travel as [`MacAddr`] inside the pipeline and as lowercase
//! `aa:bb:cc:dd:ee:ff` strings on the wire (cache values, documents, SQL rows).

use pnet::util::MacAddr;

/// Parses a MAC address as printed by discovery tools (`AA:BB:CC:DD:EE:FF`).
///
/// Returns `None` for anything that is not six hex octets.
pub fn parse_mac(raw: &str) -> Option<MacAddr> {
    raw.trim().parse::<MacAddr>().ok()
}

/// `#[serde(with = "...")]` adapter for `Option<MacAddr>`.
pub mod option {
    use pnet::util::MacAddr;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(mac: &Option<MacAddr>, serializer: S) -> Result<S::Ok, S::Error> {
        match mac {
            Some(mac) => serializer.serialize_some(&mac.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<MacAddr>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            super::parse_mac(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid MAC address '{s}'")))
        })
        .transpose()
    }
}

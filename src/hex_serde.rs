//! Serde helpers rendering raw byte fields as lowercase hex strings.
//!
//! Use with `#[serde(with = "crate::hex_serde")]` on `Vec<u8>` fields.

use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use serde::de::Error;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&HEXLOWER.encode(bytes))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    let digits = text.strip_prefix("0x").unwrap_or(&text);
    HEXLOWER_PERMISSIVE
        .decode(digits.as_bytes())
        .map_err(|err| D::Error::custom(format!("invalid hex bytes: {err}")))
}

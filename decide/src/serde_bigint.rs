//! Big integers travel as decimal strings.
//!
//! Use as `#[serde(with = "serde_bigint")]`. Deserialization also accepts a bare JSON number
//! for small values, which is what hand-written fixtures tend to contain.

use num::{BigUint, Num};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

pub fn serialize<S>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    value.to_str_radix(10).serialize(serializer)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrUint {
    String(String),
    Uint(u64),
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<BigUint, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrUint::deserialize(deserializer)? {
        StringOrUint::String(s) => BigUint::from_str_radix(s.trim(), 10).map_err(de::Error::custom),
        StringOrUint::Uint(u) => Ok(BigUint::from(u)),
    }
}

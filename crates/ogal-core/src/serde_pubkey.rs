//! Serde adapters that render public keys as base58 strings.
//!
//! `Pubkey`'s own serde impl writes a byte array, which is unreadable in JSON
//! config files and CLI output. Use with `#[serde(with = "...")]`.

use std::str::FromStr;

use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
use solana_program::pubkey::Pubkey;

pub fn serialize<S: Serializer>(key: &Pubkey, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&key.to_string())
}

pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Pubkey, D::Error> {
    let raw = String::deserialize(d)?;
    Pubkey::from_str(raw.trim()).map_err(|e| D::Error::custom(format!("invalid pubkey {raw:?}: {e}")))
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(key: &Option<Pubkey>, s: S) -> Result<S::Ok, S::Error> {
        match key {
            Some(k) => s.serialize_some(&k.to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Pubkey>, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => Pubkey::from_str(s)
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid pubkey {s:?}: {e}"))),
        }
    }
}

pub mod hash_hex {
    use super::*;

    pub fn serialize<S: Serializer>(hash: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 32], D::Error> {
        let raw = String::deserialize(d)?;
        crate::hashing::parse_hash_hex(&raw).map_err(D::Error::custom)
    }
}

pub mod vec {
    use super::*;
    use serde::ser::SerializeSeq;

    pub fn serialize<S: Serializer>(keys: &[Pubkey], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(keys.len()))?;
        for k in keys {
            seq.serialize_element(&k.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Pubkey>, D::Error> {
        Vec::<String>::deserialize(d)?
            .iter()
            .map(|s| {
                Pubkey::from_str(s.trim())
                    .map_err(|e| D::Error::custom(format!("invalid pubkey {s:?}: {e}")))
            })
            .collect()
    }
}

//! Token-metadata `Metadata` account decoding.
//!
//! Only what the guard rails need is kept: the key byte, the update authority,
//! the mint and whether the collection is sized. Sizing is decided by a forward
//! scan because every field between the mint and the collection details is
//! variable length.

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

use crate::codec::ByteReader;
use crate::errors::{CoreError, CoreResult};
use crate::hashing::{discriminator, Discriminator};

/// `Key::MetadataV1`.
pub const METADATA_V1_KEY: u8 = 4;

/// Hash input of the TLV entry that carries collection details after the
/// borsh body.
pub const COLLECTION_DETAILS_TLV_INPUT: &str = "collection_details";

const CREATOR_ENTRY_LEN: usize = 32 + 1 + 1;
const MAX_TOKEN_STANDARD: u8 = 5;
const MAX_USE_METHOD: u8 = 2;
const TLV_HEADER_LEN: usize = 8 + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionSizing {
    Sized,
    Unsized,
    /// The layout could not be walked; callers must assume unsized.
    Undetermined,
}

impl CollectionSizing {
    /// Whether the master-edition uniqueness rule applies.
    pub fn requires_unique_edition(self) -> bool {
        !matches!(self, Self::Sized)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMetadataInfo {
    pub key: u8,
    #[serde(with = "crate::serde_pubkey")]
    pub update_authority: Pubkey,
    #[serde(with = "crate::serde_pubkey::option")]
    pub mint: Option<Pubkey>,
    pub sizing: CollectionSizing,
}

impl CollectionMetadataInfo {
    /// Fails only when the key byte or update authority cannot be read.
    pub fn parse(data: &[u8]) -> CoreResult<Self> {
        let mut r = ByteReader::new(data);
        let key = r.read_u8()?;
        let update_authority = r.read_pubkey()?;
        let mint = r.read_pubkey().ok();

        let sizing = if key == METADATA_V1_KEY && mint.is_some() {
            detect_sizing(&mut r)
        } else {
            CollectionSizing::Undetermined
        };

        Ok(Self {
            key,
            update_authority,
            mint,
            sizing,
        })
    }
}

fn collection_details_tlv_type() -> Discriminator {
    discriminator(COLLECTION_DETAILS_TLV_INPUT)
}

/// `CollectionDetails::V1 { size: u64 }` or `V2 { padding: [u8; 8] }`.
fn read_collection_details(r: &mut ByteReader<'_>) -> CoreResult<bool> {
    match r.read_u8()? {
        0 | 1 => {
            r.skip(8)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Walks the fields after the mint. `r` must sit on the name string.
fn detect_sizing(r: &mut ByteReader<'_>) -> CollectionSizing {
    if skip_to_collection_details(r).is_err() {
        return CollectionSizing::Undetermined;
    }

    let at_details = r.clone();
    match r.peek_u8() {
        None => CollectionSizing::Unsized,
        Some(0) => {
            let _ = r.read_u8();
            skip_programmable_config(r);
            if find_tlv_collection_details(r.rest()) {
                CollectionSizing::Sized
            } else {
                CollectionSizing::Unsized
            }
        }
        Some(1) => {
            let _ = r.read_u8();
            if matches!(read_collection_details(r), Ok(true)) {
                return CollectionSizing::Sized;
            }
            tlv_or_undetermined(at_details.rest())
        }
        Some(_) => tlv_or_undetermined(at_details.rest()),
    }
}

/// The program falls back to a TLV lookup wherever the borsh tail stops
/// parsing, so a trailing TLV entry can still mark the collection as sized.
fn tlv_or_undetermined(tail: &[u8]) -> CollectionSizing {
    if find_tlv_collection_details(tail) {
        CollectionSizing::Sized
    } else {
        CollectionSizing::Undetermined
    }
}

fn skip_to_collection_details(r: &mut ByteReader<'_>) -> CoreResult<()> {
    r.read_bytes()?; // name
    r.read_bytes()?; // symbol
    r.read_bytes()?; // uri
    r.read_u16()?; // seller fee
    r.read_option(|r| {
        let count = r.read_u32()? as usize;
        r.skip(count.saturating_mul(CREATOR_ENTRY_LEN))
    })?;
    r.read_bool()?; // primary sale happened
    r.read_bool()?; // is mutable
    r.read_option(|r| r.read_u8())?; // edition nonce
    if let Some(standard) = r.read_option(|r| r.read_u8())? {
        if standard > MAX_TOKEN_STANDARD {
            return Err(CoreError::invalid_value(
                "token_standard",
                standard.to_string(),
            ));
        }
    }
    r.read_option(|r| {
        r.read_bool()?;
        r.read_pubkey()
    })?; // collection
    if let Some(method) = r.read_option(|r| {
        let method = r.read_u8()?;
        r.read_u64()?;
        r.read_u64()?;
        Ok(method)
    })? {
        if method > MAX_USE_METHOD {
            return Err(CoreError::invalid_value(
                "use_method",
                method.to_string(),
            ));
        }
    }
    Ok(())
}

/// `Option<ProgrammableConfig::V1 { rule_set: Option<Pubkey> }>`; leaves the
/// reader untouched when the bytes do not fit.
fn skip_programmable_config(r: &mut ByteReader<'_>) {
    let mut ahead = r.clone();
    let parsed = ahead.read_option(|p| {
        if p.read_u8()? != 0 {
            return Err(CoreError::invalid_value(
                "programmable_config",
                "unknown variant",
            ));
        }
        p.read_option(|p| p.read_pubkey())
    });
    if parsed.is_ok() {
        *r = ahead;
    }
}

/// Scan `type[8] ‖ len u32 ‖ value` entries for a decodable collection-details
/// value. An all-zero type marks the end of initialized entries.
pub fn find_tlv_collection_details(tail: &[u8]) -> bool {
    let wanted = collection_details_tlv_type();
    let mut r = ByteReader::new(tail);

    while r.remaining() >= TLV_HEADER_LEN {
        let Ok(ty) = r.read_array::<8>() else {
            return false;
        };
        if ty == [0u8; 8] {
            return false;
        }
        let Ok(len) = r.read_u32() else {
            return false;
        };
        let len = len as usize;
        if len > r.remaining() {
            return false;
        }
        let value = &r.rest()[..len];
        if ty == wanted {
            let mut v = ByteReader::new(value);
            return matches!(read_collection_details(&mut v), Ok(true));
        }
        if r.skip(len).is_err() {
            return false;
        }
    }
    false
}

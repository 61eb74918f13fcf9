//! Hashing utilities for the ledger wire format.
//!
//! Two things are hashed on the client side:
//! - namespaced names, truncated to 8-byte discriminators that tag both
//!   instructions (`global:<name>`) and accounts (`account:<Name>`)
//! - off-chain manifest payloads, whose SHA-256 is stored on-chain as the
//!   manifest hash
//!
//! Both use SHA-256 so results match what the program computes.

use sha2::{Digest, Sha256};

use crate::errors::{CoreError, CoreResult};

/// Length of every account and instruction discriminator.
pub const DISCRIMINATOR_LEN: usize = 8;

/// An 8-byte account or instruction tag.
pub type Discriminator = [u8; DISCRIMINATOR_LEN];

/// Namespace prefixes. These must remain stable across versions.
pub mod namespace {
    pub const INSTRUCTION: &str = "global";
    pub const ACCOUNT: &str = "account";
}

/// SHA-256 of raw bytes.
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(bytes);
    h.finalize().into()
}

/// First 8 bytes of the SHA-256 of a namespaced name (e.g. `account:Config`).
pub fn discriminator(namespaced_name: &str) -> Discriminator {
    let digest = sha256(namespaced_name.as_bytes());
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    out
}

/// Discriminator for an instruction, given its snake_case handler name.
pub fn instruction_discriminator(name: &str) -> Discriminator {
    discriminator(&format!("{}:{name}", namespace::INSTRUCTION))
}

/// Discriminator for an account, given its type name.
pub fn account_discriminator(name: &str) -> Discriminator {
    discriminator(&format!("{}:{name}", namespace::ACCOUNT))
}

/// Content address of an off-chain manifest payload.
pub fn manifest_hash(payload: &[u8]) -> [u8; 32] {
    sha256(payload)
}

/// Parse a 32-byte hash from hex, accepting an optional `0x` prefix.
pub fn parse_hash_hex(input: &str) -> CoreResult<[u8; 32]> {
    let s = input.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s)
        .map_err(|e| CoreError::invalid_argument(format!("manifest hash is not valid hex: {e}")))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        CoreError::invalid_argument(format!("manifest hash must be 32 bytes, got {len}"))
    })
}

/// Lowercase hex of a 32-byte hash.
pub fn hash_hex(hash: &[u8; 32]) -> String {
    hex::encode(hash)
}

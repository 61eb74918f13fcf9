//! Constants shared between the on-chain program and clients.
//!
//! Keep these stable because they affect PDA derivation.

use solana_program::pubkey::Pubkey;

/// PDA seed for the per-namespace registry config.
pub const SEED_CONFIG: &[u8] = b"config";

/// PDA seed for the mint/update authority of a config.
pub const SEED_AUTH: &[u8] = b"auth";

/// PDA seed for object manifests.
pub const SEED_MANIFEST: &[u8] = b"object_manifest";

/// PDA seed for object mints.
pub const SEED_OBJECT_MINT: &[u8] = b"object_mint";

/// Token-metadata PDA seeds.
pub const SEED_METADATA: &[u8] = b"metadata";
pub const SEED_EDITION: &[u8] = b"edition";

/// Deployed registry program id.
pub const DEFAULT_PROGRAM_ID: Pubkey =
    solana_program::pubkey!("GwMpopxNkDYsnucBRPf47QSEsEzA3rS1o6ioMX78hgqx");

pub const TOKEN_PROGRAM_ID: Pubkey =
    solana_program::pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");

pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    solana_program::pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

pub use ogal_core::collection::TOKEN_METADATA_PROGRAM_ID;

/// Default compute unit limit requested for mints.
pub const DEFAULT_COMPUTE_UNIT_LIMIT: u32 = 400_000;

/// Anchor custom error reported when a verified creator did not sign.
pub const DEFAULT_CREATOR_SIGNATURE_MISMATCH_CODE: u32 = 6031;

/// Token-metadata errors surfaced for collection guard-rail failures.
pub const DEFAULT_COLLECTION_AUTHORITY_MISMATCH_CODE: u32 = 0x63;
pub const DEFAULT_COLLECTION_NOT_UNIQUE_CODE: u32 = 0x65;

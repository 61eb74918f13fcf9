//! PDA derivation for the registry program and the foreign programs it calls.
//!
//! Bumps are tried from 255 down to 1, the same order the runtime uses, so
//! every address here agrees with `Pubkey::find_program_address` and with the
//! on-chain program.

use serde::{Deserialize, Serialize};
use solana_program::pubkey::{Pubkey, MAX_SEEDS, MAX_SEED_LEN};

use crate::constants::{
    ASSOCIATED_TOKEN_PROGRAM_ID, SEED_AUTH, SEED_CONFIG, SEED_EDITION, SEED_MANIFEST,
    SEED_METADATA, SEED_OBJECT_MINT, TOKEN_METADATA_PROGRAM_ID, TOKEN_PROGRAM_ID,
};
use crate::errors::{LedgerError, LedgerResult};

/// A derived address with the bump and seeds that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramAddress {
    pub address: Pubkey,
    pub bump: u8,
    pub seeds: Vec<Vec<u8>>,
}

/// Derive `seeds` under `program_id`, probing bumps 255 → 1.
pub fn derive(label: &str, seeds: &[&[u8]], program_id: &Pubkey) -> LedgerResult<ProgramAddress> {
    // One slot is reserved for the bump seed.
    if seeds.len() >= MAX_SEEDS {
        return Err(LedgerError::invalid_input(format!(
            "{label}: {} seeds exceed the maximum of {}",
            seeds.len(),
            MAX_SEEDS - 1
        )));
    }
    if let Some(seed) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(LedgerError::invalid_input(format!(
            "{label}: seed of {} bytes exceeds {MAX_SEED_LEN}",
            seed.len()
        )));
    }

    for bump in (1..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut with_bump: Vec<&[u8]> = seeds.to_vec();
        with_bump.push(&bump_seed);
        if let Ok(address) = Pubkey::create_program_address(&with_bump, program_id) {
            return Ok(ProgramAddress {
                address,
                bump,
                seeds: seeds.iter().map(|s| s.to_vec()).collect(),
            });
        }
    }

    Err(LedgerError::AddressDerivationExhausted {
        label: label.to_string(),
    })
}

/// Derive and require the bump recorded on-chain (or in configuration).
pub fn derive_checked(
    label: &str,
    seeds: &[&[u8]],
    program_id: &Pubkey,
    expected_bump: Option<u8>,
) -> LedgerResult<ProgramAddress> {
    let derived = derive(label, seeds, program_id)?;
    match expected_bump {
        Some(expected) if expected != derived.bump => Err(LedgerError::BumpMismatch {
            label: label.to_string(),
            expected,
            derived: derived.bump,
        }),
        _ => Ok(derived),
    }
}

pub fn derive_config(
    program_id: &Pubkey,
    namespace: &Pubkey,
    expected_bump: Option<u8>,
) -> LedgerResult<ProgramAddress> {
    derive_checked("config", &[SEED_CONFIG, namespace.as_ref()], program_id, expected_bump)
}

pub fn derive_auth(program_id: &Pubkey, config: &Pubkey, expected_bump: Option<u8>) -> LedgerResult<ProgramAddress> {
    derive_checked("auth", &[SEED_AUTH, config.as_ref()], program_id, expected_bump)
}

pub fn derive_manifest(
    program_id: &Pubkey,
    config: &Pubkey,
    object_id: u64,
    expected_bump: Option<u8>,
) -> LedgerResult<ProgramAddress> {
    derive_checked(
        "manifest",
        &[SEED_MANIFEST, config.as_ref(), &object_id.to_le_bytes()],
        program_id,
        expected_bump,
    )
}

pub fn derive_object_mint(
    program_id: &Pubkey,
    manifest: &Pubkey,
    expected_bump: Option<u8>,
) -> LedgerResult<ProgramAddress> {
    derive_checked(
        "object mint",
        &[SEED_OBJECT_MINT, manifest.as_ref()],
        program_id,
        expected_bump,
    )
}

pub fn derive_metadata(mint: &Pubkey) -> LedgerResult<ProgramAddress> {
    derive(
        "metadata",
        &[SEED_METADATA, TOKEN_METADATA_PROGRAM_ID.as_ref(), mint.as_ref()],
        &TOKEN_METADATA_PROGRAM_ID,
    )
}

pub fn derive_master_edition(mint: &Pubkey) -> LedgerResult<ProgramAddress> {
    derive(
        "master edition",
        &[
            SEED_METADATA,
            TOKEN_METADATA_PROGRAM_ID.as_ref(),
            mint.as_ref(),
            SEED_EDITION,
        ],
        &TOKEN_METADATA_PROGRAM_ID,
    )
}

pub fn derive_associated_token_account(owner: &Pubkey, mint: &Pubkey) -> LedgerResult<ProgramAddress> {
    derive(
        "associated token account",
        &[owner.as_ref(), TOKEN_PROGRAM_ID.as_ref(), mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
}

/// Bumps recorded on-chain or configured, verified against derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectedBumps {
    pub config: Option<u8>,
    pub auth: Option<u8>,
    pub manifest: Option<u8>,
    pub mint: Option<u8>,
}

impl ExpectedBumps {
    /// Fill unset bumps from `fallback`.
    pub fn or(self, fallback: ExpectedBumps) -> Self {
        Self {
            config: self.config.or(fallback.config),
            auth: self.auth.or(fallback.auth),
            manifest: self.manifest.or(fallback.manifest),
            mint: self.mint.or(fallback.mint),
        }
    }
}

/// Registry-side addresses shared by every operation.
#[derive(Debug, Clone)]
pub struct RegistryPdas {
    pub program_id: Pubkey,
    pub namespace: Pubkey,
    pub config: ProgramAddress,
    pub auth: ProgramAddress,
}

impl RegistryPdas {
    pub fn derive(program_id: &Pubkey, namespace: &Pubkey, expected: &ExpectedBumps) -> LedgerResult<Self> {
        let config = derive_config(program_id, namespace, expected.config)?;
        let auth = derive_auth(program_id, &config.address, expected.auth)?;
        Ok(Self {
            program_id: *program_id,
            namespace: *namespace,
            config,
            auth,
        })
    }

    /// Manifest and mint PDAs for one object.
    pub fn object(&self, object_id: u64, expected: &ExpectedBumps) -> LedgerResult<ObjectPdas> {
        let manifest = derive_manifest(&self.program_id, &self.config.address, object_id, expected.manifest)?;
        let mint = derive_object_mint(&self.program_id, &manifest.address, expected.mint)?;
        let metadata = derive_metadata(&mint.address)?;
        let master_edition = derive_master_edition(&mint.address)?;
        Ok(ObjectPdas {
            object_id,
            manifest,
            mint,
            metadata: metadata.address,
            master_edition: master_edition.address,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ObjectPdas {
    pub object_id: u64,
    pub manifest: ProgramAddress,
    pub mint: ProgramAddress,
    pub metadata: Pubkey,
    pub master_edition: Pubkey,
}

/// Metadata and edition addresses of the collection NFT.
#[derive(Debug, Clone, Copy)]
pub struct CollectionPdas {
    pub mint: Pubkey,
    pub metadata: Pubkey,
    pub master_edition: Pubkey,
}

impl CollectionPdas {
    pub fn derive(collection_mint: &Pubkey) -> LedgerResult<Self> {
        Ok(Self {
            mint: *collection_mint,
            metadata: derive_metadata(collection_mint)?.address,
            master_edition: derive_master_edition(collection_mint)?.address,
        })
    }
}

//! Operation requests and their typed outcomes.

use ogal_core::creators::CreatorRequest;
use ogal_core::limits;
use ogal_core::state::{AuthRecord, ObjectManifest, RegistryConfig};
use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

use crate::errors::{LedgerError, LedgerResult};
use crate::pda::ExpectedBumps;
use crate::pipeline::SubmissionOutcome;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRequest {
    pub object_id: u64,
    /// Token recipient; the fee payer when omitted.
    #[serde(
        default,
        with = "ogal_core::serde_pubkey::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub recipient: Option<Pubkey>,
    pub manifest_uri: String,
    #[serde(with = "ogal_core::serde_pubkey::hash_hex")]
    pub manifest_hash: [u8; 32],
    pub metadata_name: String,
    pub metadata_symbol: String,
    #[serde(default)]
    pub seller_fee_basis_points: u16,
    pub creators: Vec<CreatorRequest>,
    #[serde(default)]
    pub expected_bumps: ExpectedBumps,
}

impl MintRequest {
    pub fn validate(&self) -> LedgerResult<()> {
        check_uri(&self.manifest_uri)?;
        check_len("metadata_name", &self.metadata_name, limits::MAX_NAME_LEN)?;
        check_len("metadata_symbol", &self.metadata_symbol, limits::MAX_SYMBOL_LEN)?;
        if self.seller_fee_basis_points > limits::MAX_SELLER_FEE_BASIS_POINTS {
            return Err(LedgerError::invalid_input(format!(
                "seller_fee_basis_points {} exceeds {}",
                self.seller_fee_basis_points,
                limits::MAX_SELLER_FEE_BASIS_POINTS
            )));
        }
        if self.creators.is_empty() || self.creators.len() > limits::MAX_CREATORS {
            return Err(LedgerError::invalid_input(format!(
                "expected 1 to {} creators, got {}",
                limits::MAX_CREATORS,
                self.creators.len()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateManifestRequest {
    pub object_id: u64,
    #[serde(with = "ogal_core::serde_pubkey::hash_hex")]
    pub manifest_hash: [u8; 32],
    pub metadata_uri: String,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

impl UpdateManifestRequest {
    pub fn validate(&self) -> LedgerResult<()> {
        check_uri(&self.metadata_uri)
    }
}

fn check_uri(uri: &str) -> LedgerResult<()> {
    if uri.is_empty() {
        return Err(LedgerError::invalid_input("manifest uri is empty"));
    }
    check_len("manifest uri", uri, limits::MAX_URI_LEN)
}

fn check_len(field: &str, value: &str, max: usize) -> LedgerResult<()> {
    if value.len() > max {
        return Err(LedgerError::invalid_input(format!(
            "{field} is {} bytes, limit is {max}",
            value.len()
        )));
    }
    Ok(())
}

/// Decoded registry config with its address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigView {
    #[serde(with = "ogal_core::serde_pubkey")]
    pub address: Pubkey,
    #[serde(with = "ogal_core::serde_pubkey")]
    pub auth: Pubkey,
    pub config: RegistryConfig,
    /// The auth PDA's own record; `None` when the account does not exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_record: Option<AuthRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestView {
    #[serde(with = "ogal_core::serde_pubkey")]
    pub address: Pubkey,
    pub manifest: ObjectManifest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MintOutcome {
    pub object_id: u64,
    #[serde(with = "ogal_core::serde_pubkey")]
    pub manifest: Pubkey,
    #[serde(with = "ogal_core::serde_pubkey")]
    pub mint: Pubkey,
    #[serde(with = "ogal_core::serde_pubkey")]
    pub metadata: Pubkey,
    #[serde(with = "ogal_core::serde_pubkey")]
    pub master_edition: Pubkey,
    #[serde(with = "ogal_core::serde_pubkey")]
    pub recipient_token_account: Pubkey,
    #[serde(flatten)]
    pub submission: SubmissionOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateManifestOutcome {
    pub object_id: u64,
    #[serde(with = "ogal_core::serde_pubkey")]
    pub manifest: Pubkey,
    #[serde(flatten)]
    pub submission: SubmissionOutcome,
}

/// Result of an authority-gated operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminOutcome {
    pub operation: &'static str,
    /// Account the operation wrote, e.g. the new config after a migration.
    #[serde(with = "ogal_core::serde_pubkey")]
    pub target: Pubkey,
    #[serde(flatten)]
    pub submission: SubmissionOutcome,
}

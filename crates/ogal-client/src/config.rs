//! Client configuration.
//!
//! `LedgerConfig` is a plain serde structure read from a JSON file by the CLI
//! (or built in code by a host application). The library never reads
//! environment variables; everything must be passed in explicitly.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;
use solana_sdk::commitment_config::CommitmentConfig;

use crate::constants::{
    DEFAULT_COLLECTION_AUTHORITY_MISMATCH_CODE, DEFAULT_COLLECTION_NOT_UNIQUE_CODE,
    DEFAULT_COMPUTE_UNIT_LIMIT, DEFAULT_CREATOR_SIGNATURE_MISMATCH_CODE, DEFAULT_PROGRAM_ID,
};
use crate::errors::{LedgerError, LedgerResult};
use crate::pda::ExpectedBumps;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    #[serde(with = "ogal_core::serde_pubkey")]
    pub program_id: Pubkey,
    /// Namespace key the registry config PDA is derived from.
    #[serde(with = "ogal_core::serde_pubkey")]
    pub namespace: Pubkey,
    /// Collection every object is minted into. Required for mint and rotation.
    #[serde(with = "ogal_core::serde_pubkey::option", skip_serializing_if = "Option::is_none")]
    pub collection_mint: Option<Pubkey>,
    /// Co-signer used for admin operations instead of the config authority.
    #[serde(with = "ogal_core::serde_pubkey::option", skip_serializing_if = "Option::is_none")]
    pub authority_override: Option<Pubkey>,
    pub blockhash_ttl_ms: u64,
    pub rpc: RpcConfig,
    pub retry: RetryConfig,
    pub compute_budget: ComputeBudgetConfig,
    pub confirmation: ConfirmationConfig,
    pub error_codes: ErrorCodeConfig,
    pub expected_bumps: BumpConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            program_id: DEFAULT_PROGRAM_ID,
            namespace: Pubkey::default(),
            collection_mint: None,
            authority_override: None,
            blockhash_ttl_ms: 20_000,
            rpc: RpcConfig::default(),
            retry: RetryConfig::default(),
            compute_budget: ComputeBudgetConfig::default(),
            confirmation: ConfirmationConfig::default(),
            error_codes: ErrorCodeConfig::default(),
            expected_bumps: BumpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_config(self) -> CommitmentConfig {
        match self {
            Self::Processed => CommitmentConfig::processed(),
            Self::Confirmed => CommitmentConfig::confirmed(),
            Self::Finalized => CommitmentConfig::finalized(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub primary_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_url: Option<String>,
    pub commitment: Commitment,
    /// Skip the node's preflight simulation on send.
    pub skip_preflight: bool,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            primary_url: "https://api.devnet.solana.com".to_string(),
            secondary_url: None,
            commitment: Commitment::Confirmed,
            skip_preflight: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries per endpoint before failing over.
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeBudgetConfig {
    /// `0` omits the limit instruction.
    pub unit_limit: u32,
    /// Priority fee in micro-lamports per unit; `0` omits the price instruction.
    pub unit_price_micro_lamports: u64,
}

impl Default for ComputeBudgetConfig {
    fn default() -> Self {
        Self {
            unit_limit: DEFAULT_COMPUTE_UNIT_LIMIT,
            unit_price_micro_lamports: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    pub poll_attempts: u32,
    pub poll_interval_ms: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_attempts: 30,
            poll_interval_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorCodeConfig {
    pub creator_signature_mismatch: u32,
    pub collection_authority_mismatch: u32,
    pub collection_not_unique: u32,
}

impl Default for ErrorCodeConfig {
    fn default() -> Self {
        Self {
            creator_signature_mismatch: DEFAULT_CREATOR_SIGNATURE_MISMATCH_CODE,
            collection_authority_mismatch: DEFAULT_COLLECTION_AUTHORITY_MISMATCH_CODE,
            collection_not_unique: DEFAULT_COLLECTION_NOT_UNIQUE_CODE,
        }
    }
}

impl ErrorCodeConfig {
    pub fn guard_rail_codes(&self) -> [u32; 2] {
        [self.collection_authority_mismatch, self.collection_not_unique]
    }
}

/// Bumps pinned by the operator, checked on every derivation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BumpConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<u8>,
}

impl BumpConfig {
    pub fn as_expected(&self) -> ExpectedBumps {
        ExpectedBumps {
            config: self.config,
            auth: self.auth,
            ..ExpectedBumps::default()
        }
    }
}

impl LedgerConfig {
    pub fn from_json_str(raw: &str) -> LedgerResult<Self> {
        serde_json::from_str(raw).map_err(|e| LedgerError::Config(format!("parse: {e}")))
    }

    pub fn load(path: &Path) -> LedgerResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    pub fn blockhash_ttl(&self) -> Duration {
        Duration::from_millis(self.blockhash_ttl_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirmation.poll_interval_ms)
    }
}

/// Validate a full configuration object.
pub fn validate_config(cfg: &LedgerConfig) -> LedgerResult<()> {
    let primary = parse_rpc_url("rpc.primary_url", &cfg.rpc.primary_url)?;
    if let Some(secondary) = &cfg.rpc.secondary_url {
        let secondary = parse_rpc_url("rpc.secondary_url", secondary)?;
        if secondary == primary {
            return Err(LedgerError::Config(
                "rpc.secondary_url must differ from rpc.primary_url".into(),
            ));
        }
    }

    if cfg.program_id == Pubkey::default() {
        return Err(LedgerError::Config("program_id must be set".into()));
    }

    if cfg.blockhash_ttl_ms == 0 {
        return Err(LedgerError::Config(
            "blockhash_ttl_ms must be greater than zero".into(),
        ));
    }

    if cfg.retry.base_delay_ms == 0 {
        return Err(LedgerError::Config(
            "retry.base_delay_ms must be greater than zero".into(),
        ));
    }

    if cfg.confirmation.poll_attempts == 0 || cfg.confirmation.poll_interval_ms == 0 {
        return Err(LedgerError::Config(
            "confirmation bounds must be greater than zero".into(),
        ));
    }

    let codes = &cfg.error_codes;
    if codes.guard_rail_codes().contains(&codes.creator_signature_mismatch) {
        return Err(LedgerError::Config(
            "creator signature mismatch code must differ from the guard-rail codes".into(),
        ));
    }

    Ok(())
}

fn parse_rpc_url(field: &str, raw: &str) -> LedgerResult<url::Url> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| LedgerError::Config(format!("{field} is not a valid url: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(LedgerError::Config(format!(
            "{field} must use http or https, got {other}"
        ))),
    }
}

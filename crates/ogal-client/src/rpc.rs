//! RPC boundary.
//!
//! The pipeline only sees [`LedgerRpc`] and a typed [`RpcFailure`]. The
//! `solana-client` implementation classifies `ClientError` kinds once, here,
//! so nothing downstream has to inspect error types or text.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcSendTransactionConfig;
use solana_client::rpc_request::{RpcError, RpcResponseErrorData};
use solana_program::hash::Hash;
use solana_program::instruction::InstructionError;
use solana_program::pubkey::Pubkey;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{Transaction, TransactionError};

/// Account bytes as returned by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAccount {
    pub owner: Pubkey,
    pub lamports: u64,
    pub data: Vec<u8>,
}

impl RawAccount {
    pub fn view(&self) -> ogal_core::collection::AccountRef<'_> {
        ogal_core::collection::AccountRef {
            owner: &self.owner,
            data: &self.data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The request never got a definitive answer; safe to retry.
    Transport,
    /// The node or program refused the transaction.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcFailure {
    pub kind: FailureKind,
    pub reason: String,
    pub raw_response: Option<String>,
    /// Custom program error code, when the node reported one.
    pub error_code: Option<u32>,
    /// The node no longer knows the transaction's recent blockhash.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stale_blockhash: bool,
}

impl RpcFailure {
    pub fn transport(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            reason: reason.into(),
            raw_response: None,
            error_code: None,
            stale_blockhash: false,
        }
    }

    /// Transport failure caused by an expired blockhash.
    pub fn blockhash_not_found(reason: impl Into<String>) -> Self {
        Self {
            stale_blockhash: true,
            ..Self::transport(reason)
        }
    }

    pub fn rejected(reason: impl Into<String>, error_code: Option<u32>) -> Self {
        Self {
            kind: FailureKind::Rejected,
            reason: reason.into(),
            raw_response: None,
            error_code,
            stale_blockhash: false,
        }
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw_response = Some(raw.into());
        self
    }

    pub fn is_transport(&self) -> bool {
        self.kind == FailureKind::Transport
    }

    /// True when this failure carries custom program error `code`.
    ///
    /// A structured code wins. Otherwise the reason and raw response are
    /// searched for the textual forms nodes and wallets use.
    pub fn matches_code(&self, code: u32) -> bool {
        if let Some(found) = self.error_code {
            return found == code;
        }
        text_mentions_code(&self.reason, code)
            || self
                .raw_response
                .as_deref()
                .is_some_and(|raw| text_mentions_code(raw, code))
    }

    /// The structured code, or the first code recognisable in the text.
    pub fn code(&self) -> Option<u32> {
        self.error_code
            .or_else(|| extract_custom_code(&self.reason))
            .or_else(|| self.raw_response.as_deref().and_then(extract_custom_code))
    }
}

impl fmt::Display for RpcFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.reason)
    }
}

pub fn text_mentions_code(text: &str, code: u32) -> bool {
    let lower = text.to_ascii_lowercase();
    [
        format!("custom program error: 0x{code:x}"),
        format!("\"custom\":{code}"),
        format!("custom({code})"),
        format!("error code: {code}"),
    ]
    .iter()
    .any(|needle| contains_token(&lower, needle))
}

/// `needle` occurs and is not followed by an alphanumeric character, so
/// `0x63` does not match inside `0x63f`.
fn contains_token(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(idx, _)| {
        !haystack[idx + needle.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric())
    })
}

/// Parse `custom program error: 0x..` or `Custom(..)` out of free text.
pub fn extract_custom_code(text: &str) -> Option<u32> {
    let lower = text.to_ascii_lowercase();
    if let Some(idx) = lower.find("custom program error: 0x") {
        let hex: String = lower[idx + "custom program error: 0x".len()..]
            .chars()
            .take_while(|c| c.is_ascii_hexdigit())
            .collect();
        if let Ok(code) = u32::from_str_radix(&hex, 16) {
            return Some(code);
        }
    }
    for prefix in ["custom(", "\"custom\":"] {
        if let Some(idx) = lower.find(prefix) {
            let digits: String = lower[idx + prefix.len()..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if let Ok(code) = digits.parse() {
                return Some(code);
            }
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    Confirmed,
    Pending,
    Errored(RpcFailure),
}

#[derive(Debug, Clone, Copy)]
pub struct SendOptions {
    pub skip_preflight: bool,
    pub commitment: CommitmentConfig,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            skip_preflight: false,
            commitment: CommitmentConfig::confirmed(),
        }
    }
}

#[async_trait]
pub trait LedgerRpc: Send + Sync {
    /// Stable identity of the endpoint, used as the blockhash cache key.
    fn endpoint(&self) -> String;

    async fn get_account(
        &self,
        address: &Pubkey,
        commitment: CommitmentConfig,
    ) -> Result<Option<RawAccount>, RpcFailure>;

    async fn get_latest_blockhash(&self, commitment: CommitmentConfig) -> Result<Hash, RpcFailure>;

    async fn send_transaction(
        &self,
        tx: &Transaction,
        options: SendOptions,
    ) -> Result<Signature, RpcFailure>;

    async fn get_signature_status(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<SignatureStatus, RpcFailure>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointRole {
    Primary,
    Secondary,
}

/// Primary endpoint plus an optional failover target.
#[derive(Clone)]
pub struct RpcEndpoints {
    pub primary: Arc<dyn LedgerRpc>,
    pub secondary: Option<Arc<dyn LedgerRpc>>,
}

impl RpcEndpoints {
    pub fn new(primary: Arc<dyn LedgerRpc>, secondary: Option<Arc<dyn LedgerRpc>>) -> Self {
        Self { primary, secondary }
    }

    pub fn single(primary: Arc<dyn LedgerRpc>) -> Self {
        Self::new(primary, None)
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }

    pub fn get(&self, role: EndpointRole) -> &Arc<dyn LedgerRpc> {
        match (role, &self.secondary) {
            (EndpointRole::Secondary, Some(s)) => s,
            _ => &self.primary,
        }
    }
}

impl fmt::Debug for RpcEndpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcEndpoints")
            .field("primary", &self.primary.endpoint())
            .field("secondary", &self.secondary.as_ref().map(|s| s.endpoint()))
            .finish()
    }
}

/// `LedgerRpc` over the nonblocking `solana-client` RPC client.
pub struct SolanaRpc {
    client: RpcClient,
    url: String,
}

impl SolanaRpc {
    pub fn new(url: &str, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(url.to_string(), commitment),
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl LedgerRpc for SolanaRpc {
    fn endpoint(&self) -> String {
        self.url.clone()
    }

    async fn get_account(
        &self,
        address: &Pubkey,
        commitment: CommitmentConfig,
    ) -> Result<Option<RawAccount>, RpcFailure> {
        let response = self
            .client
            .get_account_with_commitment(address, commitment)
            .await
            .map_err(|e| classify_client_error(&e))?;
        Ok(response.value.map(|a| RawAccount {
            owner: a.owner,
            lamports: a.lamports,
            data: a.data,
        }))
    }

    async fn get_latest_blockhash(&self, commitment: CommitmentConfig) -> Result<Hash, RpcFailure> {
        self.client
            .get_latest_blockhash_with_commitment(commitment)
            .await
            .map(|(hash, _)| hash)
            .map_err(|e| classify_client_error(&e))
    }

    async fn send_transaction(
        &self,
        tx: &Transaction,
        options: SendOptions,
    ) -> Result<Signature, RpcFailure> {
        let config = RpcSendTransactionConfig {
            skip_preflight: options.skip_preflight,
            preflight_commitment: Some(options.commitment.commitment),
            ..RpcSendTransactionConfig::default()
        };
        self.client
            .send_transaction_with_config(tx, config)
            .await
            .map_err(|e| classify_client_error(&e))
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
    ) -> Result<SignatureStatus, RpcFailure> {
        let response = self
            .client
            .get_signature_statuses(&[*signature])
            .await
            .map_err(|e| classify_client_error(&e))?;
        let Some(Some(status)) = response.value.into_iter().next() else {
            return Ok(SignatureStatus::Pending);
        };
        if let Some(err) = status.err.clone() {
            return Ok(SignatureStatus::Errored(classify_transaction_error(&err)));
        }
        if status.satisfies_commitment(commitment) {
            Ok(SignatureStatus::Confirmed)
        } else {
            Ok(SignatureStatus::Pending)
        }
    }
}

/// Node errors that mean "ask again later" rather than "no".
const TRANSIENT_RPC_CODES: [i64; 3] = [-32603, -32005, -32004];

pub fn classify_client_error(err: &ClientError) -> RpcFailure {
    let reason = err.to_string();
    match err.kind() {
        ClientErrorKind::TransactionError(tx_err) => {
            classify_transaction_error(tx_err).with_raw(format!("{err:?}"))
        }
        ClientErrorKind::RpcError(RpcError::RpcResponseError { code, data, .. }) => match data {
            RpcResponseErrorData::SendTransactionPreflightFailure(sim) => {
                let raw = serde_json::to_string(sim).unwrap_or_else(|_| format!("{sim:?}"));
                match &sim.err {
                    Some(tx_err) => {
                        let mut failure = classify_transaction_error(tx_err);
                        failure.reason = reason;
                        failure.with_raw(raw)
                    }
                    None => RpcFailure::rejected(reason, extract_custom_code(&raw)).with_raw(raw),
                }
            }
            RpcResponseErrorData::NodeUnhealthy { .. } => {
                RpcFailure::transport(reason).with_raw(format!("{err:?}"))
            }
            _ if TRANSIENT_RPC_CODES.contains(code) => {
                RpcFailure::transport(reason).with_raw(format!("{err:?}"))
            }
            _ => RpcFailure::rejected(reason.clone(), extract_custom_code(&reason))
                .with_raw(format!("{err:?}")),
        },
        ClientErrorKind::SigningError(_) => RpcFailure::rejected(reason, None),
        // I/O, HTTP, request and parse failures.
        _ => RpcFailure::transport(reason).with_raw(format!("{err:?}")),
    }
}

pub fn classify_transaction_error(err: &TransactionError) -> RpcFailure {
    match err {
        TransactionError::BlockhashNotFound => RpcFailure::blockhash_not_found(err.to_string()),
        TransactionError::InstructionError(index, InstructionError::Custom(code)) => {
            RpcFailure::rejected(
                format!("instruction {index}: custom program error: 0x{code:x}"),
                Some(*code),
            )
        }
        other => RpcFailure::rejected(other.to_string(), None),
    }
}

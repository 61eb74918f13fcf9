//! Error taxonomy for the ledger client.
//!
//! Every failure carries a class that decides retry behaviour, a short message
//! for operators and a diagnostic with raw RPC text and, where one was built,
//! the base58 serialized transaction.

use ogal_core::collection::GuardRailViolation;
use ogal_core::creators::CreatorError;
use ogal_core::CoreError;
use serde::Serialize;
use solana_program::pubkey::Pubkey;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Bad caller input; never retried.
    Input,
    /// On-chain or local state forbids the operation; never retried.
    State,
    /// Account bytes could not be decoded; never retried.
    Decode,
    /// RPC transport failed after retries and failover.
    Transport,
    /// The program (or a program it calls) rejected the transaction.
    Program,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Creator(#[from] CreatorError),

    #[error("no viable bump for {label} address")]
    AddressDerivationExhausted { label: String },

    #[error("{label} bump mismatch: expected {expected}, derived {derived}")]
    BumpMismatch {
        label: String,
        expected: u8,
        derived: u8,
    },

    #[error("{label} account {address} not found")]
    AccountNotFound { label: String, address: Pubkey },

    #[error("registry is paused")]
    RegistryPaused,

    #[error("not ready: {0}")]
    NotReady(String),

    #[error("signer failed: {0}")]
    Signer(String),

    #[error("collection guard rail failed: {violation}")]
    CollectionGuardRailViolation {
        violation: GuardRailViolation,
        transaction: Option<String>,
    },

    #[error("verified creators did not sign (program error {code})")]
    CreatorSignatureMismatch {
        code: u32,
        reason: String,
        raw_response: Option<String>,
        transaction: Option<String>,
    },

    #[error("program rejected transaction{}: {reason}", .code.map(|c| format!(" with code {c}")).unwrap_or_default())]
    ProgramRejected {
        code: Option<u32>,
        reason: String,
        raw_response: Option<String>,
        transaction: Option<String>,
    },

    #[error("rpc transport exhausted after {attempts} attempt(s), last endpoint {endpoint}: {reason}")]
    TransportExhausted {
        attempts: u32,
        endpoint: String,
        reason: String,
        raw_response: Option<String>,
    },

    #[error("operation cancelled")]
    Cancelled,
}

impl LedgerError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidInput(_) | Self::Config(_) | Self::Creator(_) => ErrorClass::Input,
            Self::Core(e) if e.is_decode_error() => ErrorClass::Decode,
            Self::Core(_) => ErrorClass::Input,
            Self::AddressDerivationExhausted { .. }
            | Self::BumpMismatch { .. }
            | Self::AccountNotFound { .. }
            | Self::RegistryPaused
            | Self::NotReady(_)
            | Self::Signer(_)
            | Self::Cancelled => ErrorClass::State,
            Self::TransportExhausted { .. } => ErrorClass::Transport,
            Self::CollectionGuardRailViolation { .. }
            | Self::CreatorSignatureMismatch { .. }
            | Self::ProgramRejected { .. } => ErrorClass::Program,
        }
    }

    /// Short, actionable text for end users.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => format!("Check the request: {msg}"),
            Self::Config(msg) => format!("Fix the client configuration: {msg}"),
            Self::Core(e) if e.is_decode_error() => {
                "On-chain account data could not be read; check the program id and namespace.".into()
            }
            Self::Core(e) => format!("Check the request: {e}"),
            Self::Creator(_) => {
                "The only creator asks to be verified but cannot sign; connect that wallet or drop verification.".into()
            }
            Self::AddressDerivationExhausted { .. } | Self::BumpMismatch { .. } => {
                "Derived addresses do not match the registry; check the program id and namespace.".into()
            }
            Self::AccountNotFound { label, .. } => format!("The {label} account does not exist yet."),
            Self::RegistryPaused => "Minting is paused by the registry authority.".into(),
            Self::NotReady(msg) => msg.clone(),
            Self::Signer(_) => "The wallet could not sign the transaction.".into(),
            Self::CollectionGuardRailViolation { violation, .. } => match violation {
                GuardRailViolation::MetadataUnavailable { .. } => {
                    "The collection metadata account could not be read.".into()
                }
                GuardRailViolation::CollectionAuthorityMismatch { expected, .. } => format!(
                    "The collection's update authority must be the registry authority {expected}."
                ),
                GuardRailViolation::MasterEditionNotUnique { .. } => {
                    "The collection must be a sized collection or a one-of-one master edition.".into()
                }
            },
            Self::CreatorSignatureMismatch { .. } => {
                "A verified creator did not sign; retry without verified creators.".into()
            }
            Self::ProgramRejected { code, .. } => match code
                .and_then(ogal_core::ProgramErrorCode::from_code)
            {
                Some(known) => known.message().to_string(),
                None => "The program rejected the transaction.".into(),
            },
            Self::TransportExhausted { .. } => {
                "The RPC endpoints are unreachable; try again later.".into()
            }
            Self::Cancelled => "The operation was cancelled.".into(),
        }
    }

    /// Full text for logs and bug reports.
    pub fn diagnostic(&self) -> String {
        let mut out = self.to_string();
        let (raw, tx) = match self {
            Self::CollectionGuardRailViolation { transaction, .. } => (None, transaction.as_ref()),
            Self::CreatorSignatureMismatch {
                reason,
                raw_response,
                transaction,
                ..
            }
            | Self::ProgramRejected {
                reason,
                raw_response,
                transaction,
                ..
            } => {
                out.push_str(&format!("\nreason: {reason}"));
                (raw_response.as_ref(), transaction.as_ref())
            }
            Self::TransportExhausted { raw_response, .. } => (raw_response.as_ref(), None),
            _ => (None, None),
        };
        if let Some(raw) = raw {
            out.push_str(&format!("\nrpc response: {raw}"));
        }
        if let Some(tx) = tx {
            out.push_str(&format!("\ntransaction (base58): {tx}"));
        }
        out
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.class(), ErrorClass::Transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_follow_retry_policy() {
        assert_eq!(LedgerError::invalid_input("x").class(), ErrorClass::Input);
        assert_eq!(LedgerError::RegistryPaused.class(), ErrorClass::State);
        assert_eq!(
            LedgerError::Core(CoreError::TruncatedData { offset: 0, needed: 8, remaining: 0 }).class(),
            ErrorClass::Decode
        );
        assert_eq!(
            LedgerError::Core(CoreError::invalid_argument("bad hash")).class(),
            ErrorClass::Input
        );
        let transport = LedgerError::TransportExhausted {
            attempts: 3,
            endpoint: "http://a".into(),
            reason: "timeout".into(),
            raw_response: None,
        };
        assert_eq!(transport.class(), ErrorClass::Transport);
        assert!(transport.is_retryable());
        assert!(!LedgerError::RegistryPaused.is_retryable());
    }

    #[test]
    fn program_rejection_uses_known_message() {
        let err = LedgerError::ProgramRejected {
            code: Some(6015),
            reason: "custom program error: 0x177f".into(),
            raw_response: None,
            transaction: None,
        };
        assert_eq!(err.user_message(), "Minting has been paused by the registry authority.");
        assert!(err.to_string().contains("with code 6015"));
    }

    #[test]
    fn diagnostic_carries_raw_text_and_transaction() {
        let err = LedgerError::CreatorSignatureMismatch {
            code: 6031,
            reason: "custom program error: 0x178f".into(),
            raw_response: Some("{\"err\":{\"Custom\":6031}}".into()),
            transaction: Some("3xyz".into()),
        };
        let diag = err.diagnostic();
        assert!(diag.contains("0x178f"));
        assert!(diag.contains("\"Custom\":6031"));
        assert!(diag.contains("transaction (base58): 3xyz"));
    }
}

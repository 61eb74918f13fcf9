//! ogal-client
//!
//! Solana client for the owner-governed asset ledger program.
//!
//! It includes:
//! - PDA derivation for registry, object and token-metadata accounts
//! - instruction builders with the program's account ordering
//! - RPC and signer boundaries plus a per-endpoint blockhash cache
//! - a submission pipeline with retry, failover and creator downgrades
//! - the [`LedgerService`] facade that ties them together
//!
//! Configuration is passed in explicitly; the library never reads the
//! environment.

pub mod blockhash;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pda;
pub mod pipeline;
pub mod registry_client;
pub mod request;
pub mod rpc;
pub mod service;
pub mod signer;
pub mod transaction;

pub use config::{validate_config, LedgerConfig};
pub use errors::{ErrorClass, LedgerError, LedgerResult};
pub use pipeline::SubmissionOutcome;
pub use request::{
    AdminOutcome, ConfigView, ManifestView, MintOutcome, MintRequest, UpdateManifestOutcome,
    UpdateManifestRequest,
};
pub use rpc::{LedgerRpc, RawAccount, RpcEndpoints, RpcFailure, SolanaRpc};
pub use service::LedgerService;
pub use signer::{KeypairSigner, TransactionSigner};
pub use tokio_util::sync::CancellationToken;

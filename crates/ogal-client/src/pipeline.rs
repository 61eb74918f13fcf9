//! Submission pipeline.
//!
//! Each call walks `Draft → Signed → Submitted → {Confirmed | Rejected |
//! TransportFailed}`. What happens after a failure is decided by the pure
//! functions [`on_transport_failure`] and [`on_rejection`] over an
//! [`AttemptState`]; the async driver only performs the I/O they ask for.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ogal_core::creators::{downgrade, downgrade_all, verified_addresses, Creator};
use serde::Serialize;
use solana_program::instruction::Instruction;
use solana_program::pubkey::Pubkey;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::signature::Signature;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::blockhash::BlockhashCache;
use crate::config::{ConfirmationConfig, ErrorCodeConfig, LedgerConfig, RetryConfig};
use crate::errors::{LedgerError, LedgerResult};
use crate::rpc::{EndpointRole, RpcEndpoints, RpcFailure, SendOptions, SignatureStatus};
use crate::signer::TransactionSigner;
use crate::transaction::{find_missing_signatures, serialize_base58, signer_set, TransactionAssembler};

/// Mutable bookkeeping for one submission call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptState {
    /// Transport failures on the current endpoint.
    pub attempt: u32,
    pub endpoint: EndpointRole,
    /// Set once `downgrade_all` has been spent.
    pub creator_downgrade_used: bool,
    /// Set once unsignable creators were downgraded before sending.
    pub presign_downgrade_used: bool,
    pub force_refresh: bool,
    /// Transactions handed to an RPC node, across endpoints.
    pub submissions: u32,
}

impl Default for AttemptState {
    fn default() -> Self {
        Self {
            attempt: 0,
            endpoint: EndpointRole::Primary,
            creator_downgrade_used: false,
            presign_downgrade_used: false,
            force_refresh: false,
            submissions: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    Failover,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionDecision {
    /// Clear every verified flag and resubmit.
    DowngradeAllAndResubmit,
    CreatorSignatureMismatch,
    /// Stop; the caller re-reads collection state to explain the failure.
    GuardRail,
    Fatal,
}

/// `base × 2^(attempt−1)`, saturating.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32
        .checked_shl(attempt.saturating_sub(1))
        .unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

pub fn on_transport_failure(
    state: &mut AttemptState,
    retry: &RetryConfig,
    has_secondary: bool,
) -> RetryDecision {
    state.attempt += 1;
    state.force_refresh = true;
    if state.attempt <= retry.max_retries {
        return RetryDecision::Retry {
            delay: backoff_delay(retry.base_delay(), state.attempt),
        };
    }
    if has_secondary && state.endpoint == EndpointRole::Primary {
        state.endpoint = EndpointRole::Secondary;
        state.attempt = 0;
        return RetryDecision::Failover;
    }
    RetryDecision::Exhausted
}

pub fn on_rejection(
    state: &mut AttemptState,
    failure: &RpcFailure,
    codes: &ErrorCodeConfig,
    creators: &[Creator],
) -> RejectionDecision {
    if failure.matches_code(codes.creator_signature_mismatch) {
        let has_verified = creators.iter().any(|c| c.verified);
        if !state.creator_downgrade_used && has_verified {
            state.creator_downgrade_used = true;
            return RejectionDecision::DowngradeAllAndResubmit;
        }
        return RejectionDecision::CreatorSignatureMismatch;
    }
    if codes
        .guard_rail_codes()
        .iter()
        .any(|code| failure.matches_code(*code))
    {
        return RejectionDecision::GuardRail;
    }
    RejectionDecision::Fatal
}

/// Everything the pipeline needs to (re)build one operation's instruction.
pub struct SubmissionPlan {
    pub label: &'static str,
    pub creators: Vec<Creator>,
    /// Creator addresses already downgraded by sanitization.
    pub downgraded: Vec<Pubkey>,
    /// Registry authority that co-signs; the configured override, when set,
    /// signs in its place.
    pub authority: Option<Pubkey>,
    pub build: Box<dyn Fn(&[Creator]) -> LedgerResult<Instruction> + Send + Sync>,
}

impl SubmissionPlan {
    /// A plan whose instruction does not depend on creators.
    pub fn fixed(label: &'static str, ix: Instruction, authority: Option<Pubkey>) -> Self {
        Self {
            label,
            creators: Vec::new(),
            downgraded: Vec::new(),
            authority,
            build: Box::new(move |_| Ok(ix.clone())),
        }
    }
}

impl std::fmt::Debug for SubmissionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionPlan")
            .field("label", &self.label)
            .field("creators", &self.creators)
            .field("authority", &self.authority)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    #[serde(serialize_with = "display")]
    pub signature: Signature,
    /// `false` when the transaction was accepted but not yet confirmed.
    pub confirmed: bool,
    pub creators: Vec<Creator>,
    #[serde(with = "ogal_core::serde_pubkey::vec")]
    pub creators_downgraded: Vec<Pubkey>,
    /// Keys the final transaction was expected to be signed by, fee payer first.
    #[serde(with = "ogal_core::serde_pubkey::vec")]
    pub signers: Vec<Pubkey>,
    pub attempts: u32,
    pub endpoint: String,
}

fn display<T: std::fmt::Display, S: serde::Serializer>(v: &T, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(v)
}

/// Why a submission stopped without an outcome.
#[derive(Debug)]
pub enum SubmitError {
    Ledger(LedgerError),
    /// A collection guard-rail code; the facade turns this into a
    /// `CollectionGuardRailViolation` after re-reading collection state.
    GuardRailRejected {
        failure: RpcFailure,
        transaction: Option<String>,
    },
}

impl From<LedgerError> for SubmitError {
    fn from(e: LedgerError) -> Self {
        Self::Ledger(e)
    }
}

/// Await `fut` unless `cancel` fires first.
pub async fn until_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> LedgerResult<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(LedgerError::Cancelled),
        out = fut => Ok(out),
    }
}

pub struct SubmissionPipeline {
    endpoints: RpcEndpoints,
    cache: Arc<BlockhashCache>,
    assembler: TransactionAssembler,
    retry: RetryConfig,
    confirmation: ConfirmationConfig,
    poll_interval: Duration,
    codes: ErrorCodeConfig,
    commitment: CommitmentConfig,
    skip_preflight: bool,
    authority_override: Option<Pubkey>,
}

enum SendStep {
    Accepted(Signature, bool),
    Transport(RpcFailure),
    Rejected(RpcFailure),
}

impl SubmissionPipeline {
    pub fn new(endpoints: RpcEndpoints, cache: Arc<BlockhashCache>, config: &LedgerConfig) -> Self {
        Self {
            endpoints,
            cache,
            assembler: TransactionAssembler::new(config.compute_budget),
            retry: config.retry,
            confirmation: config.confirmation,
            poll_interval: config.poll_interval(),
            codes: config.error_codes,
            commitment: config.rpc.commitment.as_config(),
            skip_preflight: config.rpc.skip_preflight,
            authority_override: config.authority_override,
        }
    }

    pub fn endpoints(&self) -> &RpcEndpoints {
        &self.endpoints
    }

    pub async fn submit(
        &self,
        plan: SubmissionPlan,
        signer: &dyn TransactionSigner,
        cancel: &CancellationToken,
    ) -> Result<SubmissionOutcome, SubmitError> {
        let fee_payer = signer.fee_payer();
        let mut state = AttemptState::default();
        let mut creators = plan.creators.clone();
        let mut downgraded = plan.downgraded.clone();

        loop {
            if cancel.is_cancelled() {
                return Err(LedgerError::Cancelled.into());
            }
            let rpc = self.endpoints.get(state.endpoint).clone();
            let endpoint = rpc.endpoint();

            let fetched = until_cancelled(
                cancel,
                self.cache.get(rpc.as_ref(), self.commitment, state.force_refresh),
            )
            .await?;
            let blockhash = match fetched {
                Ok(hash) => hash,
                Err(failure) => {
                    self.handle_transport(&mut state, failure, &endpoint, cancel).await?;
                    continue;
                }
            };
            state.force_refresh = false;

            let ix = (plan.build)(&creators)?;
            let signers = signer_set(
                &fee_payer,
                plan.authority.as_ref(),
                self.authority_override.as_ref(),
                &creators,
            );
            let assembled = self.assembler.assemble(ix, &signers, &fee_payer, blockhash);
            let signers = assembled.signers;
            let signed = until_cancelled(cancel, signer.sign(assembled.transaction)).await??;

            let missing = find_missing_signatures(&signed, &creators);
            if !missing.is_empty() {
                if state.presign_downgrade_used {
                    return Err(LedgerError::Signer(format!(
                        "creators still unsigned after downgrade: {missing:?}"
                    ))
                    .into());
                }
                warn!(
                    target: "ogal",
                    operation = plan.label,
                    missing = ?missing,
                    "signer cannot sign for verified creators; downgrading"
                );
                state.presign_downgrade_used = true;
                creators = downgrade(&creators, &missing);
                push_unique(&mut downgraded, &missing);
                continue;
            }

            let transaction = serialize_base58(&signed);
            state.submissions += 1;
            debug!(target: "ogal", operation = plan.label, %endpoint, submission = state.submissions, "sending transaction");

            let options = SendOptions {
                skip_preflight: self.skip_preflight,
                commitment: self.commitment,
            };
            let step = match until_cancelled(cancel, rpc.send_transaction(&signed, options)).await? {
                Ok(signature) => {
                    info!(target: "ogal", operation = plan.label, %signature, %endpoint, "transaction accepted");
                    self.await_confirmation(rpc.as_ref(), signature, cancel).await?
                }
                Err(f) if f.is_transport() => SendStep::Transport(f),
                Err(f) => SendStep::Rejected(f),
            };

            match step {
                SendStep::Accepted(signature, confirmed) => {
                    return Ok(SubmissionOutcome {
                        signature,
                        confirmed,
                        creators,
                        creators_downgraded: downgraded,
                        signers,
                        attempts: state.submissions,
                        endpoint,
                    });
                }
                SendStep::Transport(failure) => {
                    self.handle_transport(&mut state, failure, &endpoint, cancel).await?;
                }
                SendStep::Rejected(failure) => {
                    match on_rejection(&mut state, &failure, &self.codes, &creators) {
                        RejectionDecision::DowngradeAllAndResubmit => {
                            let cleared = verified_addresses(&creators);
                            warn!(
                                target: "ogal",
                                operation = plan.label,
                                cleared = ?cleared,
                                "program reported unsigned verified creators; retrying with all creators unverified"
                            );
                            creators = downgrade_all(&creators);
                            push_unique(&mut downgraded, &cleared);
                        }
                        RejectionDecision::CreatorSignatureMismatch => {
                            return Err(LedgerError::CreatorSignatureMismatch {
                                code: self.codes.creator_signature_mismatch,
                                reason: failure.reason,
                                raw_response: failure.raw_response,
                                transaction,
                            }
                            .into());
                        }
                        RejectionDecision::GuardRail => {
                            return Err(SubmitError::GuardRailRejected { failure, transaction });
                        }
                        RejectionDecision::Fatal => {
                            return Err(LedgerError::ProgramRejected {
                                code: failure.code(),
                                reason: failure.reason,
                                raw_response: failure.raw_response,
                                transaction,
                            }
                            .into());
                        }
                    }
                }
            }
        }
    }

    async fn handle_transport(
        &self,
        state: &mut AttemptState,
        failure: RpcFailure,
        endpoint: &str,
        cancel: &CancellationToken,
    ) -> Result<(), SubmitError> {
        if failure.stale_blockhash {
            debug!(target: "ogal", %endpoint, "blockhash expired; dropping cached entry");
            self.cache.invalidate(endpoint);
        }
        match on_transport_failure(state, &self.retry, self.endpoints.has_secondary()) {
            RetryDecision::Retry { delay } => {
                warn!(
                    target: "ogal",
                    %endpoint,
                    attempt = state.attempt,
                    delay_ms = delay.as_millis() as u64,
                    reason = %failure.reason,
                    "rpc transport failure; retrying"
                );
                until_cancelled(cancel, tokio::time::sleep(delay)).await?;
                Ok(())
            }
            RetryDecision::Failover => {
                warn!(target: "ogal", from = %endpoint, reason = %failure.reason, "failing over to secondary rpc");
                Ok(())
            }
            RetryDecision::Exhausted => Err(LedgerError::TransportExhausted {
                attempts: state.submissions,
                endpoint: endpoint.to_string(),
                reason: failure.reason,
                raw_response: failure.raw_response,
            }
            .into()),
        }
    }

    /// Poll until confirmed, errored or out of attempts. A still-pending
    /// transaction, or a status lookup that fails in transport, is reported
    /// as accepted but unconfirmed and never resubmitted.
    async fn await_confirmation(
        &self,
        rpc: &dyn crate::rpc::LedgerRpc,
        signature: Signature,
        cancel: &CancellationToken,
    ) -> LedgerResult<SendStep> {
        for poll in 0..self.confirmation.poll_attempts {
            let status = until_cancelled(cancel, rpc.get_signature_status(&signature, self.commitment)).await?;
            match status {
                Ok(SignatureStatus::Confirmed) => {
                    debug!(target: "ogal", %signature, poll, "transaction confirmed");
                    return Ok(SendStep::Accepted(signature, true));
                }
                Ok(SignatureStatus::Errored(failure)) => return Ok(SendStep::Rejected(failure)),
                Ok(SignatureStatus::Pending) => {}
                Err(failure) => {
                    warn!(target: "ogal", %signature, reason = %failure.reason, "status lookup failed; returning unconfirmed");
                    return Ok(SendStep::Accepted(signature, false));
                }
            }
            if poll + 1 < self.confirmation.poll_attempts {
                until_cancelled(cancel, tokio::time::sleep(self.poll_interval)).await?;
            }
        }
        Ok(SendStep::Accepted(signature, false))
    }
}

fn push_unique(into: &mut Vec<Pubkey>, keys: &[Pubkey]) {
    for k in keys {
        if !into.contains(k) {
            into.push(*k);
        }
    }
}

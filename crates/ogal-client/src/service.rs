//! `LedgerService`: the facade every caller goes through.
//!
//! Each operation validates locally, derives addresses, reads the registry
//! config, builds its instruction and hands a [`SubmissionPlan`] to the
//! pipeline. Nothing here is global; RPC endpoints, the chain-tip cache and the
//! signer are injected.

use std::sync::Arc;

use ogal_core::collection::{evaluate_guard_rails, GuardRailReport, GuardRailViolation};
use ogal_core::creators::sanitize_creators;
use ogal_core::state::{AuthRecord, ObjectManifest, ProgramAccount, RegistryConfig};
use solana_program::pubkey::Pubkey;
use solana_sdk::commitment_config::CommitmentConfig;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::blockhash::BlockhashCache;
use crate::config::{validate_config, LedgerConfig};
use crate::errors::{LedgerError, LedgerResult};
use crate::pda::{derive_associated_token_account, CollectionPdas, ExpectedBumps, RegistryPdas};
use crate::pipeline::{until_cancelled, SubmissionPipeline, SubmissionPlan, SubmitError};
use crate::registry_client::{MintAccounts, MintArgs, RegistryClient};
use crate::request::{
    AdminOutcome, ConfigView, ManifestView, MintOutcome, MintRequest, UpdateManifestOutcome,
    UpdateManifestRequest,
};
use crate::rpc::{RawAccount, RpcEndpoints, RpcFailure, SolanaRpc};
use crate::signer::TransactionSigner;

pub struct LedgerService {
    config: LedgerConfig,
    endpoints: RpcEndpoints,
    pipeline: SubmissionPipeline,
    signer: Arc<dyn TransactionSigner>,
    client: RegistryClient,
    commitment: CommitmentConfig,
}

impl std::fmt::Debug for LedgerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerService")
            .field("program_id", &self.config.program_id)
            .field("namespace", &self.config.namespace)
            .field("endpoints", &self.endpoints)
            .field("fee_payer", &self.signer.fee_payer())
            .finish()
    }
}

/// Registry state every write operation starts from.
struct Loaded {
    pdas: RegistryPdas,
    config: RegistryConfig,
}

impl LedgerService {
    pub fn new(
        config: LedgerConfig,
        endpoints: RpcEndpoints,
        cache: Arc<BlockhashCache>,
        signer: Arc<dyn TransactionSigner>,
    ) -> LedgerResult<Self> {
        validate_config(&config)?;
        let pipeline = SubmissionPipeline::new(endpoints.clone(), cache, &config);
        Ok(Self {
            client: RegistryClient::new(config.program_id),
            commitment: config.rpc.commitment.as_config(),
            config,
            endpoints,
            pipeline,
            signer,
        })
    }

    /// Service over `solana-client` endpoints taken from `config.rpc`.
    pub fn connect(config: LedgerConfig, signer: Arc<dyn TransactionSigner>) -> LedgerResult<Self> {
        validate_config(&config)?;
        let commitment = config.rpc.commitment.as_config();
        let primary: Arc<dyn crate::rpc::LedgerRpc> =
            Arc::new(SolanaRpc::new(&config.rpc.primary_url, commitment));
        let secondary = config.rpc.secondary_url.as_deref().map(|url| {
            Arc::new(SolanaRpc::new(url, commitment)) as Arc<dyn crate::rpc::LedgerRpc>
        });
        let cache = Arc::new(BlockhashCache::new(config.blockhash_ttl()));
        Self::new(config, RpcEndpoints::new(primary, secondary), cache, signer)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn fee_payer(&self) -> Pubkey {
        self.signer.fee_payer()
    }

    /// Registry PDAs for the configured namespace, checked against pinned bumps.
    pub fn registry_pdas(&self, extra: ExpectedBumps) -> LedgerResult<RegistryPdas> {
        RegistryPdas::derive(
            &self.config.program_id,
            &self.config.namespace,
            &extra.or(self.config.expected_bumps.as_expected()),
        )
    }

    #[instrument(name = "ledger", skip_all, fields(operation = "fetch_config", operation_id = %Uuid::new_v4()))]
    pub async fn fetch_config(&self, cancel: &CancellationToken) -> LedgerResult<ConfigView> {
        let loaded = self.load_registry(ExpectedBumps::default(), cancel).await?;
        let auth_record = match self.fetch_account(&loaded.pdas.auth.address, cancel).await? {
            Some(account) => {
                let record = AuthRecord::decode_account(&account.data, &account.owner, &self.config.program_id)?;
                if record.config != loaded.pdas.config.address || record.bump != loaded.pdas.auth.bump {
                    warn!(
                        target: "ogal",
                        auth = %loaded.pdas.auth.address,
                        recorded_config = %record.config,
                        recorded_bump = record.bump,
                        "auth record does not point back at this config"
                    );
                }
                Some(record)
            }
            None => None,
        };
        Ok(ConfigView {
            address: loaded.pdas.config.address,
            auth: loaded.pdas.auth.address,
            config: loaded.config,
            auth_record,
        })
    }

    #[instrument(name = "ledger", skip_all, fields(operation = "fetch_manifest", operation_id = %Uuid::new_v4()))]
    pub async fn fetch_manifest(&self, object_id: u64, cancel: &CancellationToken) -> LedgerResult<ManifestView> {
        let pdas = self.registry_pdas(ExpectedBumps::default())?;
        let object = pdas.object(object_id, &ExpectedBumps::default())?;
        let address = object.manifest.address;
        let account = self.require_account("object manifest", &address, cancel).await?;
        let manifest = ObjectManifest::decode_account(&account.data, &account.owner, &self.config.program_id)?;
        Ok(ManifestView { address, manifest })
    }

    /// Read-only run of both collection guard rails.
    #[instrument(name = "ledger", skip_all, fields(operation = "check_collection", operation_id = %Uuid::new_v4()))]
    pub async fn check_collection(&self, cancel: &CancellationToken) -> LedgerResult<GuardRailReport> {
        let pdas = self.registry_pdas(ExpectedBumps::default())?;
        self.evaluate_collection(&pdas, cancel).await
    }

    #[instrument(name = "ledger", skip_all, fields(operation = "mint", object_id = request.object_id, operation_id = %Uuid::new_v4()))]
    pub async fn mint(&self, request: MintRequest, cancel: &CancellationToken) -> LedgerResult<MintOutcome> {
        request.validate()?;
        let loaded = self.load_registry(request.expected_bumps, cancel).await?;
        if loaded.config.paused {
            return Err(LedgerError::RegistryPaused);
        }
        let expected = request.expected_bumps.or(self.config.expected_bumps.as_expected());
        let object = loaded.pdas.object(request.object_id, &expected)?;

        let report = self.evaluate_collection(&loaded.pdas, cancel).await?;
        if let Some(violation) = report.violation {
            warn!(target: "ogal", %violation, "collection guard rail failed before submission");
            return Err(LedgerError::CollectionGuardRailViolation {
                violation,
                transaction: None,
            });
        }
        let collection = self.collection_pdas()?;

        let fee_payer = self.signer.fee_payer();
        let sanitized = sanitize_creators(&request.creators, &fee_payer, &self.signer.signing_keys())?;
        if !sanitized.downgraded.is_empty() {
            info!(target: "ogal", downgraded = ?sanitized.downgraded, "creators the signer cannot sign for were downgraded");
        }

        let recipient = request.recipient.unwrap_or(fee_payer);
        let recipient_token_account = derive_associated_token_account(&recipient, &object.mint.address)?.address;
        // The program does not require the authority to sign a mint, so it only
        // co-signs when the signer holds the key.
        let authority = self.config.authority_override.unwrap_or(loaded.config.authority);
        let cosigner = self.signer.signing_keys().contains(&authority).then_some(authority);
        let accounts = MintAccounts {
            authority,
            payer: fee_payer,
            recipient,
            recipient_token_account,
            collection,
        };
        let args = MintArgs {
            manifest_uri: request.manifest_uri,
            manifest_hash: request.manifest_hash,
            metadata_name: request.metadata_name,
            metadata_symbol: request.metadata_symbol,
            seller_fee_basis_points: request.seller_fee_basis_points,
        };

        let client = self.client;
        let (registry, obj) = (loaded.pdas.clone(), object.clone());
        let plan = SubmissionPlan {
            label: "mint",
            creators: sanitized.creators,
            downgraded: sanitized.downgraded,
            authority: cosigner,
            build: Box::new(move |creators| Ok(client.ix_mint_object(&registry, &obj, &accounts, &args, creators))),
        };

        let submission = match self.pipeline.submit(plan, self.signer.as_ref(), cancel).await {
            Ok(outcome) => outcome,
            Err(SubmitError::Ledger(e)) => return Err(e),
            Err(SubmitError::GuardRailRejected { failure, transaction }) => {
                return Err(self
                    .explain_guard_rail_rejection(&loaded.pdas, failure, transaction, cancel)
                    .await);
            }
        };

        info!(target: "ogal", object_id = object.object_id, signature = %submission.signature, "object minted");
        Ok(MintOutcome {
            object_id: object.object_id,
            manifest: object.manifest.address,
            mint: object.mint.address,
            metadata: object.metadata,
            master_edition: object.master_edition,
            recipient_token_account,
            submission,
        })
    }

    #[instrument(name = "ledger", skip_all, fields(operation = "update_manifest", operation_id = %Uuid::new_v4()))]
    pub async fn update_manifest(
        &self,
        request: UpdateManifestRequest,
        cancel: &CancellationToken,
    ) -> LedgerResult<UpdateManifestOutcome> {
        request.validate()?;
        let loaded = self.load_registry(ExpectedBumps::default(), cancel).await?;
        let object = loaded
            .pdas
            .object(request.object_id, &self.config.expected_bumps.as_expected())?;
        let account = self
            .require_account("object manifest", &object.manifest.address, cancel)
            .await?;
        let manifest = ObjectManifest::decode_account(&account.data, &account.owner, &self.config.program_id)?;
        if manifest.mint != object.mint.address {
            return Err(LedgerError::NotReady(format!(
                "manifest {} records mint {}, derived {}",
                object.manifest.address, manifest.mint, object.mint.address
            )));
        }

        let owner = self.signer.fee_payer();
        let owner_token_account = derive_associated_token_account(&owner, &object.mint.address)?.address;
        let ix = self.client.ix_update_manifest(
            &loaded.pdas,
            &object,
            &owner,
            &owner_token_account,
            request.manifest_hash,
            &request.metadata_uri,
            request.is_active,
        );
        let submission = self
            .submit(SubmissionPlan::fixed("update_manifest", ix, None), cancel)
            .await?;
        Ok(UpdateManifestOutcome {
            object_id: request.object_id,
            manifest: object.manifest.address,
            submission,
        })
    }

    #[instrument(name = "ledger", skip_all, fields(operation = "set_authority", operation_id = %Uuid::new_v4()))]
    pub async fn set_authority(&self, new_authority: Pubkey, cancel: &CancellationToken) -> LedgerResult<AdminOutcome> {
        let loaded = self.load_registry(ExpectedBumps::default(), cancel).await?;
        let authority = self.admin_key(&loaded.config)?;
        let ix = self.client.ix_set_authority(&loaded.pdas, &authority, new_authority);
        self.submit_admin("set_authority", ix, loaded.config.authority, loaded.pdas.config.address, cancel)
            .await
    }

    #[instrument(name = "ledger", skip_all, fields(operation = "set_paused", operation_id = %Uuid::new_v4()))]
    pub async fn set_paused(&self, paused: bool, cancel: &CancellationToken) -> LedgerResult<AdminOutcome> {
        let loaded = self.load_registry(ExpectedBumps::default(), cancel).await?;
        let authority = self.admin_key(&loaded.config)?;
        if loaded.config.paused == paused {
            debug!(target: "ogal", paused, "registry already in requested pause state");
        }
        let ix = self.client.ix_set_paused(&loaded.pdas, &authority, paused);
        self.submit_admin("set_paused", ix, loaded.config.authority, loaded.pdas.config.address, cancel)
            .await
    }

    #[instrument(name = "ledger", skip_all, fields(operation = "migrate_namespace", operation_id = %Uuid::new_v4()))]
    pub async fn migrate_namespace(&self, new_namespace: Pubkey, cancel: &CancellationToken) -> LedgerResult<AdminOutcome> {
        if new_namespace == self.config.namespace {
            return Err(LedgerError::invalid_input("new namespace equals the current namespace"));
        }
        let loaded = self.load_registry(ExpectedBumps::default(), cancel).await?;
        let authority = self.admin_key(&loaded.config)?;
        let target = RegistryPdas::derive(&self.config.program_id, &new_namespace, &ExpectedBumps::default())?;
        if self.fetch_account(&target.config.address, cancel).await?.is_some() {
            return Err(LedgerError::NotReady(format!(
                "config for namespace {new_namespace} already exists at {}",
                target.config.address
            )));
        }
        let ix = self.client.ix_migrate_namespace(&loaded.pdas, &target, &authority);
        self.submit_admin("migrate_namespace", ix, loaded.config.authority, target.config.address, cancel)
            .await
    }

    #[instrument(name = "ledger", skip_all, fields(operation = "rotate_collection_authority", operation_id = %Uuid::new_v4()))]
    pub async fn rotate_collection_authority(
        &self,
        new_update_authority: Pubkey,
        cancel: &CancellationToken,
    ) -> LedgerResult<AdminOutcome> {
        let loaded = self.load_registry(ExpectedBumps::default(), cancel).await?;
        let authority = self.admin_key(&loaded.config)?;
        let collection = self.collection_pdas()?;
        let ix = self.client.ix_rotate_collection_authority(
            &loaded.pdas,
            &authority,
            &collection,
            new_update_authority,
        );
        self.submit_admin("rotate_collection_authority", ix, loaded.config.authority, collection.metadata, cancel)
            .await
    }

    async fn submit_admin(
        &self,
        label: &'static str,
        ix: solana_program::instruction::Instruction,
        registry_authority: Pubkey,
        target: Pubkey,
        cancel: &CancellationToken,
    ) -> LedgerResult<AdminOutcome> {
        let submission = self
            .submit(SubmissionPlan::fixed(label, ix, Some(registry_authority)), cancel)
            .await?;
        info!(target: "ogal", operation = label, signature = %submission.signature, "admin operation submitted");
        Ok(AdminOutcome {
            operation: label,
            target,
            submission,
        })
    }

    async fn submit(
        &self,
        plan: SubmissionPlan,
        cancel: &CancellationToken,
    ) -> LedgerResult<crate::pipeline::SubmissionOutcome> {
        match self.pipeline.submit(plan, self.signer.as_ref(), cancel).await {
            Ok(outcome) => Ok(outcome),
            Err(SubmitError::Ledger(e)) => Err(e),
            // Only mints touch the collection; anything else is a plain rejection.
            Err(SubmitError::GuardRailRejected { failure, transaction }) => Err(LedgerError::ProgramRejected {
                code: failure.code(),
                reason: failure.reason,
                raw_response: failure.raw_response,
                transaction,
            }),
        }
    }

    /// The key admin operations are signed with: the configured override, or
    /// the authority recorded in the registry config.
    fn admin_key(&self, config: &RegistryConfig) -> LedgerResult<Pubkey> {
        let key = self.config.authority_override.unwrap_or(config.authority);
        if !self.signer.signing_keys().contains(&key) {
            return Err(LedgerError::NotReady(format!(
                "signer cannot sign for registry authority {key}"
            )));
        }
        Ok(key)
    }

    fn collection_pdas(&self) -> LedgerResult<CollectionPdas> {
        let mint = self
            .config
            .collection_mint
            .ok_or_else(|| LedgerError::NotReady("collection_mint is not configured".into()))?;
        CollectionPdas::derive(&mint)
    }

    async fn evaluate_collection(&self, pdas: &RegistryPdas, cancel: &CancellationToken) -> LedgerResult<GuardRailReport> {
        let collection = self.collection_pdas()?;
        let metadata = self.fetch_account(&collection.metadata, cancel).await?;
        let edition = self.fetch_account(&collection.master_edition, cancel).await?;
        let report = evaluate_guard_rails(
            metadata.as_ref().map(RawAccount::view),
            edition.as_ref().map(RawAccount::view),
            &pdas.auth.address,
        );
        debug!(
            target: "ogal",
            collection = %collection.mint,
            passed = report.passed(),
            uniqueness_skipped = report.uniqueness_skipped,
            "collection guard rails evaluated"
        );
        Ok(report)
    }

    /// After a guard-rail rejection, re-read the collection so the error names
    /// the state that caused it.
    async fn explain_guard_rail_rejection(
        &self,
        pdas: &RegistryPdas,
        failure: RpcFailure,
        transaction: Option<String>,
        cancel: &CancellationToken,
    ) -> LedgerError {
        let report = match self.evaluate_collection(pdas, cancel).await {
            Ok(report) => Some(report),
            Err(LedgerError::Cancelled) => return LedgerError::Cancelled,
            Err(e) => {
                warn!(target: "ogal", error = %e, "collection re-read failed; reporting the program's code");
                None
            }
        };
        let (violation, metadata, edition) = match report {
            Some(r) => (r.violation, r.metadata, r.master_edition),
            None => (None, None, None),
        };
        let violation = match violation {
            Some(v) => v,
            None if failure.matches_code(self.config.error_codes.collection_authority_mismatch) => {
                GuardRailViolation::CollectionAuthorityMismatch {
                    expected: pdas.auth.address,
                    actual: metadata.map(|m| m.update_authority).unwrap_or(pdas.auth.address),
                }
            }
            None => GuardRailViolation::MasterEditionNotUnique {
                max_supply: edition.and_then(|e| e.max_supply),
                detail: failure.reason.clone(),
            },
        };
        warn!(target: "ogal", %violation, reason = %failure.reason, "program rejected mint on a collection guard rail");
        LedgerError::CollectionGuardRailViolation { violation, transaction }
    }

    /// Derive registry PDAs, read the config and check its recorded bumps.
    async fn load_registry(&self, extra: ExpectedBumps, cancel: &CancellationToken) -> LedgerResult<Loaded> {
        let pdas = self.registry_pdas(extra)?;
        let account = self.require_account("registry config", &pdas.config.address, cancel).await?;
        let config = RegistryConfig::decode_account(&account.data, &account.owner, &self.config.program_id)?;

        for (label, recorded, derived) in [
            ("config", config.config_bump, pdas.config.bump),
            ("auth", config.auth_bump, pdas.auth.bump),
        ] {
            if recorded != derived {
                return Err(LedgerError::BumpMismatch {
                    label: label.to_string(),
                    expected: recorded,
                    derived,
                });
            }
        }
        debug!(target: "ogal", config = %pdas.config.address, paused = config.paused, objects = config.object_count, "registry config loaded");
        Ok(Loaded { pdas, config })
    }

    async fn require_account(&self, label: &str, address: &Pubkey, cancel: &CancellationToken) -> LedgerResult<RawAccount> {
        self.fetch_account(address, cancel)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound {
                label: label.to_string(),
                address: *address,
            })
    }

    /// Read one account, falling back to the secondary endpoint on a
    /// transport failure.
    async fn fetch_account(&self, address: &Pubkey, cancel: &CancellationToken) -> LedgerResult<Option<RawAccount>> {
        let mut last: Option<(String, RpcFailure)> = None;
        let candidates = std::iter::once(&self.endpoints.primary).chain(self.endpoints.secondary.iter());
        for rpc in candidates {
            match until_cancelled(cancel, rpc.get_account(address, self.commitment)).await? {
                Ok(account) => return Ok(account),
                Err(failure) if failure.is_transport() => {
                    warn!(target: "ogal", endpoint = %rpc.endpoint(), %address, reason = %failure.reason, "account read failed");
                    last = Some((rpc.endpoint(), failure));
                }
                Err(failure) => {
                    return Err(LedgerError::ProgramRejected {
                        code: failure.code(),
                        reason: failure.reason,
                        raw_response: failure.raw_response,
                        transaction: None,
                    })
                }
            }
        }
        let (endpoint, failure) = last.unwrap_or_else(|| (self.endpoints.primary.endpoint(), RpcFailure::transport("no endpoint")));
        Err(LedgerError::TransportExhausted {
            attempts: 1 + u32::from(self.endpoints.has_secondary()),
            endpoint,
            reason: failure.reason,
            raw_response: failure.raw_response,
        })
    }
}

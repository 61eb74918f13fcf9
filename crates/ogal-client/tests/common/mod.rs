#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ogal_client::blockhash::BlockhashCache;
use ogal_client::config::LedgerConfig;
use ogal_client::constants::TOKEN_METADATA_PROGRAM_ID;
use ogal_client::pda::{CollectionPdas, ExpectedBumps, RegistryPdas};
use ogal_client::rpc::{LedgerRpc, RawAccount, RpcEndpoints, RpcFailure, SendOptions, SignatureStatus};
use ogal_client::{KeypairSigner, LedgerService, MintRequest};
use ogal_core::codec::ByteWriter;
use ogal_core::collection::edition::MASTER_EDITION_V2_KEY;
use ogal_core::collection::metadata::METADATA_V1_KEY;
use ogal_core::creators::CreatorRequest;
use ogal_core::state::{AuthRecord, ProgramAccount, RegistryConfig};
use solana_program::hash::Hash;
use solana_program::pubkey::Pubkey;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;

/// In-memory ledger node with scripted send and status results.
pub struct MockRpc {
    pub name: String,
    pub accounts: Mutex<HashMap<Pubkey, RawAccount>>,
    pub send_script: Mutex<VecDeque<Result<Signature, RpcFailure>>>,
    pub status_script: Mutex<VecDeque<Result<SignatureStatus, RpcFailure>>>,
    pub sent: Mutex<Vec<Transaction>>,
    pub blockhash_calls: AtomicUsize,
    pub blockhash_failures: AtomicUsize,
    pub status_calls: AtomicUsize,
    /// Account reads fail in transport once a transaction has been sent.
    pub reads_fail_after_send: AtomicBool,
}

impl MockRpc {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            accounts: Mutex::new(HashMap::new()),
            send_script: Mutex::new(VecDeque::new()),
            status_script: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            blockhash_calls: AtomicUsize::new(0),
            blockhash_failures: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            reads_fail_after_send: AtomicBool::new(false),
        })
    }

    pub fn put(&self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
        self.accounts.lock().unwrap().insert(
            address,
            RawAccount {
                owner,
                lamports: 1_000_000,
                data,
            },
        );
    }

    /// Queue send results; once the script runs out every send succeeds.
    pub fn script(&self, results: impl IntoIterator<Item = Result<Signature, RpcFailure>>) {
        self.send_script.lock().unwrap().extend(results);
    }

    /// Queue status results; once the script runs out every lookup is confirmed.
    pub fn script_status(&self, results: impl IntoIterator<Item = Result<SignatureStatus, RpcFailure>>) {
        self.status_script.lock().unwrap().extend(results);
    }

    pub fn blockhash_calls(&self) -> usize {
        self.blockhash_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<Transaction> {
        self.sent.lock().unwrap().clone()
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl LedgerRpc for MockRpc {
    fn endpoint(&self) -> String {
        self.name.clone()
    }

    async fn get_account(
        &self,
        address: &Pubkey,
        _: CommitmentConfig,
    ) -> Result<Option<RawAccount>, RpcFailure> {
        if self.reads_fail_after_send.load(Ordering::SeqCst) && self.send_count() > 0 {
            return Err(RpcFailure::transport("connection reset"));
        }
        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }

    async fn get_latest_blockhash(&self, _: CommitmentConfig) -> Result<Hash, RpcFailure> {
        self.blockhash_calls.fetch_add(1, Ordering::SeqCst);
        let pending = self.blockhash_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.blockhash_failures.store(pending - 1, Ordering::SeqCst);
            return Err(RpcFailure::transport("connection reset"));
        }
        Ok(Hash::new_unique())
    }

    async fn send_transaction(
        &self,
        tx: &Transaction,
        _: SendOptions,
    ) -> Result<Signature, RpcFailure> {
        self.sent.lock().unwrap().push(tx.clone());
        let next = self.send_script.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => Ok(tx.signatures[0]),
        }
    }

    async fn get_signature_status(
        &self,
        _: &Signature,
        _: CommitmentConfig,
    ) -> Result<SignatureStatus, RpcFailure> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.status_script.lock().unwrap().pop_front();
        next.unwrap_or(Ok(SignatureStatus::Confirmed))
    }
}

/// Collection metadata account with no collection details (unsized).
pub fn collection_metadata(update_authority: &Pubkey, mint: &Pubkey) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.write_u8(METADATA_V1_KEY)
        .write_pubkey(update_authority)
        .write_pubkey(mint)
        .write_string("Collection")
        .write_string("COLL")
        .write_string("https://example.org/collection.json")
        .write_u16(0)
        .write_u8(0)
        .write_bool(false)
        .write_bool(true)
        .write_u8(0)
        .write_u8(0)
        .write_u8(0)
        .write_u8(0)
        .write_u8(0)
        .write_u8(0);
    let mut data = w.into_inner();
    data.resize(679, 0);
    data
}

pub fn master_edition(max_supply: Option<u64>) -> Vec<u8> {
    let mut w = ByteWriter::new();
    w.write_u8(MASTER_EDITION_V2_KEY)
        .write_u64(0)
        .write_option(max_supply.as_ref(), |w, m| {
            w.write_u64(*m);
        });
    w.into_inner()
}

/// A registry with one collection, served by `primary` (and `secondary`).
pub struct World {
    pub program_id: Pubkey,
    pub namespace: Pubkey,
    pub authority: Pubkey,
    pub pdas: RegistryPdas,
    pub collection: CollectionPdas,
    pub primary: Arc<MockRpc>,
    pub secondary: Option<Arc<MockRpc>>,
    pub config: LedgerConfig,
}

impl World {
    /// The fee payer is the registry authority.
    pub fn new(payer: &Keypair, with_secondary: bool) -> Self {
        let program_id = Pubkey::new_unique();
        let namespace = Pubkey::new_unique();
        let authority = payer.pubkey();
        let pdas = RegistryPdas::derive(&program_id, &namespace, &ExpectedBumps::default()).unwrap();
        let collection = CollectionPdas::derive(&Pubkey::new_unique()).unwrap();

        let primary = MockRpc::new("http://primary.test");
        let secondary = with_secondary.then(|| MockRpc::new("http://secondary.test"));

        let mut config = LedgerConfig::default();
        config.program_id = program_id;
        config.namespace = namespace;
        config.collection_mint = Some(collection.mint);
        config.rpc.primary_url = primary.name.clone();
        config.rpc.secondary_url = secondary.as_ref().map(|s| s.name.clone());
        config.retry.base_delay_ms = 1;
        config.confirmation.poll_interval_ms = 1;

        let world = Self {
            program_id,
            namespace,
            authority,
            pdas,
            collection,
            primary,
            secondary,
            config,
        };
        world.set_registry(false);
        world.set_collection_authority(&world.pdas.auth.address);
        world.set_edition(Some(0));
        world
    }

    fn nodes(&self) -> Vec<&Arc<MockRpc>> {
        std::iter::once(&self.primary).chain(self.secondary.iter()).collect()
    }

    pub fn set_registry(&self, paused: bool) {
        let cfg = RegistryConfig {
            authority: self.authority,
            config_bump: self.pdas.config.bump,
            auth_bump: self.pdas.auth.bump,
            object_count: 0,
            namespace: self.namespace,
            paused,
        };
        for node in self.nodes() {
            node.put(self.pdas.config.address, self.program_id, cfg.encode_account());
        }
    }

    /// Auth account pointing back at the config with the derived bump.
    pub fn set_auth_record(&self) -> AuthRecord {
        let record = AuthRecord {
            config: self.pdas.config.address,
            bump: self.pdas.auth.bump,
        };
        for node in self.nodes() {
            node.put(self.pdas.auth.address, self.program_id, record.encode_account());
        }
        record
    }

    pub fn set_collection_authority(&self, update_authority: &Pubkey) {
        for node in self.nodes() {
            node.put(
                self.collection.metadata,
                TOKEN_METADATA_PROGRAM_ID,
                collection_metadata(update_authority, &self.collection.mint),
            );
        }
    }

    pub fn set_edition(&self, max_supply: Option<u64>) {
        for node in self.nodes() {
            node.put(
                self.collection.master_edition,
                TOKEN_METADATA_PROGRAM_ID,
                master_edition(max_supply),
            );
        }
    }

    pub fn service(&self, signer: KeypairSigner) -> LedgerService {
        let primary: Arc<dyn LedgerRpc> = self.primary.clone();
        let secondary = self.secondary.clone().map(|s| s as Arc<dyn LedgerRpc>);
        LedgerService::new(
            self.config.clone(),
            RpcEndpoints::new(primary, secondary),
            Arc::new(BlockhashCache::new(self.config.blockhash_ttl())),
            Arc::new(signer),
        )
        .unwrap()
    }
}

pub fn mint_request(object_id: u64, creators: Vec<CreatorRequest>) -> MintRequest {
    MintRequest {
        object_id,
        recipient: None,
        manifest_uri: format!("https://example.org/objects/{object_id}.json"),
        manifest_hash: [7; 32],
        metadata_name: format!("Object {object_id}"),
        metadata_symbol: "OBJ".into(),
        seller_fee_basis_points: 500,
        creators,
        expected_bumps: ExpectedBumps::default(),
    }
}

pub fn payer_creator() -> CreatorRequest {
    CreatorRequest {
        address: None,
        verified: true,
        share: 100,
    }
}

/// The registry instruction carried by `tx`.
pub fn registry_instruction(tx: &Transaction, program_id: &Pubkey) -> ogal_core::instruction::RegistryInstruction {
    let keys = &tx.message.account_keys;
    let ix = tx
        .message
        .instructions
        .iter()
        .find(|ix| keys[ix.program_id_index as usize] == *program_id)
        .expect("registry instruction present");
    ogal_core::instruction::RegistryInstruction::from_slice(&ix.data).unwrap()
}

pub fn sent_creators(tx: &Transaction, program_id: &Pubkey) -> Vec<ogal_core::creators::Creator> {
    match registry_instruction(tx, program_id) {
        ogal_core::instruction::RegistryInstruction::MintObjectNft { creators, .. } => creators,
        other => panic!("expected a mint, got {other:?}"),
    }
}

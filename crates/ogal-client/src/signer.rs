//! Signer boundary.

use async_trait::async_trait;
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use solana_sdk::transaction::Transaction;

use crate::errors::{LedgerError, LedgerResult};

/// Something that can sign registry transactions: a wallet, a hardware
/// device or in-memory keys. Signing may take arbitrarily long.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
    fn fee_payer(&self) -> Pubkey;

    /// Every key this signer can produce signatures for, fee payer included.
    fn signing_keys(&self) -> Vec<Pubkey>;

    /// Fill the signature slots this signer owns. Slots for other keys are
    /// left untouched.
    async fn sign(&self, tx: Transaction) -> LedgerResult<Transaction>;
}

/// In-memory keypairs; the first one pays fees.
pub struct KeypairSigner {
    keys: Vec<Keypair>,
}

impl KeypairSigner {
    pub fn new(fee_payer: Keypair) -> Self {
        Self {
            keys: vec![fee_payer],
        }
    }

    pub fn with_cosigner(mut self, key: Keypair) -> Self {
        if !self.keys.iter().any(|k| k.pubkey() == key.pubkey()) {
            self.keys.push(key);
        }
        self
    }
}

impl std::fmt::Debug for KeypairSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeypairSigner")
            .field("keys", &self.signing_keys())
            .finish()
    }
}

#[async_trait]
impl TransactionSigner for KeypairSigner {
    fn fee_payer(&self) -> Pubkey {
        self.keys[0].pubkey()
    }

    fn signing_keys(&self) -> Vec<Pubkey> {
        self.keys.iter().map(|k| k.pubkey()).collect()
    }

    async fn sign(&self, mut tx: Transaction) -> LedgerResult<Transaction> {
        let required = tx.message.header.num_required_signatures as usize;
        let slots = &tx.message.account_keys[..required.min(tx.message.account_keys.len())];
        let owned: Vec<&Keypair> = self
            .keys
            .iter()
            .filter(|k| slots.contains(&k.pubkey()))
            .collect();
        if owned.is_empty() {
            return Err(LedgerError::Signer(
                "none of the signer's keys are required by the transaction".into(),
            ));
        }
        let blockhash = tx.message.recent_blockhash;
        tx.try_partial_sign(&owned, blockhash)
            .map_err(|e| LedgerError::Signer(e.to_string()))?;
        Ok(tx)
    }
}

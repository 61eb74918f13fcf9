//! Transaction assembly and signature inspection.

use ogal_core::creators::{verified_addresses, Creator};
use solana_program::hash::Hash;
use solana_program::instruction::Instruction;
use solana_program::pubkey::Pubkey;
use solana_sdk::compute_budget::ComputeBudgetInstruction;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

use crate::config::ComputeBudgetConfig;

/// Unsigned transaction plus the keys expected to sign it.
#[derive(Debug, Clone)]
pub struct AssembledTransaction {
    pub transaction: Transaction,
    pub signers: Vec<Pubkey>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionAssembler {
    compute_budget: ComputeBudgetConfig,
}

impl TransactionAssembler {
    pub fn new(compute_budget: ComputeBudgetConfig) -> Self {
        Self { compute_budget }
    }

    /// Compute-budget prefix (limit, then price), then `target`.
    pub fn instructions(&self, target: Instruction) -> Vec<Instruction> {
        let mut out = Vec::with_capacity(3);
        if self.compute_budget.unit_limit > 0 {
            out.push(ComputeBudgetInstruction::set_compute_unit_limit(
                self.compute_budget.unit_limit,
            ));
        }
        if self.compute_budget.unit_price_micro_lamports > 0 {
            out.push(ComputeBudgetInstruction::set_compute_unit_price(
                self.compute_budget.unit_price_micro_lamports,
            ));
        }
        out.push(target);
        out
    }

    pub fn assemble(
        &self,
        mut target: Instruction,
        signer_set: &[Pubkey],
        fee_payer: &Pubkey,
        blockhash: Hash,
    ) -> AssembledTransaction {
        for meta in target.accounts.iter_mut() {
            if signer_set.contains(&meta.pubkey) {
                meta.is_signer = true;
            }
        }
        let mut transaction =
            Transaction::new_with_payer(&self.instructions(target), Some(fee_payer));
        transaction.message.recent_blockhash = blockhash;
        AssembledTransaction {
            transaction,
            signers: signer_set.to_vec(),
        }
    }
}

/// Fee payer first, then the authority co-signer when the operation has one
/// (the override stands in for it), then verified creators. Deduplicated,
/// order preserved.
pub fn signer_set(
    fee_payer: &Pubkey,
    authority: Option<&Pubkey>,
    authority_override: Option<&Pubkey>,
    creators: &[Creator],
) -> Vec<Pubkey> {
    let mut out = vec![*fee_payer];
    let mut push = |key: Pubkey| {
        if !out.contains(&key) {
            out.push(key);
        }
    };
    if let Some(authority) = authority {
        push(*authority_override.unwrap_or(authority));
    }
    for key in verified_addresses(creators) {
        push(key);
    }
    out
}

/// Verified creators whose signature slot is absent or still zeroed.
pub fn find_missing_signatures(tx: &Transaction, creators: &[Creator]) -> Vec<Pubkey> {
    let required = tx.message.header.num_required_signatures as usize;
    verified_addresses(creators)
        .into_iter()
        .filter(|creator| {
            let slot = tx
                .message
                .account_keys
                .iter()
                .take(required)
                .position(|k| k == creator);
            match slot.and_then(|i| tx.signatures.get(i)) {
                Some(sig) => *sig == Signature::default(),
                None => true,
            }
        })
        .collect()
}

/// Base58 of the bincode wire encoding, for diagnostics.
pub fn serialize_base58(tx: &Transaction) -> Option<String> {
    bincode::serialize(tx).ok().map(|bytes| bs58::encode(bytes).into_string())
}

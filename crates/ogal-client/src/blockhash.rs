//! Per-endpoint chain-tip cache.
//!
//! The mutex guards only the check-and-replace of an entry and is never held
//! across an `.await`; a fetch on a cache miss happens outside the lock.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use solana_program::hash::Hash;
use solana_sdk::commitment_config::CommitmentConfig;
use tracing::debug;

use crate::rpc::{LedgerRpc, RpcFailure};

#[derive(Debug, Clone, Copy)]
struct BlockhashCacheEntry {
    hash: Hash,
    fetched_at: Instant,
}

#[derive(Debug)]
pub struct BlockhashCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, BlockhashCacheEntry>>,
}

impl BlockhashCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn fresh(&self, endpoint: &str) -> Option<Hash> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries
            .get(endpoint)
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
            .map(|e| e.hash)
    }

    fn store(&self, endpoint: String, hash: Hash) {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.insert(
            endpoint,
            BlockhashCacheEntry {
                hash,
                fetched_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, endpoint: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.remove(endpoint);
    }

    /// Cached hash for `rpc`'s endpoint, fetching when stale or forced.
    pub async fn get(
        &self,
        rpc: &dyn LedgerRpc,
        commitment: CommitmentConfig,
        force_refresh: bool,
    ) -> Result<Hash, RpcFailure> {
        let endpoint = rpc.endpoint();
        if !force_refresh {
            if let Some(hash) = self.fresh(&endpoint) {
                debug!(target: "ogal", %endpoint, "blockhash cache hit");
                return Ok(hash);
            }
        }

        let hash = rpc.get_latest_blockhash(commitment).await?;
        debug!(target: "ogal", %endpoint, %hash, force_refresh, "blockhash fetched");
        self.store(endpoint, hash);
        Ok(hash)
    }
}

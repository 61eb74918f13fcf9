//! Per-invocation setup: configuration, keys, service and Ctrl-C handling.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context as _, Result};
use ogal_client::{validate_config, CancellationToken, KeypairSigner, LedgerConfig, LedgerService};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair};
use tracing::debug;

use crate::args::Cli;

/// Configuration file contents with command-line overrides applied.
pub fn load_config(cli: &Cli) -> Result<LedgerConfig> {
    let mut cfg = if cli.config.exists() {
        LedgerConfig::load(&cli.config)?
    } else if cli.config == Path::new("ogal.json") {
        debug!(target: "ogal", "no ogal.json found; using defaults");
        LedgerConfig::default()
    } else {
        return Err(anyhow!("config file {} does not exist", cli.config.display()));
    };
    if let Some(url) = &cli.rpc_url {
        cfg.rpc.primary_url = url.clone();
    }
    validate_config(&cfg)?;
    Ok(cfg)
}

pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(rest),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
}

pub fn load_keypair(path: &str) -> Result<Keypair> {
    let full = expand_home(path);
    read_keypair_file(&full).map_err(|e| anyhow!("read keypair {}: {e}", full.display()))
}

pub fn parse_pubkey(field: &str, raw: &str) -> Result<Pubkey> {
    raw.trim()
        .parse()
        .with_context(|| format!("{field} is not a base58 public key: {raw}"))
}

pub fn signer(cli: &Cli) -> Result<KeypairSigner> {
    let mut signer = KeypairSigner::new(load_keypair(&cli.keypair)?);
    if let Some(path) = &cli.authority_keypair {
        signer = signer.with_cosigner(load_keypair(path)?);
    }
    Ok(signer)
}

/// Service over the configured RPC endpoints.
pub fn service(cli: &Cli) -> Result<LedgerService> {
    let cfg = load_config(cli)?;
    Ok(LedgerService::connect(cfg, Arc::new(signer(cli)?))?)
}

/// Token cancelled on Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            child.cancel();
        }
    });
    token
}

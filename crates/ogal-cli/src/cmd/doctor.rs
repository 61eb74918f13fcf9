use anyhow::Result;
use ogal_client::{LedgerConfig, LedgerRpc, SolanaRpc};
use solana_sdk::signer::Signer;

use crate::args::Cli;
use crate::context;
use crate::output;

#[derive(Debug, serde::Serialize)]
pub struct Check {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

#[derive(Debug, serde::Serialize)]
pub struct DoctorOut {
    pub ok: bool,
    pub checks: Vec<Check>,
}

fn check(name: &str, result: Result<String>) -> Check {
    match result {
        Ok(detail) => Check {
            name: name.to_string(),
            ok: true,
            detail,
        },
        Err(e) => Check {
            name: name.to_string(),
            ok: false,
            detail: format!("{e:#}"),
        },
    }
}

async fn endpoint(url: &str, cfg: &LedgerConfig) -> Result<String> {
    let rpc = SolanaRpc::new(url, cfg.rpc.commitment.as_config());
    let hash = rpc
        .get_latest_blockhash(cfg.rpc.commitment.as_config())
        .await
        .map_err(|f| anyhow::anyhow!("{url}: {f}"))?;
    Ok(format!("{url} (blockhash {hash})"))
}

pub async fn run(cli: &Cli) -> Result<()> {
    let mut checks = Vec::new();

    let cfg = context::load_config(cli);
    checks.push(check(
        "config",
        cfg.as_ref()
            .map(|c| format!("program {} namespace {}", c.program_id, c.namespace))
            .map_err(|e| anyhow::anyhow!("{e:#}")),
    ));

    checks.push(check(
        "keypair",
        context::load_keypair(&cli.keypair).map(|k| format!("fee payer {}", k.pubkey())),
    ));
    if let Some(path) = &cli.authority_keypair {
        checks.push(check(
            "authority keypair",
            context::load_keypair(path).map(|k| format!("authority {}", k.pubkey())),
        ));
    }

    if let Ok(cfg) = &cfg {
        checks.push(check("rpc primary", endpoint(&cfg.rpc.primary_url, cfg).await));
        if let Some(url) = &cfg.rpc.secondary_url {
            checks.push(check("rpc secondary", endpoint(url, cfg).await));
        }
        checks.push(check(
            "collection mint",
            cfg.collection_mint
                .map(|m| m.to_string())
                .ok_or_else(|| anyhow::anyhow!("collection_mint is not configured; mint is unavailable")),
        ));
    }

    let ok = checks.iter().all(|c| c.ok);
    output::print(&DoctorOut { ok, checks })
}

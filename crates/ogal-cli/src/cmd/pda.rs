use anyhow::Result;
use ogal_client::pda::{CollectionPdas, ExpectedBumps, RegistryPdas};
use serde::Serialize;

use crate::args::Cli;
use crate::context;
use crate::output;

#[derive(Debug, Serialize)]
pub struct Address {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bump: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct ObjectOut {
    pub object_id: u64,
    pub manifest: Address,
    pub mint: Address,
    pub metadata: Address,
    pub master_edition: Address,
}

#[derive(Debug, Serialize)]
pub struct CollectionOut {
    pub mint: Address,
    pub metadata: Address,
    pub master_edition: Address,
}

#[derive(Debug, Serialize)]
pub struct PdaOut {
    pub program_id: String,
    pub namespace: String,
    pub config: Address,
    pub auth: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionOut>,
}

fn addr(address: impl ToString, bump: Option<u8>) -> Address {
    Address {
        address: address.to_string(),
        bump,
    }
}

/// Offline: derives addresses only.
pub fn run(cli: &Cli, object_id: Option<u64>) -> Result<()> {
    let cfg = context::load_config(cli)?;
    let expected: ExpectedBumps = cfg.expected_bumps.as_expected();
    let pdas = RegistryPdas::derive(&cfg.program_id, &cfg.namespace, &expected)?;

    let object = match object_id {
        Some(id) => {
            let o = pdas.object(id, &expected)?;
            Some(ObjectOut {
                object_id: id,
                manifest: addr(o.manifest.address, Some(o.manifest.bump)),
                mint: addr(o.mint.address, Some(o.mint.bump)),
                metadata: addr(o.metadata, None),
                master_edition: addr(o.master_edition, None),
            })
        }
        None => None,
    };
    let collection = match cfg.collection_mint {
        Some(mint) => {
            let c = CollectionPdas::derive(&mint)?;
            Some(CollectionOut {
                mint: addr(c.mint, None),
                metadata: addr(c.metadata, None),
                master_edition: addr(c.master_edition, None),
            })
        }
        None => None,
    };

    output::print(&PdaOut {
        program_id: cfg.program_id.to_string(),
        namespace: cfg.namespace.to_string(),
        config: addr(pdas.config.address, Some(pdas.config.bump)),
        auth: addr(pdas.auth.address, Some(pdas.auth.bump)),
        object,
        collection,
    })
}

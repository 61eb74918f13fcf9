use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "ogal", version, about = "Owner-governed asset ledger CLI")]
pub struct Cli {
    /// Emit JSON output on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Client configuration file (JSON).
    #[arg(long, global = true, default_value = "ogal.json")]
    pub config: PathBuf,

    /// Override rpc.primary_url from the configuration.
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// Fee payer keypair file.
    #[arg(long, global = true, default_value = "~/.config/solana/id.json")]
    pub keypair: String,

    /// Extra keypair that can sign as registry authority.
    #[arg(long, global = true)]
    pub authority_keypair: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the registry, object and collection addresses.
    Pda {
        /// Also derive the manifest and mint PDAs of this object.
        #[arg(long)]
        object_id: Option<u64>,
    },

    /// Fetch and decode the registry config.
    Config,

    /// Fetch and decode one object manifest.
    Manifest { object_id: u64 },

    /// Run the collection guard rails without submitting anything.
    CheckCollection,

    /// Mint an object from a JSON mint request.
    Mint {
        /// Path to a MintRequest JSON file.
        request: PathBuf,
    },

    /// Update an object's manifest hash and URI.
    UpdateManifest {
        object_id: u64,
        #[arg(long)]
        hash: String,
        #[arg(long)]
        uri: String,
        /// Mark the object inactive.
        #[arg(long)]
        retire: bool,
    },

    /// Hand registry authority to another key.
    SetAuthority { new_authority: String },

    /// Pause or resume minting.
    SetPaused {
        #[arg(value_parser = clap::builder::BoolishValueParser::new())]
        paused: bool,
    },

    /// Move the registry config to a new namespace.
    MigrateNamespace { new_namespace: String },

    /// Give the collection's update authority to another key.
    RotateCollectionAuthority { new_update_authority: String },

    /// Hash a manifest file (sha256, hex).
    Hash { path: PathBuf },

    /// Check configuration, keypair and RPC reachability.
    Doctor,
}

use anyhow::Result;

use crate::args::{Cli, Command};

mod admin;
mod doctor;
mod hash;
mod inspect;
mod mint;
mod pda;

pub async fn dispatch(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Pda { object_id } => pda::run(&cli, *object_id),
        Command::Config => inspect::config(&cli).await,
        Command::Manifest { object_id } => inspect::manifest(&cli, *object_id).await,
        Command::CheckCollection => inspect::check_collection(&cli).await,
        Command::Mint { request } => mint::mint(&cli, request).await,
        Command::UpdateManifest { object_id, hash, uri, retire } => {
            mint::update_manifest(&cli, *object_id, hash, uri, !*retire).await
        }
        Command::SetAuthority { new_authority } => admin::set_authority(&cli, new_authority).await,
        Command::SetPaused { paused } => admin::set_paused(&cli, *paused).await,
        Command::MigrateNamespace { new_namespace } => admin::migrate_namespace(&cli, new_namespace).await,
        Command::RotateCollectionAuthority { new_update_authority } => {
            admin::rotate_collection_authority(&cli, new_update_authority).await
        }
        Command::Hash { path } => hash::run(path),
        Command::Doctor => doctor::run(&cli).await,
    }
}

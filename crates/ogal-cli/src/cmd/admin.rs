use anyhow::Result;
use ogal_client::AdminOutcome;

use crate::args::Cli;
use crate::cmd::mint::report_submission;
use crate::context;
use crate::output;

async fn finish(label: &str, fut: impl std::future::Future<Output = ogal_client::LedgerResult<AdminOutcome>>) -> Result<()> {
    let pb = output::spinner(label);
    let result = fut.await;
    pb.finish_and_clear();
    let outcome = result?;
    report_submission(outcome.operation, &outcome.submission);
    output::print(&outcome)
}

pub async fn set_authority(cli: &Cli, new_authority: &str) -> Result<()> {
    let new_authority = context::parse_pubkey("new authority", new_authority)?;
    let service = context::service(cli)?;
    let cancel = context::cancel_on_ctrl_c();
    finish("setting authority", service.set_authority(new_authority, &cancel)).await
}

pub async fn set_paused(cli: &Cli, paused: bool) -> Result<()> {
    let service = context::service(cli)?;
    let cancel = context::cancel_on_ctrl_c();
    let label = if paused { "pausing registry" } else { "resuming registry" };
    finish(label, service.set_paused(paused, &cancel)).await
}

pub async fn migrate_namespace(cli: &Cli, new_namespace: &str) -> Result<()> {
    let new_namespace = context::parse_pubkey("new namespace", new_namespace)?;
    let service = context::service(cli)?;
    let cancel = context::cancel_on_ctrl_c();
    finish("migrating namespace", service.migrate_namespace(new_namespace, &cancel)).await
}

pub async fn rotate_collection_authority(cli: &Cli, new_update_authority: &str) -> Result<()> {
    let new_update_authority = context::parse_pubkey("new update authority", new_update_authority)?;
    let service = context::service(cli)?;
    let cancel = context::cancel_on_ctrl_c();
    finish(
        "rotating collection authority",
        service.rotate_collection_authority(new_update_authority, &cancel),
    )
    .await
}

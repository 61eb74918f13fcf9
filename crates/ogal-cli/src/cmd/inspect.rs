use anyhow::Result;
use termcolor::Color;

use crate::args::Cli;
use crate::context;
use crate::output;

pub async fn config(cli: &Cli) -> Result<()> {
    let service = context::service(cli)?;
    let view = service.fetch_config(&context::cancel_on_ctrl_c()).await?;
    if view.config.paused {
        output::status("paused", Color::Yellow, "minting is paused");
    }
    output::print(&view)
}

pub async fn manifest(cli: &Cli, object_id: u64) -> Result<()> {
    let service = context::service(cli)?;
    let view = service
        .fetch_manifest(object_id, &context::cancel_on_ctrl_c())
        .await?;
    output::print(&view)
}

pub async fn check_collection(cli: &Cli) -> Result<()> {
    let service = context::service(cli)?;
    let report = service.check_collection(&context::cancel_on_ctrl_c()).await?;
    match &report.violation {
        None => output::status("ok", Color::Green, "collection guard rails pass"),
        Some(v) => output::status("blocked", Color::Red, &v.to_string()),
    }
    output::print(&report)
}

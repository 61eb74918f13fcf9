use std::path::Path;

use anyhow::{Context as _, Result};
use ogal_client::{MintRequest, SubmissionOutcome, UpdateManifestRequest};
use ogal_core::hashing::parse_hash_hex;
use termcolor::Color;

use crate::args::Cli;
use crate::context;
use crate::output;

pub fn read_request(path: &Path) -> Result<MintRequest> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid mint request in {}", path.display()))
}

pub fn report_submission(what: &str, s: &SubmissionOutcome) {
    if !s.creators_downgraded.is_empty() {
        output::status(
            "downgraded",
            Color::Yellow,
            &format!("{} creator(s) submitted unverified", s.creators_downgraded.len()),
        );
    }
    if s.confirmed {
        output::status("confirmed", Color::Green, &format!("{what} {}", s.signature));
    } else {
        output::status(
            "submitted",
            Color::Yellow,
            &format!("{what} {} accepted but not yet confirmed", s.signature),
        );
    }
}

pub async fn mint(cli: &Cli, request: &Path) -> Result<()> {
    let request = read_request(request)?;
    let service = context::service(cli)?;

    let pb = output::spinner(&format!("minting object {}", request.object_id));
    let result = service.mint(request, &context::cancel_on_ctrl_c()).await;
    pb.finish_and_clear();

    let outcome = result?;
    report_submission("mint", &outcome.submission);
    output::print(&outcome)
}

pub async fn update_manifest(cli: &Cli, object_id: u64, hash: &str, uri: &str, is_active: bool) -> Result<()> {
    let request = UpdateManifestRequest {
        object_id,
        manifest_hash: parse_hash_hex(hash)?,
        metadata_uri: uri.to_string(),
        is_active,
    };
    let service = context::service(cli)?;

    let pb = output::spinner(&format!("updating manifest of object {object_id}"));
    let result = service.update_manifest(request, &context::cancel_on_ctrl_c()).await;
    pb.finish_and_clear();

    let outcome = result?;
    report_submission("update", &outcome.submission);
    output::print(&outcome)
}

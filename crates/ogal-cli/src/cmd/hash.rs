use std::path::Path;

use anyhow::{Context as _, Result};
use ogal_core::hashing::{hash_hex, manifest_hash};
use serde::Serialize;

use crate::output;

#[derive(Debug, Serialize)]
pub struct HashOut {
    pub path: String,
    pub bytes: usize,
    pub sha256: String,
}

pub fn hash_file(path: &Path) -> Result<HashOut> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok(HashOut {
        path: path.display().to_string(),
        bytes: bytes.len(),
        sha256: hash_hex(&manifest_hash(&bytes)),
    })
}

pub fn run(path: &Path) -> Result<()> {
    output::print(&hash_file(path)?)
}

//! Pre-mint guard rails over the collection's token-metadata accounts.
//!
//! The program refuses to mint into a collection whose update authority is
//! not the registry's auth PDA, and into an unsized collection whose master
//! edition is not a one-of-one. Both conditions live in mutable foreign
//! accounts, so they are re-checked against fresh bytes before every mint.

pub mod edition;
pub mod metadata;

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

pub use edition::{EditionFormat, MasterEditionInfo};
pub use metadata::{CollectionMetadataInfo, CollectionSizing};

/// Token-metadata program id.
pub const TOKEN_METADATA_PROGRAM_ID: Pubkey =
    solana_program::pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// Borrowed view of a fetched foreign account.
#[derive(Debug, Clone, Copy)]
pub struct AccountRef<'a> {
    pub owner: &'a Pubkey,
    pub data: &'a [u8],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum GuardRailViolation {
    #[error("collection metadata unavailable: {reason}")]
    MetadataUnavailable { reason: String },

    #[error("collection update authority is {actual}, expected registry auth {expected}")]
    CollectionAuthorityMismatch {
        #[serde(with = "crate::serde_pubkey")]
        expected: Pubkey,
        #[serde(with = "crate::serde_pubkey")]
        actual: Pubkey,
    },

    #[error("collection master edition is not unique (max supply {max_supply:?}): {detail}")]
    MasterEditionNotUnique {
        max_supply: Option<u64>,
        detail: String,
    },
}

/// Decode the collection metadata and require `expected_authority` as its
/// update authority.
pub fn check_collection_authority(
    metadata: Option<AccountRef<'_>>,
    expected_authority: &Pubkey,
) -> Result<CollectionMetadataInfo, GuardRailViolation> {
    let account = metadata.ok_or_else(|| GuardRailViolation::MetadataUnavailable {
        reason: "account not found".into(),
    })?;
    if account.owner != &TOKEN_METADATA_PROGRAM_ID {
        return Err(GuardRailViolation::MetadataUnavailable {
            reason: format!("owned by {} instead of token metadata", account.owner),
        });
    }
    let info = CollectionMetadataInfo::parse(account.data).map_err(|e| {
        GuardRailViolation::MetadataUnavailable {
            reason: e.to_string(),
        }
    })?;
    if &info.update_authority != expected_authority {
        return Err(GuardRailViolation::CollectionAuthorityMismatch {
            expected: *expected_authority,
            actual: info.update_authority,
        });
    }
    Ok(info)
}

/// Require the collection master edition to be a one-of-one.
pub fn check_master_edition_unique(
    edition: Option<AccountRef<'_>>,
) -> Result<MasterEditionInfo, GuardRailViolation> {
    let not_unique = |max_supply, detail: String| GuardRailViolation::MasterEditionNotUnique {
        max_supply,
        detail,
    };

    let account = edition.ok_or_else(|| not_unique(None, "master edition account not found".into()))?;
    if account.owner != &TOKEN_METADATA_PROGRAM_ID {
        return Err(not_unique(
            None,
            format!("master edition owned by {}", account.owner),
        ));
    }
    let info = MasterEditionInfo::parse(account.data)
        .map_err(|e| not_unique(None, format!("undecodable master edition: {e}")))?;
    if !info.is_unique() {
        let detail = match info.max_supply {
            None => "max supply is unlimited".to_string(),
            Some(n) => format!("max supply is {n}, expected 0"),
        };
        return Err(not_unique(info.max_supply, detail));
    }
    Ok(info)
}

/// Outcome of both guard rails, for read-only inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardRailReport {
    pub metadata: Option<CollectionMetadataInfo>,
    pub master_edition: Option<MasterEditionInfo>,
    /// `true` when the edition check was skipped for a sized collection.
    pub uniqueness_skipped: bool,
    pub violation: Option<GuardRailViolation>,
}

impl GuardRailReport {
    pub fn passed(&self) -> bool {
        self.violation.is_none()
    }
}

/// Run the authority check, then the uniqueness check unless the collection
/// is sized. Stops at the first violation.
pub fn evaluate_guard_rails(
    metadata: Option<AccountRef<'_>>,
    edition: Option<AccountRef<'_>>,
    expected_authority: &Pubkey,
) -> GuardRailReport {
    let mut report = GuardRailReport {
        metadata: None,
        master_edition: None,
        uniqueness_skipped: false,
        violation: None,
    };

    let info = match check_collection_authority(metadata, expected_authority) {
        Ok(info) => info,
        Err(v) => {
            // Keep whatever was decodable for the report.
            report.metadata = metadata
                .filter(|a| a.owner == &TOKEN_METADATA_PROGRAM_ID)
                .and_then(|a| CollectionMetadataInfo::parse(a.data).ok());
            report.violation = Some(v);
            return report;
        }
    };

    let sizing = info.sizing;
    report.metadata = Some(info);
    if !sizing.requires_unique_edition() {
        report.uniqueness_skipped = true;
        return report;
    }

    match check_master_edition_unique(edition) {
        Ok(e) => report.master_edition = Some(e),
        Err(v) => {
            report.master_edition = edition
                .filter(|a| a.owner == &TOKEN_METADATA_PROGRAM_ID)
                .and_then(|a| MasterEditionInfo::parse(a.data).ok());
            report.violation = Some(v);
        }
    }
    report
}

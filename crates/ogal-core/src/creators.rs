//! Creator reconciliation.
//!
//! The program requires every creator marked `verified` to sign the mint
//! transaction. Callers ask for verification optimistically; this module
//! decides which requests can be honoured by the keys actually available and
//! downgrades the rest.

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

use crate::codec::{ByteReader, ByteWriter, Decode, Encode};
use crate::errors::CoreResult;

/// Maximum number of creators the program accepts on a mint.
pub const MAX_CREATORS: usize = 5;

/// A metadata creator as sent to the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    #[serde(with = "crate::serde_pubkey")]
    pub address: Pubkey,
    pub verified: bool,
    pub share: u8,
}

impl Decode for Creator {
    fn decode(r: &mut ByteReader<'_>) -> CoreResult<Self> {
        Ok(Self {
            address: r.read_pubkey()?,
            verified: r.read_bool()?,
            share: r.read_u8()?,
        })
    }
}

impl Encode for Creator {
    fn encode(&self, w: &mut ByteWriter) {
        w.write_pubkey(&self.address)
            .write_bool(self.verified)
            .write_u8(self.share);
    }
}

/// A creator as requested by the caller. A missing address means "the fee payer".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatorRequest {
    #[serde(default, with = "crate::serde_pubkey::option")]
    pub address: Option<Pubkey>,
    #[serde(default)]
    pub verified: bool,
    pub share: u8,
}

impl From<Creator> for CreatorRequest {
    fn from(c: Creator) -> Self {
        Self {
            address: Some(c.address),
            verified: c.verified,
            share: c.share,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SanitizedCreators {
    pub creators: Vec<Creator>,
    /// Addresses whose verification request was dropped.
    pub downgraded: Vec<Pubkey>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CreatorError {
    /// The only creator asked to be verified but nobody available can sign for it.
    #[error("sole creator {address} requested verification but cannot sign and the fee payer is not a permitted signer")]
    CreatorRejected { address: Pubkey },
}

/// Resolve requested creators against the keys that can sign.
///
/// Address-less entries become the fee payer, verified. Verified entries whose
/// address is not in `permitted_signers` are downgraded, unless the request has
/// a single creator and the fee payer cannot sign either, in which case the
/// request is rejected outright.
pub fn sanitize_creators(
    requested: &[CreatorRequest],
    fee_payer: &Pubkey,
    permitted_signers: &[Pubkey],
) -> Result<SanitizedCreators, CreatorError> {
    let permitted = |k: &Pubkey| permitted_signers.contains(k);
    let mut out = SanitizedCreators::default();

    for req in requested {
        let Some(address) = req.address else {
            out.creators.push(Creator {
                address: *fee_payer,
                verified: true,
                share: req.share,
            });
            continue;
        };

        let mut verified = req.verified;
        if verified && !permitted(&address) {
            if requested.len() == 1 && !permitted(fee_payer) {
                return Err(CreatorError::CreatorRejected { address });
            }
            verified = false;
            out.downgraded.push(address);
        }
        out.creators.push(Creator {
            address,
            verified,
            share: req.share,
        });
    }

    Ok(out)
}

/// Clear the verified flag on the named creators only.
pub fn downgrade(creators: &[Creator], missing: &[Pubkey]) -> Vec<Creator> {
    creators
        .iter()
        .map(|c| Creator {
            verified: c.verified && !missing.contains(&c.address),
            ..*c
        })
        .collect()
}

/// Clear every verified flag.
pub fn downgrade_all(creators: &[Creator]) -> Vec<Creator> {
    creators
        .iter()
        .map(|c| Creator {
            verified: false,
            ..*c
        })
        .collect()
}

/// Verified creator addresses, deduplicated, in list order.
pub fn verified_addresses(creators: &[Creator]) -> Vec<Pubkey> {
    let mut out: Vec<Pubkey> = Vec::new();
    for c in creators.iter().filter(|c| c.verified) {
        if !out.contains(&c.address) {
            out.push(c.address);
        }
    }
    out
}

//! Token-metadata master edition decoding.

use serde::{Deserialize, Serialize};

use crate::codec::ByteReader;
use crate::errors::{CoreError, CoreResult};

/// `Key::MasterEditionV1`.
pub const MASTER_EDITION_V1_KEY: u8 = 2;
/// `Key::MasterEditionV2`.
pub const MASTER_EDITION_V2_KEY: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditionFormat {
    V1,
    V2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterEditionInfo {
    pub format: EditionFormat,
    pub supply: u64,
    pub max_supply: Option<u64>,
}

impl MasterEditionInfo {
    pub fn parse(data: &[u8]) -> CoreResult<Self> {
        let mut r = ByteReader::new(data);
        match r.read_u8()? {
            MASTER_EDITION_V2_KEY => {
                let supply = r.read_u64()?;
                let max_supply = r.read_option(|r| r.read_u64())?;
                Ok(Self {
                    format: EditionFormat::V2,
                    supply,
                    max_supply,
                })
            }
            MASTER_EDITION_V1_KEY => {
                // V1 reserves the u64 slot even when the option is None, and
                // is followed by the printing and one-time auth mints.
                let supply = r.read_u64()?;
                let present = r.read_option_tag()?;
                let slot = r.read_u64()?;
                r.read_pubkey()?;
                r.read_pubkey()?;
                Ok(Self {
                    format: EditionFormat::V1,
                    supply,
                    max_supply: present.then_some(slot),
                })
            }
            key => Err(CoreError::invalid_value(
                "master edition key",
                format!("unsupported key byte {key}"),
            )),
        }
    }

    pub fn has_max_supply(&self) -> bool {
        self.max_supply.is_some()
    }

    /// A one-of-one edition: max supply present and zero.
    pub fn is_unique(&self) -> bool {
        self.max_supply == Some(0)
    }
}

//! Registry program instruction payloads.
//!
//! Each instruction is serialized as `discriminator ‖ args`, where the
//! discriminator is `sha256("global:<handler>")[..8]` and the args use the
//! borsh-compatible encoding from [`crate::codec`].

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

use crate::codec::{ByteReader, ByteWriter, Encode};
use crate::creators::Creator;
use crate::errors::{CoreError, CoreResult};
use crate::hashing::{instruction_discriminator, Discriminator};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "instruction", rename_all = "snake_case")]
pub enum RegistryInstruction {
    MintObjectNft {
        object_id: u64,
        manifest_uri: String,
        #[serde(with = "crate::serde_pubkey::hash_hex")]
        manifest_hash: [u8; 32],
        metadata_name: String,
        metadata_symbol: String,
        seller_fee_basis_points: u16,
        creators: Vec<Creator>,
    },
    UpdateObjectManifest {
        #[serde(with = "crate::serde_pubkey::hash_hex")]
        manifest_hash: [u8; 32],
        metadata_uri: String,
        is_active: bool,
    },
    SetAuthority {
        #[serde(with = "crate::serde_pubkey")]
        new_authority: Pubkey,
    },
    SetPaused {
        paused: bool,
    },
    MigrateConfigNamespace {
        #[serde(with = "crate::serde_pubkey")]
        new_namespace: Pubkey,
    },
    RotateCollectionAuthority {
        #[serde(with = "crate::serde_pubkey")]
        new_update_authority: Pubkey,
    },
}

impl RegistryInstruction {
    const HANDLERS: [&'static str; 6] = [
        "mint_object_nft",
        "update_object_manifest",
        "set_authority",
        "set_paused",
        "migrate_config_namespace",
        "rotate_collection_authority",
    ];

    /// Snake-case handler name hashed into the discriminator.
    pub fn name(&self) -> &'static str {
        match self {
            Self::MintObjectNft { .. } => Self::HANDLERS[0],
            Self::UpdateObjectManifest { .. } => Self::HANDLERS[1],
            Self::SetAuthority { .. } => Self::HANDLERS[2],
            Self::SetPaused { .. } => Self::HANDLERS[3],
            Self::MigrateConfigNamespace { .. } => Self::HANDLERS[4],
            Self::RotateCollectionAuthority { .. } => Self::HANDLERS[5],
        }
    }

    pub fn discriminator(&self) -> Discriminator {
        instruction_discriminator(self.name())
    }

    /// Instruction data: discriminator followed by the encoded args.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.write_raw(&self.discriminator());
        self.encode_args(&mut w);
        w.into_inner()
    }

    fn encode_args(&self, w: &mut ByteWriter) {
        match self {
            Self::MintObjectNft {
                object_id,
                manifest_uri,
                manifest_hash,
                metadata_name,
                metadata_symbol,
                seller_fee_basis_points,
                creators,
            } => {
                w.write_u64(*object_id)
                    .write_string(manifest_uri)
                    .write_raw(manifest_hash)
                    .write_string(metadata_name)
                    .write_string(metadata_symbol)
                    .write_u16(*seller_fee_basis_points)
                    .write_vec(creators, |w, c| c.encode(w));
            }
            Self::UpdateObjectManifest {
                manifest_hash,
                metadata_uri,
                is_active,
            } => {
                w.write_raw(manifest_hash)
                    .write_string(metadata_uri)
                    .write_bool(*is_active);
            }
            Self::SetAuthority { new_authority } => {
                w.write_pubkey(new_authority);
            }
            Self::SetPaused { paused } => {
                w.write_bool(*paused);
            }
            Self::MigrateConfigNamespace { new_namespace } => {
                w.write_pubkey(new_namespace);
            }
            Self::RotateCollectionAuthority {
                new_update_authority,
            } => {
                w.write_pubkey(new_update_authority);
            }
        }
    }

    /// Decode instruction data produced by [`Self::to_vec`].
    ///
    /// Trailing bytes after the args are rejected.
    pub fn from_slice(data: &[u8]) -> CoreResult<Self> {
        let mut r = ByteReader::new(data);
        let disc = r.read_discriminator()?;
        let handler = Self::HANDLERS
            .iter()
            .find(|h| instruction_discriminator(h) == disc)
            .ok_or_else(|| {
                CoreError::invalid_value("instruction discriminator", hex::encode(disc))
            })?;

        let ix = match *handler {
            "mint_object_nft" => Self::MintObjectNft {
                object_id: r.read_u64()?,
                manifest_uri: r.read_string()?,
                manifest_hash: r.read_array::<32>()?,
                metadata_name: r.read_string()?,
                metadata_symbol: r.read_string()?,
                seller_fee_basis_points: r.read_u16()?,
                creators: r.read_vec(|r| r.read::<Creator>())?,
            },
            "update_object_manifest" => Self::UpdateObjectManifest {
                manifest_hash: r.read_array::<32>()?,
                metadata_uri: r.read_string()?,
                is_active: r.read_bool()?,
            },
            "set_authority" => Self::SetAuthority {
                new_authority: r.read_pubkey()?,
            },
            "set_paused" => Self::SetPaused {
                paused: r.read_bool()?,
            },
            "migrate_config_namespace" => Self::MigrateConfigNamespace {
                new_namespace: r.read_pubkey()?,
            },
            _ => Self::RotateCollectionAuthority {
                new_update_authority: r.read_pubkey()?,
            },
        };

        if !r.is_empty() {
            return Err(CoreError::invalid_value(
                "instruction data",
                format!("{} trailing byte(s)", r.remaining()),
            ));
        }
        Ok(ix)
    }
}

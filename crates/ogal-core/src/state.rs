//! Registry program account layouts.
//!
//! Every account starts with an 8-byte discriminator. Decoding always checks,
//! in order: the owning program, the buffer holds a discriminator, the
//! discriminator, and finally the fields. Nothing from a buffer that fails any
//! of these checks is returned to the caller.

use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;

use crate::codec::{ByteReader, ByteWriter, Decode, Encode};
use crate::errors::{CoreError, CoreResult};
use crate::hashing::{account_discriminator, Discriminator, DISCRIMINATOR_LEN};

/// Capacity of the inline URI buffer in [`ObjectManifest`].
pub const MAX_MANIFEST_URI_LEN: usize = 128;

/// Reserved bytes the program allocates after the manifest body.
pub const MANIFEST_PADDING: usize = 8;

/// A program account layout with a fixed discriminator.
pub trait ProgramAccount: Decode + Encode {
    /// Type name hashed into the discriminator (`account:<NAME>`).
    const NAME: &'static str;
    /// Full account length including the discriminator.
    const LEN: usize;

    fn discriminator() -> Discriminator {
        account_discriminator(Self::NAME)
    }

    /// Validate owner and discriminator, then decode the body.
    fn decode_account(data: &[u8], owner: &Pubkey, program_id: &Pubkey) -> CoreResult<Self> {
        if owner != program_id {
            return Err(CoreError::OwnerMismatch {
                expected: *program_id,
                found: *owner,
            });
        }

        let mut r = ByteReader::new(data);
        let found = r.read_discriminator()?;
        let expected = Self::discriminator();
        if found != expected {
            return Err(CoreError::DiscriminatorMismatch {
                account: Self::NAME,
                expected: hex::encode(expected),
                found: hex::encode(found),
            });
        }

        Self::decode(&mut r)
    }

    /// Discriminator, body, then zero padding up to [`Self::LEN`].
    fn encode_account(&self) -> Vec<u8> {
        account_writer(self).into_inner()
    }

    /// Like [`Self::encode_account`], failing when a field does not fit the layout.
    fn try_encode_account(&self) -> CoreResult<Vec<u8>> {
        account_writer(self).finish()
    }
}

fn account_writer<T: ProgramAccount>(account: &T) -> ByteWriter {
    let mut w = ByteWriter::with_capacity(T::LEN);
    w.write_raw(&T::discriminator());
    account.encode(&mut w);
    w.pad_to(T::LEN);
    w
}

/// Per-namespace registry configuration singleton.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(with = "crate::serde_pubkey")]
    pub authority: Pubkey,
    pub config_bump: u8,
    /// Bump of the auth PDA that acts as mint and update authority.
    pub auth_bump: u8,
    pub object_count: u64,
    #[serde(with = "crate::serde_pubkey")]
    pub namespace: Pubkey,
    pub paused: bool,
}

impl Decode for RegistryConfig {
    fn decode(r: &mut ByteReader<'_>) -> CoreResult<Self> {
        Ok(Self {
            authority: r.read_pubkey()?,
            config_bump: r.read_u8()?,
            auth_bump: r.read_u8()?,
            object_count: r.read_u64()?,
            namespace: r.read_pubkey()?,
            paused: r.read_bool()?,
        })
    }
}

impl Encode for RegistryConfig {
    fn encode(&self, w: &mut ByteWriter) {
        w.write_pubkey(&self.authority)
            .write_u8(self.config_bump)
            .write_u8(self.auth_bump)
            .write_u64(self.object_count)
            .write_pubkey(&self.namespace)
            .write_bool(self.paused);
    }
}

impl ProgramAccount for RegistryConfig {
    const NAME: &'static str = "Config";
    const LEN: usize = DISCRIMINATOR_LEN + 32 + 1 + 1 + 8 + 32 + 1;
}

/// Record stored at the auth PDA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRecord {
    #[serde(with = "crate::serde_pubkey")]
    pub config: Pubkey,
    pub bump: u8,
}

impl Decode for AuthRecord {
    fn decode(r: &mut ByteReader<'_>) -> CoreResult<Self> {
        Ok(Self {
            config: r.read_pubkey()?,
            bump: r.read_u8()?,
        })
    }
}

impl Encode for AuthRecord {
    fn encode(&self, w: &mut ByteWriter) {
        w.write_pubkey(&self.config).write_u8(self.bump);
    }
}

impl ProgramAccount for AuthRecord {
    const NAME: &'static str = "Auth";
    const LEN: usize = DISCRIMINATOR_LEN + 32 + 1;
}

/// Per-object manifest.
///
/// On-chain this is a zero-copy `repr(C)` struct. Its field order happens to
/// need no alignment padding, so a sequential read matches the memory layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectManifest {
    #[serde(with = "crate::serde_pubkey")]
    pub config: Pubkey,
    pub object_id: u64,
    #[serde(with = "crate::serde_pubkey")]
    pub mint: Pubkey,
    pub bump: u8,
    pub mint_bump: u8,
    pub is_active: bool,
    pub minted: bool,
    pub initialized: bool,
    #[serde(with = "crate::serde_pubkey::hash_hex")]
    pub manifest_hash: [u8; 32],
    pub metadata_uri: String,
    #[serde(with = "crate::serde_pubkey")]
    pub creator: Pubkey,
}

impl ObjectManifest {
    /// Size of the zero-copy body, excluding discriminator and padding.
    pub const BODY_LEN: usize = 32 + 8 + 32 + 5 + 32 + MAX_MANIFEST_URI_LEN + 1 + 2 + 32;
}

/// Zero-copy flags are stored as bytes; any nonzero value reads as set.
fn read_flag(r: &mut ByteReader<'_>) -> CoreResult<bool> {
    Ok(r.read_u8()? != 0)
}

impl Decode for ObjectManifest {
    fn decode(r: &mut ByteReader<'_>) -> CoreResult<Self> {
        let config = r.read_pubkey()?;
        let object_id = r.read_u64()?;
        let mint = r.read_pubkey()?;
        let bump = r.read_u8()?;
        let mint_bump = r.read_u8()?;
        let is_active = read_flag(r)?;
        let minted = read_flag(r)?;
        let initialized = read_flag(r)?;
        let manifest_hash = r.read_array::<32>()?;
        let uri_offset = r.offset();
        let uri_buf = r.read_array::<MAX_MANIFEST_URI_LEN>()?;
        let _uri_padding = r.read_u8()?;
        let uri_len = r.read_u16()? as usize;
        let creator = r.read_pubkey()?;

        if uri_len > MAX_MANIFEST_URI_LEN {
            return Err(CoreError::invalid_value(
                "metadata_uri_length",
                format!("{uri_len} exceeds {MAX_MANIFEST_URI_LEN}"),
            ));
        }
        let metadata_uri = std::str::from_utf8(&uri_buf[..uri_len])
            .map_err(|_| CoreError::InvalidUtf8 { offset: uri_offset })?
            .to_string();

        Ok(Self {
            config,
            object_id,
            mint,
            bump,
            mint_bump,
            is_active,
            minted,
            initialized,
            manifest_hash,
            metadata_uri,
            creator,
        })
    }
}

impl Encode for ObjectManifest {
    fn encode(&self, w: &mut ByteWriter) {
        let uri = self.metadata_uri.as_bytes();
        if uri.len() > MAX_MANIFEST_URI_LEN {
            w.record_error(CoreError::invalid_value(
                "metadata_uri",
                format!("{} bytes exceeds {MAX_MANIFEST_URI_LEN}", uri.len()),
            ));
        }
        let uri_len = uri.len().min(MAX_MANIFEST_URI_LEN);
        let mut uri_buf = [0u8; MAX_MANIFEST_URI_LEN];
        uri_buf[..uri_len].copy_from_slice(&uri[..uri_len]);

        w.write_pubkey(&self.config)
            .write_u64(self.object_id)
            .write_pubkey(&self.mint)
            .write_u8(self.bump)
            .write_u8(self.mint_bump)
            .write_bool(self.is_active)
            .write_bool(self.minted)
            .write_bool(self.initialized)
            .write_raw(&self.manifest_hash)
            .write_raw(&uri_buf)
            .write_u8(0)
            .write_u16(uri_len as u16)
            .write_pubkey(&self.creator);
    }
}

impl ProgramAccount for ObjectManifest {
    const NAME: &'static str = "ObjectManifest";
    const LEN: usize = DISCRIMINATOR_LEN + Self::BODY_LEN + MANIFEST_PADDING;
}

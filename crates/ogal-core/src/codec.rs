//! Bounds-checked byte codec for program accounts and instruction data.
//!
//! Account bytes arrive from an RPC node, so every read is checked and fails
//! with [`CoreError::TruncatedData`] instead of panicking. The encoding is the
//! borsh-compatible subset the program uses:
//! - fixed-width little-endian integers
//! - `u32` length-prefixed byte strings and UTF-8 strings
//! - one-byte-tagged optionals (`0` none, `1` some)
//! - `u32` count-prefixed vectors
//! - raw 32-byte public keys
//!
//! Layouts implement [`Decode`] / [`Encode`] so decoders read as a sequence of
//! field reads instead of offset arithmetic.

use solana_program::pubkey::Pubkey;

use crate::errors::{CoreError, CoreResult};
use crate::hashing::{Discriminator, DISCRIMINATOR_LEN};

/// Types that can be read from a [`ByteReader`].
pub trait Decode: Sized {
    fn decode(reader: &mut ByteReader<'_>) -> CoreResult<Self>;
}

/// Types that can be written to a [`ByteWriter`].
pub trait Encode {
    fn encode(&self, writer: &mut ByteWriter);

    fn to_bytes(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        self.encode(&mut w);
        w.into_inner()
    }
}

/// Forward-only reader over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Current position from the start of the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Unread tail of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }

    fn take(&mut self, n: usize) -> CoreResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CoreError::TruncatedData {
                offset: self.offset,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(out)
    }

    pub fn skip(&mut self, n: usize) -> CoreResult<()> {
        self.take(n).map(|_| ())
    }

    pub fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    pub fn read_u8(&mut self) -> CoreResult<u8> {
        Ok(self.take(1)?[0])
    }

    /// Reads a bool, rejecting any byte other than 0 or 1.
    pub fn read_bool(&mut self) -> CoreResult<bool> {
        let offset = self.offset;
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(CoreError::InvalidBool { value, offset }),
        }
    }

    pub fn read_u16(&mut self) -> CoreResult<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> CoreResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> CoreResult<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_array<const N: usize>(&mut self) -> CoreResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_pubkey(&mut self) -> CoreResult<Pubkey> {
        Ok(Pubkey::new_from_array(self.read_array()?))
    }

    pub fn read_discriminator(&mut self) -> CoreResult<Discriminator> {
        self.read_array::<DISCRIMINATOR_LEN>()
    }

    /// `u32` length prefix followed by that many bytes.
    pub fn read_bytes(&mut self) -> CoreResult<&'a [u8]> {
        let len = self.read_u32()? as usize;
        self.take(len)
    }

    pub fn read_string(&mut self) -> CoreResult<String> {
        let offset = self.offset;
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| CoreError::InvalidUtf8 { offset })
    }

    /// Reads the one-byte option tag; the payload is left unread.
    pub fn read_option_tag(&mut self) -> CoreResult<bool> {
        let offset = self.offset;
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            tag => Err(CoreError::InvalidOptionTag { tag, offset }),
        }
    }

    pub fn read_option<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> CoreResult<T>,
    ) -> CoreResult<Option<T>> {
        if self.read_option_tag()? {
            read(self).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn read_vec<T>(
        &mut self,
        mut read: impl FnMut(&mut Self) -> CoreResult<T>,
    ) -> CoreResult<Vec<T>> {
        let count = self.read_u32()? as usize;
        // Cap the preallocation by what the buffer could possibly hold.
        let mut out = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            out.push(read(self)?);
        }
        Ok(out)
    }

    pub fn read<T: Decode>(&mut self) -> CoreResult<T> {
        T::decode(self)
    }
}

/// Append-only writer mirroring [`ByteReader`].
///
/// Length prefixes are `u32`; a slice longer than that, or a field that does
/// not fit its fixed layout, is recorded as an error and reported by
/// [`ByteWriter::finish`].
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
    error: Option<CoreError>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            error: None,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Written bytes, ignoring any recorded encoding error.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Written bytes, or the first recorded encoding error.
    pub fn finish(self) -> CoreResult<Vec<u8>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.buf),
        }
    }

    /// Keeps the first error; later ones are dropped.
    pub fn record_error(&mut self, err: CoreError) -> &mut Self {
        self.error.get_or_insert(err);
        self
    }

    fn write_len(&mut self, field: &'static str, len: usize) -> &mut Self {
        match u32::try_from(len) {
            Ok(len) => self.write_u32(len),
            Err(_) => self
                .record_error(CoreError::invalid_value(
                    field,
                    format!("length {len} does not fit a u32 prefix"),
                ))
                .write_u32(u32::MAX),
        }
    }

    pub fn write_u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn write_bool(&mut self, v: bool) -> &mut Self {
        self.write_u8(u8::from(v))
    }

    pub fn write_u16(&mut self, v: u16) -> &mut Self {
        self.write_raw(&v.to_le_bytes())
    }

    pub fn write_u32(&mut self, v: u32) -> &mut Self {
        self.write_raw(&v.to_le_bytes())
    }

    pub fn write_u64(&mut self, v: u64) -> &mut Self {
        self.write_raw(&v.to_le_bytes())
    }

    /// Raw bytes with no length prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn write_pubkey(&mut self, key: &Pubkey) -> &mut Self {
        self.write_raw(key.as_ref())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_len("bytes", bytes.len());
        self.write_raw(bytes)
    }

    pub fn write_string(&mut self, s: &str) -> &mut Self {
        self.write_bytes(s.as_bytes())
    }

    pub fn write_option<T>(
        &mut self,
        value: Option<&T>,
        write: impl FnOnce(&mut Self, &T),
    ) -> &mut Self {
        match value {
            Some(v) => {
                self.write_u8(1);
                write(self, v);
            }
            None => {
                self.write_u8(0);
            }
        }
        self
    }

    pub fn write_vec<T>(&mut self, items: &[T], mut write: impl FnMut(&mut Self, &T)) -> &mut Self {
        self.write_len("vec", items.len());
        for item in items {
            write(self, item);
        }
        self
    }

    pub fn write<T: Encode + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.encode(self);
        self
    }

    /// Pads with zero bytes up to `len` total; no-op when already longer.
    pub fn pad_to(&mut self, len: usize) -> &mut Self {
        if self.buf.len() < len {
            self.buf.resize(len, 0);
        }
        self
    }
}

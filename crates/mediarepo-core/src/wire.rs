//! Versioned binary framing for catalog entities
//!
//! Every persisted entity is written as:
//! `[magic u32]? FRAME_START version:u16 fields... FRAME_END`
//!
//! All integers are little-endian. Strings are a u32 byte length followed by
//! UTF-8 bytes, id lists are a u32 count followed by u16 ids.
//!
//! Version migration is table driven: each type lists its fields as
//! [`FieldStep`]s tagged with the version that introduced them and, for
//! retired fields, the version that dropped them.

use chrono::{DateTime, Utc};

use crate::error::MediaError;

/// Marker opening an entity frame
pub const FRAME_START: u8 = 0xFA;

/// Marker closing an entity frame
pub const FRAME_END: u8 = 0xFB;

/// Longest id list a membership can hold
pub const MAX_LIST_IDS: usize = u16::MAX as usize;

/// Growable little-endian output buffer
#[derive(Debug, Default, Clone)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn put_bool(&mut self, value: bool) {
        self.buf.push(value as u8);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn put_str(&mut self, value: &str) {
        self.put_u32(value.len() as u32);
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub fn put_ids(&mut self, ids: &[u16]) {
        self.put_u32(ids.len() as u32);
        for id in ids {
            self.put_u16(*id);
        }
    }

    /// Timestamps are stored as whole Unix seconds; sub-second precision
    /// is dropped
    pub fn put_time(&mut self, value: &DateTime<Utc>) {
        self.put_i64(value.timestamp());
    }
}

/// Cursor over an encoded buffer
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], MediaError> {
        if len > self.remaining() {
            return Err(MediaError::format(format!(
                "truncated data: need {} bytes at offset {}, have {}",
                len,
                self.pos,
                self.remaining()
            )));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], MediaError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn get_u8(&mut self) -> Result<u8, MediaError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn get_bool(&mut self) -> Result<bool, MediaError> {
        match self.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(MediaError::format(format!("invalid bool byte {}", other))),
        }
    }

    pub fn get_u16(&mut self) -> Result<u16, MediaError> {
        Ok(u16::from_le_bytes(self.take_array()?))
    }

    pub fn get_u32(&mut self) -> Result<u32, MediaError> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub fn get_i64(&mut self) -> Result<i64, MediaError> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    pub fn get_str(&mut self) -> Result<String, MediaError> {
        let len = self.get_u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| MediaError::format(format!("invalid UTF-8 string: {}", e)))
    }

    /// Id lists hold at most [`MAX_LIST_IDS`] entries so every position
    /// fits a 1-based u16 cookie index
    pub fn get_ids(&mut self) -> Result<Vec<u16>, MediaError> {
        let count = self.get_u32()? as usize;
        if count > MAX_LIST_IDS {
            return Err(MediaError::format(format!(
                "id list of {} entries exceeds limit of {}",
                count, MAX_LIST_IDS
            )));
        }
        let bytes = self.take(count.saturating_mul(2))?;
        Ok(bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect())
    }

    pub fn get_time(&mut self) -> Result<DateTime<Utc>, MediaError> {
        let secs = self.get_i64()?;
        DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| MediaError::format(format!("timestamp {} out of range", secs)))
    }

    /// Consume a marker byte, failing if it does not match
    pub fn expect_marker(&mut self, marker: u8, what: &str) -> Result<(), MediaError> {
        let found = self.get_u8()?;
        if found != marker {
            return Err(MediaError::format(format!(
                "{}: expected marker {:#04x}, found {:#04x}",
                what, marker, found
            )));
        }
        Ok(())
    }
}

/// One field (or field group) of a persisted type, gated by format version
pub struct FieldStep<T> {
    /// First version carrying this field
    pub since: u16,
    /// First version no longer carrying this field
    pub removed_in: Option<u16>,
    pub write: fn(&T, &mut WireWriter),
    pub read: fn(&mut T, &mut WireReader<'_>) -> Result<(), MediaError>,
}

impl<T> FieldStep<T> {
    pub const fn new(
        since: u16,
        write: fn(&T, &mut WireWriter),
        read: fn(&mut T, &mut WireReader<'_>) -> Result<(), MediaError>,
    ) -> Self {
        Self {
            since,
            removed_in: None,
            write,
            read,
        }
    }

    /// A field that existed in `since..removed_in` and is skipped on read
    pub const fn retired(
        since: u16,
        removed_in: u16,
        write: fn(&T, &mut WireWriter),
        read: fn(&mut T, &mut WireReader<'_>) -> Result<(), MediaError>,
    ) -> Self {
        Self {
            since,
            removed_in: Some(removed_in),
            write,
            read,
        }
    }

    pub fn present_in(&self, version: u16) -> bool {
        version >= self.since && self.removed_in.map_or(true, |removed| version < removed)
    }
}

/// A type with a versioned binary representation
pub trait WireFormat: Default + Sized + 'static {
    /// Name used in error messages
    const TYPE_NAME: &'static str;
    /// Fast corruption check written ahead of the frame
    const MAGIC: Option<u32>;
    /// Highest version this build reads and the version it writes
    const FORMAT_VERSION: u16;

    /// Field table in wire order
    fn steps() -> &'static [FieldStep<Self>];

    /// Restore defaults, dropping non-persisted fields
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn encode(&self, w: &mut WireWriter) {
        self.encode_as(Self::FORMAT_VERSION, w);
    }

    /// Write the field layout of an older (or the current) version
    fn encode_as(&self, version: u16, w: &mut WireWriter) {
        if let Some(magic) = Self::MAGIC {
            w.put_u32(magic);
        }
        w.put_u8(FRAME_START);
        w.put_u16(version);
        for step in Self::steps().iter().filter(|s| s.present_in(version)) {
            (step.write)(self, w);
        }
        w.put_u8(FRAME_END);
    }

    fn decode(r: &mut WireReader<'_>) -> Result<Self, MediaError> {
        if let Some(magic) = Self::MAGIC {
            let found = r.get_u32()?;
            if found != magic {
                return Err(MediaError::format(format!(
                    "bad {} magic: expected {:#010x}, found {:#010x}",
                    Self::TYPE_NAME,
                    magic,
                    found
                )));
            }
        }
        r.expect_marker(FRAME_START, Self::TYPE_NAME)?;

        let version = r.get_u16()?;
        if version == 0 || version > Self::FORMAT_VERSION {
            return Err(MediaError::format(format!(
                "unsupported {} format version {} (known: 1..={})",
                Self::TYPE_NAME,
                version,
                Self::FORMAT_VERSION
            )));
        }

        let mut value = Self::default();
        for step in Self::steps().iter().filter(|s| s.present_in(version)) {
            (step.read)(&mut value, r)?;
        }
        r.expect_marker(FRAME_END, Self::TYPE_NAME)?;
        Ok(value)
    }

    fn to_bytes(&self) -> Vec<u8> {
        let mut w = WireWriter::new();
        self.encode(&mut w);
        w.into_bytes()
    }

    fn from_bytes(data: &[u8]) -> Result<Self, MediaError> {
        Self::decode(&mut WireReader::new(data))
    }
}

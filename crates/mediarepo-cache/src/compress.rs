//! Snapshot compression
//!
//! A compressed snapshot is a zip archive holding a single deflated
//! [`SNAPSHOT_ENTRY`] with the encoded catalog.

use std::io::{Cursor, Read, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::ReplicaError;

/// Name of the archive entry holding the encoded catalog
pub const SNAPSHOT_ENTRY: &str = "catalog.bin";

/// Compress an encoded catalog
pub fn compress_snapshot(data: &[u8]) -> Result<Vec<u8>, ReplicaError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(SNAPSHOT_ENTRY, options)?;
    writer.write_all(data)?;
    Ok(writer.finish()?.into_inner())
}

/// Decompress a snapshot, refusing to inflate past `max_bytes`
pub fn decompress_snapshot(data: &[u8], max_bytes: u64) -> Result<Vec<u8>, ReplicaError> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let entry = archive.by_name(SNAPSHOT_ENTRY)?;
    if entry.size() > max_bytes {
        return Err(ReplicaError::TooLarge {
            size: entry.size(),
            limit: max_bytes,
        });
    }

    let mut out = Vec::with_capacity(entry.size() as usize);
    // The header size is not trusted, cap the actual inflate as well
    entry.take(max_bytes.saturating_add(1)).read_to_end(&mut out)?;
    if out.len() as u64 > max_bytes {
        return Err(ReplicaError::TooLarge {
            size: out.len() as u64,
            limit: max_bytes,
        });
    }
    Ok(out)
}

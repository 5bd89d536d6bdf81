//! Content fingerprints used as the paste deduplication key.
//!
//! Fingerprints are BLAKE3 digests rendered as 64 lowercase hex characters.
//! They identify content for dedup only; nothing relies on them for tamper
//! detection.

use std::io::{self, Read, Seek, SeekFrom};

/// Length of a rendered fingerprint in characters.
pub const FINGERPRINT_LEN: usize = 64;

/// Fingerprint an in-memory byte slice.
pub fn fingerprint(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}

/// Fingerprint everything remaining in `reader`.
///
/// # Errors
/// Propagates read errors from `reader`.
pub fn fingerprint_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hasher.finalize().to_hex().to_string())
}

/// Fingerprint the rest of a seekable stream, then put the read position back
/// where it was.
///
/// # Errors
/// Propagates read and seek errors from `reader`.
pub fn fingerprint_seekable<R: Read + Seek>(reader: &mut R) -> io::Result<String> {
    let start = reader.stream_position()?;
    let digest = fingerprint_reader(&mut *reader)?;
    reader.seek(SeekFrom::Start(start))?;
    Ok(digest)
}

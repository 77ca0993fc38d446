//! Artifact container for fitted pipelines.
//!
//! ```text
//! [4-byte magic: "OBP1"]
//! [4-byte format version, u32 LE]
//! [8-byte payload length, u64 LE]
//! [bincode payload]
//! [4-byte CRC32 of payload, u32 LE]
//! ```
//!
//! The payload carries no timestamps or host data, so serializing the same
//! value twice yields identical bytes.
//!
//! ```
//! use obesity_pipeline::serialization::{decode, encode};
//!
//! let bytes = encode(&vec![1.5_f32, 2.5]).unwrap();
//! assert_eq!(&bytes[..4], b"OBP1");
//! let back: Vec<f32> = decode(&bytes).unwrap();
//! assert_eq!(back, vec![1.5, 2.5]);
//! ```

use crate::error::{PipelineError, Result};
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Magic bytes at the start of every artifact.
pub const ARTIFACT_MAGIC: [u8; 4] = *b"OBP1";

/// Current container format version.
pub const FORMAT_VERSION: u32 = 1;

/// Magic + version + payload length.
const HEADER_LEN: usize = 16;

/// Trailing CRC32.
const TRAILER_LEN: usize = 4;

/// Serializes `value` into the artifact container.
///
/// # Errors
///
/// Returns [`PipelineError::Serialization`] if bincode rejects the value.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let payload = bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .serialize(value)?;

    let mut output = Vec::with_capacity(HEADER_LEN + payload.len() + TRAILER_LEN);
    output.extend_from_slice(&ARTIFACT_MAGIC);
    output.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    output.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    output.extend_from_slice(&payload);
    output.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    Ok(output)
}

/// Validates the container and deserializes its payload.
///
/// # Errors
///
/// Returns [`PipelineError::CorruptArtifact`] for a short buffer, bad magic,
/// unsupported version, length or checksum mismatch, or undecodable payload.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let corrupt = |msg: String| PipelineError::CorruptArtifact(msg);

    if bytes.is_empty() {
        return Err(corrupt("artifact is empty".to_string()));
    }
    if bytes.len() < HEADER_LEN + TRAILER_LEN {
        return Err(corrupt(format!("artifact too short: {} bytes", bytes.len())));
    }

    let magic = &bytes[0..4];
    if magic != ARTIFACT_MAGIC {
        return Err(corrupt(format!(
            "invalid magic: expected {ARTIFACT_MAGIC:?}, got {magic:?}"
        )));
    }

    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != FORMAT_VERSION {
        return Err(corrupt(format!(
            "unsupported format version {version} (expected {FORMAT_VERSION})"
        )));
    }

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&bytes[8..16]);
    let payload_len = u64::from_le_bytes(len_bytes);
    let expected_total = (HEADER_LEN + TRAILER_LEN) as u64 + payload_len;
    if expected_total != bytes.len() as u64 {
        return Err(corrupt(format!(
            "length mismatch: header declares {payload_len} payload bytes, file has {}",
            bytes.len() - HEADER_LEN - TRAILER_LEN
        )));
    }

    let payload_end = bytes.len() - TRAILER_LEN;
    let payload = &bytes[HEADER_LEN..payload_end];
    let mut crc_bytes = [0u8; 4];
    crc_bytes.copy_from_slice(&bytes[payload_end..]);
    let stored = u32::from_le_bytes(crc_bytes);
    let computed = crc32fast::hash(payload);
    if stored != computed {
        return Err(corrupt(format!(
            "checksum mismatch: stored {stored:#010x}, computed {computed:#010x}"
        )));
    }

    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(payload.len() as u64)
        .reject_trailing_bytes()
        .deserialize(payload)
        .map_err(|e| corrupt(format!("payload decode failed: {e}")))
}

/// Writes `value` to `path` through a sibling temporary file and a rename,
/// so readers never observe a half-written artifact. Returns the byte count.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] on filesystem failure.
pub fn write_artifact<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<usize> {
    let path = path.as_ref();
    let bytes = encode(value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;
    log::info!("wrote artifact {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes.len())
}

/// Reads and decodes the artifact at `path`.
///
/// # Errors
///
/// Every failure, whether unreadable or corrupt, is reported as
/// [`PipelineError::MissingArtifact`] naming the path.
pub fn read_artifact<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let missing = |reason: String| PipelineError::MissingArtifact {
        path: path.to_path_buf(),
        reason,
    };
    let bytes = fs::read(path).map_err(|e| missing(e.to_string()))?;
    let value = decode(&bytes).map_err(|e| missing(e.to_string()))?;
    log::debug!("read artifact {} ({} bytes)", path.display(), bytes.len());
    Ok(value)
}

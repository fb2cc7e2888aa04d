//! Encoding and decoding helpers between Rust domain types and SQLite
//! column representations.
//!
//! Timestamps are stored as RFC 3339 strings. Face encodings are stored
//! as raw little-endian f32 arrays.

use chrono::{DateTime, Utc};
use vigil_core::Encoding;

use crate::{Error, Result};

pub fn encode_dt(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encoding_to_blob(encoding: &Encoding) -> Vec<u8> {
    let mut blob = Vec::with_capacity(encoding.values.len() * 4);
    for v in &encoding.values {
        blob.extend_from_slice(&v.to_le_bytes());
    }
    blob
}

pub fn encoding_from_blob(blob: &[u8]) -> Result<Encoding> {
    if blob.len() % 4 != 0 {
        return Err(Error::CorruptEncoding(format!(
            "blob length {} is not a multiple of 4",
            blob.len()
        )));
    }
    if blob.is_empty() {
        return Err(Error::CorruptEncoding("blob is empty".into()));
    }

    let values = blob
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    Ok(Encoding::new(values))
}

//! Word weight files: `u32` word count followed by one little-endian `f32` per word.
use std::fs;
use std::path::Path;

use voctree_core::error::{Error, Result};

pub fn read_weights(path: &Path) -> Result<Vec<f32>> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    if bytes.len() < 4 {
        return Err(Error::parse(path, "missing word count header"));
    }
    let (header, body) = bytes.split_at(4);
    let count = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
    if body.len() != count * 4 {
        return Err(Error::parse(
            path,
            format!("header announces {} weights but {} bytes follow", count, body.len()),
        ));
    }
    Ok(body
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

pub fn write_weights(path: &Path, weights: &[f32]) -> Result<()> {
    let mut bytes = Vec::with_capacity(4 + weights.len() * 4);
    bytes.extend_from_slice(&(weights.len() as u32).to_le_bytes());
    for w in weights {
        bytes.extend_from_slice(&w.to_le_bytes());
    }
    fs::write(path, bytes).map_err(|e| Error::io(path, e))
}

//! Durable encoding of the flat index.
//!
//! The index is externalized as three artifacts: the vector storage and the
//! id sequence in a compact binary format, and the document texts as one
//! base64 record per line so embedded newlines or control characters cannot
//! break the line framing. All three artifacts must exist together for a
//! load to succeed; encoding then decoding reproduces the index exactly.

use crate::error::StoreError;
use crate::index::FlatIndex;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

/// Locations of the three persisted artifacts.
#[derive(Debug, Clone)]
pub struct StorePaths {
    pub vectors: PathBuf,
    pub ids: PathBuf,
    pub texts: PathBuf,
}

impl StorePaths {
    pub fn new(
        vectors: impl Into<PathBuf>,
        ids: impl Into<PathBuf>,
        texts: impl Into<PathBuf>,
    ) -> StorePaths {
        StorePaths { vectors: vectors.into(), ids: ids.into(), texts: texts.into() }
    }
}

/// Writes the index to the three artifact paths.
///
/// Destination directories are created as needed. The vector artifact
/// preserves exact float32 values together with the index dimension.
pub fn encode(index: &FlatIndex, paths: &StorePaths) -> Result<(), StoreError> {
    for path in [&paths.vectors, &paths.ids, &paths.texts] {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
    }

    let writer = BufWriter::new(File::create(&paths.vectors)?);
    bincode::serialize_into(writer, &(index.dimension(), index.raw_vectors()))
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))?;

    let writer = BufWriter::new(File::create(&paths.ids)?);
    bincode::serialize_into(writer, index.ids())
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))?;

    let mut writer = BufWriter::new(File::create(&paths.texts)?);
    for text in index.texts() {
        writeln!(writer, "{}", STANDARD.encode(text.as_bytes()))?;
    }
    writer.flush()?;

    Ok(())
}

/// Reads the three artifacts back into an index.
///
/// Fails with [`StoreError::NotFound`] when any artifact is missing (no
/// partial load) and with [`StoreError::Corrupt`] when the stored data is
/// malformed or the artifacts disagree about the document count.
pub fn decode(paths: &StorePaths) -> Result<FlatIndex, StoreError> {
    for path in [&paths.vectors, &paths.ids, &paths.texts] {
        if !path.exists() {
            return Err(StoreError::NotFound(path.clone()));
        }
    }

    let reader = BufReader::new(File::open(&paths.vectors)?);
    let (dimension, vectors): (Option<usize>, Vec<f32>) = bincode::deserialize_from(reader)
        .map_err(|e| StoreError::Corrupt(format!("vector artifact: {}", e)))?;

    let reader = BufReader::new(File::open(&paths.ids)?);
    let ids: Vec<i64> = bincode::deserialize_from(reader)
        .map_err(|e| StoreError::Corrupt(format!("id artifact: {}", e)))?;

    let mut texts = Vec::new();
    for line in BufReader::new(File::open(&paths.texts)?).lines() {
        let bytes = STANDARD.decode(line?)
            .map_err(|e| StoreError::Corrupt(format!("text artifact: {}", e)))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| StoreError::Corrupt(format!("text artifact: {}", e)))?;
        texts.push(text);
    }

    FlatIndex::from_parts(dimension, ids, texts, vectors)
}

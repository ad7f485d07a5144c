//! Acoustic model: phoneme tokens + durations + f0 → mel spectrogram.
//!
//! The content hash of the model bytes identifies this exact model in
//! downstream render caches.

use std::path::{Path, PathBuf};

use xxhash_rust::xxh64::xxh64;

use super::{NamedTensor, Session, SessionFactory, read_artifact};
use crate::Result;

#[derive(Debug)]
pub struct AcousticModel {
    path: PathBuf,
    hash: u64,
    session: Session,
}

impl AcousticModel {
    /// Read the model file, hash it and open a session.
    pub fn load(factory: &dyn SessionFactory, path: &Path) -> Result<Self> {
        let bytes = read_artifact("acoustic model", path)?;
        let hash = content_hash(&bytes);
        let session = Session::new(factory.create(&bytes)?);
        tracing::info!(path = %path.display(), hash = format_args!("{hash:016x}"), "acoustic model loaded");
        Ok(Self {
            path: path.to_path_buf(),
            hash,
            session,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// XXH64 of the model bytes.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn run(&self, inputs: Vec<NamedTensor>) -> Result<Vec<NamedTensor>> {
        self.session.run(inputs)
    }
}

/// 64-bit content hash used as model identity.
pub fn content_hash(bytes: &[u8]) -> u64 {
    xxh64(bytes, 0)
}

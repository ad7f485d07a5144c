//! Neural sub-model handles of a DiffSinger singer.
//!
//! ## Components
//!
//! - [`acoustic`]: acoustic model session plus content hash
//! - [`vocoder`]: mel spectrogram → waveform session
//! - [`predictor`]: pitch and variance predictors (linguistic encoder + predictor)
//! - [`speaker`]: speaker embeddings and mixing
//! - [`slot`]: per-resource lazy slot with its own lock
//! - `onnx`: ONNX Runtime backend (feature `onnx`)
//!
//! The inference engine itself is opaque: a [`SessionFactory`] turns
//! serialized model bytes into an [`InferenceSession`] that maps named
//! tensors to named tensors.

pub mod acoustic;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod predictor;
pub mod slot;
pub mod speaker;
pub mod vocoder;

use std::fmt;
use std::fs;
use std::path::Path;

use parking_lot::Mutex;

use crate::{Error, Result};

/// Tensor element storage.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    F32(Vec<f32>),
    I64(Vec<i64>),
    Bool(Vec<bool>),
}

impl TensorData {
    pub fn len(&self) -> usize {
        match self {
            TensorData::F32(values) => values.len(),
            TensorData::I64(values) => values.len(),
            TensorData::Bool(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named, shaped tensor passed to or returned from a session.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTensor {
    pub name: String,
    pub shape: Vec<usize>,
    pub data: TensorData,
}

impl NamedTensor {
    /// Build a tensor, checking that `shape` matches the element count.
    pub fn new(name: impl Into<String>, shape: Vec<usize>, data: TensorData) -> Result<Self> {
        let name = name.into();
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::Inference(format!(
                "tensor {name}: shape {shape:?} needs {expected} elements, got {}",
                data.len()
            )));
        }
        Ok(Self { name, shape, data })
    }
}

/// A live inference session.
pub trait InferenceSession: Send {
    fn run(&mut self, inputs: Vec<NamedTensor>) -> Result<Vec<NamedTensor>>;
}

/// Builds sessions from serialized model bytes.
pub trait SessionFactory: Send + Sync {
    fn create(&self, model: &[u8]) -> Result<Box<dyn InferenceSession>>;
}

/// A session shared between rendering workers; runs are serialized.
pub struct Session {
    inner: Mutex<Box<dyn InferenceSession>>,
}

impl Session {
    pub fn new(inner: Box<dyn InferenceSession>) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    pub fn run(&self, inputs: Vec<NamedTensor>) -> Result<Vec<NamedTensor>> {
        self.inner.lock().run(inputs)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

/// Read a model artifact, mapping I/O failures to [`Error::ModelLoad`].
pub(crate) fn read_artifact(resource: &'static str, path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Error::ModelLoad {
        resource,
        path: path.to_path_buf(),
        source,
    })
}

/// Read a model artifact and open a session on it.
pub(crate) fn open_session(
    factory: &dyn SessionFactory,
    resource: &'static str,
    path: &Path,
) -> Result<Session> {
    let bytes = read_artifact(resource, path)?;
    let session = factory.create(&bytes)?;
    tracing::debug!(resource, path = %path.display(), bytes = bytes.len(), "session created");
    Ok(Session::new(session))
}

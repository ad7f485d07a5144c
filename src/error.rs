//! Error types for presamp-rs.

use std::path::PathBuf;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Phoneme symbol missing from (or negative in) the phoneme vocabulary.
    #[error("phoneme \"{symbol}\" isn't supported by acoustic model. Please check {}", path.display())]
    UnknownPhoneme { symbol: String, path: PathBuf },

    /// Language prefix missing from (or negative in) the language vocabulary.
    #[error("language \"{language}\" isn't supported by acoustic model. Please check {}", path.display())]
    UnknownLanguage { language: String, path: PathBuf },

    /// A model artifact could not be read.
    #[error("failed to load {resource} from {}: {source}", path.display())]
    ModelLoad {
        resource: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid or incomplete configuration.
    #[error("config: {0}")]
    Config(String),

    /// Inference backend failure (session construction or run).
    #[error("inference: {0}")]
    Inference(String),

    /// I/O error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error.
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(feature = "onnx")]
impl From<ort::Error> for Error {
    fn from(error: ort::Error) -> Self {
        Error::Inference(error.to_string())
    }
}

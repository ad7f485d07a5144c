//! DiffSinger voice-model descriptors.
//!
//! A singer directory carries a `dsconfig.yaml` naming its vocabularies and
//! model artifacts. Pitch and variance predictors may live in `dspitch/` and
//! `dsvariance/` subdirectories with their own `dsconfig.yaml`; a vocoder may
//! live in `dsvocoder/` with a `vocoder.yaml`. All paths are relative to the
//! directory holding the config file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// File name of the singer-level (and predictor-level) descriptor.
pub const DS_CONFIG_FILE: &str = "dsconfig.yaml";

/// File name of a vocoder package descriptor.
pub const VOCODER_CONFIG_FILE: &str = "vocoder.yaml";

/// Model descriptor of a DiffSinger singer or predictor package.
///
/// Unknown keys are ignored: real voice banks carry many fields this crate
/// does not interpret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DsConfig {
    /// Phoneme vocabulary: `.json` symbol → ID map or newline-separated list.
    pub phonemes: String,
    /// Language vocabulary (`.json` symbol → ID map).
    pub languages: Option<String>,
    /// Acoustic model artifact.
    pub acoustic: Option<String>,
    /// Vocoder: a path or an inline configuration.
    pub vocoder: Option<VocoderSource>,
    /// Linguistic encoder shared by the pitch and variance predictors.
    pub linguistic: Option<String>,
    /// Pitch predictor model.
    pub pitch: Option<String>,
    /// Variance predictor model.
    pub variance: Option<String>,
    /// Speaker names; each has a `<name>.emb` embedding file.
    pub speakers: Vec<String>,
    /// Width of a speaker embedding.
    pub hidden_size: usize,
    /// Whether the acoustic model expects language IDs.
    pub use_lang_id: bool,
    pub sample_rate: u32,
    pub hop_size: u32,
}

impl Default for DsConfig {
    fn default() -> Self {
        Self {
            phonemes: "phonemes.txt".to_string(),
            languages: None,
            acoustic: None,
            vocoder: None,
            linguistic: None,
            pitch: None,
            variance: None,
            speakers: Vec::new(),
            hidden_size: 256,
            use_lang_id: false,
            sample_rate: 44100,
            hop_size: 512,
        }
    }
}

impl DsConfig {
    /// Load a descriptor from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be read or isn't valid YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty map.
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(data)?)
    }

    /// Frame length in milliseconds.
    pub fn frame_ms(&self) -> f64 {
        1000.0 * self.hop_size as f64 / self.sample_rate as f64
    }
}

/// Where the vocoder comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VocoderSource {
    /// A `.onnx` model file or a directory holding `vocoder.yaml`.
    Path(String),
    /// Configuration written directly into `dsconfig.yaml`.
    Inline(VocoderConfig),
}

/// Vocoder package descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocoderConfig {
    pub name: String,
    /// Model artifact, relative to the package directory.
    pub model: String,
    pub sample_rate: u32,
    pub hop_size: u32,
    pub num_mel_bins: u32,
    pub mel_fmin: f64,
    pub mel_fmax: f64,
}

impl Default for VocoderConfig {
    fn default() -> Self {
        Self {
            name: "vocoder".to_string(),
            model: "model.onnx".to_string(),
            sample_rate: 44100,
            hop_size: 512,
            num_mel_bins: 128,
            mel_fmin: 40.0,
            mel_fmax: 16000.0,
        }
    }
}

impl VocoderConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&data)?)
    }

    /// Frame length in milliseconds.
    pub fn frame_ms(&self) -> f64 {
        1000.0 * self.hop_size as f64 / self.sample_rate as f64
    }
}

/// Join a config-relative path onto its base directory.
///
/// Absolute paths are returned unchanged.
pub fn resolve_relative_path(base: &Path, maybe_relative: &str) -> PathBuf {
    let candidate = Path::new(maybe_relative);
    if candidate.is_absolute() {
        return candidate.to_path_buf();
    }
    base.join(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_for_missing_keys() {
        let config = DsConfig::from_yaml("acoustic: acoustic.onnx\n").unwrap();
        assert_eq!(config.acoustic.as_deref(), Some("acoustic.onnx"));
        assert_eq!(config.phonemes, "phonemes.txt");
        assert_eq!(config.hidden_size, 256);
        assert!(config.languages.is_none());
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(DsConfig::from_yaml("").unwrap(), DsConfig::default());
    }

    #[test]
    fn unknown_keys_ignored() {
        let yaml = "phonemes: dict.json\nuse_key_shift_embed: true\nmax_depth: 0.6\n";
        let config = DsConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.phonemes, "dict.json");
    }

    #[test]
    fn vocoder_as_path_or_inline() {
        let config = DsConfig::from_yaml("vocoder: nsf_hifigan\n").unwrap();
        assert_eq!(config.vocoder, Some(VocoderSource::Path("nsf_hifigan".into())));

        let yaml = "vocoder:\n  name: pc_nsf\n  model: pc.onnx\n  hop_size: 256\n";
        let config = DsConfig::from_yaml(yaml).unwrap();
        match config.vocoder {
            Some(VocoderSource::Inline(vocoder)) => {
                assert_eq!(vocoder.model, "pc.onnx");
                assert_eq!(vocoder.hop_size, 256);
                assert_eq!(vocoder.sample_rate, 44100);
            }
            other => panic!("expected inline vocoder, got {other:?}"),
        }
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(DsConfig::from_yaml("phonemes: [unterminated").is_err());
    }

    #[test]
    fn frame_length() {
        let config = DsConfig::default();
        assert!((config.frame_ms() - 11.609977).abs() < 1e-5);
    }

    #[test]
    fn relative_paths() {
        let base = Path::new("/banks/ds");
        assert_eq!(
            resolve_relative_path(base, "acoustic.onnx"),
            PathBuf::from("/banks/ds/acoustic.onnx")
        );
        assert_eq!(
            resolve_relative_path(base, "/models/a.onnx"),
            PathBuf::from("/models/a.onnx")
        );
    }
}

//! Vocoder: mel spectrogram (+ f0) → audio waveform.
//!
//! A vocoder comes either from a package directory holding `vocoder.yaml`
//! and its model, from an inline configuration in the singer's
//! `dsconfig.yaml`, or from a bare model file with default settings.

use std::path::{Path, PathBuf};

use super::{NamedTensor, Session, SessionFactory, open_session};
use crate::config::{VOCODER_CONFIG_FILE, VocoderConfig, resolve_relative_path};
use crate::{Error, Result};

#[derive(Debug)]
pub struct Vocoder {
    config: VocoderConfig,
    model_path: PathBuf,
    session: Session,
}

impl Vocoder {
    /// Load a vocoder package directory.
    pub fn load_package(factory: &dyn SessionFactory, dir: &Path) -> Result<Self> {
        let config = VocoderConfig::load(dir.join(VOCODER_CONFIG_FILE))?;
        Self::from_config(factory, dir, config)
    }

    /// Load from a configuration whose model path is relative to `base`.
    pub fn from_config(
        factory: &dyn SessionFactory,
        base: &Path,
        config: VocoderConfig,
    ) -> Result<Self> {
        verify(&config)?;
        let model_path = resolve_relative_path(base, &config.model);
        let session = open_session(factory, "vocoder", &model_path)?;
        tracing::info!(name = %config.name, path = %model_path.display(), "vocoder loaded");
        Ok(Self {
            config,
            model_path,
            session,
        })
    }

    /// Load a bare model file with default settings.
    pub fn from_model_file(factory: &dyn SessionFactory, path: &Path) -> Result<Self> {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("vocoder")
            .to_string();
        let config = VocoderConfig {
            name,
            model: path.to_string_lossy().into_owned(),
            ..Default::default()
        };
        Self::from_config(factory, Path::new(""), config)
    }

    pub fn config(&self) -> &VocoderConfig {
        &self.config
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn run(&self, inputs: Vec<NamedTensor>) -> Result<Vec<NamedTensor>> {
        self.session.run(inputs)
    }
}

/// Reject configurations the vocoder can't run with.
pub fn verify(config: &VocoderConfig) -> Result<()> {
    if config.sample_rate == 0 || config.hop_size == 0 {
        return Err(Error::Config(format!(
            "vocoder {}: sample_rate and hop_size must be positive",
            config.name
        )));
    }
    if config.mel_fmin >= config.mel_fmax {
        return Err(Error::Config(format!(
            "vocoder {}: mel_fmin {} must be below mel_fmax {}",
            config.name, config.mel_fmin, config.mel_fmax
        )));
    }
    Ok(())
}

//! Model lifecycle manager: lazily loads and releases a singer's models.
//!
//! The manager owns five independent [`ModelSlot`]s: acoustic model,
//! vocoder, pitch predictor, variance predictor and speaker embeddings.
//! Each is built from disk on first access and cached until
//! [`ModelManager::release_all`]. Slots have separate locks, so loading the
//! acoustic model never blocks releasing the vocoder.
//!
//! Loads are blocking file reads plus session construction and can't be
//! cancelled. A caller that needs a timeout should run the accessor on a
//! worker thread and treat a timeout as "still absent, retry later".
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use presamp_rs::DiffSingerSinger;
//! # use presamp_rs::model::{InferenceSession, SessionFactory};
//! # struct Backend;
//! # impl SessionFactory for Backend {
//! #     fn create(&self, _: &[u8]) -> presamp_rs::Result<Box<dyn InferenceSession>> { unimplemented!() }
//! # }
//!
//! let singer = DiffSingerSinger::load("voicebanks/ds_singer", Arc::new(Backend));
//! let acoustic = singer.models().acoustic().unwrap();
//! println!("model identity {:016x}", acoustic.hash());
//! singer.models().release_all();
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{DS_CONFIG_FILE, DsConfig, VOCODER_CONFIG_FILE, VocoderSource, resolve_relative_path};
use crate::model::SessionFactory;
use crate::model::acoustic::AcousticModel;
use crate::model::predictor::{Predictor, PredictorKind};
use crate::model::slot::ModelSlot;
use crate::model::speaker::SpeakerEmbedManager;
use crate::model::vocoder::Vocoder;
use crate::{Error, Result};

/// Subdirectory holding a vocoder package that overrides `dsconfig.yaml`.
pub const VOCODER_SUBDIRECTORY: &str = "dsvocoder";

/// Lazily loaded model handles of one singer.
pub struct ModelManager {
    location: PathBuf,
    config: Arc<DsConfig>,
    factory: Arc<dyn SessionFactory>,
    acoustic: ModelSlot<AcousticModel>,
    vocoder: ModelSlot<Vocoder>,
    pitch: ModelSlot<Predictor>,
    variance: ModelSlot<Predictor>,
    speaker_embeds: ModelSlot<SpeakerEmbedManager>,
}

impl ModelManager {
    pub fn new(
        location: impl Into<PathBuf>,
        config: Arc<DsConfig>,
        factory: Arc<dyn SessionFactory>,
    ) -> Self {
        Self {
            location: location.into(),
            config,
            factory,
            acoustic: ModelSlot::new("acoustic model"),
            vocoder: ModelSlot::new("vocoder"),
            pitch: ModelSlot::new("pitch predictor"),
            variance: ModelSlot::new("variance predictor"),
            speaker_embeds: ModelSlot::new("speaker embeddings"),
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    /// The acoustic model, loading it (and computing its hash) if needed.
    pub fn acoustic(&self) -> Result<Arc<AcousticModel>> {
        self.acoustic.get_or_try_load(|| {
            let relative = self.config.acoustic.as_deref().ok_or_else(|| {
                Error::Config(format!(
                    "acoustic model not set in {}",
                    self.location.join(DS_CONFIG_FILE).display()
                ))
            })?;
            let path = resolve_relative_path(&self.location, relative);
            AcousticModel::load(self.factory.as_ref(), &path)
        })
    }

    /// Content hash of the acoustic model, only while it is loaded.
    pub fn acoustic_hash(&self) -> Option<u64> {
        self.acoustic.peek().map(|model| model.hash())
    }

    /// The vocoder. A `dsvocoder/vocoder.yaml` package takes precedence over
    /// the `vocoder` entry of `dsconfig.yaml`.
    pub fn vocoder(&self) -> Result<Arc<Vocoder>> {
        self.vocoder.get_or_try_load(|| {
            let factory = self.factory.as_ref();
            let package = self.location.join(VOCODER_SUBDIRECTORY);
            if package.join(VOCODER_CONFIG_FILE).is_file() {
                return Vocoder::load_package(factory, &package);
            }
            match &self.config.vocoder {
                Some(VocoderSource::Inline(config)) => {
                    Vocoder::from_config(factory, &self.location, config.clone())
                }
                Some(VocoderSource::Path(relative)) => {
                    let path = resolve_relative_path(&self.location, relative);
                    if path.is_dir() {
                        Vocoder::load_package(factory, &path)
                    } else {
                        Vocoder::from_model_file(factory, &path)
                    }
                }
                None => Err(Error::Config(format!(
                    "no vocoder in {} and no {VOCODER_SUBDIRECTORY}/{VOCODER_CONFIG_FILE}",
                    self.location.join(DS_CONFIG_FILE).display()
                ))),
            }
        })
    }

    pub fn pitch_predictor(&self) -> Result<Arc<Predictor>> {
        self.pitch
            .get_or_try_load(|| self.load_predictor(PredictorKind::Pitch))
    }

    pub fn variance_predictor(&self) -> Result<Arc<Predictor>> {
        self.variance
            .get_or_try_load(|| self.load_predictor(PredictorKind::Variance))
    }

    pub fn speaker_embeds(&self) -> Result<Arc<SpeakerEmbedManager>> {
        self.speaker_embeds
            .get_or_try_load(|| SpeakerEmbedManager::load(&self.config, &self.location))
    }

    /// A predictor package subdirectory with its own descriptor takes
    /// precedence over the singer root.
    fn load_predictor(&self, kind: PredictorKind) -> Result<Predictor> {
        let factory = self.factory.as_ref();
        let package = self.location.join(kind.subdirectory());
        if package.join(DS_CONFIG_FILE).is_file() {
            return Predictor::load(factory, kind, &package);
        }
        Predictor::from_config(factory, kind, &self.location, (*self.config).clone())
    }

    /// Which resources are currently loaded, by name.
    pub fn loaded(&self) -> Vec<&'static str> {
        let slots = [
            (self.acoustic.name(), self.acoustic.is_loaded()),
            (self.vocoder.name(), self.vocoder.is_loaded()),
            (self.pitch.name(), self.pitch.is_loaded()),
            (self.variance.name(), self.variance.is_loaded()),
            (self.speaker_embeds.name(), self.speaker_embeds.is_loaded()),
        ];
        slots
            .into_iter()
            .filter_map(|(name, loaded)| loaded.then_some(name))
            .collect()
    }

    /// Release every loaded resource. Returns how many were released.
    ///
    /// Each resource is released under its own lock; absent ones are skipped.
    pub fn release_all(&self) -> usize {
        let released = [
            self.acoustic.release(),
            self.vocoder.release(),
            self.pitch.release(),
            self.variance.release(),
            self.speaker_embeds.release(),
        ]
        .into_iter()
        .filter(|&released| released)
        .count();
        tracing::info!(location = %self.location.display(), released, "freed singer models");
        released
    }
}

impl std::fmt::Debug for ModelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelManager")
            .field("location", &self.location)
            .field("loaded", &self.loaded())
            .finish_non_exhaustive()
    }
}

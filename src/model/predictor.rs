//! Pitch and variance predictors.
//!
//! Both run a linguistic encoder over the phoneme sequence and feed its
//! output to a predictor model. A predictor package may ship its own phoneme
//! vocabulary, so each predictor carries a tokenizer built from its own
//! descriptor.

use std::path::{Path, PathBuf};

use super::{NamedTensor, Session, SessionFactory, open_session};
use crate::config::{DS_CONFIG_FILE, DsConfig, resolve_relative_path};
use crate::tokenizer::{PhonemeTokenizer, Vocabulary};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictorKind {
    Pitch,
    Variance,
}

impl PredictorKind {
    /// Package subdirectory that overrides the singer-level descriptor.
    pub fn subdirectory(self) -> &'static str {
        match self {
            PredictorKind::Pitch => "dspitch",
            PredictorKind::Variance => "dsvariance",
        }
    }

    pub fn resource(self) -> &'static str {
        match self {
            PredictorKind::Pitch => "pitch predictor",
            PredictorKind::Variance => "variance predictor",
        }
    }

    fn model<'c>(self, config: &'c DsConfig) -> Option<&'c str> {
        match self {
            PredictorKind::Pitch => config.pitch.as_deref(),
            PredictorKind::Variance => config.variance.as_deref(),
        }
    }
}

#[derive(Debug)]
pub struct Predictor {
    kind: PredictorKind,
    root: PathBuf,
    config: DsConfig,
    tokenizer: PhonemeTokenizer,
    linguistic: Session,
    model: Session,
}

impl Predictor {
    /// Load from `root/dsconfig.yaml`.
    pub fn load(factory: &dyn SessionFactory, kind: PredictorKind, root: &Path) -> Result<Self> {
        let config = DsConfig::load(root.join(DS_CONFIG_FILE))?;
        Self::from_config(factory, kind, root, config)
    }

    /// Load with an already parsed descriptor whose paths are relative to `root`.
    pub fn from_config(
        factory: &dyn SessionFactory,
        kind: PredictorKind,
        root: &Path,
        config: DsConfig,
    ) -> Result<Self> {
        let missing = |field: &str| {
            Error::Config(format!(
                "{}: `{field}` not set in {}",
                kind.resource(),
                root.join(DS_CONFIG_FILE).display()
            ))
        };
        let linguistic_path = config
            .linguistic
            .as_deref()
            .ok_or_else(|| missing("linguistic"))?;
        let model_path = kind.model(&config).ok_or_else(|| {
            missing(match kind {
                PredictorKind::Pitch => "pitch",
                PredictorKind::Variance => "variance",
            })
        })?;

        let tokenizer = load_tokenizer(root, &config)?;
        let linguistic = open_session(
            factory,
            "linguistic model",
            &resolve_relative_path(root, linguistic_path),
        )?;
        let model = open_session(
            factory,
            kind.resource(),
            &resolve_relative_path(root, model_path),
        )?;
        tracing::info!(kind = kind.resource(), root = %root.display(), "predictor loaded");

        Ok(Self {
            kind,
            root: root.to_path_buf(),
            config,
            tokenizer,
            linguistic,
            model,
        })
    }

    pub fn kind(&self) -> PredictorKind {
        self.kind
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &DsConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &PhonemeTokenizer {
        &self.tokenizer
    }

    /// Run the linguistic encoder.
    pub fn encode(&self, inputs: Vec<NamedTensor>) -> Result<Vec<NamedTensor>> {
        self.linguistic.run(inputs)
    }

    /// Run the predictor on encoder output.
    pub fn predict(&self, inputs: Vec<NamedTensor>) -> Result<Vec<NamedTensor>> {
        self.model.run(inputs)
    }
}

fn load_tokenizer(root: &Path, config: &DsConfig) -> Result<PhonemeTokenizer> {
    let phonemes = Vocabulary::load(resolve_relative_path(root, &config.phonemes))?;
    let languages = match config.languages.as_deref() {
        Some(path) => Vocabulary::load_json(resolve_relative_path(root, path))?,
        None => Vocabulary::empty(root),
    };
    Ok(PhonemeTokenizer::new(phonemes, languages))
}

//! DiffSinger singer: descriptor, vocabularies and model handles.
//!
//! Loading a singer never fails. Configuration problems are logged, recorded
//! in [`DiffSingerSinger::errors`], and replaced by defaults, so a broken
//! bank still shows up (and explains itself) instead of vanishing. Model
//! errors surface later, on first access to the model concerned.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::Result;
use crate::config::{DS_CONFIG_FILE, DsConfig, VocoderSource, resolve_relative_path};
use crate::manager::ModelManager;
use crate::model::SessionFactory;
use crate::phonemizer::{AliasLookup, Oto};
use crate::tokenizer::{PhonemeTokenizer, Vocabulary};

pub struct DiffSingerSinger {
    name: String,
    location: PathBuf,
    config: Arc<DsConfig>,
    tokenizer: PhonemeTokenizer,
    errors: Vec<String>,
    models: ModelManager,
}

impl DiffSingerSinger {
    /// Load the singer at `location`; models are created with `factory` on
    /// first use.
    pub fn load(location: impl Into<PathBuf>, factory: Arc<dyn SessionFactory>) -> Self {
        let location = location.into();
        let name = location
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| location.display().to_string());
        let mut errors = Vec::new();

        let config_path = location.join(DS_CONFIG_FILE);
        let config = match DsConfig::load(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(singer = %name, path = %config_path.display(), "failed to load {DS_CONFIG_FILE}: {e}");
                errors.push(format!("failed to load {}: {e}", config_path.display()));
                DsConfig::default()
            }
        };

        let phonemes_path = resolve_relative_path(&location, &config.phonemes);
        let phonemes = Vocabulary::load(&phonemes_path).unwrap_or_else(|e| {
            tracing::error!(singer = %name, path = %phonemes_path.display(), "failed to load phonemes: {e}");
            errors.push(format!("failed to load phonemes {}: {e}", phonemes_path.display()));
            Vocabulary::empty(&phonemes_path)
        });

        let languages = match config.languages.as_deref() {
            Some(relative) => {
                let path = resolve_relative_path(&location, relative);
                Vocabulary::load_json(&path).unwrap_or_else(|e| {
                    tracing::error!(singer = %name, path = %path.display(), "failed to load languages: {e}");
                    errors.push(format!("failed to load languages {}: {e}", path.display()));
                    Vocabulary::empty(&path)
                })
            }
            None => Vocabulary::empty(location.join("languages.json")),
        };

        let config = Arc::new(config);
        tracing::info!(
            singer = %name,
            phonemes = phonemes.len(),
            languages = languages.len(),
            errors = errors.len(),
            "singer loaded"
        );
        Self {
            models: ModelManager::new(&location, config.clone(), factory),
            name,
            location,
            config,
            tokenizer: PhonemeTokenizer::new(phonemes, languages),
            errors,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn config(&self) -> &DsConfig {
        &self.config
    }

    /// Problems found while loading; empty for a healthy singer.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn found(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn tokenizer(&self) -> &PhonemeTokenizer {
        &self.tokenizer
    }

    pub fn tokenize_phoneme(&self, symbol: &str) -> Result<i64> {
        self.tokenizer.tokenize_phoneme(symbol)
    }

    pub fn tokenize_language(&self, symbol: &str) -> Result<i64> {
        self.tokenizer.tokenize_language(symbol)
    }

    pub fn models(&self) -> &ModelManager {
        &self.models
    }

    /// Serializable overview of the descriptor, vocabularies and load errors.
    pub fn summary(&self) -> SingerSummary<'_> {
        let config = &*self.config;
        SingerSummary {
            name: &self.name,
            location: &self.location,
            phonemes: VocabularySummary::of(self.tokenizer.phonemes()),
            languages: VocabularySummary::of(self.tokenizer.languages()),
            acoustic: config.acoustic.as_deref(),
            vocoder: config.vocoder.as_ref(),
            linguistic: config.linguistic.as_deref(),
            pitch: config.pitch.as_deref(),
            variance: config.variance.as_deref(),
            speakers: &config.speakers,
            use_lang_id: config.use_lang_id,
            sample_rate: config.sample_rate,
            hop_size: config.hop_size,
            frame_ms: config.frame_ms(),
            errors: &self.errors,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SingerSummary<'a> {
    pub name: &'a str,
    pub location: &'a Path,
    pub phonemes: VocabularySummary<'a>,
    pub languages: VocabularySummary<'a>,
    pub acoustic: Option<&'a str>,
    pub vocoder: Option<&'a VocoderSource>,
    pub linguistic: Option<&'a str>,
    pub pitch: Option<&'a str>,
    pub variance: Option<&'a str>,
    pub speakers: &'a [String],
    pub use_lang_id: bool,
    pub sample_rate: u32,
    pub hop_size: u32,
    pub frame_ms: f64,
    pub errors: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct VocabularySummary<'a> {
    pub path: &'a Path,
    pub size: usize,
}

impl<'a> VocabularySummary<'a> {
    fn of(vocabulary: &'a Vocabulary) -> Self {
        Self {
            path: vocabulary.path(),
            size: vocabulary.len(),
        }
    }
}

/// A DiffSinger bank has no recorded samples: an alias exists when every
/// space-separated part is a known phoneme, with zero timing. Empty parts
/// (leading, trailing or doubled spaces) never match.
impl AliasLookup for DiffSingerSinger {
    fn resolve(&self, alias: &str, _tone: i32, _color: Option<&str>) -> Option<Oto> {
        let phonemes = self.tokenizer.phonemes();
        alias
            .split(' ')
            .all(|part| !part.is_empty() && phonemes.contains(part))
            .then(|| Oto::dummy(alias))
    }
}

impl std::fmt::Debug for DiffSingerSinger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffSingerSinger")
            .field("name", &self.name)
            .field("location", &self.location)
            .field("errors", &self.errors)
            .field("models", &self.models)
            .finish_non_exhaustive()
    }
}

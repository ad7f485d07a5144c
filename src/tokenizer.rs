//! Phoneme and language tokenization.
//!
//! Vocabularies map symbols to the integer IDs the acoustic model was trained
//! with. They are loaded once per singer and never mutated. An unknown symbol
//! is always an error: silently mapping it to a default ID would render the
//! wrong sound.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Separator between a language prefix and a phoneme (`"ja/a"`).
pub const LANGUAGE_SEPARATOR: char = '/';

/// Symbol → ID table together with the file it came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    path: PathBuf,
    ids: HashMap<String, i64>,
}

impl Vocabulary {
    /// An empty vocabulary attributed to `path` (used in diagnostics).
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ids: HashMap::new(),
        }
    }

    /// Load a vocabulary, choosing the format by extension: `.json` is a
    /// symbol → ID object, anything else a newline-separated list.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::load_json(path)
        } else {
            Self::load_list(path)
        }
    }

    /// Load a JSON object of symbol → ID.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)?;
        let ids: HashMap<String, i64> = serde_json::from_str(&data)?;
        Ok(Self {
            path: path.to_path_buf(),
            ids,
        })
    }

    /// Load a newline-separated symbol list; the ID is the position among
    /// non-blank lines.
    pub fn load_list(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)?;
        Ok(Self::from_list(path, &data))
    }

    /// Build from list text. Blank lines are skipped without consuming an
    /// ID; a repeated symbol keeps its first ID.
    pub fn from_list(path: impl Into<PathBuf>, text: &str) -> Self {
        let mut ids = HashMap::new();
        let symbols = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty());
        for (id, symbol) in symbols.enumerate() {
            ids.entry(symbol.to_string()).or_insert(id as i64);
        }
        Self {
            path: path.into(),
            ids,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw ID lookup; may return a negative ID.
    pub fn get(&self, symbol: &str) -> Option<i64> {
        self.ids.get(symbol).copied()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.ids.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Tokenizer over a singer's phoneme and language vocabularies.
#[derive(Debug, Clone, Default)]
pub struct PhonemeTokenizer {
    phonemes: Vocabulary,
    languages: Vocabulary,
}

impl PhonemeTokenizer {
    pub fn new(phonemes: Vocabulary, languages: Vocabulary) -> Self {
        Self {
            phonemes,
            languages,
        }
    }

    pub fn phonemes(&self) -> &Vocabulary {
        &self.phonemes
    }

    pub fn languages(&self) -> &Vocabulary {
        &self.languages
    }

    /// ID of a phoneme symbol.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownPhoneme`] if the symbol is absent or mapped to a
    /// negative ID.
    pub fn tokenize_phoneme(&self, symbol: &str) -> Result<i64> {
        match self.phonemes.get(symbol) {
            Some(id) if id >= 0 => Ok(id),
            _ => Err(Error::UnknownPhoneme {
                symbol: symbol.to_string(),
                path: self.phonemes.path().to_path_buf(),
            }),
        }
    }

    /// Language ID of a possibly language-prefixed symbol.
    ///
    /// Symbols without a separator belong to the default language, ID 0.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownLanguage`] if the prefix is absent or mapped to a
    /// negative ID.
    pub fn tokenize_language(&self, symbol: &str) -> Result<i64> {
        let Some((language, _)) = symbol.split_once(LANGUAGE_SEPARATOR) else {
            return Ok(0);
        };
        match self.languages.get(language) {
            Some(id) if id >= 0 => Ok(id),
            _ => Err(Error::UnknownLanguage {
                language: language.to_string(),
                path: self.languages.path().to_path_buf(),
            }),
        }
    }

    /// Tokenize a phoneme sequence into parallel phoneme and language IDs.
    pub fn tokenize_all<S: AsRef<str>>(&self, symbols: &[S]) -> Result<(Vec<i64>, Vec<i64>)> {
        symbols
            .iter()
            .map(|symbol| {
                let symbol = symbol.as_ref();
                Ok((self.tokenize_phoneme(symbol)?, self.tokenize_language(symbol)?))
            })
            .collect::<Result<Vec<_>>>()
            .map(|pairs| pairs.into_iter().unzip())
    }
}

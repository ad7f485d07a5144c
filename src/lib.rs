//! Japanese presamp phonemization and DiffSinger voice-model management.
//!
//! Turns sung lyric notes into timed phoneme events following the Japanese
//! "presamp" VCV / CVVC voice-bank convention, and manages the neural
//! sub-models of a DiffSinger singer.
//!
//! ## Flow
//!
//! ```text
//! notes ──→ PresampPhonemizer ──→ candidate aliases ──→ AliasLookup (voice bank)
//!                   │                                          │
//!                   └──────────── timed phonemes ←─────────────┘
//!                                       ↓
//!                         PhonemeTokenizer (phoneme + language IDs)
//!                                       ↓
//!     ModelManager: acoustic · vocoder · pitch · variance · speaker embeddings
//! ```
//!
//! ## Modules
//!
//! - [`phonemizer`]: mora tables, alias resolution, the presamp engine
//! - [`config`]: `dsconfig.yaml` / `vocoder.yaml` descriptors
//! - [`tokenizer`]: phoneme and language vocabularies
//! - [`model`]: inference seam and the individual model handles
//! - [`manager`]: lazy per-resource model lifecycle
//! - [`singer`]: a DiffSinger singer on disk

pub mod config;
pub mod manager;
pub mod model;
pub mod phonemizer;
pub mod singer;
pub mod tokenizer;

mod error;

pub use error::{Error, Result};
pub use manager::ModelManager;
pub use singer::DiffSingerSinger;

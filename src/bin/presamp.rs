//! presamp CLI: phonemize lyrics and inspect DiffSinger singers.
//!
//! Every subcommand prints JSON to stdout: one object per line for
//! `phonemize` and `tokenize`, a single object for `inspect`. Logs go to
//! stderr (`RUST_LOG` overrides the default `info` filter).
//!
//! ```text
//! presamp phonemize --singer banks/ds_ja --notes song.json --bpm 140
//! {"note":0,"phoneme":"- a","position":0,"tokens":[1,12]}
//! ```
//!
//! Exit code 0 on success, non-zero on error.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use presamp_rs::DiffSingerSinger;
use presamp_rs::model::SessionFactory;
use presamp_rs::phonemizer::{FixedTempo, MoraTables, Note, NoteContext, PresampPhonemizer};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "presamp",
    about = "Japanese presamp phonemizer and DiffSinger singer tools"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Phonemize a note sequence against a singer.
    Phonemize {
        /// Singer directory (holds dsconfig.yaml).
        #[arg(long)]
        singer: PathBuf,

        /// JSON array of notes: {"lyric": "か", "tone": 60, "duration": 480}.
        /// Notes are laid out back to back.
        #[arg(long)]
        notes: PathBuf,

        /// Tempo in beats per minute.
        #[arg(long, default_value_t = 120.0)]
        bpm: f64,

        /// Ticks per quarter note.
        #[arg(long, default_value_t = 480)]
        resolution: u32,
    },

    /// Print phoneme and language IDs of symbols.
    Tokenize {
        #[arg(long)]
        singer: PathBuf,

        #[arg(required = true)]
        symbols: Vec<String>,
    },

    /// Print a JSON summary of a singer.
    Inspect {
        #[arg(long)]
        singer: PathBuf,
    },
}

#[derive(Serialize)]
struct PhonemeLine<'a> {
    note: usize,
    phoneme: &'a str,
    position: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tokens: Option<Vec<i64>>,
}

/// Session factory for builds without an inference backend.
#[cfg(not(feature = "onnx"))]
struct NoBackend;

#[cfg(not(feature = "onnx"))]
impl SessionFactory for NoBackend {
    fn create(&self, _model: &[u8]) -> presamp_rs::Result<Box<dyn presamp_rs::model::InferenceSession>> {
        Err(presamp_rs::Error::Inference(
            "built without the `onnx` feature".to_string(),
        ))
    }
}

fn session_factory() -> Arc<dyn SessionFactory> {
    #[cfg(feature = "onnx")]
    {
        Arc::new(presamp_rs::model::onnx::OrtSessionFactory)
    }
    #[cfg(not(feature = "onnx"))]
    {
        Arc::new(NoBackend)
    }
}

fn load_singer(location: &Path) -> anyhow::Result<DiffSingerSinger> {
    if !location.is_dir() {
        anyhow::bail!("singer directory {} does not exist", location.display());
    }
    let singer = DiffSingerSinger::load(location, session_factory());
    for error in singer.errors() {
        tracing::warn!(singer = singer.name(), "{error}");
    }
    Ok(singer)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match Args::parse().command {
        Command::Phonemize {
            singer,
            notes,
            bpm,
            resolution,
        } => phonemize(&singer, &notes, bpm, resolution),
        Command::Tokenize { singer, symbols } => tokenize(&singer, &symbols),
        Command::Inspect { singer } => inspect(&singer),
    }
}

fn phonemize(singer: &Path, notes: &Path, bpm: f64, resolution: u32) -> anyhow::Result<()> {
    if bpm.is_nan() || bpm <= 0.0 || resolution == 0 {
        anyhow::bail!("bpm and resolution must be positive, got {bpm} and {resolution}");
    }
    let singer = load_singer(singer)?;
    let data = std::fs::read_to_string(notes)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", notes.display()))?;
    let notes: Vec<Note> = serde_json::from_str(&data)?;

    let tempo = FixedTempo::new(bpm, resolution);
    let phonemizer = PresampPhonemizer::new(MoraTables::shared(), &singer, &tempo);

    let mut start = 0;
    for (index, note) in notes.iter().enumerate() {
        let prev = index.checked_sub(1).and_then(|i| notes.get(i));
        let ctx = NoteContext::new(std::slice::from_ref(note), prev, notes.get(index + 1));
        for phoneme in phonemizer.process(&ctx).phonemes {
            let tokens = phoneme
                .phoneme
                .split_whitespace()
                .map(|part| singer.tokenize_phoneme(part).ok())
                .collect::<Option<Vec<_>>>();
            let line = PhonemeLine {
                note: index,
                phoneme: &phoneme.phoneme,
                position: start + phoneme.position,
                tokens,
            };
            println!("{}", serde_json::to_string(&line)?);
        }
        start += note.duration;
    }
    Ok(())
}

fn tokenize(singer: &Path, symbols: &[String]) -> anyhow::Result<()> {
    let singer = load_singer(singer)?;
    let mut failed = 0;
    for symbol in symbols {
        let ids = singer
            .tokenize_phoneme(symbol)
            .and_then(|phoneme| Ok((phoneme, singer.tokenize_language(symbol)?)));
        match ids {
            Ok((phoneme, language)) => println!(
                "{}",
                serde_json::json!({ "symbol": symbol, "phoneme": phoneme, "language": language })
            ),
            Err(e) => {
                eprintln!("{e}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} symbols could not be tokenized", symbols.len());
    }
    Ok(())
}

fn inspect(singer: &Path) -> anyhow::Result<()> {
    let singer = load_singer(singer)?;
    println!("{}", serde_json::to_string_pretty(&singer.summary())?);
    Ok(())
}

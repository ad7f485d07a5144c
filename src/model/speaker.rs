//! Speaker embeddings for multi-speaker acoustic models.
//!
//! Each configured speaker has a `<name>.emb` file next to the descriptor
//! holding `hidden_size` little-endian `f32` values. Mixing speakers is a
//! weighted sum of their embeddings.

use std::path::Path;

use super::read_artifact;
use crate::config::{DsConfig, resolve_relative_path};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct SpeakerEmbedManager {
    hidden_size: usize,
    speakers: Vec<String>,
    /// Row-major `[speakers, hidden_size]`.
    embeds: Vec<f32>,
}

impl SpeakerEmbedManager {
    /// Read every configured speaker's embedding.
    pub fn load(config: &DsConfig, location: &Path) -> Result<Self> {
        let hidden_size = config.hidden_size;
        let mut embeds = Vec::with_capacity(config.speakers.len() * hidden_size);
        for speaker in &config.speakers {
            let path = resolve_relative_path(location, &format!("{speaker}.emb"));
            let bytes = read_artifact("speaker embedding", &path)?;
            if bytes.len() != hidden_size * 4 {
                return Err(Error::Config(format!(
                    "speaker embedding {} has {} bytes, expected {} ({} f32 values)",
                    path.display(),
                    bytes.len(),
                    hidden_size * 4,
                    hidden_size
                )));
            }
            embeds.extend(
                bytes
                    .chunks_exact(4)
                    .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])),
            );
        }
        tracing::info!(speakers = config.speakers.len(), hidden_size, "speaker embeddings loaded");
        Ok(Self {
            hidden_size,
            speakers: config.speakers.clone(),
            embeds,
        })
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    pub fn speakers(&self) -> &[String] {
        &self.speakers
    }

    pub fn speaker_index(&self, name: &str) -> Option<usize> {
        self.speakers.iter().position(|speaker| speaker == name)
    }

    pub fn embedding(&self, name: &str) -> Option<&[f32]> {
        let index = self.speaker_index(name)?;
        let start = index * self.hidden_size;
        Some(&self.embeds[start..start + self.hidden_size])
    }

    /// Weighted sum of all speaker embeddings; `weights[i]` scales speaker `i`.
    pub fn mix(&self, weights: &[f32]) -> Result<Vec<f32>> {
        if weights.len() != self.speakers.len() {
            return Err(Error::Config(format!(
                "got {} speaker weights for {} speakers",
                weights.len(),
                self.speakers.len()
            )));
        }
        let mut mixed = vec![0.0f32; self.hidden_size];
        for (embed, &weight) in self.embeds.chunks_exact(self.hidden_size.max(1)).zip(weights) {
            for (out, value) in mixed.iter_mut().zip(embed) {
                *out += weight * value;
            }
        }
        Ok(mixed)
    }

    /// Mix one embedding per frame; `frames[t]` holds the weights at frame
    /// `t`. Returns row-major `[frames, hidden_size]`.
    pub fn mix_frames(&self, frames: &[Vec<f32>]) -> Result<Vec<f32>> {
        let mut out = Vec::with_capacity(frames.len() * self.hidden_size);
        for weights in frames {
            out.extend(self.mix(weights)?);
        }
        Ok(out)
    }
}

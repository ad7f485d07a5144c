//! Lyric-to-phoneme analysis for Japanese presamp-style voice banks.
//!
//! ## Components
//!
//! - [`tables`]: fixed mora → vowel / consonant tables and consonant substitutions
//! - [`alias`]: voice-bank alias lookup and ordered candidate resolution
//! - [`timing`]: millisecond → tick conversion
//! - [`presamp`]: the per-note VCV / CVVC decision procedure
//!
//! The engine only reads its inputs and the immutable tables, so any number of
//! note groups can be processed concurrently.

pub mod alias;
pub mod presamp;
pub mod tables;
pub mod timing;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

pub use alias::{AliasLookup, Oto, OtoMap, resolve_first_hit};
pub use presamp::PresampPhonemizer;
pub use tables::MoraTables;
pub use timing::{FixedTempo, TimeAxis};

/// Per-phoneme attributes attached to a note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhonemeAttributes {
    /// Phoneme index within the note this attribute applies to.
    pub index: usize,
    /// Pitch shift in semitones applied when looking up samples.
    pub tone_shift: i32,
    /// Voice-color tag selecting a timbral variant.
    pub voice_color: Option<String>,
    /// Consonant stretch ratio. `None` means 1.0.
    pub consonant_stretch_ratio: Option<f64>,
}

/// A sung note as seen by the phonemizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Note {
    pub lyric: String,
    /// Pitch in semitones (MIDI note number).
    pub tone: i32,
    /// Duration in ticks.
    pub duration: i32,
    pub phoneme_attributes: Vec<PhonemeAttributes>,
}

impl Note {
    pub fn new(lyric: impl Into<String>, tone: i32, duration: i32) -> Self {
        Self {
            lyric: lyric.into(),
            tone,
            duration,
            phoneme_attributes: Vec::new(),
        }
    }

    /// Builder-style helper to attach an attribute.
    pub fn with_attribute(mut self, attribute: PhonemeAttributes) -> Self {
        self.phoneme_attributes.push(attribute);
        self
    }

    /// Attribute for the given phoneme index, or defaults when none is set.
    pub fn attribute(&self, index: usize) -> PhonemeAttributes {
        self.phoneme_attributes
            .iter()
            .find(|attr| attr.index == index)
            .cloned()
            .unwrap_or(PhonemeAttributes {
                index,
                ..Default::default()
            })
    }

    /// Lookup pitch for phoneme `index`: note tone plus the attribute's shift.
    pub fn shifted_tone(&self, index: usize) -> i32 {
        self.tone + self.attribute(index).tone_shift
    }

    /// The lyric split into extended grapheme clusters.
    pub fn graphemes(&self) -> Vec<&str> {
        self.lyric.graphemes(true).collect()
    }
}

/// Neighbourhood of the note group being phonemized.
///
/// `notes[0]` is the sounding note; later entries are extender notes merged
/// into the same output unit. Only `prev_neighbour` and `next_neighbour` drive
/// the presamp rules; the other fields are carried for hosts that pass full
/// context.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoteContext<'a> {
    pub notes: &'a [Note],
    pub prev: Option<&'a Note>,
    pub next: Option<&'a Note>,
    pub prev_neighbour: Option<&'a Note>,
    pub next_neighbour: Option<&'a Note>,
    pub prev_neighbours: &'a [Note],
}

impl<'a> NoteContext<'a> {
    /// Context for a group with direct neighbours only.
    pub fn new(
        notes: &'a [Note],
        prev_neighbour: Option<&'a Note>,
        next_neighbour: Option<&'a Note>,
    ) -> Self {
        Self {
            notes,
            prev: prev_neighbour,
            next: next_neighbour,
            prev_neighbour,
            next_neighbour,
            prev_neighbours: &[],
        }
    }

    /// Sum of durations of every note merged into this group.
    pub fn total_duration(&self) -> i32 {
        self.notes.iter().map(|note| note.duration).sum()
    }
}

/// A phoneme placed on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phoneme {
    pub phoneme: String,
    /// Ticks relative to the start of the note group.
    pub position: i32,
}

impl Phoneme {
    pub fn new(phoneme: impl Into<String>, position: i32) -> Self {
        Self {
            phoneme: phoneme.into(),
            position,
        }
    }
}

/// Output of one phonemizer invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhonemizerResult {
    pub phonemes: Vec<Phoneme>,
}

impl PhonemizerResult {
    /// A result holding a single phoneme at position 0.
    pub fn simple(phoneme: impl Into<String>) -> Self {
        Self {
            phonemes: vec![Phoneme::new(phoneme, 0)],
        }
    }
}

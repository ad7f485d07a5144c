//! Millisecond → tick conversion.

/// Project time axis as seen by the phonemizer.
pub trait TimeAxis: Send + Sync {
    /// Convert a duration in milliseconds to ticks at the note group's
    /// position, rounded to the nearest tick.
    fn ms_to_ticks(&self, ms: f64) -> i32;
}

/// A single constant tempo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTempo {
    /// Beats (quarter notes) per minute.
    pub bpm: f64,
    /// Ticks per quarter note.
    pub resolution: u32,
}

impl Default for FixedTempo {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            resolution: 480,
        }
    }
}

impl FixedTempo {
    pub fn new(bpm: f64, resolution: u32) -> Self {
        Self { bpm, resolution }
    }

    /// Ticks per millisecond at this tempo.
    pub fn ticks_per_ms(&self) -> f64 {
        self.bpm * self.resolution as f64 / 60_000.0
    }
}

impl TimeAxis for FixedTempo {
    fn ms_to_ticks(&self, ms: f64) -> i32 {
        (ms * self.ticks_per_ms()).round() as i32
    }
}

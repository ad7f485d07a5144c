//! Presamp VCV / CVVC phonemizer.
//!
//! For each note group the engine:
//!
//! 1. Picks the sounding alias of the current note from an ordered candidate
//!    list built from the previous neighbour (`"- か"`, `"a か"`, `"* か"`, `"か"`).
//! 2. Decides whether a vowel→consonant transition (`"a s"`) must be placed
//!    before the next note, skipping it when the next note is vowel-led or
//!    will itself consume a combined VCV alias.
//! 3. Times that transition from the next sample's preutter/overlap.
//!
//! Every lookup miss degrades to a single phoneme; nothing here fails.

use super::alias::{AliasLookup, Oto, resolve_first_hit};
use super::tables::MoraTables;
use super::timing::TimeAxis;
use super::{Note, NoteContext, Phoneme, PhonemizerResult};

/// VC length in ticks when the next note has no sample to time it from.
pub const DEFAULT_VC_LENGTH: i32 = 120;

/// Phonemizer for Japanese presamp voice banks (JA VCV & CVVC).
///
/// Holds only shared references, so one instance can serve many worker
/// threads at once.
#[derive(Clone, Copy)]
pub struct PresampPhonemizer<'a> {
    tables: &'a MoraTables,
    lookup: &'a dyn AliasLookup,
    time_axis: &'a dyn TimeAxis,
}

impl<'a> PresampPhonemizer<'a> {
    pub fn new(
        tables: &'a MoraTables,
        lookup: &'a dyn AliasLookup,
        time_axis: &'a dyn TimeAxis,
    ) -> Self {
        Self {
            tables,
            lookup,
            time_axis,
        }
    }

    /// Phonemize one note group.
    pub fn process(&self, ctx: &NoteContext<'_>) -> PhonemizerResult {
        let Some(note) = ctx.notes.first() else {
            return PhonemizerResult::default();
        };

        let candidates = self.current_candidates(&note.lyric, ctx.prev_neighbour);
        let current = self
            .resolve_for(&candidates, note)
            .map(|oto| oto.alias)
            .unwrap_or_else(|| note.lyric.clone());

        let Some(next) = ctx.next_neighbour else {
            return PhonemizerResult::simple(current);
        };
        let Some(vc) = self.vc_transition(note, next) else {
            return PhonemizerResult::simple(current);
        };

        let total_duration = ctx.total_duration();
        let vc_length = self.vc_length(next, total_duration);
        PhonemizerResult {
            phonemes: vec![
                Phoneme::new(current, 0),
                Phoneme::new(vc, total_duration - vc_length),
            ],
        }
    }

    /// Ordered alias candidates for the current lyric given its predecessor.
    pub fn current_candidates(&self, lyric: &str, prev: Option<&Note>) -> Vec<String> {
        let initial = format!("- {lyric}");
        let Some(prev) = prev else {
            return vec![initial, lyric.to_string()];
        };

        let prev_units = prev.graphemes();
        if let Some(vowel) = prev_units.last().and_then(|unit| self.tables.vowel_of(unit)) {
            vec![
                format!("{vowel} {lyric}"),
                format!("* {lyric}"),
                lyric.to_string(),
            ]
        } else if self.tables.contains_plain_consonant(&prev.lyric) {
            vec![lyric.to_string(), initial]
        } else {
            vec![initial, lyric.to_string()]
        }
    }

    /// The VC alias to place before `next`, if one is needed and exists.
    fn vc_transition(&self, note: &Note, next: &Note) -> Option<String> {
        let next_units = next.graphemes();
        if next_units.len() < 2
            && next_units
                .first()
                .is_some_and(|unit| self.tables.is_plain_vowel(unit))
        {
            return None;
        }

        let vowel = note
            .graphemes()
            .last()
            .and_then(|unit| self.tables.vowel_of(unit))
            .unwrap_or_default();

        if !vowel.is_empty() {
            // The next note will pick a combined "v CV" alias itself.
            let probe = [format!("{vowel} {}", next.lyric), next.lyric.clone()];
            if let Some(oto) = self.resolve_for(&probe, next)
                && oto.alias.contains(' ')
            {
                return None;
            }
        }

        let consonant = self.tables.consonant_of_units(&next_units)?;
        let mut candidates = vec![format!("{vowel} {consonant}")];
        if let Some(substitute) = self.tables.substitute_for(consonant) {
            candidates.push(format!("{vowel} {substitute}"));
        }
        self.resolve_for(&candidates, note).map(|oto| oto.alias)
    }

    /// Length of the VC phoneme in ticks, clamped to half the group.
    fn vc_length(&self, next: &Note, total_duration: i32) -> i32 {
        let attr = next.attribute(0);
        let base = match self
            .lookup
            .resolve(&next.lyric, next.shifted_tone(0), attr.voice_color.as_deref())
        {
            Some(oto) if oto.overlap < 0.0 => {
                self.time_axis.ms_to_ticks(oto.preutter - oto.overlap)
            }
            Some(oto) => self.time_axis.ms_to_ticks(oto.preutter),
            None => DEFAULT_VC_LENGTH,
        };
        let stretched = base as f64 * attr.consonant_stretch_ratio.unwrap_or(1.0);
        stretched.min((total_duration / 2) as f64).round_ties_even() as i32
    }

    /// Resolve candidates at the note's own pitch and color.
    fn resolve_for<S: AsRef<str>>(&self, candidates: &[S], note: &Note) -> Option<Oto> {
        let attr = note.attribute(0);
        resolve_first_hit(
            self.lookup,
            candidates,
            note.shifted_tone(0),
            attr.voice_color.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phonemizer::alias::OtoMap;
    use crate::phonemizer::timing::FixedTempo;
    use crate::phonemizer::PhonemeAttributes;

    fn bank(otos: &[(&str, f64, f64)]) -> OtoMap {
        otos.iter()
            .map(|(alias, preutter, overlap)| Oto::new(*alias, *preutter, *overlap))
            .collect()
    }

    fn run(bank: &OtoMap, notes: &[Note], prev: Option<&Note>, next: Option<&Note>) -> Vec<(String, i32)> {
        run_at(FixedTempo::default(), bank, notes, prev, next)
    }

    fn run_at(
        tempo: FixedTempo,
        bank: &OtoMap,
        notes: &[Note],
        prev: Option<&Note>,
        next: Option<&Note>,
    ) -> Vec<(String, i32)> {
        let phonemizer = PresampPhonemizer::new(MoraTables::shared(), bank, &tempo);
        phonemizer
            .process(&NoteContext::new(notes, prev, next))
            .phonemes
            .into_iter()
            .map(|p| (p.phoneme, p.position))
            .collect()
    }

    fn candidates(lyric: &str, prev: Option<&Note>) -> Vec<String> {
        let lookup = OtoMap::new();
        let tempo = FixedTempo::default();
        PresampPhonemizer::new(MoraTables::shared(), &lookup, &tempo).current_candidates(lyric, prev)
    }

    #[test]
    fn word_initial_candidates() {
        assert_eq!(candidates("あ", None), vec!["- あ", "あ"]);
    }

    #[test]
    fn word_initial_falls_back_to_plain() {
        let bank = bank(&[("あ", 0.0, 0.0)]);
        let notes = [Note::new("あ", 60, 480)];
        assert_eq!(run(&bank, &notes, None, None), vec![("あ".to_string(), 0)]);
    }

    #[test]
    fn vcv_candidates_after_vowel() {
        let prev = Note::new("か", 60, 480);
        assert_eq!(candidates("き", Some(&prev)), vec!["a き", "* き", "き"]);
    }

    #[test]
    fn cv_preferred_after_bare_consonant() {
        let prev = Note::new("k", 60, 480);
        assert_eq!(candidates("き", Some(&prev)), vec!["き", "- き"]);
    }

    #[test]
    fn initial_preferred_after_unknown_predecessor() {
        let prev = Note::new("ー", 60, 480);
        assert_eq!(candidates("き", Some(&prev)), vec!["- き", "き"]);
    }

    #[test]
    fn vcv_alias_replaces_lyric() {
        let bank = bank(&[("a き", 0.0, 0.0), ("き", 0.0, 0.0)]);
        let prev = Note::new("か", 60, 480);
        let notes = [Note::new("き", 60, 480)];
        assert_eq!(run(&bank, &notes, Some(&prev), None), vec![("a き".to_string(), 0)]);
    }

    #[test]
    fn unresolved_lyric_passes_through() {
        let bank = OtoMap::new();
        let notes = [Note::new("ぬ", 60, 480)];
        assert_eq!(run(&bank, &notes, None, None), vec![("ぬ".to_string(), 0)]);
    }

    #[test]
    fn vc_inserted_with_negative_overlap() {
        let bank = bank(&[("か", 0.0, 0.0), ("a s", 0.0, 0.0), ("す", 80.0, -10.0)]);
        let notes = [Note::new("か", 60, 480)];
        let next = Note::new("す", 62, 480);
        // 90 ms at 120 BPM / 480 = 86 ticks
        assert_eq!(
            run(&bank, &notes, None, Some(&next)),
            vec![("か".to_string(), 0), ("a s".to_string(), 480 - 86)]
        );
    }

    #[test]
    fn vc_length_uses_preutter_for_positive_overlap() {
        let bank = bank(&[("か", 0.0, 0.0), ("a s", 0.0, 0.0), ("す", 80.0, 20.0)]);
        let notes = [Note::new("か", 60, 480)];
        let next = Note::new("す", 60, 480);
        let result = run(&bank, &notes, None, Some(&next));
        assert_eq!(result[1], ("a s".to_string(), 480 - 77));
    }

    #[test]
    fn vc_length_clamped_to_half_group() {
        let bank = bank(&[("か", 0.0, 0.0), ("a s", 0.0, 0.0), ("す", 80.0, -10.0)]);
        let notes = [Note::new("か", 60, 100)];
        let next = Note::new("す", 60, 480);
        assert_eq!(run(&bank, &notes, None, Some(&next))[1], ("a s".to_string(), 50));
    }

    #[test]
    fn vc_length_spans_merged_notes() {
        let bank = bank(&[("か", 0.0, 0.0), ("a s", 0.0, 0.0), ("す", 80.0, -10.0)]);
        let notes = [Note::new("か", 60, 60), Note::new("+", 60, 60)];
        let next = Note::new("す", 60, 480);
        // total 120, half 60, preutter 86 → clamped to 60
        assert_eq!(run(&bank, &notes, None, Some(&next))[1], ("a s".to_string(), 60));
    }

    #[test]
    fn vc_length_scaled_by_stretch_ratio() {
        let bank = bank(&[("か", 0.0, 0.0), ("a s", 0.0, 0.0), ("す", 80.0, -10.0)]);
        let notes = [Note::new("か", 60, 960)];
        let next = Note::new("す", 60, 480).with_attribute(PhonemeAttributes {
            index: 0,
            consonant_stretch_ratio: Some(2.0),
            ..Default::default()
        });
        assert_eq!(run(&bank, &notes, None, Some(&next))[1], ("a s".to_string(), 960 - 172));
    }

    #[test]
    fn vc_length_defaults_without_next_sample() {
        let bank = bank(&[("か", 0.0, 0.0), ("a s", 0.0, 0.0)]);
        let notes = [Note::new("か", 60, 480)];
        let next = Note::new("す", 60, 480);
        assert_eq!(
            run(&bank, &notes, None, Some(&next))[1],
            ("a s".to_string(), 480 - DEFAULT_VC_LENGTH)
        );
    }

    #[test]
    fn plain_vowel_next_needs_no_vc() {
        let bank = bank(&[("か", 0.0, 0.0), ("a あ", 0.0, 0.0), ("a k", 0.0, 0.0)]);
        let notes = [Note::new("か", 60, 480)];
        let next = Note::new("あ", 60, 480);
        assert_eq!(run(&bank, &notes, None, Some(&next)), vec![("か".to_string(), 0)]);
    }

    #[test]
    fn next_vcv_alias_suppresses_vc() {
        let bank = bank(&[("か", 0.0, 0.0), ("a す", 0.0, 0.0), ("a s", 0.0, 0.0)]);
        let notes = [Note::new("か", 60, 480)];
        let next = Note::new("す", 60, 480);
        assert_eq!(run(&bank, &notes, None, Some(&next)), vec![("か".to_string(), 0)]);
    }

    #[test]
    fn substitute_consonant_used_when_primary_missing() {
        let bank = bank(&[("か", 0.0, 0.0), ("a k", 0.0, 0.0), ("きゃ", 60.0, 0.0)]);
        let notes = [Note::new("か", 60, 480)];
        let next = Note::new("きゃ", 60, 480);
        let result = run(&bank, &notes, None, Some(&next));
        assert_eq!(result.len(), 2);
        assert_eq!(result[1].0, "a k");
    }

    #[test]
    fn primary_consonant_preferred_over_substitute() {
        let bank = bank(&[("か", 0.0, 0.0), ("a k", 0.0, 0.0), ("a ky", 0.0, 0.0)]);
        let notes = [Note::new("か", 60, 480)];
        let next = Note::new("きゃ", 60, 480);
        assert_eq!(run(&bank, &notes, None, Some(&next))[1].0, "a ky");
    }

    #[test]
    fn missing_vc_degrades_to_single_phoneme() {
        let bank = bank(&[("か", 0.0, 0.0), ("す", 80.0, 0.0)]);
        let notes = [Note::new("か", 60, 480)];
        let next = Note::new("す", 60, 480);
        assert_eq!(run(&bank, &notes, None, Some(&next)), vec![("か".to_string(), 0)]);
    }

    #[test]
    fn consonantless_next_degrades_to_single_phoneme() {
        let bank = bank(&[("か", 0.0, 0.0)]);
        let notes = [Note::new("か", 60, 480)];
        let next = Note::new("ー", 60, 480);
        assert_eq!(run(&bank, &notes, None, Some(&next)), vec![("か".to_string(), 0)]);
    }

    #[test]
    fn voice_color_selects_tagged_vc() {
        let bank = bank(&[("か", 0.0, 0.0), ("a s", 0.0, 0.0), ("a s強", 0.0, 0.0)]);
        let notes = [Note::new("か", 60, 480).with_attribute(PhonemeAttributes {
            index: 0,
            voice_color: Some("強".into()),
            ..Default::default()
        })];
        let next = Note::new("す", 60, 480);
        assert_eq!(run(&bank, &notes, None, Some(&next))[1].0, "a s強");
    }

    #[test]
    fn stretched_vc_length_rounds_half_to_even() {
        // 125 BPM at 480 ticks per quarter: one tick per millisecond.
        let tempo = FixedTempo::new(125.0, 480);
        let bank = bank(&[("か", 0.0, 0.0), ("a s", 0.0, 0.0), ("す", 87.0, 0.0)]);
        let notes = [Note::new("か", 60, 1000)];
        let next = Note::new("す", 60, 480).with_attribute(PhonemeAttributes {
            index: 0,
            consonant_stretch_ratio: Some(1.5),
            ..Default::default()
        });
        // 87 * 1.5 = 130.5 -> 130
        assert_eq!(
            run_at(tempo, &bank, &notes, None, Some(&next))[1],
            ("a s".to_string(), 1000 - 130)
        );
    }

    #[test]
    fn next_color_finds_tagged_vcv_and_suppresses_vc() {
        let bank = bank(&[("か", 0.0, 0.0), ("a す強", 0.0, 0.0), ("a s", 0.0, 0.0)]);
        let notes = [Note::new("か", 60, 480)];
        let next = Note::new("す", 60, 480).with_attribute(PhonemeAttributes {
            index: 0,
            voice_color: Some("強".into()),
            ..Default::default()
        });
        assert_eq!(run(&bank, &notes, None, Some(&next)), vec![("か".to_string(), 0)]);
    }

    #[test]
    fn next_color_oto_sets_vc_length() {
        let bank = bank(&[
            ("か", 0.0, 0.0),
            ("a s", 0.0, 0.0),
            ("す", 30.0, 0.0),
            ("す強", 80.0, -10.0),
        ]);
        let notes = [Note::new("か", 60, 480)];
        let next = Note::new("す", 60, 480).with_attribute(PhonemeAttributes {
            index: 0,
            voice_color: Some("強".into()),
            ..Default::default()
        });
        // 90 ms from the tagged sample, not 30 ms from the plain one.
        assert_eq!(
            run(&bank, &notes, None, Some(&next)),
            vec![("か".to_string(), 0), ("a s".to_string(), 480 - 86)]
        );
    }

    #[test]
    fn wildcard_vcv_used_when_vowel_alias_missing() {
        let bank = bank(&[("* き", 0.0, 0.0), ("き", 0.0, 0.0)]);
        let prev = Note::new("か", 60, 480);
        let notes = [Note::new("き", 60, 480)];
        assert_eq!(run(&bank, &notes, Some(&prev), None), vec![("* き".to_string(), 0)]);
    }

    #[test]
    fn initial_alias_used_after_bare_consonant_when_cv_missing() {
        let bank = bank(&[("- き", 0.0, 0.0)]);
        let prev = Note::new("k", 60, 480);
        let notes = [Note::new("き", 60, 480)];
        assert_eq!(run(&bank, &notes, Some(&prev), None), vec![("- き".to_string(), 0)]);
    }

    #[test]
    fn empty_group_yields_nothing() {
        let bank = OtoMap::new();
        assert!(run(&bank, &[], None, None).is_empty());
    }

    #[test]
    fn shared_across_threads() {
        let bank = bank(&[("か", 0.0, 0.0), ("a s", 0.0, 0.0), ("す", 80.0, -10.0)]);
        let tempo = FixedTempo::default();
        let phonemizer = PresampPhonemizer::new(MoraTables::shared(), &bank, &tempo);
        let notes = [Note::new("か", 60, 480)];
        let next = Note::new("す", 60, 480);
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| phonemizer.process(&NoteContext::new(&notes, None, Some(&next))))
                })
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap().phonemes.len(), 2);
            }
        });
    }
}

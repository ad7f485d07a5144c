//! Fixed presamp mora tables.
//!
//! Each literal line has the form `symbol=mora,mora,...` for the vowel and
//! consonant groups, and `consonant,consonant=replacement` for substitutions.
//! Tables are built once and only read afterwards.

use std::collections::HashMap;
use std::sync::LazyLock;

const VOWELS: &[&str] = &[
    "a=ぁ,あ,か,が,さ,ざ,た,だ,な,は,ば,ぱ,ま,ゃ,や,ら,わ,ァ,ア,カ,ガ,サ,ザ,タ,ダ,ナ,ハ,バ,パ,マ,ャ,ヤ,ラ,ワ",
    "e=ぇ,え,け,げ,せ,ぜ,て,で,ね,へ,べ,ぺ,め,れ,ゑ,ェ,エ,ケ,ゲ,セ,ゼ,テ,デ,ネ,ヘ,ベ,ペ,メ,レ,ヱ",
    "i=ぃ,い,き,ぎ,し,じ,ち,ぢ,に,ひ,び,ぴ,み,り,ゐ,ィ,イ,キ,ギ,シ,ジ,チ,ヂ,ニ,ヒ,ビ,ピ,ミ,リ,ヰ",
    "o=ぉ,お,こ,ご,そ,ぞ,と,ど,の,ほ,ぼ,ぽ,も,ょ,よ,ろ,を,ォ,オ,コ,ゴ,ソ,ゾ,ト,ド,ノ,ホ,ボ,ポ,モ,ョ,ヨ,ロ,ヲ",
    "n=ん",
    "u=ぅ,う,く,ぐ,す,ず,つ,づ,ぬ,ふ,ぶ,ぷ,む,ゅ,ゆ,る,ゥ,ウ,ク,グ,ス,ズ,ツ,ヅ,ヌ,フ,ブ,プ,ム,ュ,ユ,ル,ヴ",
    "N=ン",
    "・=・",
];

const CONSONANTS: &[&str] = &[
    "ch=ち,ちぇ,ちゃ,ちゅ,ちょ",
    "gy=ぎ,ぎぇ,ぎゃ,ぎゅ,ぎょ",
    "ts=つ,つぁ,つぃ,つぇ,つぉ",
    "ty=てぃ,てぇ,てゃ,てゅ,てょ",
    "py=ぴ,ぴぇ,ぴゃ,ぴゅ,ぴょ",
    "ry=り,りぇ,りゃ,りゅ,りょ",
    "ly=リ,リェ,リャ,リュ,リョ",
    "ny=に,にぇ,にゃ,にゅ,にょ",
    "r=ら,る,るぃ,れ,ろ",
    "hy=ひ,ひぇ,ひゃ,ひゅ,ひょ",
    "dy=でぃ,でぇ,でゃ,でゅ,でょ",
    "by=び,びぇ,びゃ,びゅ,びょ",
    "b=ば,ぶ,ぶぃ,べ,ぼ",
    "d=だ,で,ど,どぃ,どぅ",
    "g=が,ぐ,ぐぃ,げ,ご",
    "f=ふ,ふぁ,ふぃ,ふぇ,ふぉ",
    "h=は,はぃ,へ,ほ,ほぅ",
    "k=か,く,くぃ,け,こ",
    "j=じ,じぇ,じゃ,じゅ,じょ,ぢ,ぢぇ,ぢゃ,ぢゅ,ぢょ",
    "m=ま,む,むぃ,め,も",
    "n=な,ぬ,ぬぃ,ね,の",
    "p=ぱ,ぷ,ぷぃ,ぺ,ぽ",
    "s=さ,す,すぃ,せ,そ",
    "sh=し,しぇ,しゃ,しゅ,しょ",
    "t=た,て,と,とぃ,とぅ",
    "v=ヴ,ヴぁ,ヴぃ,ヴぅ,ヴぇ,ヴぉ",
    "ky=き,きぇ,きゃ,きゅ,きょ",
    "w=うぃ,うぅ,うぇ,うぉ,わ,ゐ,ゑ,を,ヰ,ヱ",
    "y=いぃ,いぇ,や,ゆ,よ",
    "z=ざ,ず,ずぃ,ぜ,ぞ",
    "dz=づ,づぃ",
    "my=み,みぇ,みゃ,みゅ,みょ",
    "ng=ガ,ギ,グ,ゲ,ゴ,ギェ,ギャ,ギュ,ギョ,カ゜,キ゜,ク゜,ケ゜,コ゜,キ゜ェ,キ゜ャ,キ゜ュ,キ゜ョ",
    "l=ラ,ル,レ,ロ",
    "・=・あ,・い,・う,・え,・お,・ん,・を,・ン",
];

// Consonants that smaller banks often lack, mapped to the closest plain form.
const SUBSTITUTIONS: &[&str] = &[
    "ty,ch,ts=t",
    "j,dy=d",
    "gy=g",
    "ky=k",
    "py=p",
    "ny=n",
    "ry=r",
    "hy,f=h",
    "by,v=b",
    "dz=z",
    "l=r",
    "ly=l",
];

const PLAIN_VOWELS: &[&str] = &["あ", "い", "う", "え", "お", "を", "ん", "ン"];

const PLAIN_CONSONANTS: &[&str] = &[
    "k", "ky", "g", "gy", "s", "sh", "z", "j", "t", "ch", "ty", "ts", "d", "dy", "n", "ny", "h",
    "hy", "f", "b", "by", "p", "py", "m", "my", "y", "r", "4", "ry", "w", "v", "ng", "l", "・",
];

static SHARED: LazyLock<MoraTables> = LazyLock::new(MoraTables::presamp);

/// Immutable mora lookup tables.
#[derive(Debug, Clone, Default)]
pub struct MoraTables {
    vowels: HashMap<String, String>,
    consonants: HashMap<String, String>,
    substitutions: HashMap<String, String>,
    plain_vowels: Vec<String>,
    plain_consonants: Vec<String>,
}

impl MoraTables {
    /// Build the standard presamp tables.
    pub fn presamp() -> Self {
        Self::from_groups(
            VOWELS,
            CONSONANTS,
            SUBSTITUTIONS,
            PLAIN_VOWELS,
            PLAIN_CONSONANTS,
        )
    }

    /// Process-wide presamp tables, built on first use.
    pub fn shared() -> &'static MoraTables {
        &SHARED
    }

    /// Build tables from literal group lines.
    ///
    /// Lines without `=` are skipped. When a mora appears twice the first
    /// mapping wins.
    pub fn from_groups(
        vowels: &[&str],
        consonants: &[&str],
        substitutions: &[&str],
        plain_vowels: &[&str],
        plain_consonants: &[&str],
    ) -> Self {
        let mut tables = Self {
            plain_vowels: plain_vowels.iter().map(|s| s.to_string()).collect(),
            plain_consonants: plain_consonants.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        for (symbol, morae) in vowels.iter().filter_map(|line| split_line(line)) {
            insert_all(&mut tables.vowels, morae.split(','), symbol);
        }
        for (symbol, morae) in consonants.iter().filter_map(|line| split_line(line)) {
            insert_all(&mut tables.consonants, morae.split(','), symbol);
        }
        // Substitution lines are reversed: many originals, one replacement.
        for (originals, replacement) in substitutions.iter().filter_map(|line| split_line(line)) {
            insert_all(&mut tables.substitutions, originals.split(','), replacement);
        }
        tables
    }

    /// Vowel symbol of a single mora.
    pub fn vowel_of(&self, mora: &str) -> Option<&str> {
        self.vowels.get(mora).map(String::as_str)
    }

    /// Consonant symbol of a single mora (or digraph).
    pub fn consonant_of(&self, mora: &str) -> Option<&str> {
        self.consonants.get(mora).map(String::as_str)
    }

    /// Leading consonant of a grapheme sequence: the first two units as a
    /// digraph, then the first unit alone.
    pub fn consonant_of_units(&self, units: &[&str]) -> Option<&str> {
        if units.len() >= 2 {
            let digraph = units[..2].concat();
            if let Some(consonant) = self.consonant_of(&digraph) {
                return Some(consonant);
            }
        }
        units.first().and_then(|unit| self.consonant_of(unit))
    }

    /// Replacement for a consonant missing from the voice bank.
    pub fn substitute_for(&self, consonant: &str) -> Option<&str> {
        self.substitutions.get(consonant).map(String::as_str)
    }

    /// Whether `unit` is a bare vowel that attaches without a VC transition.
    pub fn is_plain_vowel(&self, unit: &str) -> bool {
        self.plain_vowels.iter().any(|vowel| vowel == unit)
    }

    /// Whether `text` contains any romanized plain consonant marker.
    pub fn contains_plain_consonant(&self, text: &str) -> bool {
        self.plain_consonants
            .iter()
            .any(|consonant| text.contains(consonant.as_str()))
    }
}

fn split_line(line: &str) -> Option<(&str, &str)> {
    let parsed = line.split_once('=');
    if parsed.is_none() {
        tracing::warn!(line, "skipping malformed mora table line");
    }
    parsed
}

fn insert_all<'a>(
    map: &mut HashMap<String, String>,
    keys: impl Iterator<Item = &'a str>,
    value: &str,
) {
    for key in keys {
        map.entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vowels_cover_hiragana_and_katakana() {
        let tables = MoraTables::presamp();
        assert_eq!(tables.vowel_of("か"), Some("a"));
        assert_eq!(tables.vowel_of("キ"), Some("i"));
        assert_eq!(tables.vowel_of("ゅ"), Some("u"));
        assert_eq!(tables.vowel_of("ん"), Some("n"));
        assert_eq!(tables.vowel_of("ン"), Some("N"));
        assert_eq!(tables.vowel_of("x"), None);
    }

    #[test]
    fn consonant_digraph_wins_over_single_unit() {
        let tables = MoraTables::presamp();
        // "て" alone is plain t, "てぃ" is palatalized.
        assert_eq!(tables.consonant_of_units(&["て", "ぃ"]), Some("ty"));
        assert_eq!(tables.consonant_of_units(&["て"]), Some("t"));
        assert_eq!(tables.consonant_of_units(&["す", "し"]), Some("s"));
        assert_eq!(tables.consonant_of_units(&["あ"]), None);
        assert_eq!(tables.consonant_of_units(&[]), None);
    }

    #[test]
    fn substitutions_collapse_palatalized_forms() {
        let tables = MoraTables::presamp();
        assert_eq!(tables.substitute_for("ky"), Some("k"));
        assert_eq!(tables.substitute_for("by"), Some("b"));
        assert_eq!(tables.substitute_for("v"), Some("b"));
        assert_eq!(tables.substitute_for("ch"), Some("t"));
        assert_eq!(tables.substitute_for("k"), None);
    }

    #[test]
    fn literal_tables_have_unique_keys() {
        let tables = MoraTables::presamp();
        let vowel_entries: usize = VOWELS
            .iter()
            .map(|line| line.split_once('=').unwrap().1.split(',').count())
            .sum();
        let consonant_entries: usize = CONSONANTS
            .iter()
            .map(|line| line.split_once('=').unwrap().1.split(',').count())
            .sum();
        assert_eq!(tables.vowels.len(), vowel_entries);
        assert_eq!(tables.consonants.len(), consonant_entries);
    }

    #[test]
    fn plain_sets() {
        let tables = MoraTables::shared();
        assert!(tables.is_plain_vowel("あ"));
        assert!(!tables.is_plain_vowel("か"));
        assert!(tables.contains_plain_consonant("ks"));
        assert!(!tables.contains_plain_consonant("かき"));
    }

    #[test]
    fn custom_groups_skip_malformed_lines() {
        let tables = MoraTables::from_groups(&["a=x,y", "broken"], &["k=x"], &[], &["x"], &["k"]);
        assert_eq!(tables.vowel_of("y"), Some("a"));
        assert_eq!(tables.consonant_of("x"), Some("k"));
        assert_eq!(tables.substitute_for("k"), None);
    }
}

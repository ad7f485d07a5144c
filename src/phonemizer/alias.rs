//! Voice-bank alias lookup.
//!
//! The phonemizer never inspects a voice bank directly; it asks an
//! [`AliasLookup`] whether a candidate alias exists at a pitch and color.
//! [`resolve_first_hit`] turns an ordered candidate list into a single
//! sample using the presamp color tie-break.

use std::collections::HashMap;

/// A voice-bank sample record. Timing values are in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Oto {
    pub alias: String,
    pub preutter: f64,
    /// May be negative, which lengthens the pre-attack region.
    pub overlap: f64,
}

impl Oto {
    pub fn new(alias: impl Into<String>, preutter: f64, overlap: f64) -> Self {
        Self {
            alias: alias.into(),
            preutter,
            overlap,
        }
    }

    /// A placeholder record with zero timing, as exposed by banks whose
    /// samples are synthesized rather than recorded.
    pub fn dummy(alias: impl Into<String>) -> Self {
        Self::new(alias, 0.0, 0.0)
    }
}

/// Mapped-alias lookup service provided by the voice bank.
pub trait AliasLookup: Send + Sync {
    /// Find the sample for `alias` at `tone`, optionally restricted to a
    /// voice color.
    fn resolve(&self, alias: &str, tone: i32, color: Option<&str>) -> Option<Oto>;
}

impl<T: AliasLookup + ?Sized> AliasLookup for &T {
    fn resolve(&self, alias: &str, tone: i32, color: Option<&str>) -> Option<Oto> {
        (**self).resolve(alias, tone, color)
    }
}

/// Try every candidate in order and pick one hit.
///
/// Without a color the first hit wins. With a color, the first hit whose
/// alias contains the color wins, falling back to the first hit overall.
pub fn resolve_first_hit<L, S>(
    lookup: &L,
    candidates: &[S],
    tone: i32,
    color: Option<&str>,
) -> Option<Oto>
where
    L: AliasLookup + ?Sized,
    S: AsRef<str>,
{
    let mut hits: Vec<Oto> = candidates
        .iter()
        .filter_map(|candidate| lookup.resolve(candidate.as_ref(), tone, color))
        .collect();
    if hits.is_empty() {
        tracing::debug!(
            candidates = ?candidates.iter().map(|c| c.as_ref()).collect::<Vec<&str>>(),
            tone,
            "no alias candidate resolved"
        );
        return None;
    }
    let index = color
        .and_then(|color| hits.iter().position(|oto| oto.alias.contains(color)))
        .unwrap_or(0);
    Some(hits.swap_remove(index))
}

/// In-memory alias table.
///
/// Colored variants are stored as aliases suffixed with their color tag
/// (`"a か強"` for color `"強"`); a colored lookup prefers the suffixed
/// variant and falls back to the plain alias. Pitch is not used.
#[derive(Debug, Clone, Default)]
pub struct OtoMap {
    otos: HashMap<String, Oto>,
}

impl OtoMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample. An existing record with the same alias is kept.
    pub fn insert(&mut self, oto: Oto) {
        self.otos.entry(oto.alias.clone()).or_insert(oto);
    }

    pub fn len(&self) -> usize {
        self.otos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.otos.is_empty()
    }
}

impl FromIterator<Oto> for OtoMap {
    fn from_iter<I: IntoIterator<Item = Oto>>(iter: I) -> Self {
        let mut map = Self::new();
        for oto in iter {
            map.insert(oto);
        }
        map
    }
}

impl AliasLookup for OtoMap {
    fn resolve(&self, alias: &str, _tone: i32, color: Option<&str>) -> Option<Oto> {
        color
            .and_then(|color| self.otos.get(&format!("{alias}{color}")))
            .or_else(|| self.otos.get(alias))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every queried alias.
    struct Recording {
        inner: OtoMap,
        queries: Mutex<Vec<String>>,
    }

    impl AliasLookup for Recording {
        fn resolve(&self, alias: &str, tone: i32, color: Option<&str>) -> Option<Oto> {
            self.queries.lock().unwrap().push(alias.to_string());
            self.inner.resolve(alias, tone, color)
        }
    }

    fn bank(aliases: &[&str]) -> OtoMap {
        aliases.iter().map(|alias| Oto::dummy(*alias)).collect()
    }

    #[test]
    fn first_hit_in_candidate_order() {
        let lookup = bank(&["あ", "- あ"]);
        let oto = resolve_first_hit(&lookup, &["- あ", "あ"], 60, None).unwrap();
        assert_eq!(oto.alias, "- あ");
    }

    #[test]
    fn queries_every_candidate() {
        let lookup = Recording {
            inner: bank(&["き"]),
            queries: Mutex::new(Vec::new()),
        };
        let oto = resolve_first_hit(&lookup, &["a き", "* き", "き"], 60, None).unwrap();
        assert_eq!(oto.alias, "き");
        assert_eq!(*lookup.queries.lock().unwrap(), vec!["a き", "* き", "き"]);
    }

    #[test]
    fn color_prefers_tagged_hit() {
        let lookup = bank(&["- か", "か", "か強"]);
        let oto = resolve_first_hit(&lookup, &["- か", "か"], 60, Some("強")).unwrap();
        assert_eq!(oto.alias, "か強");
    }

    #[test]
    fn color_without_tagged_hit_keeps_first_hit() {
        let lookup = bank(&["- か", "か"]);
        let oto = resolve_first_hit(&lookup, &["- か", "か"], 60, Some("弱")).unwrap();
        assert_eq!(oto.alias, "- か");
    }

    #[test]
    fn nothing_resolves() {
        let lookup = bank(&["さ"]);
        assert!(resolve_first_hit(&lookup, &["- か", "か"], 60, None).is_none());
        let empty: [&str; 0] = [];
        assert!(resolve_first_hit(&lookup, &empty, 60, None).is_none());
    }

    #[test]
    fn oto_map_keeps_first_insert() {
        let mut map = OtoMap::new();
        map.insert(Oto::new("a", 10.0, 0.0));
        map.insert(Oto::new("a", 99.0, 0.0));
        assert_eq!(map.len(), 1);
        assert_eq!(map.resolve("a", 60, None).unwrap().preutter, 10.0);
    }
}

//! Resolution of operator-typed team and referee names to the names present in the data.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;
use strsim::jaro_winkler;
use tracing::debug;

pub const DEFAULT_CUTOFF: f64 = 0.85;

/// Common short forms, mapped to the longer names some sources use.
const ALIASES: &[(&str, &str)] = &[
    ("man united", "Manchester United"),
    ("man utd", "Manchester United"),
    ("manchester utd", "Manchester United"),
    ("man city", "Manchester City"),
    ("spurs", "Tottenham"),
    ("tottenham hotspur", "Tottenham"),
    ("wolves", "Wolverhampton"),
    ("wolverhampton wanderers", "Wolverhampton"),
    ("paris sg", "PSG"),
    ("paris saint germain", "PSG"),
    ("nottm forest", "Nottingham Forest"),
    ("sheffield utd", "Sheffield United"),
    ("ath madrid", "Atletico Madrid"),
    ("ath bilbao", "Athletic Club"),
    ("gladbach", "Borussia Monchengladbach"),
];

static NOISE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn noise() -> Option<&'static Regex> {
    NOISE
        .get_or_init(|| Regex::new(r"[^\p{L}\p{N}]+|\b(?:a?fc|cf)\b"))
        .as_ref()
        .ok()
}

/// Case-folded, punctuation-free key with club suffixes removed.
pub fn key(name: &str) -> String {
    let lower = name.to_lowercase();
    let stripped = match noise() {
        Some(noise) => noise.replace_all(&lower, " "),
        None => Cow::Borrowed(lower.as_str()),
    };
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub struct NameResolver<'a> {
    known: Vec<(&'a str, String)>,
    cutoff: f64,
}
impl<'a> NameResolver<'a> {
    pub fn new(known: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            known: known.into_iter().map(|name| (name, key(name))).collect(),
            cutoff: DEFAULT_CUTOFF,
        }
    }

    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Exact name, then an exact key (of the raw name or its alias), then the closest key by
    /// Jaro-Winkler similarity if it reaches the cutoff. Ties keep the earlier known name.
    pub fn resolve(&self, raw: &str) -> Option<&'a str> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some((name, _)) = self.known.iter().find(|(name, _)| *name == raw) {
            return Some(*name);
        }

        let raw_key = key(raw);
        let alias_key = ALIASES
            .iter()
            .find(|(alias, _)| *alias == raw_key)
            .map(|(_, target)| key(target));
        let candidates = std::iter::once(&raw_key).chain(alias_key.as_ref()).collect::<Vec<_>>();
        for candidate in &candidates {
            if let Some((name, _)) = self.known.iter().find(|(_, known)| known == *candidate) {
                return Some(*name);
            }
        }

        let mut best: Option<(&'a str, f64)> = None;
        for (name, known) in &self.known {
            let similarity = candidates
                .iter()
                .map(|candidate| jaro_winkler(candidate, known))
                .fold(0.0, f64::max);
            if similarity >= self.cutoff && best.map_or(true, |(_, best)| similarity > best) {
                best = Some((*name, similarity));
            }
        }
        if let Some((name, similarity)) = best {
            debug!("resolved {raw:?} to {name:?} (similarity {similarity:.3})");
        }
        best.map(|(name, _)| name)
    }
}

pub fn resolve_name(raw: &str, known: &[&str]) -> Option<String> {
    NameResolver::new(known.iter().copied())
        .resolve(raw)
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEAMS: &[&str] = &["Arsenal", "Man City", "Manchester United", "Nott'm Forest", "Tottenham", "Wolves"];

    #[test]
    fn keys() {
        assert_eq!("nott m forest", key("  Nott'm   Forest "));
        assert_eq!("arsenal", key("Arsenal FC"));
        assert_eq!("brighton hove albion", key("Brighton & Hove Albion"));
        assert_eq!("são paulo", key("São Paulo FC"));
    }

    #[test]
    fn exact_and_key_matches() {
        assert_eq!(Some("Arsenal".to_string()), resolve_name("Arsenal", TEAMS));
        assert_eq!(Some("Arsenal".to_string()), resolve_name(" arsenal fc", TEAMS));
        assert_eq!(Some("Man City".to_string()), resolve_name("MAN CITY", TEAMS));
    }

    #[test]
    fn aliases() {
        assert_eq!(Some("Manchester United".to_string()), resolve_name("Man Utd", TEAMS));
        assert_eq!(Some("Tottenham".to_string()), resolve_name("Spurs", TEAMS));
    }

    #[test]
    fn fuzzy_matches() {
        assert_eq!(Some("Arsenal".to_string()), resolve_name("Arsenall", TEAMS));
        assert_eq!(Some("Tottenham".to_string()), resolve_name("Tottenam", TEAMS));
        assert_eq!(Some("Nott'm Forest".to_string()), resolve_name("Nottm Forest", TEAMS));
    }

    #[test]
    fn no_match() {
        assert_eq!(None, resolve_name("Real Madrid", TEAMS));
        assert_eq!(None, resolve_name("", TEAMS));
        assert_eq!(None, resolve_name("Arsenal", &[]));
    }

    #[test]
    fn cutoff_is_configurable() {
        let resolver = NameResolver::new(TEAMS.iter().copied()).with_cutoff(0.99);
        assert_eq!(None, resolver.resolve("Arsenall"));
        assert_eq!(Some("Wolves"), resolver.resolve("wolves"));
    }
}

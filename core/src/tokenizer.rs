use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::Algorithm;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"\W+").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a", "and", "be", "by", "for", "from", "in", "into", "or", "that", "the", "to",
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Stemming hook applied as the last normalization step.
///
/// Returning an empty string drops the token.
pub trait Stemmer: Send + Sync {
    fn stem(&self, token: &str) -> String;

    fn name(&self) -> &str;
}

/// Returns every token unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityStemmer;

impl Stemmer for IdentityStemmer {
    fn stem(&self, token: &str) -> String { token.to_string() }

    fn name(&self) -> &str { "identity" }
}

/// Snowball stemmer backed by `rust-stemmers`.
pub struct SnowballStemmer {
    inner: rust_stemmers::Stemmer,
}

impl SnowballStemmer {
    pub fn new(algorithm: Algorithm) -> Self {
        Self { inner: rust_stemmers::Stemmer::create(algorithm) }
    }

    pub fn english() -> Self { Self::new(Algorithm::English) }
}

impl Stemmer for SnowballStemmer {
    fn stem(&self, token: &str) -> String { self.inner.stem(token).into_owned() }

    fn name(&self) -> &str { "snowball" }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StemmerKind {
    #[default]
    Identity,
    English,
}

impl FromStr for StemmerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identity" | "none" => Ok(StemmerKind::Identity),
            "english" | "snowball" => Ok(StemmerKind::English),
            other => Err(format!("unknown stemmer '{other}' (expected identity or english)")),
        }
    }
}

impl fmt::Display for StemmerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StemmerKind::Identity => f.write_str("identity"),
            StemmerKind::English => f.write_str("english"),
        }
    }
}

/// Settings shared by indexing and querying. An index keeps the normalizer it
/// was built with, so both sides always see the same configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    #[serde(default)]
    pub stemmer: StemmerKind,
    /// Apply NFKC compatibility folding before lower-casing.
    #[serde(default)]
    pub unicode_fold: bool,
}

#[derive(Clone)]
pub struct Normalizer {
    stemmer: Arc<dyn Stemmer>,
    unicode_fold: bool,
}

impl Default for Normalizer {
    fn default() -> Self { Self::from_config(&NormalizerConfig::default()) }
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer")
            .field("stemmer", &self.stemmer.name())
            .field("unicode_fold", &self.unicode_fold)
            .finish()
    }
}

impl Normalizer {
    pub fn from_config(config: &NormalizerConfig) -> Self {
        let stemmer: Arc<dyn Stemmer> = match config.stemmer {
            StemmerKind::Identity => Arc::new(IdentityStemmer),
            StemmerKind::English => Arc::new(SnowballStemmer::english()),
        };
        Self { stemmer, unicode_fold: config.unicode_fold }
    }

    pub fn with_stemmer(stemmer: Arc<dyn Stemmer>) -> Self {
        Self { stemmer, unicode_fold: false }
    }

    pub fn unicode_fold(mut self, enabled: bool) -> Self {
        self.unicode_fold = enabled;
        self
    }

    pub fn stemmer_name(&self) -> &str { self.stemmer.name() }

    /// Lower-case, split on non-word runs, drop empty, numeric, single-character
    /// and stop-word tokens, then stem. Order and duplicates are preserved.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let lowered = if self.unicode_fold {
            text.nfkc().collect::<String>().to_lowercase()
        } else {
            text.to_lowercase()
        };
        let mut terms = Vec::new();
        for token in NON_WORD.split(&lowered) {
            if token.is_empty() { continue; }
            if token.chars().all(|c| c.is_ascii_digit()) { continue; }
            if token.chars().count() < 2 { continue; }
            if is_stopword(token) { continue; }
            let stemmed = self.stemmer.stem(token);
            if stemmed.is_empty() { continue; }
            terms.push(stemmed);
        }
        terms
    }
}

/// Normalize with the reference configuration (identity stemmer, no folding).
pub fn normalize(text: &str) -> Vec<String> {
    lazy_static! {
        static ref DEFAULT: Normalizer = Normalizer::default();
    }
    DEFAULT.normalize(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DropEverything;

    impl Stemmer for DropEverything {
        fn stem(&self, _token: &str) -> String { String::new() }
        fn name(&self) -> &str { "drop" }
    }

    #[test]
    fn basic_normalize() {
        let t = normalize("The Cat, the DOG and 42 birds!");
        assert_eq!(t, vec!["cat", "dog", "birds"]);
    }

    #[test]
    fn keeps_duplicates_in_order() {
        assert_eq!(normalize("cat dog cat"), vec!["cat", "dog", "cat"]);
    }

    #[test]
    fn drops_short_and_numeric_tokens() {
        assert!(normalize("x 7 2024 a-b").is_empty());
        assert_eq!(normalize("b2b 3d"), vec!["b2b", "3d"]);
    }

    #[test]
    fn only_ascii_digit_runs_count_as_numbers() {
        assert_eq!(normalize("ⅻⅻ ٤٢ 1984"), vec!["ⅻⅻ", "٤٢"]);
    }

    #[test]
    fn underscore_is_a_word_character() {
        assert_eq!(normalize("snake_case-word"), vec!["snake_case", "word"]);
    }

    #[test]
    fn empty_stem_drops_token() {
        let n = Normalizer::with_stemmer(Arc::new(DropEverything));
        assert!(n.normalize("anything at all").is_empty());
    }

    #[test]
    fn english_stemmer_from_config() {
        let n = Normalizer::from_config(&NormalizerConfig { stemmer: StemmerKind::English, unicode_fold: false });
        assert_eq!(n.normalize("running"), vec!["run"]);
        assert_eq!(n.stemmer_name(), "snowball");
    }

    #[test]
    fn unicode_fold_applies_nfkc() {
        let n = Normalizer::default().unicode_fold(true);
        assert_eq!(n.normalize("ﬁne"), vec!["fine"]);
        assert_eq!(Normalizer::default().normalize("ﬁne"), vec!["ﬁne"]);
    }

    #[test]
    fn stemmer_kind_parses() {
        assert_eq!("English".parse::<StemmerKind>(), Ok(StemmerKind::English));
        assert_eq!("none".parse::<StemmerKind>(), Ok(StemmerKind::Identity));
        assert!("porter2000".parse::<StemmerKind>().is_err());
    }
}

use search_core::tokenizer::{normalize, Normalizer, NormalizerConfig, Stemmer, StemmerKind};
use std::sync::Arc;

#[test]
fn it_lowercases_and_splits_on_non_word_runs() {
    let words = normalize("Pharaoh--RAMESES;  ruled\tEgypt...");
    assert_eq!(words, vec!["pharaoh", "rameses", "ruled", "egypt"]);
}

#[test]
fn it_filters_stopwords() {
    let words = normalize("The quick brown fox and the lazy dog went into that barn by a river");
    for stop in ["the", "and", "into", "that", "by", "a"] {
        assert!(!words.contains(&stop.to_string()), "{stop} should be removed");
    }
    assert!(words.contains(&"quick".to_string()));
    assert!(words.contains(&"river".to_string()));
}

#[test]
fn only_stopwords_and_numbers_is_empty() {
    assert!(normalize("123 the a").is_empty());
    assert!(normalize("   ").is_empty());
    assert!(normalize("").is_empty());
}

struct SuffixStripper;

impl Stemmer for SuffixStripper {
    fn stem(&self, token: &str) -> String {
        token.strip_suffix('s').unwrap_or(token).to_string()
    }

    fn name(&self) -> &str { "suffix" }
}

#[test]
fn custom_stemmer_plugs_in() {
    let n = Normalizer::with_stemmer(Arc::new(SuffixStripper));
    assert_eq!(n.normalize("cats dogs"), vec!["cat", "dog"]);
}

#[test]
fn english_stemmer_normalizes_variants() {
    let n = Normalizer::from_config(&NormalizerConfig { stemmer: StemmerKind::English, unicode_fold: true });
    let words = n.normalize("Running runs RUN");
    assert_eq!(words, vec!["run", "run", "run"]);
}

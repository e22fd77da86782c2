//! TF-IDF weighting and cosine helpers. All logarithms are base 10.

use std::collections::HashMap;
use std::hash::Hash;

/// `1 + log10(tf)` for positive frequencies, `0` otherwise.
pub fn tf_weight(tf: u32) -> f64 {
    if tf == 0 { return 0.0; }
    1.0 + (tf as f64).log10()
}

/// `log10(n / df)`, or `0` when the statistics are degenerate.
///
/// A term present in every document (`df == n`) gets `0`: it cannot
/// discriminate between documents.
pub fn idf(n: u32, df: u32) -> f64 {
    if n == 0 || df == 0 || df > n { return 0.0; }
    (n as f64 / df as f64).log10()
}

pub fn tf_idf(tf: u32, n: u32, df: u32) -> f64 { tf_weight(tf) * idf(n, df) }

/// Euclidean norm of a sparse vector.
pub fn vector_magnitude<K>(vector: &HashMap<K, f64>) -> f64 {
    vector.values().map(|w| w * w).sum::<f64>().sqrt()
}

/// Dot product over the keys both vectors share.
pub fn dot_product<K: Eq + Hash>(a: &HashMap<K, f64>, b: &HashMap<K, f64>) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(k, w)| large.get(k).map(|v| w * v))
        .sum()
}

/// Cosine similarity from a precomputed dot product and both magnitudes.
///
/// Zero magnitudes yield `0`. The result is clamped to `[0, 1]` and
/// non-finite values are reported as `0`.
pub fn cosine_similarity(dot: f64, magnitude_a: f64, magnitude_b: f64) -> f64 {
    if magnitude_a == 0.0 || magnitude_b == 0.0 { return 0.0; }
    let similarity = dot / (magnitude_a * magnitude_b);
    if !similarity.is_finite() { return 0.0; }
    similarity.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn tf_weight_values() {
        assert_eq!(tf_weight(0), 0.0);
        assert!((tf_weight(1) - 1.0).abs() < EPS);
        assert!((tf_weight(10) - 2.0).abs() < EPS);
        assert!((tf_weight(5) - (1.0 + 5f64.log10())).abs() < EPS);
    }

    #[test]
    fn idf_edge_cases() {
        assert!((idf(10, 1) - 1.0).abs() < EPS);
        assert!((idf(10, 5) - 2f64.log10()).abs() < EPS);
        assert_eq!(idf(10, 0), 0.0);
        assert_eq!(idf(10, 11), 0.0);
        assert_eq!(idf(0, 5), 0.0);
        for n in 1..50 {
            assert_eq!(idf(n, n), 0.0);
        }
    }

    #[test]
    fn tf_idf_is_product() {
        assert!((tf_idf(5, 10, 1) - (1.0 + 5f64.log10())).abs() < EPS);
        assert_eq!(tf_idf(10, 10, 10), 0.0);
        assert_eq!(tf_idf(0, 10, 5), 0.0);
        assert_eq!(tf_idf(5, 10, 0), 0.0);
    }

    #[test]
    fn magnitude_and_dot() {
        let a: HashMap<&str, f64> = [("a", 3.0), ("b", 4.0)].into_iter().collect();
        let b: HashMap<&str, f64> = [("b", 2.0), ("c", 7.0), ("d", 1.0)].into_iter().collect();
        assert!((vector_magnitude(&a) - 5.0).abs() < EPS);
        assert!((dot_product(&a, &b) - 8.0).abs() < EPS);
        assert!((dot_product(&b, &a) - 8.0).abs() < EPS);
        assert_eq!(vector_magnitude::<&str>(&HashMap::new()), 0.0);
    }

    #[test]
    fn cosine_guards() {
        assert_eq!(cosine_similarity(1.0, 0.0, 2.0), 0.0);
        assert_eq!(cosine_similarity(-1.0, 1.0, 1.0), 0.0);
        assert_eq!(cosine_similarity(1.0000001, 1.0, 1.0), 1.0);
        assert_eq!(cosine_similarity(f64::NAN, 1.0, 1.0), 0.0);
        assert_eq!(cosine_similarity(f64::INFINITY, 1.0, 1.0), 0.0);
        assert!((cosine_similarity(1.0, 2.0, 1.0) - 0.5).abs() < EPS);
    }
}

use crate::error::SearchError;
use crate::index::{DictEntry, DocId, Index};
use crate::weighting::{cosine_similarity, idf, tf_idf, tf_weight};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub doc_id: DocId,
    /// Cosine similarity in `(0, 1]`.
    pub score: f64,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanMatch {
    pub doc_id: DocId,
    pub identifier: String,
}

impl Index {
    /// Normalize a query exactly as documents were normalized at build time.
    /// Duplicates are kept so in-query frequencies can be counted.
    pub fn process_query(&self, query: &str) -> Vec<String> { self.normalizer.normalize(query) }

    fn identifier(&self, doc_id: DocId) -> String {
        self.document(doc_id)
            .map(|d| d.source_identifier.clone())
            .unwrap_or_else(|| format!("doc#{doc_id}"))
    }

    /// Ranked retrieval by cosine similarity of TF-IDF vectors.
    ///
    /// `Ok(vec![])` means the query was valid but nothing could be ranked,
    /// e.g. every query term is unknown or present in all documents.
    pub fn try_ranked_search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let n = self.document_count();
        if n == 0 { return Err(SearchError::IndexNotReady); }
        let terms = self.process_query(query);
        if terms.is_empty() { return Err(SearchError::NoValidTerms); }

        let mut tf_q: BTreeMap<&str, u32> = BTreeMap::new();
        for term in &terms {
            *tf_q.entry(term.as_str()).or_insert(0) += 1;
        }

        let mut q_weights: Vec<(f64, &DictEntry)> = Vec::with_capacity(tf_q.len());
        let mut q_norm_sq = 0.0f64;
        for (term, tf_raw) in tf_q {
            let Some(entry) = self.dictionary.get(term) else { continue };
            let w = tf_weight(tf_raw) * idf(n, entry.document_frequency);
            if w > 0.0 {
                q_norm_sq += w * w;
                q_weights.push((w, entry));
            }
        }
        let q_norm = q_norm_sq.sqrt();
        if q_norm == 0.0 {
            tracing::debug!(query, "no informative query term in index, cannot rank");
            return Ok(Vec::new());
        }

        let mut dots = vec![0.0f64; n as usize];
        for (q_w, entry) in &q_weights {
            for p in &entry.postings {
                dots[p.doc_id as usize] += q_w * tf_idf(p.frequency, n, entry.document_frequency);
            }
        }

        let mut results: Vec<SearchResult> = Vec::new();
        for (doc_id, dot) in dots.into_iter().enumerate() {
            if dot == 0.0 { continue; }
            let doc_id = doc_id as DocId;
            let d_norm = self.document_magnitude(doc_id);
            if d_norm == 0.0 { continue; }
            let score = cosine_similarity(dot, q_norm, d_norm);
            if score > 0.0 {
                results.push(SearchResult { doc_id, score, identifier: self.identifier(doc_id) });
            }
        }
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.doc_id.cmp(&b.doc_id))
        });
        Ok(results)
    }

    /// Ranked retrieval that reports every degenerate case as an empty list.
    pub fn ranked_search(&self, query: &str) -> Vec<SearchResult> {
        match self.try_ranked_search(query) {
            Ok(results) => results,
            Err(err) => {
                tracing::debug!(query, %err, "ranked search returned nothing");
                Vec::new()
            }
        }
    }

    /// Conjunctive retrieval: documents containing every query term, ascending by id.
    ///
    /// Fails as a whole on the first query term missing from the dictionary.
    pub fn boolean_and_search(&self, query: &str) -> Result<Vec<BooleanMatch>, SearchError> {
        if self.is_empty() { return Err(SearchError::IndexNotReady); }
        let terms = self.process_query(query);
        if terms.is_empty() { return Err(SearchError::NoValidTerms); }

        let mut entries: Vec<&DictEntry> = Vec::new();
        let mut distinct: Vec<&str> = Vec::new();
        for term in &terms {
            if distinct.contains(&term.as_str()) { continue; }
            distinct.push(term.as_str());
            match self.dictionary.get(term) {
                Some(entry) => entries.push(entry),
                None => return Err(SearchError::MissingTerm { term: term.clone() }),
            }
        }

        entries.sort_by_key(|e| e.document_frequency);
        let mut matches: Vec<DocId> = entries[0].postings.iter().map(|p| p.doc_id).collect();
        for entry in &entries[1..] {
            if matches.is_empty() { break; }
            matches = intersect_sorted(&matches, entry);
        }

        Ok(matches
            .into_iter()
            .map(|doc_id| BooleanMatch { doc_id, identifier: self.identifier(doc_id) })
            .collect())
    }
}

/// Merge-intersect ascending ids with a posting list (also ascending by id).
fn intersect_sorted(ids: &[DocId], entry: &DictEntry) -> Vec<DocId> {
    let mut out = Vec::with_capacity(ids.len().min(entry.postings.len()));
    let (mut i, mut j) = (0, 0);
    while i < ids.len() && j < entry.postings.len() {
        match ids[i].cmp(&entry.postings[j].doc_id) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(ids[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::build_index;

    fn corpus() -> Index {
        build_index([("doc0", "cat dog cat"), ("doc1", "dog bird"), ("doc2", "cat bird fish")])
    }

    fn ids(matches: &[BooleanMatch]) -> Vec<DocId> { matches.iter().map(|m| m.doc_id).collect() }

    #[test]
    fn boolean_and_intersects() {
        let idx = corpus();
        assert_eq!(ids(&idx.boolean_and_search("cat dog").unwrap()), vec![0]);
        assert_eq!(ids(&idx.boolean_and_search("cat").unwrap()), vec![0, 2]);
        assert_eq!(ids(&idx.boolean_and_search("dog CAT dog").unwrap()), vec![0]);
        assert!(idx.boolean_and_search("dog fish").unwrap().is_empty());
    }

    #[test]
    fn boolean_and_reports_first_missing_term() {
        let idx = corpus();
        let err = idx.boolean_and_search("cat unicorn zebra").unwrap_err();
        assert_eq!(err, SearchError::MissingTerm { term: "unicorn".into() });
    }

    #[test]
    fn boolean_and_maps_identifiers() {
        let idx = corpus();
        let hits = idx.boolean_and_search("bird").unwrap();
        let names: Vec<_> = hits.iter().map(|m| m.identifier.as_str()).collect();
        assert_eq!(names, vec!["doc1", "doc2"]);
    }

    #[test]
    fn ranked_single_rare_term() {
        let idx = corpus();
        let results = idx.ranked_search("fish");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].doc_id, 2);
        let expected = 3f64.log10() / idx.document_magnitude(2);
        assert!((results[0].score - expected).abs() < 1e-12);
    }

    #[test]
    fn ranked_ties_break_by_doc_id() {
        let idx = build_index([("a", "apple pear"), ("b", "apple pear"), ("c", "plum")]);
        let results = idx.ranked_search("apple");
        let order: Vec<_> = results.iter().map(|r| r.doc_id).collect();
        assert_eq!(order, vec![0, 1]);
        assert_eq!(results[0].score, results[1].score);
    }

    #[test]
    fn ranked_scores_in_unit_interval() {
        let idx = corpus();
        for q in ["cat", "dog bird", "cat cat fish", "bird fish dog cat"] {
            for r in idx.ranked_search(q) {
                assert!(r.score > 0.0 && r.score <= 1.0, "{q}: {}", r.score);
            }
        }
    }

    #[test]
    fn ranked_signals() {
        let idx = corpus();
        assert_eq!(idx.try_ranked_search("123 the a"), Err(SearchError::NoValidTerms));
        assert_eq!(idx.try_ranked_search("unicorn"), Ok(vec![]));
        assert_eq!(Index::new().try_ranked_search("cat"), Err(SearchError::IndexNotReady));
    }

    #[test]
    fn uninformative_terms_cannot_rank() {
        let idx = build_index([("a", "shared words"), ("b", "shared things")]);
        assert_eq!(idx.try_ranked_search("shared"), Ok(vec![]));
        assert_eq!(ids(&idx.boolean_and_search("shared").unwrap()), vec![0, 1]);
    }

    #[test]
    fn intersect_sorted_merges() {
        let idx = build_index([("a", "x1 common"), ("b", "zz"), ("c", "common"), ("d", "common yy")]);
        let common = idx.entry("common").unwrap();
        assert_eq!(intersect_sorted(&[0, 1, 3, 9], common), vec![0, 3]);
        assert!(intersect_sorted(&[], common).is_empty());
    }
}

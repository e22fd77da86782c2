use crate::tokenizer::Normalizer;
use crate::weighting::{idf, tf_idf};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

pub type DocId = u32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    /// External key the document was supplied under, e.g. a URL.
    pub source_identifier: String,
    pub title: String,
    /// Number of terms that survived normalization.
    pub token_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub frequency: u32,
}

/// Per-term statistics plus postings, kept in ascending `doc_id` order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictEntry {
    pub document_frequency: u32,
    pub aggregate_term_frequency: u64,
    pub postings: Vec<Posting>,
}

impl DictEntry {
    fn push(&mut self, doc_id: DocId, frequency: u32) {
        debug_assert!(
            self.postings.last().map_or(true, |p| p.doc_id < doc_id),
            "document {doc_id} posted twice for the same term"
        );
        self.postings.push(Posting { doc_id, frequency });
        self.document_frequency += 1;
        self.aggregate_term_frequency += u64::from(frequency);
    }

    pub fn contains(&self, doc_id: DocId) -> bool {
        self.postings.binary_search_by_key(&doc_id, |p| p.doc_id).is_ok()
    }
}

/// Dictionary row as reported by [`Index::dictionary_sample`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermStats {
    pub term: String,
    pub document_frequency: u32,
    pub aggregate_term_frequency: u64,
    pub postings: usize,
}

/// Immutable inverted index. Built in one pass by [`IndexBuilder`], then only read.
#[derive(Debug, Clone, Default)]
pub struct Index {
    pub(crate) dictionary: BTreeMap<String, DictEntry>,
    pub(crate) documents: Vec<Document>,
    pub(crate) doc_id_map: HashMap<String, DocId>,
    /// Indexed by `DocId`; `0.0` for documents without an informative term.
    pub(crate) magnitudes: Vec<f64>,
    pub(crate) normalizer: Normalizer,
}

impl Index {
    pub fn new() -> Self { Self::default() }

    /// N: the number of documents that were actually indexed.
    pub fn document_count(&self) -> u32 { self.documents.len() as u32 }

    pub fn vocabulary_size(&self) -> usize { self.dictionary.len() }

    pub fn is_empty(&self) -> bool { self.documents.is_empty() }

    pub fn normalizer(&self) -> &Normalizer { &self.normalizer }

    pub fn document(&self, doc_id: DocId) -> Option<&Document> { self.documents.get(doc_id as usize) }

    pub fn documents(&self) -> &[Document] { &self.documents }

    pub fn document_id(&self, source_identifier: &str) -> Option<DocId> {
        self.doc_id_map.get(source_identifier).copied()
    }

    pub fn entry(&self, term: &str) -> Option<&DictEntry> { self.dictionary.get(term) }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &DictEntry)> + '_ {
        self.dictionary.iter().map(|(t, e)| (t.as_str(), e))
    }

    pub fn document_magnitude(&self, doc_id: DocId) -> f64 {
        self.magnitudes.get(doc_id as usize).copied().unwrap_or(0.0)
    }

    /// Non-zero TF-IDF components of one document.
    pub fn document_vector(&self, doc_id: DocId) -> BTreeMap<String, f64> {
        let n = self.document_count();
        let mut vector = BTreeMap::new();
        if self.document(doc_id).is_none() { return vector; }
        for (term, entry) in &self.dictionary {
            let Ok(pos) = entry.postings.binary_search_by_key(&doc_id, |p| p.doc_id) else { continue };
            let weight = tf_idf(entry.postings[pos].frequency, n, entry.document_frequency);
            if weight > 0.0 {
                vector.insert(term.clone(), weight);
            }
        }
        vector
    }

    /// Alphabetical listing of the first `limit` dictionary terms.
    pub fn dictionary_sample(&self, limit: usize) -> Vec<TermStats> {
        self.dictionary
            .iter()
            .take(limit)
            .map(|(term, e)| TermStats {
                term: term.clone(),
                document_frequency: e.document_frequency,
                aggregate_term_frequency: e.aggregate_term_frequency,
                postings: e.postings.len(),
            })
            .collect()
    }

    fn compute_magnitudes(&mut self) {
        let n = self.document_count();
        let mut sum_squares = vec![0.0f64; n as usize];
        for entry in self.dictionary.values() {
            if idf(n, entry.document_frequency) == 0.0 { continue; }
            for p in &entry.postings {
                let w = tf_idf(p.frequency, n, entry.document_frequency);
                sum_squares[p.doc_id as usize] += w * w;
            }
        }
        self.magnitudes = sum_squares.into_iter().map(f64::sqrt).collect();
    }
}

struct PendingDoc {
    source_identifier: String,
    title: Option<String>,
    text: String,
}

/// Collects documents in order and builds an [`Index`] in one pass.
///
/// Ids are assigned in insertion order, counting only documents that are
/// actually indexed.
#[derive(Default)]
pub struct IndexBuilder {
    normalizer: Normalizer,
    pending: Vec<PendingDoc>,
    seen: HashSet<String>,
}

impl IndexBuilder {
    pub fn new(normalizer: Normalizer) -> Self {
        Self { normalizer, pending: Vec::new(), seen: HashSet::new() }
    }

    pub fn add_document(&mut self, source_identifier: impl Into<String>, title: Option<String>, text: impl Into<String>) -> &mut Self {
        let source_identifier = source_identifier.into();
        if !self.seen.insert(source_identifier.clone()) {
            tracing::warn!(%source_identifier, "duplicate source identifier, keeping first occurrence");
            return self;
        }
        self.pending.push(PendingDoc { source_identifier, title, text: text.into() });
        self
    }

    pub fn len(&self) -> usize { self.pending.len() }

    pub fn is_empty(&self) -> bool { self.pending.is_empty() }

    pub fn build(self) -> Index {
        let mut index = Index { normalizer: self.normalizer, ..Index::default() };
        if self.pending.is_empty() {
            tracing::warn!("no documents provided, index is empty");
            return index;
        }

        let mut skipped = 0usize;
        for doc in self.pending {
            if doc.text.trim().is_empty() {
                tracing::warn!(source_identifier = %doc.source_identifier, "skipping document with empty content");
                skipped += 1;
                continue;
            }
            let doc_id = index.documents.len() as DocId;
            let terms = index.normalizer.normalize(&doc.text);
            let mut tf_counts: BTreeMap<String, u32> = BTreeMap::new();
            for term in &terms {
                *tf_counts.entry(term.clone()).or_insert(0) += 1;
            }
            for (term, freq) in tf_counts {
                index.dictionary.entry(term).or_default().push(doc_id, freq);
            }
            index.doc_id_map.insert(doc.source_identifier.clone(), doc_id);
            index.documents.push(Document {
                id: doc_id,
                title: doc.title.unwrap_or_else(|| doc.source_identifier.clone()),
                source_identifier: doc.source_identifier,
                token_count: terms.len(),
            });
        }

        tracing::info!(
            num_docs = index.documents.len(),
            num_terms = index.dictionary.len(),
            skipped,
            "ingested documents"
        );
        index.compute_magnitudes();
        index
    }
}

/// Build an index with the reference normalizer, assigning ids in ascending
/// order of source identifier so the result does not depend on map iteration order.
pub fn build_index<I, K, V>(documents: I) -> Index
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    build_index_with(Normalizer::default(), documents)
}

pub fn build_index_with<I, K, V>(normalizer: Normalizer, documents: I) -> Index
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut docs: Vec<(String, String)> = documents.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
    docs.sort_by(|a, b| a.0.cmp(&b.0));
    let mut builder = IndexBuilder::new(normalizer);
    for (id, text) in docs {
        builder.add_document(id, None, text);
    }
    builder.build()
}

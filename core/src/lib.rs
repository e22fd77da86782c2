//! In-memory inverted index with boolean AND and TF-IDF cosine ranked retrieval.

pub mod corpus;
pub mod error;
pub mod handle;
pub mod index;
pub mod query;
pub mod tokenizer;
pub mod weighting;

pub use error::SearchError;
pub use handle::IndexHandle;
pub use index::{build_index, build_index_with, DictEntry, DocId, Document, Index, IndexBuilder, Posting, TermStats};
pub use query::{BooleanMatch, SearchResult};
pub use tokenizer::{normalize, IdentityStemmer, Normalizer, NormalizerConfig, SnowballStemmer, Stemmer, StemmerKind};

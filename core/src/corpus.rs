use crate::index::IndexBuilder;
use crate::tokenizer::Normalizer;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: String,
    #[serde(default)]
    url: Option<String>,
}

/// One document as handed to the indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub identifier: String,
    pub title: Option<String>,
    pub text: String,
}

impl From<InputDoc> for SourceDocument {
    fn from(doc: InputDoc) -> Self {
        let title = doc.title.filter(|t| !t.trim().is_empty()).or(doc.url);
        SourceDocument { identifier: doc.id, title, text: doc.body }
    }
}

/// Load documents from a `.json`, `.jsonl` or `.txt` file, or from every such
/// file below a directory (visited in file-name order).
pub fn load_corpus<P: AsRef<Path>>(input: P) -> Result<Vec<SourceDocument>> {
    let input_path = input.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && corpus_extension(p).is_some() {
                files.push(p.to_path_buf());
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        anyhow::bail!("corpus path {} does not exist", input_path.display());
    }

    let mut docs = Vec::new();
    for file in files {
        let before = docs.len();
        match corpus_extension(&file) {
            Some("jsonl") => load_jsonl(&file, &mut docs)?,
            Some("txt") => {
                let text = fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
                let rel = file.strip_prefix(input_path).unwrap_or(&file);
                let identifier = if rel.as_os_str().is_empty() { file.as_path() } else { rel };
                docs.push(SourceDocument { identifier: identifier.display().to_string(), title: None, text });
            }
            _ => load_json(&file, &mut docs)?,
        }
        tracing::debug!(file = %file.display(), docs = docs.len() - before, "loaded corpus file");
    }
    tracing::info!(input = %input_path.display(), docs = docs.len(), "corpus loaded");
    Ok(docs)
}

fn corpus_extension(path: &Path) -> Option<&str> {
    path.extension()
        .and_then(|s| s.to_str())
        .filter(|ext| matches!(*ext, "json" | "jsonl" | "txt"))
}

fn load_jsonl(file: &Path, docs: &mut Vec<SourceDocument>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid document", file.display(), lineno + 1))?;
        docs.push(doc.into());
    }
    Ok(())
}

fn load_json(file: &Path, docs: &mut Vec<SourceDocument>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)
        .with_context(|| format!("{}: invalid JSON", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                let doc: InputDoc = serde_json::from_value(v)?;
                docs.push(doc.into());
            }
        }
        serde_json::Value::Object(_) => {
            let doc: InputDoc = serde_json::from_value(json)?;
            docs.push(doc.into());
        }
        _ => tracing::warn!(file = %file.display(), "ignoring JSON that is neither object nor array"),
    }
    Ok(())
}

/// Builder pre-populated with `docs` in the order given.
pub fn builder_from(normalizer: Normalizer, docs: Vec<SourceDocument>) -> IndexBuilder {
    let mut builder = IndexBuilder::new(normalizer);
    for doc in docs {
        builder.add_document(doc.identifier, doc.title, doc.text);
    }
    builder
}

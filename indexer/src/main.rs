use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use search_core::corpus::{builder_from, load_corpus};
use search_core::{Index, Normalizer, NormalizerConfig, SearchError, StemmerKind};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build an in-memory TF-IDF inverted index and query it", long_about = None)]
struct Cli {
    #[command(flatten)]
    corpus: CorpusArgs,
    /// Emit JSON instead of text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CorpusArgs {
    /// Input path (file or directory of .json/.jsonl/.txt)
    #[arg(long, global = true, default_value = "./corpus")]
    corpus: String,
    /// Stemming strategy shared by indexing and querying
    #[arg(long, global = true, default_value_t = StemmerKind::Identity)]
    stemmer: StemmerKind,
    /// Apply NFKC folding before lower-casing
    #[arg(long, global = true, default_value_t = false)]
    unicode_fold: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print corpus statistics and an alphabetical dictionary sample
    Stats {
        #[arg(long, default_value_t = 50)]
        sample: usize,
    },
    /// Ranked retrieval by cosine similarity
    Search {
        query: String,
        /// Number of hits to show
        #[arg(long, default_value_t = 10)]
        k: usize,
    },
    /// Conjunctive (AND) retrieval
    Boolean { query: String },
    /// Print the TF-IDF vector of one document
    Vector { identifier: String },
    /// Read queries from stdin until `exit`
    Repl {
        #[arg(long, default_value_t = 10)]
        k: usize,
    },
}

#[derive(Serialize)]
struct Stats<'a> {
    num_docs: u32,
    vocabulary_size: usize,
    stemmer: &'a str,
    sample: Vec<search_core::TermStats>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(io::stderr).init();
    let cli = Cli::parse();
    let index = build(&cli.corpus)?;

    match cli.command {
        Commands::Stats { sample } => print_stats(&index, sample, cli.json),
        Commands::Search { query, k } => print_ranked(&index, &query, k, cli.json),
        Commands::Boolean { query } => print_boolean(&index, &query, cli.json),
        Commands::Vector { identifier } => print_vector(&index, &identifier, cli.json),
        Commands::Repl { k } => repl(&index, k),
    }
}

fn build(args: &CorpusArgs) -> Result<Index> {
    let config = NormalizerConfig { stemmer: args.stemmer, unicode_fold: args.unicode_fold };
    let docs = load_corpus(&args.corpus).with_context(|| format!("loading corpus from {}", args.corpus))?;
    let index = builder_from(Normalizer::from_config(&config), docs).build();
    tracing::info!(num_docs = index.document_count(), num_terms = index.vocabulary_size(), "index ready");
    Ok(index)
}

fn print_stats(index: &Index, sample: usize, json: bool) -> Result<()> {
    let stats = Stats {
        num_docs: index.document_count(),
        vocabulary_size: index.vocabulary_size(),
        stemmer: index.normalizer().stemmer_name(),
        sample: index.dictionary_sample(sample),
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    println!("documents: {}  terms: {}  stemmer: {}", stats.num_docs, stats.vocabulary_size, stats.stemmer);
    for t in &stats.sample {
        println!("{:<20} df={:<5} tf={:<6} postings={}", t.term, t.document_frequency, t.aggregate_term_frequency, t.postings);
    }
    if stats.vocabulary_size > stats.sample.len() {
        println!("... ({} more terms)", stats.vocabulary_size - stats.sample.len());
    }
    Ok(())
}

fn print_ranked(index: &Index, query: &str, k: usize, json: bool) -> Result<()> {
    let results = match index.try_ranked_search(query) {
        Ok(results) => results,
        Err(err) => {
            println!("{err}");
            return Ok(());
        }
    };
    let total_hits = results.len();
    let top: Vec<_> = results.into_iter().take(k.max(1)).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "query": query, "total_hits": total_hits, "results": top }))?);
        return Ok(());
    }
    if top.is_empty() {
        println!("no documents could be ranked for '{query}'");
    }
    for (rank, hit) in top.iter().enumerate() {
        println!("{:>3}. {:.6}  {} (id {})", rank + 1, hit.score, hit.identifier, hit.doc_id);
    }
    if total_hits > top.len() {
        println!("... {} hits total", total_hits);
    }
    Ok(())
}

fn print_boolean(index: &Index, query: &str, json: bool) -> Result<()> {
    let outcome = index.boolean_and_search(query);
    if json {
        let body = match &outcome {
            Ok(hits) => serde_json::json!({ "query": query, "results": hits }),
            Err(err) => serde_json::json!({ "query": query, "error": err.to_string(), "missing_term": missing_term(err) }),
        };
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }
    match outcome {
        Ok(hits) if hits.is_empty() => println!("no documents contain all terms of '{query}'"),
        Ok(hits) => {
            for hit in hits {
                println!("  - {} (id {})", hit.identifier, hit.doc_id);
            }
        }
        Err(err) => println!("{err}"),
    }
    Ok(())
}

fn missing_term(err: &SearchError) -> Option<&str> {
    match err {
        SearchError::MissingTerm { term } => Some(term.as_str()),
        _ => None,
    }
}

fn print_vector(index: &Index, identifier: &str, json: bool) -> Result<()> {
    let doc_id = index
        .document_id(identifier)
        .with_context(|| format!("document '{identifier}' is not in the index"))?;
    let vector = index.document_vector(doc_id);
    let magnitude = index.document_magnitude(doc_id);
    if json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "doc_id": doc_id, "magnitude": magnitude, "vector": vector }))?);
        return Ok(());
    }
    println!("{identifier} (id {doc_id}) magnitude {magnitude:.6}");
    for (term, weight) in vector {
        println!("  {term:<20} {weight:.6}");
    }
    Ok(())
}

fn repl(index: &Index, k: usize) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("query (prefix with '&' for AND, 'exit' to quit)> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let query = line.trim();
        if query.is_empty() { continue; }
        if query.eq_ignore_ascii_case("exit") { break; }
        match query.strip_prefix('&') {
            Some(rest) => print_boolean(index, rest, false)?,
            None => print_ranked(index, query, k, false)?,
        }
    }
    Ok(())
}

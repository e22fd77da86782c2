use criterion::{criterion_group, criterion_main, Criterion};
use search_core::{build_index, normalize};

fn synthetic_corpus(docs: usize) -> Vec<(String, String)> {
    let words = ["pharaoh", "egypt", "dynasty", "pyramid", "nile", "temple", "kingdom", "tomb", "river", "scribe"];
    (0..docs)
        .map(|i| {
            let body: Vec<&str> = (0..60).map(|j| words[(i * 7 + j * 3) % words.len()]).collect();
            (format!("doc-{i:05}"), body.join(" "))
        })
        .collect()
}

fn bench_normalize(c: &mut Criterion) {
    let text = "The Pharaoh of the New Kingdom ruled Egypt from Thebes; 1279 BC to 1213 BC, by most accounts.".repeat(20);
    c.bench_function("normalize_paragraph", |b| b.iter(|| normalize(&text)));
}

fn bench_build_and_query(c: &mut Criterion) {
    let corpus = synthetic_corpus(2_000);
    c.bench_function("build_index_2000", |b| b.iter(|| build_index(corpus.clone())));
    let index = build_index(corpus);
    c.bench_function("ranked_search", |b| b.iter(|| index.ranked_search("pharaoh pyramid tomb")));
    c.bench_function("boolean_and_search", |b| b.iter(|| index.boolean_and_search("egypt nile scribe")));
}

criterion_group!(benches, bench_normalize, bench_build_and_query);
criterion_main!(benches);

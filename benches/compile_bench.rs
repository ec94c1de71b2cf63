use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dynamic_synonym::fetcher::RawDictionaryText;
use dynamic_synonym::synonym::{CompilerOptions, RuleCompiler, SynonymCompiler, SynonymFormat};

fn generate_solr_rules(count: usize) -> RawDictionaryText {
    let mut text = RawDictionaryText::new();
    for i in 0..count {
        let line = if i % 5 == 0 {
            format!("term{i}a, term{i}b => canonical{i}")
        } else {
            format!("term{i}a, term{i}b, term {i} c, term{i}d")
        };
        text.push_line(&line);
    }
    text
}

fn generate_wordnet_rules(count: usize) -> RawDictionaryText {
    let mut text = RawDictionaryText::new();
    for i in 0..count {
        for w in 1..=3 {
            text.push_line(&format!("s({},{w},'word{i}x{w}',n,1,0).", 100_000_000 + i));
        }
    }
    text
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for size in [1_000, 10_000] {
        let solr = generate_solr_rules(size);
        let compiler = RuleCompiler::default();
        group.bench_with_input(BenchmarkId::new("solr", size), &solr, |b, text| {
            b.iter(|| compiler.compile(black_box(text)).unwrap())
        });

        let wordnet = generate_wordnet_rules(size);
        let compiler =
            RuleCompiler::new(CompilerOptions::default().with_format(SynonymFormat::Wordnet));
        group.bench_with_input(BenchmarkId::new("wordnet", size), &wordnet, |b, text| {
            b.iter(|| compiler.compile(black_box(text)).unwrap())
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let table = RuleCompiler::default()
        .compile(&generate_solr_rules(10_000))
        .unwrap();
    let terms: Vec<String> = (0..10_000).step_by(7).map(|i| format!("term{i}a")).collect();

    c.bench_function("lookup", |b| {
        b.iter(|| {
            for term in &terms {
                let _ = black_box(table.get_synonyms(black_box(term)));
            }
        })
    });
}

criterion_group!(benches, bench_compile, bench_lookup);
criterion_main!(benches);

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use rematch::Regex;

fn bench_compile(c: &mut Criterion) {
    c.bench_function("compile/email", |b| {
        b.iter(|| Regex::new(black_box(r"(\w+)@(\w+)\.com")).unwrap())
    });
}

fn bench_search(c: &mut Criterion) {
    let re = Regex::new(r"[a-z]+-\d+").unwrap();
    let haystack = "lorem ipsum dolor sit amet ".repeat(64) + "artifact-42 tail";
    c.bench_function("search/literal_tail", |b| {
        b.iter(|| re.find(black_box(haystack.as_str())).unwrap())
    });

    let re = Regex::new(r"\bword\b").unwrap();
    c.bench_function("search/word_boundary_miss", |b| {
        b.iter(|| re.is_match(black_box(haystack.as_str())))
    });
}

fn bench_finditer(c: &mut Criterion) {
    let re = Regex::new(r"\d+").unwrap();
    let haystack = "a1 bb22 ccc333 ".repeat(128);
    c.bench_function("finditer/digits", |b| {
        b.iter(|| re.finditer(black_box(haystack.as_str())).count())
    });
}

criterion_group!(benches, bench_compile, bench_search, bench_finditer);
criterion_main!(benches);

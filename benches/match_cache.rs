//! Compares resolving selectors against a large identifier index with a warm
//! cache, and with a cache emptied by rebuilding the index.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use lotus::{IdentifierIndex, MatchSpec, PatternMatcher, Spec};

/// 200 templates of 50 nets each.
fn identifiers() -> Vec<(String, String)> {
    (0..200)
        .flat_map(|t| (0..50).map(move |n| (format!("cell{t}"), format!("net{n}"))))
        .collect()
}

fn specs() -> Vec<MatchSpec> {
    vec![
        MatchSpec::any_template(Spec::literal("net7").unwrap()),
        MatchSpec::any_template(Spec::regex("net1[0-9]").unwrap()),
        MatchSpec::new(
            Some(Spec::regex("cell1.*").unwrap()),
            Spec::regex("net[0-4]").unwrap(),
        ),
        MatchSpec::new(Some(Spec::literal("cell42").unwrap()), Spec::regex(".*").unwrap()),
    ]
}

fn cached(c: &mut Criterion) {
    let index = IdentifierIndex::build(identifiers());
    let specs = specs();
    let mut matcher = PatternMatcher::new();

    c.bench_function("find matches (cached)", |b| {
        b.iter(|| {
            for spec in &specs {
                black_box(matcher.find_matches(spec, &index).unwrap());
            }
        });
    });
}

fn uncached(c: &mut Criterion) {
    let pairs = identifiers();
    let specs = specs();
    let mut matcher = PatternMatcher::new();

    c.bench_function("find matches (after rebuild)", |b| {
        b.iter_batched(
            || IdentifierIndex::build(pairs.clone()),
            |index| {
                for spec in &specs {
                    black_box(matcher.find_matches(spec, &index).unwrap());
                }
            },
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, cached, uncached);
criterion_main!(benches);

#![allow(clippy::all)]
//! Benchmarks for redaction.
//!
//! Tests: flat allow-listed objects, redact-by-default, nested descriptions.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sinklog::logging::{Field, Redactable, Redactor};
use std::hint::black_box;

struct Card {
    brand: String,
    number: String,
    expiry: String,
}

impl Redactable for Card {
    fn safe_fields(&self) -> Option<&'static [&'static str]> {
        Some(&["brand"])
    }

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::leaf("brand", &self.brand),
            Field::leaf("number", &self.number),
            Field::leaf("expiry", &self.expiry),
        ]
    }
}

struct Chain {
    depth: usize,
    next: Option<Box<Chain>>,
}

impl Redactable for Chain {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::leaf("depth", &self.depth),
            Field::optional_nested("next", self.next.as_deref()),
        ]
    }
}

fn chain(length: usize) -> Chain {
    (0..length).fold(Chain { depth: 0, next: None }, |next, depth| Chain {
        depth: depth + 1,
        next: Some(Box::new(next)),
    })
}

fn bench_flat(c: &mut Criterion) {
    let mut group = c.benchmark_group("redaction/flat");

    let card = Card {
        brand: "visa".to_string(),
        number: "4111111111111111".to_string(),
        expiry: "12/30".to_string(),
    };

    for flag in [false, true] {
        group.bench_with_input(BenchmarkId::new("allow_list", flag), &flag, |b, &flag| {
            let redactor = Redactor::new(flag);
            b.iter(|| black_box(redactor.describe(black_box(&card))));
        });
    }

    group.finish();
}

fn bench_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("redaction/nested");

    for length in [4, 16, 64] {
        let value = chain(length);
        group.bench_with_input(BenchmarkId::new("chain", length), &value, |b, value| {
            let redactor = Redactor::new(false);
            b.iter(|| black_box(redactor.describe(value)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_flat, bench_nested);
criterion_main!(benches);

use std::hint::black_box;

use criterion::{criterion_group, Criterion};

use athenacl::{
    parameter::{GeneratorObject, RefDict},
    prelude::*,
};

// ---------------------------------------------------------------------------------------------

// nested generators, using most of the generator families
const GENERATORS: [&str; 6] = [
    "ru, 0, 1",
    "ws, e, 30, 0, (ru, 0, .2), 1",
    "(lb)",
    "(mv)",
    "(fs)",
    "om, (ws, e, 30, 0, 0, 1), (bg, rc, (.2, .5, 1))",
];

fn load_generators() -> Vec<GeneratorObject> {
    GENERATORS
        .iter()
        .map(|args| GeneratorObject::parse(args, 42).unwrap())
        .collect()
}

// ---------------------------------------------------------------------------------------------

pub fn parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("Parameter");
    group.bench_function("Parse", |b| {
        b.iter(|| {
            for args in GENERATORS {
                black_box(Arg::parse(args).unwrap());
            }
        })
    });
    group.bench_function("Load", |b| b.iter(|| black_box(load_generators())));
    group.finish();
}

pub fn evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("Parameter");
    let mut generators = load_generators();
    let context = RefDict::default();
    group.bench_function("Evaluate", |b| {
        b.iter(|| {
            for generator in generators.iter_mut() {
                generator.reset();
                for t in 0..100 {
                    black_box(generator.value(t as f64 * 0.25, &context));
                }
            }
        })
    });
    group.finish();
}

// ---------------------------------------------------------------------------------------------

criterion_group! {
    name = parameter;
    config = Criterion::default();
    targets = parse, evaluate
}

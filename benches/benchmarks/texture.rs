use std::hint::black_box;

use criterion::{criterion_group, Criterion};

use athenacl::prelude::*;

// ---------------------------------------------------------------------------------------------

fn create_composition() -> AthenaObject {
    let mut ao = AthenaObject::new(42);
    ao.set_event_mode(EventMode::Midi);
    ao.path_new("a", &["3-4", "4-z15", "c4,e4,g4,b4", "5-35"])
        .unwrap();
    ao.texture_new("t1", ModuleKind::LineGroove, "a").unwrap();
    ao.texture_new("t2", ModuleKind::LineCluster, "a").unwrap();
    ao.texture_new("t3", ModuleKind::InterpolateLine, "a").unwrap();
    for texture in ["t1", "t2", "t3"] {
        ao.texture_edit(texture, "tRange", "0, 60").unwrap();
        ao.texture_edit(texture, "ampQ", "ws, e, 12, 0, .3, 1").unwrap();
    }
    ao.texture_edit("t1", "rhythmQ", "pt, (c, 4), (bg, rc, (1, 2, 3)), (c, 1)")
        .unwrap();
    ao.clone_new("t1", "c1").unwrap();
    ao.clone_edit("t1", "c1", "time", "fa, (c, .5)").unwrap();
    ao.clone_edit("t1", "c1", "cloneQ", "rmt, ti").unwrap();
    ao
}

// ---------------------------------------------------------------------------------------------

pub fn perform(c: &mut Criterion) {
    let mut group = c.benchmark_group("Texture");
    let mut ao = create_composition();
    let environment = Environment::new();
    group.bench_function("Perform", |b| {
        b.iter(|| black_box(ao.perform(&environment)))
    });
    group.finish();
}

pub fn save_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("Texture");
    let ao = create_composition();
    group.bench_function("Save/Load", |b| {
        b.iter(|| black_box(AthenaObject::from_json(&ao.to_json().unwrap()).unwrap()))
    });
    group.finish();
}

// ---------------------------------------------------------------------------------------------

criterion_group! {
    name = texture;
    config = Criterion::default();
    targets = perform, save_load
}

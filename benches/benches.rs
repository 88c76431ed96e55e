use criterion::criterion_main;

// ---------------------------------------------------------------------------------------------

mod benchmarks;

// ---------------------------------------------------------------------------------------------

criterion_main!(
    benchmarks::parameter::parameter, //
    benchmarks::texture::texture,
);

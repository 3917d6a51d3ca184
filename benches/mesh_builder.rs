use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use terrain_engine::{
    build_height_grid, triangulate, ChunkCoord, ElevationSource, GenerationContext, HeightMapSettings,
    MeshSettings,
};

fn mesh_settings() -> MeshSettings {
    MeshSettings {
        chunk_size_index: 8,
        ..MeshSettings::default()
    }
}

fn bench_height_grid(c: &mut Criterion) {
    let settings = HeightMapSettings::default();
    let n = mesh_settings().vertices_per_line();
    let ctx = GenerationContext::new();

    c.bench_function("height_grid_245", |b| {
        b.iter(|| {
            let coord = ChunkCoord::new(1, -2);
            black_box(build_height_grid(n, n, &settings, coord.sample_centre(n), &ctx))
        })
    });
}

fn bench_triangulate(c: &mut Criterion) {
    let mesh = mesh_settings();
    let n = mesh.vertices_per_line();
    let coord = ChunkCoord::new(0, 0);
    let ctx = GenerationContext::new();
    let grid = build_height_grid(n, n, &HeightMapSettings::default(), coord.sample_centre(n), &ctx);

    let mut group = c.benchmark_group("triangulate");
    for lod in 0..5 {
        group.bench_with_input(BenchmarkId::from_parameter(lod), &lod, |b, &lod| {
            b.iter(|| black_box(triangulate(lod, &mesh, coord, ElevationSource::Grid(&grid))))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_height_grid, bench_triangulate);
criterion_main!(benches);

use criterion::{criterion_group, criterion_main, Criterion, black_box};

use cavern::mesh::{extract, taubin_smooth, DedupStrategy};
use cavern::mesh::dedup::dedup_vertices;
use cavern::terrain::{DensityParams, DensitySampler};
use cavern::voxel::{ChunkCoord, ChunkExtent, DensityField};

use glam::Vec3;

/// A chunk of the default cave field that actually contains a surface
fn test_field(chunk_size: u32) -> DensityField {
    let extent = ChunkExtent::new(50.0, chunk_size);
    let sampler = DensitySampler::new(DensityParams::default());
    let origin = ChunkCoord::new(0, 0, 0).world_origin(extent.world_size());
    match DensityField::build(origin, extent, &sampler) {
        Ok(field) => field,
        Err(e) => panic!("field build failed: {}", e),
    }
}

/// Analytic sphere, so the bench always has geometry to chew on
fn sphere_field(chunk_size: u32) -> DensityField {
    let c = chunk_size as f32 * 0.5;
    let r = c * 0.8;
    DensityField::from_fn(chunk_size, |x, y, z| {
        Vec3::new(x as f32, y as f32, z as f32).distance(Vec3::splat(c)) - r
    })
}

fn bench_field_build_32(c: &mut Criterion) {
    c.bench_function("field_build_32", |b| {
        b.iter(|| test_field(black_box(32)));
    });
}

fn bench_field_build_64(c: &mut Criterion) {
    c.bench_function("field_build_64", |b| {
        b.iter(|| test_field(black_box(64)));
    });
}

fn bench_extract_sphere_64(c: &mut Criterion) {
    let field = sphere_field(64);

    c.bench_function("extract_sphere_64", |b| {
        b.iter(|| extract(black_box(&field), 1.0, 0.0));
    });
}

fn bench_extract_cave_64(c: &mut Criterion) {
    let field = test_field(64);

    c.bench_function("extract_cave_64", |b| {
        b.iter(|| extract(black_box(&field), 50.0, 0.0));
    });
}

fn bench_dedup_neighbor_hash(c: &mut Criterion) {
    let mesh = extract(&sphere_field(64), 1.0, 0.0);
    // Unshare the extractor's vertices so there is something to merge
    let vertices: Vec<Vec3> = mesh.triangles.iter().map(|&i| mesh.vertices[i as usize]).collect();
    let triangles: Vec<u32> = (0..vertices.len() as u32).collect();

    c.bench_function("dedup_neighbor_hash_64", |b| {
        b.iter(|| dedup_vertices(black_box(&vertices), black_box(&triangles), 0.1, DedupStrategy::NeighborHash));
    });
}

fn bench_dedup_sort_quantize(c: &mut Criterion) {
    let mesh = extract(&sphere_field(64), 1.0, 0.0);
    let vertices: Vec<Vec3> = mesh.triangles.iter().map(|&i| mesh.vertices[i as usize]).collect();
    let triangles: Vec<u32> = (0..vertices.len() as u32).collect();

    c.bench_function("dedup_sort_quantize_64", |b| {
        b.iter(|| dedup_vertices(black_box(&vertices), black_box(&triangles), 0.1, DedupStrategy::SortQuantize));
    });
}

fn bench_taubin_smooth(c: &mut Criterion) {
    let mesh = extract(&sphere_field(64), 1.0, 0.0);

    c.bench_function("taubin_smooth_64_x5", |b| {
        b.iter(|| {
            let mut vertices = mesh.vertices.clone();
            taubin_smooth(&mut vertices, black_box(&mesh.triangles), 0.5, -0.53, 5);
            black_box(vertices)
        });
    });
}

criterion_group!(
    benches,
    bench_field_build_32,
    bench_field_build_64,
    bench_extract_sphere_64,
    bench_extract_cave_64,
    bench_dedup_neighbor_hash,
    bench_dedup_sort_quantize,
    bench_taubin_smooth,
);
criterion_main!(benches);

//! Mesh a single chunk and compare vertex merge strategies.
//!
//! Usage: cargo run --release --bin mesh_chunk -- [OPTIONS]
//!
//! Options:
//!   --x <N> --y <N> --z <N>   Chunk coordinate (default: 0 0 0)
//!   --chunk-size <N>          Voxels per axis (default: 64)
//!   --voxel-size <UNITS>      World units per voxel (default: 50)
//!   --seed <SEED>             Density seed (default: 12345)
//!   --merge <UNITS>           Merge distance (default: 0.1)

use std::time::Instant;

use cavern::generation::{GenerationJob, MeshingConfig, WorldConfig};
use cavern::mesh::DedupStrategy;
use cavern::terrain::DensityParams;
use cavern::voxel::{ChunkCoord, ChunkExtent};

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .format_timestamp_millis()
    .init();

    let args: Vec<String> = std::env::args().collect();
    let defaults = WorldConfig::default();
    let coord = ChunkCoord::new(
        parse_i32_arg(&args, "--x").unwrap_or(0),
        parse_i32_arg(&args, "--y").unwrap_or(0),
        parse_i32_arg(&args, "--z").unwrap_or(0),
    );
    let chunk_size = parse_u32_arg(&args, "--chunk-size").unwrap_or(defaults.chunk_size);
    let voxel_size = parse_f32_arg(&args, "--voxel-size").unwrap_or(defaults.voxel_size);
    let seed = parse_u32_arg(&args, "--seed").unwrap_or(defaults.density.seed);
    let merge = parse_f32_arg(&args, "--merge").unwrap_or(defaults.meshing.merge_distance);

    let extent = ChunkExtent::new(voxel_size, chunk_size);
    if let Err(e) = extent.validate() {
        eprintln!("Invalid chunk parameters: {}", e);
        std::process::exit(1);
    }

    println!("=== Cavern Chunk Mesher ===");
    println!("Chunk:  {} ({} voxels x {} units)", coord, chunk_size, voxel_size);
    println!("Seed:   {}", seed);
    println!("Merge:  {}", merge);
    println!();

    let variants: [(&str, bool, DedupStrategy, bool); 4] = [
        ("raw", false, DedupStrategy::default(), false),
        ("neighbor_hash", true, DedupStrategy::NeighborHash, false),
        ("sort_quantize", true, DedupStrategy::SortQuantize, false),
        ("sort_quantize+avg", true, DedupStrategy::SortQuantize, true),
    ];

    println!("{:<20} {:>10} {:>10} {:>10} {:>10}", "variant", "vertices", "triangles", "merged", "ms");
    for (name, dedup_enabled, dedup_strategy, average_normals) in variants {
        let job = GenerationJob {
            slot: 0,
            epoch: 0,
            coord,
            priority: 0.0,
            origin: coord.world_origin(extent.world_size()),
            extent,
            density: DensityParams { seed, ..defaults.density.clone() },
            edits: Vec::new(),
            meshing: MeshingConfig {
                merge_distance: merge,
                dedup_enabled,
                dedup_strategy,
                min_vertices_for_dedup: 0,
                keep_density_field: false,
                ..defaults.meshing.clone()
            },
            average_normals,
        };

        let start = Instant::now();
        let out = match job.run() {
            Ok(out) => out,
            Err(e) => {
                eprintln!("{}: {}", name, e);
                continue;
            }
        };
        let ms = start.elapsed().as_secs_f64() * 1000.0;
        let merged = out
            .stats
            .dedup
            .map_or(0, |d| d.vertices_before - d.vertices_after);

        println!(
            "{:<20} {:>10} {:>10} {:>10} {:>10.2}",
            name,
            out.mesh.vertex_count(),
            out.mesh.triangle_count(),
            merged,
            ms
        );
    }
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_i32_arg(args: &[String], flag: &str) -> Option<i32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

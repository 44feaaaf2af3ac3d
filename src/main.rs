//! Cavern - headless fly-through
//!
//! Streams cave chunks around an observer moving along a straight line and
//! reports scheduler statistics.
//!
//! Usage: cargo run --release -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>   JSON world config (defaults for missing fields)
//!   --ticks <N>       Number of scheduler ticks (default: 600)
//!   --speed <UNITS>   Observer speed in world units per tick (default: 100)
//!   --save <PATH>     Write the effective config as JSON and exit

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cavern::core::logging;
use cavern::core::types::Vec3;
use cavern::generation::WorldConfig;
use cavern::streaming::{ChunkEvent, ChunkScheduler};

const TICK_INTERVAL: Duration = Duration::from_millis(16);

fn main() {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = parse_str_arg(&args, "--config").map(PathBuf::from);
    let ticks = parse_usize_arg(&args, "--ticks").unwrap_or(600);
    let speed = parse_f32_arg(&args, "--speed").unwrap_or(100.0);
    let save_path = parse_str_arg(&args, "--save").map(PathBuf::from);

    let config = match &config_path {
        Some(path) => match WorldConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => WorldConfig::default(),
    };

    if let Some(path) = save_path {
        match config.save(&path) {
            Ok(()) => println!("Wrote config to {}", path.display()),
            Err(e) => {
                log::error!("Failed to save {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
        return;
    }

    println!("=== Cavern Fly-Through ===");
    println!("Config: {}", config_path.as_ref().map_or("defaults".to_string(), |p| p.display().to_string()));
    println!("Chunk:  {} voxels x {} units", config.chunk_size, config.voxel_size);
    println!("View:   {} chunks", config.view_distance);
    println!("Mode:   {}", if config.async_generation { "async" } else { "sync" });
    println!("Ticks:  {} at {} units/tick", ticks, speed);
    println!();

    let mut scheduler = match ChunkScheduler::new(config) {
        Ok(scheduler) => scheduler,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let vertices = Arc::new(AtomicUsize::new(0));
    let triangles = Arc::new(AtomicUsize::new(0));
    let lod_changes = Arc::new(AtomicUsize::new(0));
    {
        let vertices = Arc::clone(&vertices);
        let triangles = Arc::clone(&triangles);
        let lod_changes = Arc::clone(&lod_changes);
        scheduler.add_listener(move |event| match event {
            ChunkEvent::Generated { vertices: v, triangles: t, .. } => {
                vertices.fetch_add(*v, Ordering::Relaxed);
                triangles.fetch_add(*t, Ordering::Relaxed);
            }
            ChunkEvent::LodChanged { .. } => {
                lod_changes.fetch_add(1, Ordering::Relaxed);
            }
            ChunkEvent::Evicted { .. } => {}
        });
    }

    let start = Instant::now();
    let direction = Vec3::new(1.0, 0.0, 0.25).normalize();
    let mut position = Vec3::ZERO;
    let mut started = 0;
    let mut discarded = 0;

    for tick in 0..ticks {
        let frame = Instant::now();
        scheduler.update_around_observer(position);
        let summary = scheduler.tick();
        started += summary.started;
        discarded += summary.discarded;

        if tick % 60 == 0 {
            let stats = scheduler.statistics();
            log::info!(
                "tick {:>5} at {:?}: {} active, {} generating, {} queued, {} pooled",
                tick,
                scheduler.world_to_chunk(position),
                stats.active,
                stats.generating,
                stats.queued,
                stats.pooled
            );
        }

        position += direction * speed;
        if let Some(rest) = TICK_INTERVAL.checked_sub(frame.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    let stats = scheduler.statistics();
    let elapsed = start.elapsed().as_secs_f64();

    println!();
    println!("=== Fly-Through Complete ===");
    println!("Time:      {:.1}s ({:.1} ticks/sec)", elapsed, ticks as f64 / elapsed);
    println!("Started:   {} generations ({} stale results discarded)", started, discarded);
    println!("Geometry:  {} vertices, {} triangles committed",
        vertices.load(Ordering::Relaxed),
        triangles.load(Ordering::Relaxed));
    println!("LOD:       {} bucket changes", lod_changes.load(Ordering::Relaxed));
    println!("Chunks:    {} active, {} pooled, {} queued",
        stats.active, stats.pooled, stats.queued);

    scheduler.clear();
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

//! Headless sand field demo: a digger drives across noise terrain.
//!
//! Usage: cargo run --release --bin sand_demo -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>    Sand config JSON (default: built-in defaults)
//!   --seconds <S>      Simulated duration (default: 20)
//!   --speed <M/S>      Anchor speed along +X (default: 1.5)
//!   --seed <SEED>      Terrain seed (default: 12345)
//!   --fps <N>          Frame rate driving the simulation (default: 60)
//!   --save-config <P>  Write the effective config and exit

use std::time::Instant;

use glam::Vec3;

use sandfield::math::Aabb;
use sandfield::physics::{DiggerId, SphereWorld};
use sandfield::simulation::{PhysicsReport, SandConfig, SandSimulation};
use sandfield::terrain::{TerrainGenerator, TerrainParams, TerrainSurface};

const DIGGER: DiggerId = DiggerId(0);

fn main() {
    sandfield::core::logging::init();

    let args: Vec<String> = std::env::args().collect();
    let seconds = parse_f32_arg(&args, "--seconds").unwrap_or(20.0);
    let speed = parse_f32_arg(&args, "--speed").unwrap_or(1.5);
    let seed = parse_u32_arg(&args, "--seed").unwrap_or(12345);
    let fps = parse_u32_arg(&args, "--fps").unwrap_or(60).max(1);

    let config = match parse_str_arg(&args, "--config") {
        Some(path) => match SandConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => SandConfig::default(),
    };

    if let Some(path) = parse_str_arg(&args, "--save-config") {
        if let Err(e) = config.save(&path) {
            log::error!("Failed to save {}: {}", path, e);
            std::process::exit(1);
        }
        println!("Wrote config to {}", path);
        return;
    }

    // Terrain long enough for the whole drive plus the window around it
    let cell_size = 0.125;
    let span = seconds * speed + config.window.width * 4.0;
    let cells = (span * 2.0 / cell_size).ceil() as usize + 1;
    let generator = TerrainGenerator::new(TerrainParams { seed, ..TerrainParams::default() });
    let terrain = generator.bake(cell_size, cells, cells);

    println!("=== Sandfield Demo ===");
    println!("Pool:    {} particles", config.pool.capacity);
    println!(
        "Window:  {}x{} columns, {}m wide, {}m deep",
        config.window.resolution, config.window.resolution, config.window.width, config.window.depth
    );
    println!("Drive:   {}s at {}m/s, {} fps", seconds, speed, fps);
    println!();

    let mut sim = match SandSimulation::new(config, terrain, SphereWorld::default()) {
        Ok(sim) => sim,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let frame_dt = 1.0 / fps as f32;
    let frames = (seconds * fps as f32).ceil() as u64;
    let start = Instant::now();
    let mut totals = PhysicsReport::default();
    let mut refreshed = 0usize;
    let mut recycled = 0usize;

    for frame in 0..frames {
        let t = frame as f32 * frame_dt;
        let x = t * speed;
        let ground = sim.terrain().height(Vec3::new(x, 0.0, 0.0));
        let anchor = Vec3::new(x, ground, 0.0);
        sim.set_anchor(anchor);

        // Blade just ahead of the anchor, cutting into the top of the stacks
        let blade_center = anchor + Vec3::new(0.75, -0.15, 0.0);
        sim.set_digger(DIGGER, Aabb::from_center_half_extent(blade_center, Vec3::new(0.1, 0.2, 0.6)));

        let report = sim.advance(frame_dt);
        totals.accumulate(&report.physics);
        refreshed += report.frame.window.stale_columns;
        recycled += report.frame.window.recycled;

        if frame % fps as u64 == 0 {
            let stats = sim.pool_stats();
            log::info!(
                "t={:5.1}s x={:6.2} | in use {:5}/{} ({:4.1}%) active {:4} | dug {} edits {} | refreshed {} recycled {}",
                t,
                x,
                stats.in_use,
                stats.capacity,
                sim.pool().utilization(),
                sim.pool().active().count(),
                totals.activations,
                totals.terrain_edits,
                refreshed,
                recycled,
            );
        }
    }

    let elapsed = start.elapsed();
    let stats = sim.pool_stats();
    println!();
    println!("=== Done ===");
    println!("Frames:         {} ({} physics steps)", frames, sim.clock().physics_steps());
    println!("Wall time:      {:.2}s ({:.3}ms/frame)", elapsed.as_secs_f64(), elapsed.as_secs_f64() * 1000.0 / frames.max(1) as f64);
    println!("Activations:    {}", totals.activations);
    println!("Terrain edits:  {}", totals.terrain_edits);
    println!("Cohesion/frict: {} / {}", totals.cohesion_applications, totals.friction_applications);
    println!("Pool:           acquired {} released {} reclaimed {} exhausted {}",
        stats.acquired, stats.released, stats.reclaimed, stats.exhausted);
    println!("Terrain low:    {:.3}m", sim.terrain().min_height());
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

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

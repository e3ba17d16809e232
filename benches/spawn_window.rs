use criterion::{criterion_group, criterion_main, Criterion, black_box};

use glam::Vec3;

use sandfield::physics::{LayerMask, PhysicsWorld, SphereWorld};
use sandfield::sand::ParticlePool;
use sandfield::simulation::{SandConfig, SandSimulation, WindowConfig};
use sandfield::spawn::SpawnWindow;
use sandfield::terrain::{HeightGrid, TerrainGenerator, TerrainParams};

fn setup(resolution: usize) -> (SpawnWindow, ParticlePool, SphereWorld, HeightGrid, LayerMask) {
    let config = SandConfig {
        window: WindowConfig { resolution, ..WindowConfig::default() },
        ..SandConfig::default()
    };
    let window = SpawnWindow::new(config.window.clone(), config.particle.size);
    let capacity = resolution * resolution * window.stack_height();
    let pool = ParticlePool::new(capacity, config.particle.clone(), config.layers.static_layer);
    let terrain = TerrainGenerator::new(TerrainParams::default()).bake(0.25, 801, 801);
    (window, pool, SphereWorld::default(), terrain, config.layers.terrain_mask)
}

fn bench_window_stationary(c: &mut Criterion) {
    let (mut window, mut pool, world, terrain, mask) = setup(32);
    window.update(Vec3::ZERO, &mut pool, &world, &terrain, mask);

    c.bench_function("window_update_stationary_32", |b| {
        b.iter(|| window.update(black_box(Vec3::ZERO), &mut pool, &world, &terrain, mask));
    });
}

fn bench_window_scrolling(c: &mut Criterion) {
    let (mut window, mut pool, world, terrain, mask) = setup(32);

    c.bench_function("window_update_scrolling_32", |b| {
        let mut frame = 0u32;
        b.iter(|| {
            frame += 1;
            let anchor = Vec3::new(
                (frame as f32 * 0.01).sin() * 40.0,
                0.0,
                (frame as f32 * 0.01).cos() * 40.0,
            );
            window.update(black_box(anchor), &mut pool, &world, &terrain, mask)
        });
    });
}

fn bench_window_teleport(c: &mut Criterion) {
    let (mut window, mut pool, world, terrain, mask) = setup(16);

    c.bench_function("window_update_full_refresh_16", |b| {
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let anchor = if flip { Vec3::new(30.0, 0.0, 30.0) } else { Vec3::new(-30.0, 0.0, -30.0) };
            window.update(black_box(anchor), &mut pool, &world, &terrain, mask)
        });
    });
}

fn bench_simulation_advance(c: &mut Criterion) {
    let terrain = TerrainGenerator::new(TerrainParams::default()).bake(0.25, 801, 801);
    let mut sim = SandSimulation::new(SandConfig::default(), terrain, SphereWorld::default())
        .expect("default config is valid");
    let dt = sim.world().fixed_timestep();

    c.bench_function("simulation_advance_default", |b| {
        let mut frame = 0u32;
        b.iter(|| {
            frame += 1;
            sim.set_anchor(Vec3::new(frame as f32 * 0.02, 0.0, 0.0));
            sim.advance(black_box(dt))
        });
    });
}

criterion_group!(
    benches,
    bench_window_stationary,
    bench_window_scrolling,
    bench_window_teleport,
    bench_simulation_advance,
);
criterion_main!(benches);

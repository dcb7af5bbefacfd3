//! # Headless Bounce
//!
//! Host loop for the bounce scene without a window: spawns rectangles,
//! ticks the world at a fixed step, churns a share of them through
//! lifetimes, and prints a frame-time report.
//!
//! Usage: `headless_bounce [world.toml]`

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stratum::{BounceScene, Bounds, Rect, Tint, Velocity, SCREEN_HEIGHT, SCREEN_WIDTH};
use stratum_core::{EcsResult, WorldConfig};

/// Fixed simulation step (60 FPS).
const FRAME_STEP: f64 = 1.0 / 60.0;

/// Frames to simulate.
const FRAMES: usize = 600;

/// Rectangles spawned up front.
const INITIAL_RECTS: usize = 2_000;

/// Rectangles spawned every frame with a short lifetime.
const SPAWNS_PER_FRAME: usize = 8;

fn random_rect(rng: &mut StdRng) -> (Rect, Velocity, Tint) {
    let size = rng.gen_range(4.0..24.0);
    let rect = Rect::new(
        rng.gen_range(0.0..SCREEN_WIDTH - size),
        rng.gen_range(0.0..SCREEN_HEIGHT - size),
        size,
        size,
    );
    let velocity = Velocity::new(rng.gen_range(-240.0..240.0), rng.gen_range(-240.0..240.0));
    let tint = Tint::rgb(rng.gen(), rng.gen(), rng.gen());
    (rect, velocity, tint)
}

fn load_config() -> EcsResult<WorldConfig> {
    match std::env::args().nth(1) {
        Some(path) => WorldConfig::from_path(path),
        None => Ok(WorldConfig {
            initial_capacity: INITIAL_RECTS,
            ..WorldConfig::default()
        }),
    }
}

fn main() -> EcsResult<()> {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║           STRATUM HEADLESS BOUNCE                                ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let config = load_config()?;
    let mut scene = BounceScene::new(&config, Bounds::default())?;
    let mut rng = StdRng::seed_from_u64(0x5EED);

    for _ in 0..INITIAL_RECTS {
        let (rect, velocity, tint) = random_rect(&mut rng);
        scene.spawn(rect, velocity, tint)?;
    }
    println!("Spawned {INITIAL_RECTS} rectangles");

    let mut frame_times = Vec::with_capacity(FRAMES);
    let mut drawn_total = 0;
    let started = Instant::now();

    for _ in 0..FRAMES {
        for _ in 0..SPAWNS_PER_FRAME {
            let (rect, velocity, tint) = random_rect(&mut rng);
            let entity = scene.spawn(rect, velocity, tint)?;
            scene.expire_after(entity, rng.gen_range(0.1..1.0))?;
        }

        let frame_start = Instant::now();
        drawn_total += scene.step(FRAME_STEP);
        frame_times.push(frame_start.elapsed());
    }

    let total = started.elapsed();
    frame_times.sort_unstable();
    let average = frame_times.iter().sum::<Duration>() / FRAMES as u32;
    let p99 = frame_times[FRAMES * 99 / 100];
    let worst = frame_times[FRAMES - 1];

    let world = scene.world();
    println!();
    println!("┌─ RESULTS ────────────────────────────────────────────────────────┐");
    println!("│ Frames:             {FRAMES}");
    println!("│ Wall time:          {:.2}s", total.as_secs_f64());
    println!("│ Tick avg:           {:.1}µs", average.as_secs_f64() * 1e6);
    println!("│ Tick p99:           {:.1}µs", p99.as_secs_f64() * 1e6);
    println!("│ Tick worst:         {:.1}µs", worst.as_secs_f64() * 1e6);
    println!("│ Live entities:      {}", world.len());
    println!("│ Draws per frame:    {}", drawn_total / FRAMES);
    println!("│ Capacity:           {}", world.capacity());
    println!("└──────────────────────────────────────────────────────────────────┘");

    scene.shutdown();
    Ok(())
}

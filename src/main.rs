use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use rand::Rng;

use pondlife::{
    AppResult, Config, PlayOptions, RodioGraph, Scene, SoundManager, VisibilitySignal,
};

/// Seconds between automatic balloon spawns in the demo loop.
const BALLOON_INTERVAL: f32 = 4.0;

fn main() -> AppResult<()> {
    initialize_tracing();

    let config = Config::load_or_init(Path::new("pondlife.json"))
        .context("failed to load scene configuration")?;
    tracing::info!(
        "Scene: {}x{}, {} bees, {} frogs",
        config.viewport.width,
        config.viewport.height,
        config.bee_count,
        config.frog_anchors.len()
    );

    let visibility = VisibilitySignal::new();
    let mut sounds = SoundManager::new(RodioGraph::factory(), visibility.clone());

    // Preload is best-effort: a missing file costs that sound, not the run.
    let entries: Vec<(&str, &Path)> = config
        .sounds
        .iter()
        .map(|s| (s.name.as_str(), Path::new(s.path.as_str())))
        .collect();
    if let Err(e) = sounds.preload(entries) {
        tracing::warn!("Some sounds failed to preload: {}", e);
    }

    // Launching the demo is the user gesture.
    sounds.unlock();
    sounds.play(
        &config.ambient_loop,
        PlayOptions::default()
            .looping()
            .with_volume(config.ambient_volume),
    );

    let anchors: Vec<(f32, f32)> = config.frog_anchors.iter().map(|a| (a[0], a[1])).collect();
    let mut scene = Scene::new(config.viewport, config.bee_count, &anchors);

    tracing::info!("Scene running; Ctrl+C to quit");
    run_loop(&config, &mut scene, &mut sounds);
    Ok(())
}

fn run_loop(config: &Config, scene: &mut Scene, sounds: &mut SoundManager) {
    let mut rng = rand::thread_rng();
    let mut last = Instant::now();
    let mut balloon_timer = 0.0f32;

    loop {
        let now = Instant::now();
        let dt = (now - last).as_secs_f32();
        last = now;

        balloon_timer += dt;
        if balloon_timer >= BALLOON_INTERVAL {
            balloon_timer = 0.0;
            let x = rng.gen_range(0.0..config.viewport.width);
            let y = config.viewport.height * rng.gen_range(0.5..0.9);
            scene.add_balloon(x, y);
            tracing::debug!("Balloon spawned at ({:.0}, {:.0})", x, y);
        }

        scene.tick(dt, sounds);
        std::thread::sleep(Duration::from_millis(16));
    }
}

fn initialize_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Configure filter (info level by default)
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .init();
}

/// Decorative scene module
///
/// Deterministic per-frame animators composed over the sound manager:
///
/// ```text
/// Scene
///   ├── Bee × N       — horizontal flight paths with sine bob
///   ├── Frog × N      — idle/jump/croak state machines (croak plays a
///   │                   one-shot when the frog is on screen)
///   └── Balloon × *   — pointer-spawned, rise and despawn
/// ```
///
/// The animators are plain physics with no concurrency or failure
/// semantics; everything fallible lives behind the sound manager.
pub mod balloon;
pub mod bee;
pub mod frog;
pub mod geometry;

// Re-export commonly used types
pub use balloon::Balloon;
pub use bee::Bee;
pub use frog::{Frog, FrogEvent};
pub use geometry::{depth_indices, Placement, Rect, Viewport};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::audio::{PlayOptions, SoundManager};

/// Sound name requested when a visible frog croaks.
pub const FROG_SOUND: &str = "frog";

/// Upper bound on a single animation step; large frame gaps (tab switches,
/// debugger pauses) are clamped instead of teleporting sprites.
pub const MAX_STEP_SECS: f32 = 0.05;

pub struct Scene {
    viewport: Viewport,
    bees: Vec<Bee>,
    frogs: Vec<Frog>,
    balloons: Vec<Balloon>,
    rng: StdRng,
    now: f32,
}

impl Scene {
    pub fn new(viewport: Viewport, bee_count: usize, frog_anchors: &[(f32, f32)]) -> Self {
        Self::with_rng(viewport, bee_count, frog_anchors, StdRng::from_entropy())
    }

    /// Seeded constructor for deterministic tests.
    pub fn with_rng(
        viewport: Viewport,
        bee_count: usize,
        frog_anchors: &[(f32, f32)],
        mut rng: StdRng,
    ) -> Self {
        let bees = (0..bee_count).map(|_| Bee::spawn(viewport, &mut rng)).collect();
        let frogs = frog_anchors
            .iter()
            .map(|&(x, y)| Frog::new(x, y, &mut rng))
            .collect();

        Self {
            viewport,
            bees,
            frogs,
            balloons: Vec::new(),
            rng,
            now: 0.0,
        }
    }

    /// Advance every animator by one frame and issue any resulting sound
    /// requests against `sounds`.
    pub fn tick(&mut self, dt: f32, sounds: &mut SoundManager) {
        let dt = dt.min(MAX_STEP_SECS);
        self.now += dt;

        for bee in &mut self.bees {
            bee.update(dt, self.viewport, &mut self.rng);
        }

        for frog in &mut self.frogs {
            if frog.update(dt, self.now, &mut self.rng) == Some(FrogEvent::CroakStarted)
                && self.viewport.center_visible(frog.rect())
            {
                sounds.play(FROG_SOUND, PlayOptions::default());
            }
        }

        self.balloons.retain_mut(|balloon| balloon.update(dt));
        sounds.reap_finished();
    }

    /// Spawn a balloon at a pointer position.
    pub fn add_balloon(&mut self, x: f32, y: f32) {
        self.balloons.push(Balloon::spawn(x, y, &mut self.rng));
    }

    /// Current placements, in draw order: frogs sorted by depth, then bees
    /// and balloons on top.
    pub fn placements(&self) -> Vec<Placement> {
        let frog_rects: Vec<Rect> = self.frogs.iter().map(Frog::rect).collect();
        let z = depth_indices(&frog_rects);
        let mut ordered: Vec<(usize, Placement)> = self
            .frogs
            .iter()
            .enumerate()
            .map(|(i, f)| (z[i], f.placement()))
            .collect();
        ordered.sort_by_key(|&(depth, _)| depth);

        let mut placements: Vec<Placement> = ordered.into_iter().map(|(_, p)| p).collect();
        placements.extend(self.bees.iter().map(Bee::placement));
        placements.extend(self.balloons.iter().map(Balloon::placement));
        placements
    }

    pub fn balloon_count(&self) -> usize {
        self.balloons.len()
    }

    pub fn bee_count(&self) -> usize {
        self.bees.len()
    }

    pub fn frog_count(&self) -> usize {
        self.frogs.len()
    }
}

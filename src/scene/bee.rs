/// Bee flight-path animator.
///
/// Each bee crosses the scene horizontally with a layered sine bob and a
/// small tilt, then respawns on a random side with fresh parameters.
use rand::Rng;

use crate::scene::geometry::{Placement, Viewport};

/// Fraction of the viewport height bees fly within.
const FLIGHT_BAND: f32 = 0.85;

pub struct Bee {
    direction: f32,
    start_x: f32,
    end_x: f32,
    base_y: f32,
    speed: f32,
    amplitude: f32,
    frequency: f32,
    phase: f32,
    scale: f32,
    x: f32,
    elapsed: f32,
}

impl Bee {
    pub fn spawn<R: Rng>(viewport: Viewport, rng: &mut R) -> Self {
        let mut bee = Self {
            direction: 1.0,
            start_x: 0.0,
            end_x: 0.0,
            base_y: 0.0,
            speed: 0.0,
            amplitude: 0.0,
            frequency: 0.0,
            phase: 0.0,
            scale: 1.0,
            x: 0.0,
            elapsed: 0.0,
        };
        bee.reset(viewport, rng);
        bee
    }

    /// Re-roll flight parameters and start just off one side of the scene.
    fn reset<R: Rng>(&mut self, viewport: Viewport, rng: &mut R) {
        let width = viewport.width;
        let band = viewport.height * FLIGHT_BAND;
        let from_left = rng.gen_bool(0.5);

        self.direction = if from_left { 1.0 } else { -1.0 };
        self.start_x = if from_left { -0.2 * width } else { 1.2 * width };
        self.end_x = if from_left { 1.2 * width } else { -0.2 * width };
        self.base_y = band * (0.2 + rng.gen_range(0.0..0.5));
        self.speed = rng.gen_range(50.0..=110.0);
        self.amplitude = 20.0 + rng.gen_range(0.0..30.0);
        self.frequency = 0.6 + rng.gen_range(0.0..1.0);
        self.phase = rng.gen_range(0.0..std::f32::consts::TAU);
        // Bees lower in the scene read as closer, so draw them larger.
        self.scale = 1.0 + self.base_y / viewport.height.max(1.0);
        self.x = self.start_x;
        self.elapsed = 0.0;
    }

    pub fn update<R: Rng>(&mut self, dt: f32, viewport: Viewport, rng: &mut R) -> Placement {
        self.elapsed += dt;
        self.x += self.speed * dt * self.direction;
        let placement = self.placement();

        let past_end = (self.direction > 0.0 && self.x > self.end_x)
            || (self.direction < 0.0 && self.x < self.end_x);
        if past_end {
            self.reset(viewport, rng);
        }

        placement
    }

    pub fn placement(&self) -> Placement {
        let y = self.base_y
            + (self.elapsed * self.frequency + self.phase).sin() * self.amplitude
            + (self.elapsed * 2.4 + self.phase).sin() * (self.amplitude * 0.35);
        let tilt = (self.elapsed * 3.0 + self.phase).sin() * 12.0 * self.direction;

        Placement {
            x: self.x,
            y,
            // Horizontal flip faces the bee along its travel direction.
            scale_x: self.scale * self.direction,
            scale_y: self.scale,
            rotation_deg: tilt,
        }
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.base_y)
    }
}

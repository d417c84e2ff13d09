/// Rising balloon animator, spawned at pointer positions.
use rand::Rng;

use crate::scene::geometry::Placement;

/// Balloon fill colors, one picked at random per spawn.
pub const BALLOON_COLORS: [&str; 5] = ["#FF5D73", "#FFB347", "#7BDFF2", "#B6F36B", "#CBB3FF"];

/// Balloons despawn once this far above the scene top.
const DESPAWN_MARGIN: f32 = 200.0;

pub struct Balloon {
    x: f32,
    y: f32,
    speed: f32,
    sway: f32,
    phase: f32,
    color: usize,
}

impl Balloon {
    pub fn spawn<R: Rng>(x: f32, y: f32, rng: &mut R) -> Self {
        Self {
            x,
            y,
            speed: 30.0 + rng.gen_range(0.0..30.0),
            sway: 10.0 + rng.gen_range(0.0..12.0),
            phase: rng.gen_range(0.0..std::f32::consts::TAU),
            color: rng.gen_range(0..BALLOON_COLORS.len()),
        }
    }

    /// Advance the balloon. Returns false once it has risen out of the
    /// scene and should be dropped.
    pub fn update(&mut self, dt: f32) -> bool {
        self.y -= self.speed * dt;
        self.y > -DESPAWN_MARGIN
    }

    pub fn placement(&self) -> Placement {
        let sway_x = (self.y * 0.02 + self.phase).sin() * self.sway;
        let tilt = (self.y * 0.03 + self.phase).sin() * 6.0;
        Placement {
            x: self.x + sway_x,
            y: self.y,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation_deg: tilt,
        }
    }

    pub fn color(&self) -> &'static str {
        BALLOON_COLORS[self.color]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_balloon_rises() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut balloon = Balloon::spawn(100.0, 400.0, &mut rng);
        let y0 = balloon.placement().y;

        assert!(balloon.update(1.0));
        assert!(balloon.placement().y < y0);
    }

    #[test]
    fn test_balloon_despawns_above_scene() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut balloon = Balloon::spawn(100.0, 50.0, &mut rng);

        let mut alive = true;
        for _ in 0..1_000 {
            alive = balloon.update(0.1);
            if !alive {
                break;
            }
        }
        assert!(!alive);
    }

    #[test]
    fn test_balloon_color_is_from_palette() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let balloon = Balloon::spawn(0.0, 0.0, &mut rng);
            assert!(BALLOON_COLORS.contains(&balloon.color()));
        }
    }
}

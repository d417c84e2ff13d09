/// Frog animator: a small idle/jump/croak state machine anchored to a
/// fixed lily-pad position.
use rand::Rng;

use crate::scene::geometry::{Placement, Rect};

/// Nominal sprite size, used for visibility checks and depth sorting.
pub const FROG_SIZE: f32 = 64.0;

const JUMP_HEIGHT: f32 = 26.0;
const JUMP_SQUASH: f32 = 0.08;

/// Raised by `update` when an action begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrogEvent {
    /// A croak started; the scene decides whether it is audible.
    CroakStarted,
}

pub struct Frog {
    anchor_x: f32,
    anchor_y: f32,
    float_phase: f32,
    jump_time: f32,
    jump_duration: f32,
    croak_time: f32,
    next_action_in: f32,
    last_now: f32,
}

impl Frog {
    pub fn new<R: Rng>(anchor_x: f32, anchor_y: f32, rng: &mut R) -> Self {
        Self {
            anchor_x,
            anchor_y,
            float_phase: rng.gen_range(0.0..std::f32::consts::TAU),
            jump_time: 0.0,
            jump_duration: 0.0,
            croak_time: 0.0,
            next_action_in: 0.8 + rng.gen_range(0.0..2.4),
            last_now: 0.0,
        }
    }

    /// Mostly jumps, occasionally croaks.
    fn trigger_action<R: Rng>(&mut self, rng: &mut R) -> Option<FrogEvent> {
        let event = if rng.gen_bool(0.85) {
            self.jump_duration = 0.45 + rng.gen_range(0.0..0.18);
            self.jump_time = self.jump_duration;
            None
        } else {
            self.croak_time = 0.35 + rng.gen_range(0.0..0.3);
            Some(FrogEvent::CroakStarted)
        };
        self.next_action_in = 1.1 + rng.gen_range(0.0..3.8);
        event
    }

    pub fn update<R: Rng>(&mut self, dt: f32, now: f32, rng: &mut R) -> Option<FrogEvent> {
        self.next_action_in -= dt;

        let mut event = None;
        if self.next_action_in <= 0.0 && self.jump_time <= 0.0 && self.croak_time <= 0.0 {
            event = self.trigger_action(rng);
        }

        if self.jump_time > 0.0 {
            self.jump_time -= dt;
        }
        if self.croak_time > 0.0 {
            self.croak_time -= dt;
        }

        self.last_now = now;
        event
    }

    pub fn is_croaking(&self) -> bool {
        self.croak_time > 0.0
    }

    pub fn placement(&self) -> Placement {
        let mut jump_offset = 0.0;
        let mut squash = 1.0;
        if self.jump_time > 0.0 && self.jump_duration > 0.0 {
            let progress = 1.0 - self.jump_time / self.jump_duration;
            let arc = (progress * std::f32::consts::PI).sin();
            jump_offset = arc * JUMP_HEIGHT;
            squash = 1.0 - arc * JUMP_SQUASH;
        }

        let breathe = (self.last_now * 2.0 + self.float_phase).sin() * 2.0;

        Placement {
            x: self.anchor_x - FROG_SIZE / 2.0,
            y: self.anchor_y - FROG_SIZE * 0.8 - jump_offset + breathe,
            scale_x: 1.0,
            scale_y: squash,
            rotation_deg: 0.0,
        }
    }

    /// Bounding box at the anchor, for visibility gating and depth order.
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.anchor_x - FROG_SIZE / 2.0,
            self.anchor_y - FROG_SIZE * 0.8,
            FROG_SIZE,
            FROG_SIZE,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_frog_idles_before_first_action() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut frog = Frog::new(100.0, 200.0, &mut rng);

        // The first action timer is at least 0.8 s.
        assert!(frog.update(0.5, 0.5, &mut rng).is_none());
        assert!(!frog.is_croaking());
    }

    #[test]
    fn test_frog_eventually_croaks() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut frog = Frog::new(100.0, 200.0, &mut rng);

        let mut croaked = false;
        let mut now = 0.0;
        for _ in 0..50_000 {
            now += 0.016;
            if frog.update(0.016, now, &mut rng) == Some(FrogEvent::CroakStarted) {
                croaked = true;
                assert!(frog.is_croaking());
                break;
            }
        }
        assert!(croaked, "a 15% action should fire within ~13 minutes");
    }

    #[test]
    fn test_jump_squashes_and_lifts() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut frog = Frog::new(100.0, 200.0, &mut rng);

        // Force a jump and sample mid-arc.
        frog.jump_duration = 0.5;
        frog.jump_time = 0.25;
        let placement = frog.placement();

        let resting_y = 200.0 - FROG_SIZE * 0.8;
        assert!(placement.y < resting_y + 2.0 - JUMP_HEIGHT * 0.9);
        assert!(placement.scale_y < 1.0);
    }

    #[test]
    fn test_rect_centers_on_anchor() {
        let mut rng = StdRng::seed_from_u64(4);
        let frog = Frog::new(100.0, 200.0, &mut rng);
        let rect = frog.rect();
        assert_eq!(rect.center().0, 100.0);
        assert_eq!(rect.width, FROG_SIZE);
    }
}

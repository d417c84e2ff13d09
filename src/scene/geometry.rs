/// Viewport geometry helpers for the decorative animators.
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in scene coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Visible scene area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether the whole rectangle lies inside the viewport.
    pub fn fully_visible(&self, rect: Rect) -> bool {
        rect.x >= 0.0 && rect.y >= 0.0 && rect.right() <= self.width && rect.bottom() <= self.height
    }

    /// Whether the rectangle's center lies inside the viewport. Used to
    /// gate sounds from sprites that have scrolled out of view.
    pub fn center_visible(&self, rect: Rect) -> bool {
        let (cx, cy) = rect.center();
        cx >= 0.0 && cy >= 0.0 && cx <= self.width && cy <= self.height
    }
}

/// Computed sprite placement for a renderer: position plus scale and tilt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub rotation_deg: f32,
}

impl Placement {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            scale_x: 1.0,
            scale_y: 1.0,
            rotation_deg: 0.0,
        }
    }
}

/// Assign a draw order to sprites by their bottom edge: sprites lower in
/// the scene draw on top. Returns one z index per input rectangle.
pub fn depth_indices(rects: &[Rect]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..rects.len()).collect();
    order.sort_by(|&a, &b| rects[a].bottom().total_cmp(&rects[b].bottom()));

    let mut z = vec![0; rects.len()];
    for (depth, idx) in order.into_iter().enumerate() {
        z[idx] = depth;
    }
    z
}

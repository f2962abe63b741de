/// Latest pointer sample for one canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pointer {
    /// Horizontal offset from the canvas centre, `-1..1`.
    pub nx: f32,
    /// Vertical offset from the canvas centre, `-1..1`.
    pub ny: f32,
    /// Position in logical canvas pixels.
    pub px: f32,
    pub py: f32,
    pub active: bool,
}

impl Default for Pointer {
    fn default() -> Self {
        Self::inactive()
    }
}

impl Pointer {
    /// Parks the pixel position far outside any canvas so distance-based
    /// interactions fall silent.
    pub const fn inactive() -> Self {
        Self {
            nx: 0.0,
            ny: 0.0,
            px: -1000.0,
            py: -1000.0,
            active: false,
        }
    }

    pub fn at(px: f32, py: f32, w: f32, h: f32) -> Self {
        let nx = if w > 0.0 { (px / w - 0.5) * 2.0 } else { 0.0 };
        let ny = if h > 0.0 { (py / h - 0.5) * 2.0 } else { 0.0 };
        Self {
            nx: nx.clamp(-1.0, 1.0),
            ny: ny.clamp(-1.0, 1.0),
            px,
            py,
            active: true,
        }
    }
}

/// Rotation bias that chases its target with exponential smoothing.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SmoothedRotation {
    pub x: f32,
    pub y: f32,
}

impl SmoothedRotation {
    pub fn step(&mut self, target_x: f32, target_y: f32, factor: f32) {
        let k = factor.clamp(0.0, 1.0);
        self.x += (target_x - self.x) * k;
        self.y += (target_y - self.y) * k;
    }
}

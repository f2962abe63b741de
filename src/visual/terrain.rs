//! Voronoi ridge terrain: drifting seeds over a cached noise grid, drawn as a
//! field of dots displaced upward along cell borders.

use super::distribution::{generate_seeds, VoronoiSeed};
use super::noise::{value_noise3, Fbm};
use super::surface::{Rgba, Surface};
use super::{Effect, FrameCtx};

pub const GRID_COLS: usize = 200;
pub const GRID_ROWS: usize = 140;

const TIME_SCALE: f64 = 0.00025;
const DRIFT_SCALE: f32 = 0.004;
const DRIFT_AMPLITUDE: f32 = 50.0;
const MIN_ALPHA: f32 = 0.025;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TerrainParams {
    pub seeds: usize,
    /// Fraction of `max_dist` over which the ridge fades out.
    pub ridge_falloff: f32,
    pub height_scale: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seeds: 28,
            ridge_falloff: 0.25,
            height_scale: 28.0,
        }
    }
}

/// Distances to the closest and second-closest seed.
pub fn two_nearest(x: f32, y: f32, seeds: &[VoronoiSeed]) -> (f32, f32) {
    let mut d1 = f32::INFINITY;
    let mut d2 = f32::INFINITY;
    for s in seeds {
        let dx = x - s.x;
        let dy = y - s.y;
        // Compare squared, root once at the end.
        let d = dx * dx + dy * dy;
        if d < d1 {
            d2 = d1;
            d1 = d;
        } else if d < d2 {
            d2 = d;
        }
    }
    (d1.sqrt(), d2.sqrt())
}

/// Cubic falloff of the gap between the two nearest seeds: 1 on a border, 0 deep inside a cell.
pub fn ridge_value(d1: f32, d2: f32, max_dist: f32, falloff: f32) -> f32 {
    let span = max_dist * falloff;
    if !d1.is_finite() || !d2.is_finite() || !(span > 0.0) {
        return 0.0;
    }
    let raw = 1.0 - ((d2 - d1) / span).min(1.0);
    let raw = raw.clamp(0.0, 1.0);
    raw * raw * raw
}

pub struct TerrainEffect {
    params: TerrainParams,
    seeds: Vec<VoronoiSeed>,
    noise_grid: Vec<f32>,
    w: f32,
    h: f32,
}

impl TerrainEffect {
    pub fn new(params: TerrainParams) -> Self {
        Self {
            params,
            seeds: Vec::new(),
            noise_grid: Vec::new(),
            w: 0.0,
            h: 0.0,
        }
    }

    pub fn seeds(&self) -> &[VoronoiSeed] {
        &self.seeds
    }

    pub fn noise_grid(&self) -> &[f32] {
        &self.noise_grid
    }

    /// Moves every seed off its base by a slow noise-driven offset.
    pub fn drift_seeds(&mut self, time_ms: f64) {
        let t = (time_ms * TIME_SCALE) as f32;
        for seed in &mut self.seeds {
            let bx = seed.base_x * DRIFT_SCALE;
            let by = seed.base_y * DRIFT_SCALE;
            let ox = value_noise3(bx, by, t) - 0.5;
            let oy = value_noise3(bx + 50.0, by + 50.0, t) - 0.5;
            seed.x = seed.base_x + ox * DRIFT_AMPLITUDE;
            seed.y = seed.base_y + oy * DRIFT_AMPLITUDE;
        }
    }

    fn build_noise_grid() -> Vec<f32> {
        let mut grid = Vec::with_capacity(GRID_COLS * GRID_ROWS);
        for row in 0..GRID_ROWS {
            let ny = row as f32 / (GRID_ROWS - 1) as f32;
            for col in 0..GRID_COLS {
                let nx = col as f32 / (GRID_COLS - 1) as f32;
                grid.push(Fbm::TERRAIN.sample2(nx * 3.5 + 1.7, ny * 3.5 + 2.3));
            }
        }
        grid
    }
}

impl Effect for TerrainEffect {
    fn name(&self) -> &'static str {
        "Terrain: Voronoi Ridges"
    }

    fn max_device_pixel_ratio(&self) -> Option<f32> {
        Some(2.0)
    }

    fn on_resize(&mut self, w: f32, h: f32) {
        self.w = w;
        self.h = h;
        self.seeds = generate_seeds(self.params.seeds, w, h);
        self.noise_grid = Self::build_noise_grid();
        tracing::debug!(seeds = self.seeds.len(), cells = self.noise_grid.len(), "terrain rebuilt");
    }

    fn render(&mut self, ctx: &FrameCtx, surface: &mut dyn Surface) {
        surface.clear();
        if self.w <= 0.0 || self.h <= 0.0 || self.noise_grid.len() != GRID_COLS * GRID_ROWS {
            return;
        }
        self.drift_seeds(ctx.time_ms);

        let (w, h) = (self.w, self.h);
        let max_dist = w.max(h) * 0.16;
        let cell_w = w / GRID_COLS as f32;
        let glow = Rgba::rgb(0, 255, 100);

        for row in 0..GRID_ROWS {
            let ny = row as f32 / (GRID_ROWS - 1) as f32;
            let depth_fade = 0.55 + ny * 0.45;
            for col in 0..GRID_COLS {
                let nx = col as f32 / (GRID_COLS - 1) as f32;
                let base_x = nx * w;
                let base_y = ny * h;

                let (d1, d2) = two_nearest(base_x, base_y, &self.seeds);
                let ridge = ridge_value(d1, d2, max_dist, self.params.ridge_falloff);
                let noise = self.noise_grid[row * GRID_COLS + col];

                let height = ridge * 0.75 + noise * 0.25;
                let sx = base_x + (noise - 0.5) * cell_w * 0.4;
                let sy = base_y - height * self.params.height_scale;

                let brightness = 0.06 + noise * 0.1 + ridge * 0.88;
                let dot = 0.25 + ridge * 2.0 + noise * 0.3;
                let alpha = (brightness * depth_fade).min(1.0);
                if alpha < MIN_ALPHA {
                    continue;
                }

                let g = (140.0 + (brightness * 115.0).floor()).min(255.0) as u8;
                let r = (brightness * 40.0).floor().clamp(0.0, 255.0) as u8;
                let b = (brightness * 15.0).floor().clamp(0.0, 255.0) as u8;
                surface.set_fill(Rgba::new(r, g, b, alpha));
                surface.fill_circle(sx, sy, dot);

                if ridge > 0.55 {
                    surface.set_fill(glow.with_alpha(alpha * 0.035));
                    surface.fill_circle(sx, sy, dot * 3.5);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(x: f32, y: f32) -> VoronoiSeed {
        VoronoiSeed { x, y, base_x: x, base_y: y }
    }

    #[test]
    fn two_nearest_tracks_first_and_second() {
        let seeds = [seed(0.0, 0.0), seed(10.0, 0.0), seed(3.0, 4.0)];
        let (d1, d2) = two_nearest(0.0, 0.0, &seeds);
        assert_eq!(d1, 0.0);
        assert_eq!(d2, 5.0);
    }

    #[test]
    fn ridge_without_two_seeds_is_flat() {
        assert_eq!(ridge_value(3.0, f32::INFINITY, 100.0, 0.25), 0.0);
        let (d1, d2) = two_nearest(1.0, 1.0, &[]);
        assert_eq!(ridge_value(d1, d2, 100.0, 0.25), 0.0);
        assert_eq!(ridge_value(1.0, 2.0, 0.0, 0.25), 0.0);
    }

    #[test]
    fn drift_is_bounded_by_amplitude() {
        let mut t = TerrainEffect::new(TerrainParams::default());
        t.on_resize(800.0, 600.0);
        for step in 0..20 {
            t.drift_seeds(step as f64 * 777.0);
            for s in t.seeds() {
                assert!((s.x - s.base_x).abs() <= DRIFT_AMPLITUDE * 0.5);
                assert!((s.y - s.base_y).abs() <= DRIFT_AMPLITUDE * 0.5);
            }
        }
    }
}

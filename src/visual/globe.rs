//! Dithered globe: noise continents on a Fibonacci sphere, floating network
//! nodes and a faint mesh between them.

use super::distribution::{build_globe, GlobeParams, GlobeSamples};
use super::pointer::{Pointer, SmoothedRotation};
use super::surface::{Rgba, Surface};
use super::{depth_sort, Effect, FrameCtx, ProjectedPoint};

const RADIUS_FRACTION: f32 = 0.38;
const BASE_TILT: f32 = 0.2;
const AUTO_SPIN_PER_MS: f64 = 0.0001;
const POINTER_TILT: f32 = 0.3;
const POINTER_SPIN: f32 = 0.4;
/// `(depth + 1) / 2` below this is treated as the far side and skipped.
const BACK_FACE_CUTOFF: f32 = 0.15;
const DEPTH_ALPHA_POWER: f32 = 1.5;
const SURFACE_LINK_WINDOW: usize = 20;

const LAND: Rgba = Rgba::rgb(0, 255, 136);
const OCEAN: Rgba = Rgba::rgb(10, 240, 232);

pub struct GlobeEffect {
    params: GlobeParams,
    smoothing: f32,
    seed: u64,
    samples: GlobeSamples,
    w: f32,
    h: f32,
    radius: f32,
    rotation: SmoothedRotation,
    // Frame scratch, rebuilt every frame.
    projected: Vec<ProjectedPoint>,
    order: Vec<ProjectedPoint>,
}

impl GlobeEffect {
    pub fn new(params: GlobeParams, smoothing: f32, seed: u64) -> Self {
        Self {
            params,
            smoothing,
            seed,
            samples: GlobeSamples::default(),
            w: 0.0,
            h: 0.0,
            radius: 0.0,
            rotation: SmoothedRotation::default(),
            projected: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn samples(&self) -> &GlobeSamples {
        &self.samples
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn rotation(&self) -> SmoothedRotation {
        self.rotation
    }

    /// Y rotation, then X tilt, then scale and centre. Returns `(sx, sy, depth)`.
    pub fn project(&self, p: [f32; 3], rot_y: f32, rot_x: f32, extension: f32) -> (f32, f32, f32) {
        let [x, y, z] = p;
        let (sin_r, cos_r) = rot_y.sin_cos();
        let rx = x * cos_r + z * sin_r;
        let rz = -x * sin_r + z * cos_r;

        let (sin_t, cos_t) = (BASE_TILT + rot_x).sin_cos();
        let ry = y * cos_t - rz * sin_t;
        let depth = y * sin_t + rz * cos_t;

        let scale = self.radius * extension;
        (rx * scale + self.w * 0.5, ry * scale + self.h * 0.5, depth)
    }

    /// Advances pointer smoothing one tick and returns `(rot_y, rot_x)`.
    pub fn step_rotation(&mut self, time_ms: f64, pointer: &Pointer) -> (f32, f32) {
        let (target_x, target_y) = if pointer.active {
            (pointer.ny * POINTER_TILT, pointer.nx * POINTER_SPIN)
        } else {
            (0.0, 0.0)
        };
        self.rotation.step(target_x, target_y, self.smoothing);
        let spin = (time_ms * AUTO_SPIN_PER_MS) as f32;
        (spin + self.rotation.y, self.rotation.x)
    }

    /// Projects every sample and returns them in painter's order.
    pub fn project_frame(&mut self, rot_y: f32, rot_x: f32) -> &[ProjectedPoint] {
        let projected = self
            .samples
            .points
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                let (sx, sy, depth) = self.project(p.pos, rot_y, rot_x, p.extension);
                ProjectedPoint { idx, sx, sy, depth }
            })
            .collect::<Vec<_>>();
        self.projected = projected;
        self.order.clear();
        self.order.extend_from_slice(&self.projected);
        depth_sort(&mut self.order);
        &self.order
    }

    fn paint_mesh(&self, surface: &mut dyn Surface) {
        surface.set_line_width(0.5);
        for edge in &self.samples.edges {
            let (Some(a), Some(b)) = (self.projected.get(edge.from), self.projected.get(edge.to)) else {
                continue;
            };
            let avg = (a.depth + b.depth) * 0.5;
            if avg < -0.3 {
                continue;
            }
            let opacity = ((avg + 0.3) * 0.15).clamp(0.0, 0.12);
            surface.set_stroke(OCEAN.with_alpha(opacity));
            surface.stroke_line(a.sx, a.sy, b.sx, b.sy);
        }
    }

    /// Short "energy grid" links between land samples that land near each other on screen.
    fn paint_surface_grid(&self, surface: &mut dyn Surface) {
        let points = &self.samples.points;
        surface.set_line_width(0.3);
        let n = self.order.len();
        for i in 0..n {
            let a = self.order[i];
            if !points[a.idx].is_land {
                continue;
            }
            for b in &self.order[i + 1..(i + SURFACE_LINK_WINDOW).min(n)] {
                if !points[b.idx].is_land {
                    continue;
                }
                let dx = a.sx - b.sx;
                let dy = a.sy - b.sy;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist >= 12.0 || dist <= 3.0 {
                    continue;
                }
                let avg = (a.depth + b.depth) * 0.5;
                if avg < -0.1 {
                    continue;
                }
                let opacity = ((avg + 0.1) * 0.08).clamp(0.0, 0.06);
                surface.set_stroke(LAND.with_alpha(opacity));
                surface.stroke_line(a.sx, a.sy, b.sx, b.sy);
            }
        }
    }

    fn paint_points(&self, surface: &mut dyn Surface, rot_y: f32, rot_x: f32) {
        let (land, ocean) = (LAND, OCEAN);
        for p in &self.order {
            let sp = &self.samples.points[p.idx];
            let depth_factor = (p.depth + 1.0) * 0.5;
            if depth_factor < BACK_FACE_CUTOFF {
                continue;
            }
            let alpha = depth_factor.powf(DEPTH_ALPHA_POWER);
            let r = sp.size * (0.6 + depth_factor * 0.4);

            if sp.is_land {
                let brightness = 0.5 + sp.noise * 0.5;
                surface.set_fill(land.with_alpha(alpha * brightness * 0.9));
                surface.fill_circle(p.sx, p.sy, r);
                if sp.size > 1.5 {
                    surface.set_fill(land.with_alpha(alpha * 0.04));
                    surface.fill_circle(p.sx, p.sy, r * 2.5);
                }
            } else {
                surface.set_fill(ocean.with_alpha(alpha * 0.25));
                surface.fill_circle(p.sx, p.sy, r * 0.7);
            }

            if sp.is_node && depth_factor > 0.4 {
                surface.set_fill(ocean.with_alpha(alpha * 0.7));
                surface.fill_circle(p.sx, p.sy, 1.5);

                let (ux, uy, _) = self.project(sp.pos, rot_y, rot_x, 1.0);
                surface.set_stroke(ocean.with_alpha(alpha * 0.15));
                surface.set_line_width(0.5);
                surface.stroke_line(ux, uy, p.sx, p.sy);
            }
        }
    }

    fn paint_glow(&self, surface: &mut dyn Surface) {
        let land = LAND;
        let stops = [
            (0.0, land.with_alpha(0.0)),
            (0.5, land.with_alpha(0.015)),
            (1.0, land.with_alpha(0.0)),
        ];
        surface.fill_radial_gradient(
            self.w * 0.5,
            self.h * 0.5,
            self.radius * 0.85,
            self.radius * 1.4,
            &stops,
        );
    }
}

impl Effect for GlobeEffect {
    fn name(&self) -> &'static str {
        "Globe: Dither Continents"
    }

    fn max_device_pixel_ratio(&self) -> Option<f32> {
        Some(2.0)
    }

    fn on_resize(&mut self, w: f32, h: f32) {
        self.w = w;
        self.h = h;
        self.radius = w.min(h) * RADIUS_FRACTION;
        let mut rng = fastrand::Rng::with_seed(self.seed);
        self.samples = build_globe(&self.params, &mut rng);
        tracing::debug!(
            points = self.samples.points.len(),
            land = self.samples.land_count(),
            nodes = self.samples.node_count(),
            edges = self.samples.edges.len(),
            "globe samples built"
        );
    }

    fn render(&mut self, ctx: &FrameCtx, surface: &mut dyn Surface) {
        surface.clear();
        if self.samples.points.is_empty() || self.radius <= 0.0 {
            return;
        }
        let (rot_y, rot_x) = self.step_rotation(ctx.time_ms, &ctx.pointer);
        self.project_frame(rot_y, rot_x);

        // Edges first so points sit on top of them.
        self.paint_mesh(surface);
        self.paint_surface_grid(surface);
        self.paint_points(surface, rot_y, rot_x);
        self.paint_glow(surface);
    }
}

//! Drifting particle network over a faint hex grid. Nodes are pushed toward
//! the pointer and linked when close.

use std::f32::consts::{FRAC_PI_3, FRAC_PI_6};

use super::distribution::{spawn_particles, ParticleNode};
use super::pointer::Pointer;
use super::surface::{Rgba, Surface};
use super::{Effect, FrameCtx};

const HEX_SIZE: f32 = 30.0;
const POINTER_RADIUS: f32 = 150.0;
const POINTER_FORCE: f32 = 0.02;
const DAMPING: f32 = 0.99;
const PACKET_CHANCE: f32 = 0.998;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleParams {
    pub max_nodes: usize,
    pub link_distance: f32,
}

impl Default for ParticleParams {
    fn default() -> Self {
        Self {
            max_nodes: 80,
            link_distance: 130.0,
        }
    }
}

pub struct ParticleEffect {
    params: ParticleParams,
    seed: u64,
    rng: fastrand::Rng,
    nodes: Vec<ParticleNode>,
    w: f32,
    h: f32,
}

impl ParticleEffect {
    pub fn new(params: ParticleParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            rng: fastrand::Rng::with_seed(seed),
            nodes: Vec::new(),
            w: 0.0,
            h: 0.0,
        }
    }

    pub fn nodes(&self) -> &[ParticleNode] {
        &self.nodes
    }

    /// Applies pointer attraction, integrates, damps, and bounces off the edges.
    pub fn step_nodes(&mut self, pointer: &Pointer) {
        let (w, h) = (self.w, self.h);
        for node in &mut self.nodes {
            let dx = node.x - pointer.px;
            let dy = node.y - pointer.py;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist < POINTER_RADIUS {
                let force = (1.0 - dist / POINTER_RADIUS) * POINTER_FORCE;
                node.vx -= dx * force;
                node.vy -= dy * force;
            }

            node.x += node.vx;
            node.y += node.vy;
            node.vx *= DAMPING;
            node.vy *= DAMPING;

            if node.x < 0.0 || node.x > w {
                node.vx = -node.vx;
            }
            if node.y < 0.0 || node.y > h {
                node.vy = -node.vy;
            }
            node.x = node.x.clamp(0.0, w);
            node.y = node.y.clamp(0.0, h);
        }
    }

    fn paint_hex_grid(&self, surface: &mut dyn Surface) {
        surface.set_stroke(Rgba::new(0, 255, 136, 0.015));
        surface.set_line_width(0.5);
        let col_step = HEX_SIZE * 3f32.sqrt();
        let row_step = HEX_SIZE * 1.5;
        let rows = (self.h / row_step).floor() as usize + 1;
        let cols = (self.w / col_step).floor() as usize + 1;

        let corners: [(f32, f32); 6] = std::array::from_fn(|i| {
            let angle = FRAC_PI_3 * i as f32 - FRAC_PI_6;
            (HEX_SIZE * angle.cos(), HEX_SIZE * angle.sin())
        });

        for row in 0..=rows {
            let offset = if row % 2 == 1 { col_step * 0.5 } else { 0.0 };
            let cy = row as f32 * row_step;
            for col in 0..=cols {
                let cx = col as f32 * col_step + offset;
                for i in 0..6 {
                    let (ax, ay) = corners[i];
                    let (bx, by) = corners[(i + 1) % 6];
                    surface.stroke_line(cx + ax, cy + ay, cx + bx, cy + by);
                }
            }
        }
    }

    fn paint_links(&mut self, surface: &mut dyn Surface, time_s: f64) {
        let accent = Rgba::rgb(0, 255, 136);
        let link = self.params.link_distance;
        surface.set_line_width(0.5);
        let packet_t = ((time_s * 0.5) % 1.0) as f32;

        for i in 0..self.nodes.len() {
            for j in i + 1..self.nodes.len() {
                let (a, b) = (self.nodes[i], self.nodes[j]);
                let dx = a.x - b.x;
                let dy = a.y - b.y;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist >= link {
                    continue;
                }
                surface.set_stroke(accent.with_alpha((1.0 - dist / link) * 0.2));
                surface.stroke_line(a.x, a.y, b.x, b.y);

                if self.rng.f32() > PACKET_CHANCE {
                    surface.set_fill(accent.with_alpha(0.8));
                    surface.fill_circle(
                        a.x + (b.x - a.x) * packet_t,
                        a.y + (b.y - a.y) * packet_t,
                        2.0,
                    );
                }
            }
        }
    }

    fn paint_nodes(&self, surface: &mut dyn Surface, time_s: f64) {
        let accent = Rgba::rgb(0, 255, 136);
        for node in &self.nodes {
            let pulse = ((time_s * 1.5) as f32 + node.pulse).sin() * 0.4 + 1.0;
            surface.set_fill(accent.with_alpha(0.02));
            surface.fill_circle(node.x, node.y, node.radius * 6.0 * pulse);
            surface.set_fill(accent.with_alpha(0.4 + pulse * 0.2));
            surface.fill_circle(node.x, node.y, node.radius * pulse);
        }
    }
}

impl Effect for ParticleEffect {
    fn name(&self) -> &'static str {
        "Particles: Node Network"
    }

    fn on_resize(&mut self, w: f32, h: f32) {
        self.w = w;
        self.h = h;
        self.rng = fastrand::Rng::with_seed(self.seed);
        self.nodes = spawn_particles(w, h, self.params.max_nodes, &mut self.rng);
        tracing::debug!(nodes = self.nodes.len(), "particles respawned");
    }

    fn render(&mut self, ctx: &FrameCtx, surface: &mut dyn Surface) {
        surface.clear();
        if self.w <= 0.0 || self.h <= 0.0 {
            return;
        }
        let time_s = ctx.time_ms * 0.001;
        self.paint_hex_grid(surface);
        self.paint_links(surface, time_s);
        // Nodes are drawn where they were at the start of the frame, then moved.
        self.paint_nodes(surface, time_s);
        self.step_nodes(&ctx.pointer);
    }
}

//! Sample generation: Fibonacci sphere points, Voronoi seeds and particle nodes.
//!
//! All of this runs once per resize. Randomness comes from a caller-provided
//! `fastrand::Rng`, so a fixed seed reproduces the same samples.

use super::noise::Fbm;
use std::f64::consts::PI;

/// Quasi-uniform points on the unit sphere via the golden-angle lattice.
pub fn fibonacci_sphere(count: usize) -> Vec<[f32; 3]> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![[0.0, 1.0, 0.0]];
    }

    let golden_angle = PI * (3.0 - 5.0f64.sqrt());
    let denom = (count - 1) as f64;
    (0..count)
        .map(|i| {
            let y = 1.0 - (i as f64 / denom) * 2.0;
            let radius = (1.0 - y * y).max(0.0).sqrt();
            let theta = golden_angle * i as f64;
            [
                (theta.cos() * radius) as f32,
                y as f32,
                (theta.sin() * radius) as f32,
            ]
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpherePoint {
    pub pos: [f32; 3],
    pub is_land: bool,
    pub noise: f32,
    pub size: f32,
    pub is_node: bool,
    /// Radial scale for network nodes floating above the surface; 1.0 otherwise.
    pub extension: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlobeParams {
    pub points: usize,
    pub land_threshold: f32,
    pub node_fraction: f32,
    pub edge_distance: f32,
}

impl Default for GlobeParams {
    fn default() -> Self {
        Self {
            points: 4500,
            land_threshold: 0.48,
            node_fraction: 0.04,
            edge_distance: 0.55,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct GlobeSamples {
    pub points: Vec<SpherePoint>,
    pub edges: Vec<Edge>,
}

impl GlobeSamples {
    pub fn land_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_land).count()
    }

    pub fn node_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_node).count()
    }
}

/// Land/ocean noise lookup for a unit-sphere position.
pub fn continent_noise(p: [f32; 3]) -> f32 {
    Fbm::GLOBE.sample3(p[0] * 2.2 + 3.7, p[1] * 2.2 + 1.3, p[2] * 2.2 + 5.1)
}

pub fn build_globe(params: &GlobeParams, rng: &mut fastrand::Rng) -> GlobeSamples {
    let points = fibonacci_sphere(params.points)
        .into_iter()
        .map(|pos| {
            let noise = continent_noise(pos);
            let is_land = noise > params.land_threshold;
            let is_node = rng.f32() < params.node_fraction;
            let size = if is_land {
                0.6 + rng.f32() * 1.4
            } else {
                0.2 + rng.f32() * 0.5
            };
            let extension = if is_node { 1.15 + rng.f32() * 0.35 } else { 1.0 };
            SpherePoint {
                pos,
                is_land,
                noise,
                size,
                is_node,
                extension,
            }
        })
        .collect::<Vec<_>>();

    let edges = node_edges(&points, params.edge_distance);
    GlobeSamples { points, edges }
}

/// Connects every pair of network nodes closer than `max_dist` on the unit sphere.
pub fn node_edges(points: &[SpherePoint], max_dist: f32) -> Vec<Edge> {
    let nodes = points
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_node)
        .map(|(i, _)| i)
        .collect::<Vec<_>>();

    let max_d2 = max_dist * max_dist;
    let mut edges = Vec::new();
    for (k, &a) in nodes.iter().enumerate() {
        for &b in &nodes[k + 1..] {
            let pa = points[a].pos;
            let pb = points[b].pos;
            let dx = pa[0] - pb[0];
            let dy = pa[1] - pb[1];
            let dz = pa[2] - pb[2];
            if dx * dx + dy * dy + dz * dz < max_d2 {
                edges.push(Edge { from: a, to: b });
            }
        }
    }
    edges
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoronoiSeed {
    pub x: f32,
    pub y: f32,
    pub base_x: f32,
    pub base_y: f32,
}

/// Per-index unit pair for seed placement. Independent of the noise field.
pub fn seed_unit(i: u32) -> (f32, f32) {
    let a = i.wrapping_mul(7).wrapping_add(3);
    let b = i.wrapping_mul(13).wrapping_add(7);
    let h1 = a
        .wrapping_mul(1_274_126_177)
        .wrapping_add(b.wrapping_mul(668_265_263))
        ^ 0x5bd1_e995;
    let h2 = a
        .wrapping_mul(374_761_393)
        .wrapping_add(b.wrapping_mul(1_103_515_245))
        ^ 0x5bd1_e995;
    // 31 significant bits, truncated to the 24 an f32 holds so 1.0 is unreachable.
    let norm = |h: u32| ((h & 0x7fff_ffff) >> 7) as f32 / 16_777_216.0;
    (norm(h1), norm(h2))
}

pub fn generate_seeds(count: usize, w: f32, h: f32) -> Vec<VoronoiSeed> {
    (0..count)
        .map(|i| {
            let (rx, ry) = seed_unit(i as u32);
            let x = rx * w;
            let y = ry * h;
            VoronoiSeed {
                x,
                y,
                base_x: x,
                base_y: y,
            }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleNode {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub radius: f32,
    pub pulse: f32,
}

/// One node per 6000 px² of canvas, capped at `max_nodes`.
pub fn particle_count(w: f32, h: f32, max_nodes: usize) -> usize {
    let area = (w.max(0.0) * h.max(0.0)) / 6000.0;
    (area.floor() as usize).min(max_nodes)
}

pub fn spawn_particles(
    w: f32,
    h: f32,
    max_nodes: usize,
    rng: &mut fastrand::Rng,
) -> Vec<ParticleNode> {
    (0..particle_count(w, h, max_nodes))
        .map(|_| ParticleNode {
            x: rng.f32() * w,
            y: rng.f32() * h,
            vx: (rng.f32() - 0.5) * 0.5,
            vy: (rng.f32() - 0.5) * 0.5,
            radius: rng.f32() * 1.5 + 0.5,
            pulse: rng.f32() * std::f32::consts::TAU,
        })
        .collect()
}

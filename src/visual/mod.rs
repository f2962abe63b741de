mod distribution;
mod globe;
mod noise;
mod particles;
mod pointer;
mod surface;
mod terrain;

use crate::tuning::Tuning;
use std::cmp::Ordering;

pub use distribution::{
    build_globe, continent_noise, fibonacci_sphere, generate_seeds, node_edges, particle_count,
    seed_unit, spawn_particles, Edge, GlobeParams, GlobeSamples, ParticleNode, SpherePoint,
    VoronoiSeed,
};
pub use globe::GlobeEffect;
pub use noise::{hash3, hash_unit, value_noise2, value_noise3, Fbm, NOISE_SEED};
pub use particles::{ParticleEffect, ParticleParams};
pub use pointer::{Pointer, SmoothedRotation};
pub use surface::{clamp_alpha, gradient_at, PixelCanvas, Rgba, Surface};
pub use terrain::{ridge_value, two_nearest, TerrainEffect, TerrainParams, GRID_COLS, GRID_ROWS};

/// Everything an effect needs to compute one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameCtx {
    /// Monotonic milliseconds since the canvas was mounted.
    pub time_ms: f64,
    /// Logical canvas size.
    pub w: f32,
    pub h: f32,
    pub pointer: Pointer,
}

pub trait Effect {
    fn name(&self) -> &'static str;
    /// Upper bound on device pixels per logical pixel; `None` means unbounded.
    fn max_device_pixel_ratio(&self) -> Option<f32> {
        None
    }
    /// Regenerates samples for a new logical size.
    fn on_resize(&mut self, w: f32, h: f32);
    fn render(&mut self, ctx: &FrameCtx, surface: &mut dyn Surface);
}

pub fn make_effects(tuning: &Tuning) -> Vec<Box<dyn Effect>> {
    vec![
        Box::new(GlobeEffect::new(tuning.globe, tuning.globe_smoothing, tuning.seed)),
        Box::new(TerrainEffect::new(tuning.terrain)),
        Box::new(ParticleEffect::new(tuning.particles, tuning.seed)),
    ]
}

/// Resolves an index or a case-insensitive (sub)string against effect names.
pub fn resolve_effect_index(selection: Option<&str>, names: &[&str]) -> anyhow::Result<usize> {
    if names.is_empty() {
        anyhow::bail!("no effects available");
    }
    let Some(raw) = selection else {
        return Ok(0);
    };

    if let Ok(idx) = raw.trim().parse::<usize>() {
        if idx < names.len() {
            return Ok(idx);
        }
        anyhow::bail!(
            "effect index {} out of range (0..{})",
            idx,
            names.len().saturating_sub(1)
        );
    }

    let needle = raw.trim().to_ascii_lowercase();
    if needle.is_empty() {
        return Ok(0);
    }
    if let Some(idx) = names.iter().position(|n| n.to_ascii_lowercase() == needle) {
        return Ok(idx);
    }
    if let Some(idx) = names
        .iter()
        .position(|n| n.to_ascii_lowercase().contains(&needle))
    {
        return Ok(idx);
    }
    anyhow::bail!("effect '{}' not found", raw)
}

/// Per-frame projected sample. Discarded after painting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedPoint {
    pub idx: usize,
    pub sx: f32,
    pub sy: f32,
    pub depth: f32,
}

/// Painter's order: back to front, ties broken by sample index.
pub fn depth_sort(points: &mut [ProjectedPoint]) {
    points.sort_by(|a, b| match a.depth.total_cmp(&b.depth) {
        Ordering::Equal => a.idx.cmp(&b.idx),
        o => o,
    });
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameHandle(u64);

/// Explicit "run again next refresh" continuation with cancellation.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    next_id: u64,
    pending: Option<FrameHandle>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the next frame, replacing any earlier request.
    pub fn request(&mut self) -> FrameHandle {
        self.next_id = self.next_id.wrapping_add(1);
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        handle
    }

    /// Returns `false` when `handle` was not the pending request.
    pub fn cancel(&mut self, handle: FrameHandle) -> bool {
        if self.pending == Some(handle) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consumes the pending request, if any. The caller runs exactly one frame.
    pub fn take_due(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }
}

/// One effect bound to one drawing surface: samples, pointer and frame handle.
pub struct EffectCanvas {
    effect: Box<dyn Effect>,
    pointer: Pointer,
    w: f32,
    h: f32,
    scheduler: FrameScheduler,
    handle: Option<FrameHandle>,
    frames: u64,
}

impl EffectCanvas {
    pub fn new(effect: Box<dyn Effect>) -> Self {
        Self {
            effect,
            pointer: Pointer::inactive(),
            w: 0.0,
            h: 0.0,
            scheduler: FrameScheduler::new(),
            handle: None,
            frames: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.effect.name()
    }

    pub fn max_device_pixel_ratio(&self) -> Option<f32> {
        self.effect.max_device_pixel_ratio()
    }

    /// Sizes the effect from the surface and requests the first frame.
    /// Without a surface the canvas stays idle.
    pub fn mount(&mut self, surface: Option<&dyn Surface>) {
        let Some(surface) = surface else {
            tracing::debug!(effect = self.name(), "no drawing surface; canvas stays idle");
            return;
        };
        let (w, h) = surface.size();
        self.resize(w, h);
        self.pointer = Pointer::inactive();
        self.frames = 0;
        self.handle = Some(self.scheduler.request());
        tracing::info!(effect = self.name(), w, h, "canvas mounted");
    }

    /// Cancels the pending frame. Ticks after this paint nothing.
    pub fn unmount(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.scheduler.cancel(handle);
        }
        self.pointer = Pointer::inactive();
        tracing::info!(effect = self.name(), frames = self.frames, "canvas unmounted");
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn size(&self) -> (f32, f32) {
        (self.w, self.h)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn pointer(&self) -> Pointer {
        self.pointer
    }

    pub fn resize(&mut self, w: f32, h: f32) {
        let w = if w.is_finite() { w.max(0.0) } else { 0.0 };
        let h = if h.is_finite() { h.max(0.0) } else { 0.0 };
        self.w = w;
        self.h = h;
        self.effect.on_resize(w, h);
        tracing::debug!(effect = self.name(), w, h, "samples regenerated");
    }

    /// Pointer position in logical canvas pixels.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if x < 0.0 || y < 0.0 || x > self.w || y > self.h {
            self.pointer_leave();
            return;
        }
        self.pointer = Pointer::at(x, y, self.w, self.h);
    }

    pub fn pointer_leave(&mut self) {
        self.pointer = Pointer::inactive();
    }

    /// Runs the due frame, if one was requested, and requests the next one.
    /// Returns whether anything was painted.
    pub fn tick(&mut self, time_ms: f64, surface: Option<&mut dyn Surface>) -> bool {
        if self.scheduler.take_due().is_none() {
            return false;
        }
        let painted = match surface {
            Some(surface) => {
                let ctx = FrameCtx {
                    time_ms,
                    w: self.w,
                    h: self.h,
                    pointer: self.pointer,
                };
                self.effect.render(&ctx, surface);
                self.frames += 1;
                true
            }
            None => false,
        };
        self.handle = Some(self.scheduler.request());
        painted
    }
}

/// Owns every effect canvas, the active selection and the RGBA front buffer.
pub struct EffectEngine {
    canvases: Vec<EffectCanvas>,
    active: usize,
    front: PixelCanvas,
    logical_width: f32,
    started_ms: f64,
}

impl EffectEngine {
    pub fn new(effects: Vec<Box<dyn Effect>>, active: usize, logical_width: f32) -> Self {
        let canvases = effects.into_iter().map(EffectCanvas::new).collect::<Vec<_>>();
        let active = active.min(canvases.len().saturating_sub(1));
        Self {
            canvases,
            active,
            front: PixelCanvas::new(0, 0, 1.0),
            logical_width: if logical_width > 0.0 { logical_width } else { 0.0 },
            started_ms: 0.0,
        }
    }

    pub fn effect_names(&self) -> Vec<&'static str> {
        self.canvases.iter().map(EffectCanvas::name).collect()
    }

    pub fn effect_name(&self) -> &'static str {
        self.canvases.get(self.active).map_or("", EffectCanvas::name)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn canvas(&self) -> Option<&EffectCanvas> {
        self.canvases.get(self.active)
    }

    pub fn device_pixel_ratio(&self) -> f32 {
        self.front.device_pixel_ratio()
    }

    /// Logical-to-physical ratio for a physical width, honouring the effect's cap.
    fn ratio_for(&self, w: usize) -> f32 {
        let mut dpr = if self.logical_width > 0.0 && w > 0 {
            w as f32 / self.logical_width
        } else {
            1.0
        };
        if let Some(cap) = self.canvases.get(self.active).and_then(EffectCanvas::max_device_pixel_ratio) {
            dpr = dpr.min(cap);
        }
        dpr.max(1e-3)
    }

    /// Resizes the physical pixel buffer and regenerates the active effect's samples.
    pub fn resize(&mut self, w: usize, h: usize) {
        let dpr = self.ratio_for(w);
        self.front.resize(w, h, dpr);
        let (lw, lh) = self.front.size();
        if let Some(canvas) = self.canvases.get_mut(self.active) {
            if canvas.is_running() {
                canvas.resize(lw, lh);
            } else {
                canvas.mount(Some(&self.front as &dyn Surface));
            }
        }
    }

    pub fn select(&mut self, idx: usize, now_ms: f64) {
        if self.canvases.is_empty() {
            return;
        }
        let idx = idx % self.canvases.len();
        if idx == self.active && self.canvases[idx].is_running() {
            return;
        }
        if let Some(canvas) = self.canvases.get_mut(self.active) {
            canvas.unmount();
        }
        self.active = idx;
        // Re-derive the ratio: caps differ per effect.
        let (w, h) = (self.front.width(), self.front.height());
        let dpr = self.ratio_for(w);
        self.front.resize(w, h, dpr);
        self.canvases[idx].mount(Some(&self.front as &dyn Surface));
        self.started_ms = now_ms;
        tracing::info!(effect = self.canvases[idx].name(), "effect selected");
    }

    pub fn next_effect(&mut self, now_ms: f64) {
        self.select(self.active.wrapping_add(1), now_ms);
    }

    pub fn prev_effect(&mut self, now_ms: f64) {
        let n = self.canvases.len().max(1);
        self.select((self.active + n - 1) % n, now_ms);
    }

    /// Pointer position in physical pixels of the front buffer.
    pub fn pointer_move(&mut self, x: f32, y: f32) {
        let dpr = self.front.device_pixel_ratio();
        if let Some(canvas) = self.canvases.get_mut(self.active) {
            canvas.pointer_move(x / dpr, y / dpr);
        }
    }

    pub fn pointer_leave(&mut self) {
        if let Some(canvas) = self.canvases.get_mut(self.active) {
            canvas.pointer_leave();
        }
    }

    /// Paints the due frame and returns the RGBA front buffer.
    pub fn render(&mut self, now_ms: f64) -> &[u8] {
        let t = (now_ms - self.started_ms).max(0.0);
        if let Some(canvas) = self.canvases.get_mut(self.active) {
            canvas.tick(t, Some(&mut self.front as &mut dyn Surface));
        }
        self.front.pixels()
    }

    pub fn shutdown(&mut self) {
        if let Some(canvas) = self.canvases.get_mut(self.active) {
            canvas.unmount();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_cancel_only_hits_the_pending_handle() {
        let mut s = FrameScheduler::new();
        let a = s.request();
        let b = s.request();
        assert!(!s.cancel(a));
        assert!(s.is_pending());
        assert!(s.cancel(b));
        assert!(s.take_due().is_none());
    }

    #[test]
    fn depth_sort_breaks_ties_by_index() {
        let mut pts = vec![
            ProjectedPoint { idx: 2, sx: 0.0, sy: 0.0, depth: 0.5 },
            ProjectedPoint { idx: 0, sx: 0.0, sy: 0.0, depth: 0.5 },
            ProjectedPoint { idx: 1, sx: 0.0, sy: 0.0, depth: -0.5 },
        ];
        depth_sort(&mut pts);
        let order = pts.iter().map(|p| p.idx).collect::<Vec<_>>();
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn resolve_by_index_and_substring() {
        let names = ["Globe: Dither Continents", "Terrain: Voronoi Ridges"];
        assert_eq!(resolve_effect_index(None, &names).unwrap(), 0);
        assert_eq!(resolve_effect_index(Some("1"), &names).unwrap(), 1);
        assert_eq!(resolve_effect_index(Some("voronoi"), &names).unwrap(), 1);
        assert!(resolve_effect_index(Some("7"), &names).is_err());
        assert!(resolve_effect_index(Some("nope"), &names).is_err());
    }
}

//! Immediate-mode 2D drawing surface and its RGBA software implementation.

/// Straight-alpha colour. Alpha is always kept inside `[0,1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Self = Self::rgb(0, 0, 0).with_alpha_const(0.0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self {
            r,
            g,
            b,
            a: clamp_alpha(a),
        }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    const fn with_alpha_const(self, a: f32) -> Self {
        Self {
            r: self.r,
            g: self.g,
            b: self.b,
            a,
        }
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            self.a + (other.a - self.a) * t,
        )
    }
}

/// NaN collapses to fully transparent.
#[inline]
pub fn clamp_alpha(a: f32) -> f32 {
    if a.is_nan() { 0.0 } else { a.clamp(0.0, 1.0) }
}

/// A 2D immediate-mode drawing context in logical pixels.
pub trait Surface {
    /// Logical size (physical size divided by the device pixel ratio).
    fn size(&self) -> (f32, f32);
    fn device_pixel_ratio(&self) -> f32;
    fn clear(&mut self);
    fn set_fill(&mut self, color: Rgba);
    fn set_stroke(&mut self, color: Rgba);
    fn set_line_width(&mut self, width: f32);
    fn fill_circle(&mut self, x: f32, y: f32, radius: f32);
    fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32);
    /// Fills the disc of radius `r1` with colour stops spread from `r0` to `r1`.
    fn fill_radial_gradient(&mut self, cx: f32, cy: f32, r0: f32, r1: f32, stops: &[(f32, Rgba)]);
}

/// Software RGBA8 canvas. Draws source-over onto an opaque background.
pub struct PixelCanvas {
    pixels: Vec<u8>,
    width: usize,
    height: usize,
    dpr: f32,
    background: [u8; 3],
    fill: Rgba,
    stroke: Rgba,
    line_width: f32,
}

impl PixelCanvas {
    pub fn new(width: usize, height: usize, dpr: f32) -> Self {
        let mut canvas = Self {
            pixels: Vec::new(),
            width: 0,
            height: 0,
            dpr: 1.0,
            background: [0, 0, 0],
            fill: Rgba::rgb(255, 255, 255),
            stroke: Rgba::rgb(255, 255, 255),
            line_width: 1.0,
        };
        canvas.resize(width, height, dpr);
        canvas
    }

    pub fn with_background(mut self, r: u8, g: u8, b: u8) -> Self {
        self.background = [r, g, b];
        self.clear();
        self
    }

    /// Resizes the physical buffer. `dpr` maps logical to physical pixels.
    pub fn resize(&mut self, width: usize, height: usize, dpr: f32) {
        self.width = width;
        self.height = height;
        self.dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        self.pixels = vec![0u8; width.saturating_mul(height).saturating_mul(4)];
        self.clear();
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    #[inline]
    fn blend(&mut self, x: usize, y: usize, c: Rgba, coverage: f32) {
        let a = clamp_alpha(c.a * coverage);
        if a <= 0.0 {
            return;
        }
        let i = (y * self.width + x) * 4;
        let ia = 1.0 - a;
        let px = &mut self.pixels[i..i + 4];
        px[0] = (c.r as f32 * a + px[0] as f32 * ia).round() as u8;
        px[1] = (c.g as f32 * a + px[1] as f32 * ia).round() as u8;
        px[2] = (c.b as f32 * a + px[2] as f32 * ia).round() as u8;
        px[3] = 255;
    }

    /// Physical-pixel bounding box clipped to the buffer, or `None` when empty.
    fn clip_box(&self, x0: f32, y0: f32, x1: f32, y1: f32) -> Option<(usize, usize, usize, usize)> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return None;
        }
        let max_x = self.width as f32 - 1.0;
        let max_y = self.height as f32 - 1.0;
        if x1 < 0.0 || y1 < 0.0 || x0 > max_x || y0 > max_y {
            return None;
        }
        Some((
            x0.floor().max(0.0) as usize,
            y0.floor().max(0.0) as usize,
            x1.ceil().min(max_x) as usize,
            y1.ceil().min(max_y) as usize,
        ))
    }
}

impl Surface for PixelCanvas {
    fn size(&self) -> (f32, f32) {
        (self.width as f32 / self.dpr, self.height as f32 / self.dpr)
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.dpr
    }

    fn clear(&mut self) {
        let [r, g, b] = self.background;
        for px in self.pixels.chunks_exact_mut(4) {
            px[0] = r;
            px[1] = g;
            px[2] = b;
            px[3] = 255;
        }
    }

    fn set_fill(&mut self, color: Rgba) {
        self.fill = color;
    }

    fn set_stroke(&mut self, color: Rgba) {
        self.stroke = color;
    }

    fn set_line_width(&mut self, width: f32) {
        self.line_width = if width.is_finite() { width.max(0.0) } else { 0.0 };
    }

    fn fill_circle(&mut self, x: f32, y: f32, radius: f32) {
        let color = self.fill;
        if color.a <= 0.0 || !(radius > 0.0) {
            return;
        }
        let cx = x * self.dpr;
        let cy = y * self.dpr;
        let r = radius * self.dpr;
        // Sub-pixel discs keep their area instead of rounding up to a full pixel.
        let thin = (r * 2.0).min(1.0);
        let Some((bx0, by0, bx1, by1)) = self.clip_box(cx - r - 1.0, cy - r - 1.0, cx + r + 1.0, cy + r + 1.0)
        else {
            return;
        };
        for py in by0..=by1 {
            let dy = py as f32 + 0.5 - cy;
            for px in bx0..=bx1 {
                let dx = px as f32 + 0.5 - cx;
                let d = (dx * dx + dy * dy).sqrt();
                let cov = (r + 0.5 - d).clamp(0.0, 1.0) * thin;
                if cov > 0.0 {
                    self.blend(px, py, color, cov);
                }
            }
        }
    }

    fn stroke_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32) {
        let color = self.stroke;
        let width = self.line_width * self.dpr;
        if color.a <= 0.0 || width <= 0.0 {
            return;
        }
        let (ax, ay) = (x0 * self.dpr, y0 * self.dpr);
        let (bx, by) = (x1 * self.dpr, y1 * self.dpr);
        let half = (width * 0.5).max(0.5);
        let thin = width.min(1.0);
        let Some((bx0, by0, bx1, by1)) = self.clip_box(
            ax.min(bx) - half - 1.0,
            ay.min(by) - half - 1.0,
            ax.max(bx) + half + 1.0,
            ay.max(by) + half + 1.0,
        ) else {
            return;
        };

        let (ex, ey) = (bx - ax, by - ay);
        let len2 = ex * ex + ey * ey;
        for py in by0..=by1 {
            let qy = py as f32 + 0.5;
            for px in bx0..=bx1 {
                let qx = px as f32 + 0.5;
                let t = if len2 > 0.0 {
                    (((qx - ax) * ex + (qy - ay) * ey) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let dx = qx - (ax + ex * t);
                let dy = qy - (ay + ey * t);
                let d = (dx * dx + dy * dy).sqrt();
                let cov = (half + 0.5 - d).clamp(0.0, 1.0) * thin;
                if cov > 0.0 {
                    self.blend(px, py, color, cov);
                }
            }
        }
    }

    fn fill_radial_gradient(&mut self, cx: f32, cy: f32, r0: f32, r1: f32, stops: &[(f32, Rgba)]) {
        if stops.is_empty() || !(r1 > 0.0) {
            return;
        }
        let cx = cx * self.dpr;
        let cy = cy * self.dpr;
        let r0 = r0.max(0.0) * self.dpr;
        let r1 = r1 * self.dpr;
        let span = (r1 - r0).max(1e-6);
        let Some((bx0, by0, bx1, by1)) = self.clip_box(cx - r1, cy - r1, cx + r1, cy + r1) else {
            return;
        };
        for py in by0..=by1 {
            let dy = py as f32 + 0.5 - cy;
            for px in bx0..=bx1 {
                let dx = px as f32 + 0.5 - cx;
                let d = (dx * dx + dy * dy).sqrt();
                if d > r1 {
                    continue;
                }
                let c = gradient_at(stops, (d - r0) / span);
                self.blend(px, py, c, 1.0);
            }
        }
    }
}

/// Colour at offset `t` along sorted gradient stops.
pub fn gradient_at(stops: &[(f32, Rgba)], t: f32) -> Rgba {
    let Some(&(first_t, first)) = stops.first() else {
        return Rgba::TRANSPARENT;
    };
    let t = t.clamp(0.0, 1.0);
    if t <= first_t {
        return first;
    }
    for pair in stops.windows(2) {
        let (ta, ca) = pair[0];
        let (tb, cb) = pair[1];
        if t <= tb {
            let span = (tb - ta).max(1e-6);
            return ca.lerp(cb, (t - ta) / span);
        }
    }
    stops[stops.len() - 1].1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_is_clamped_on_construction() {
        assert_eq!(Rgba::new(1, 2, 3, 4.0).a, 1.0);
        assert_eq!(Rgba::new(1, 2, 3, -0.5).a, 0.0);
        assert_eq!(Rgba::new(1, 2, 3, f32::NAN).a, 0.0);
    }

    #[test]
    fn opaque_circle_paints_its_centre() {
        let mut c = PixelCanvas::new(20, 20, 1.0);
        c.set_fill(Rgba::rgb(0, 255, 136));
        c.fill_circle(10.0, 10.0, 3.0);
        assert_eq!(c.pixel(10, 10), Some([0, 255, 136, 255]));
        assert_eq!(c.pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn device_pixel_ratio_scales_drawing() {
        let mut c = PixelCanvas::new(40, 40, 2.0);
        assert_eq!(c.size(), (20.0, 20.0));
        c.set_fill(Rgba::rgb(255, 0, 0));
        c.fill_circle(15.0, 15.0, 2.0);
        assert_eq!(c.pixel(30, 30).map(|p| p[0]), Some(255));
    }

    #[test]
    fn off_canvas_and_non_finite_shapes_are_ignored() {
        let mut c = PixelCanvas::new(8, 8, 1.0);
        c.set_fill(Rgba::rgb(255, 255, 255));
        c.fill_circle(-50.0, -50.0, 2.0);
        c.fill_circle(f32::NAN, 2.0, 2.0);
        c.set_stroke(Rgba::rgb(255, 255, 255));
        c.stroke_line(f32::INFINITY, 0.0, 4.0, 4.0);
        assert!(c.pixels().chunks_exact(4).all(|p| p[..3] == [0, 0, 0]));
    }

    #[test]
    fn line_covers_its_midpoint() {
        let mut c = PixelCanvas::new(16, 16, 1.0);
        c.set_stroke(Rgba::rgb(10, 240, 232));
        c.set_line_width(2.0);
        c.stroke_line(2.0, 8.5, 14.0, 8.5);
        assert_eq!(c.pixel(8, 8), Some([10, 240, 232, 255]));
    }

    #[test]
    fn gradient_interpolates_between_stops() {
        let stops = [
            (0.0, Rgba::new(0, 0, 0, 0.0)),
            (1.0, Rgba::new(200, 100, 0, 1.0)),
        ];
        let mid = gradient_at(&stops, 0.5);
        assert_eq!((mid.r, mid.g), (100, 50));
        assert!((mid.a - 0.5).abs() < 1e-6);
        assert_eq!(gradient_at(&stops, 5.0).r, 200);
        assert_eq!(gradient_at(&[], 0.5), Rgba::TRANSPARENT);
    }
}

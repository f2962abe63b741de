use crate::render::{
    luma_u8, text_frame_begin, text_frame_end, write_bg_rgb, write_fg_rgb, Frame, Renderer,
};
use std::io::Write;

/// Bit for each dot of a 2x4 braille cell, indexed `dy * 2 + dx`.
const DOT_BITS: [u8; 8] = [0x01, 0x08, 0x02, 0x10, 0x04, 0x20, 0x40, 0x80];

/// 2x4 pixels per cell. Dots brighter than the cell's mid-luma are raised and take the
/// average colour of the raised set; the rest become the background.
pub struct BrailleRenderer {
    last_fg: Option<(u8, u8, u8)>,
    last_bg: Option<(u8, u8, u8)>,
}

impl BrailleRenderer {
    pub fn new() -> Self {
        Self {
            last_fg: None,
            last_bg: None,
        }
    }
}

impl Default for BrailleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct ColorSum {
    r: u32,
    g: u32,
    b: u32,
    n: u32,
}

impl ColorSum {
    fn add(&mut self, (r, g, b): (u8, u8, u8)) {
        self.r += r as u32;
        self.g += g as u32;
        self.b += b as u32;
        self.n += 1;
    }

    fn mean(&self) -> Option<(u8, u8, u8)> {
        (self.n > 0).then(|| {
            (
                (self.r / self.n) as u8,
                (self.g / self.n) as u8,
                (self.b / self.n) as u8,
            )
        })
    }
}

impl Renderer for BrailleRenderer {
    fn name(&self) -> &'static str {
        "braille"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some((cols, visual_rows, w, _h)) = text_frame_begin(frame, 2, 4, out)? else {
            return Ok(());
        };
        self.last_fg = None;
        self.last_bg = None;

        for row in 0..visual_rows {
            for col in 0..cols {
                let mut rgb = [(0u8, 0u8, 0u8); 8];
                let mut lum = [0u8; 8];
                for (i, (c, l)) in rgb.iter_mut().zip(lum.iter_mut()).enumerate() {
                    let x = col * 2 + i % 2;
                    let y = row * 4 + i / 2;
                    let idx = (y * w + x) * 4;
                    *c = (
                        frame.pixels_rgba[idx],
                        frame.pixels_rgba[idx + 1],
                        frame.pixels_rgba[idx + 2],
                    );
                    *l = luma_u8(c.0, c.1, c.2);
                }

                let lo = lum.iter().copied().min().unwrap_or(0) as u16;
                let hi = lum.iter().copied().max().unwrap_or(0) as u16;
                let threshold = ((lo + hi) / 2) as u8;

                let mut bits = 0u8;
                let mut on = ColorSum::default();
                let mut off = ColorSum::default();
                for i in 0..8 {
                    if lum[i] > threshold {
                        bits |= DOT_BITS[i];
                        on.add(rgb[i]);
                    } else {
                        off.add(rgb[i]);
                    }
                }

                let bg = off.mean().unwrap_or((0, 0, 0));
                let (fg, ch) = match on.mean() {
                    Some(fg) => (fg, char::from_u32(0x2800 + bits as u32).unwrap_or(' ')),
                    None => (bg, ' '),
                };
                let bg = if off.n == 0 { fg } else { bg };

                if self.last_fg != Some(fg) {
                    write_fg_rgb(out, fg.0, fg.1, fg.2)?;
                    self.last_fg = Some(fg);
                }
                if self.last_bg != Some(bg) {
                    write_bg_rgb(out, bg.0, bg.1, bg.2)?;
                    self.last_bg = Some(bg);
                }
                let mut buf = [0u8; 4];
                out.write_all(ch.encode_utf8(&mut buf).as_bytes())?;
            }
            if row + 1 < visual_rows {
                out.write_all(b"\r\n")?;
            }
        }

        text_frame_end(frame, cols, visual_rows, out)
    }
}

use crate::render::{draw_overlay_popup, write_hud_line, Frame, Renderer};
use anyhow::Context;
use base64::Engine;
use std::io::Write;

/// Raw bytes per APC chunk; 3072 encodes to exactly 4096 base64 bytes.
const RAW_CHUNK: usize = 3 * 1024;

/// Streams full-resolution RGBA through the kitty graphics protocol (direct transmission),
/// placed over the effect rows. The image id is stable so the terminal replaces it in place.
pub struct KittyRenderer {
    image_id: u32,
    placement_id: u32,
    b64_buf: Vec<u8>,
    overlay_visible_last: bool,
    last_hud_rows: u16,
}

impl KittyRenderer {
    pub fn new() -> Self {
        Self {
            image_id: 1,
            placement_id: 1,
            b64_buf: Vec::new(),
            overlay_visible_last: false,
            last_hud_rows: 0,
        }
    }

    /// Deletes the image; used on shutdown so nothing lingers after leaving the alternate screen.
    pub fn clear(&self, out: &mut dyn Write) -> std::io::Result<()> {
        write!(out, "\x1b_Ga=d,d=I,i={}\x1b\\", self.image_id)
    }
}

impl Default for KittyRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for KittyRenderer {
    fn name(&self) -> &'static str {
        "kitty"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let cols = frame.term_cols as usize;
        let visual_rows = frame.visual_rows as usize;
        let w = frame.pixel_width;
        let h = frame.pixel_height;

        if cols == 0 || visual_rows == 0 || w == 0 || h == 0 {
            return Ok(());
        }
        if frame.pixels_rgba.len() < w.saturating_mul(h).saturating_mul(4) {
            return Ok(());
        }

        if frame.sync_updates {
            out.write_all(b"\x1b[?2026h")?;
        }

        if let Some(text) = frame.overlay {
            // The image sits above text, so hide it while the popup is up.
            self.clear(out)?;
            clear_rows(out, frame.term_rows as usize)?;
            write_hud(frame, cols, visual_rows, out)?;
            draw_overlay_popup(out, frame.term_cols, frame.term_rows, text)?;
            self.overlay_visible_last = true;
            self.last_hud_rows = frame.hud_rows;
        } else {
            if self.overlay_visible_last || frame.hud_rows != self.last_hud_rows {
                clear_rows(out, frame.term_rows as usize)?;
            }
            out.write_all(b"\x1b[H")?;
            write_direct_rgba(
                out,
                &frame.pixels_rgba[..w * h * 4],
                (w, h),
                (cols, visual_rows),
                (self.image_id, self.placement_id),
                &mut self.b64_buf,
            )?;
            write_hud(frame, cols, visual_rows, out)?;
            self.overlay_visible_last = false;
            self.last_hud_rows = frame.hud_rows;
        }

        if frame.sync_updates {
            out.write_all(b"\x1b[?2026l")?;
        }
        out.flush()?;
        Ok(())
    }

    fn finish(&mut self, out: &mut dyn Write) -> anyhow::Result<()> {
        self.clear(out)?;
        out.flush()?;
        Ok(())
    }
}

fn write_hud(
    frame: &Frame<'_>,
    cols: usize,
    visual_rows: usize,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut hud_lines = frame.hud.lines();
    for i in 0..frame.hud_rows as usize {
        write_hud_line(out, visual_rows + i + 1, cols, hud_lines.next())?;
    }
    Ok(())
}

fn write_direct_rgba(
    out: &mut dyn Write,
    rgba: &[u8],
    (w, h): (usize, usize),
    (cols, rows): (usize, usize),
    (image_id, placement_id): (u32, u32),
    b64_buf: &mut Vec<u8>,
) -> anyhow::Result<()> {
    let chunks = rgba.chunks(RAW_CHUNK);
    let total = chunks.len();
    for (n, chunk) in chunks.enumerate() {
        let b64_len = chunk.len().div_ceil(3) * 4;
        if b64_buf.len() < b64_len {
            b64_buf.resize(b64_len, 0);
        }
        let written = base64::engine::general_purpose::STANDARD
            .encode_slice(chunk, &mut b64_buf[..b64_len])
            .context("base64 encode pixels")?;

        let more = u8::from(n + 1 < total);
        if n == 0 {
            write!(
                out,
                "\x1b_Ga=T,f=32,s={w},v={h},t=d,i={image_id},p={placement_id},c={cols},r={rows},C=1,q=2,z=-1,m={more};"
            )?;
        } else {
            write!(out, "\x1b_Gm={more};")?;
        }
        out.write_all(&b64_buf[..written])?;
        out.write_all(b"\x1b\\")?;
    }
    Ok(())
}

fn clear_rows(out: &mut dyn Write, rows: usize) -> anyhow::Result<()> {
    for row in 1..=rows {
        write!(out, "\x1b[{row};1H\x1b[0m\x1b[2K")?;
    }
    Ok(())
}

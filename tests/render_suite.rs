use dither_fx::config::RendererMode;
use dither_fx::render::{
    cell_pixels, luma_u8, make_renderer, AsciiRenderer, BrailleRenderer, Frame,
    HalfBlockRenderer, KittyRenderer, Renderer,
};

/// Build a solid-color RGBA pixel buffer.
fn solid_pixels(w: usize, h: usize, r: u8, g: u8, b: u8) -> Vec<u8> {
    let mut buf = vec![0u8; w * h * 4];
    for px in buf.chunks_exact_mut(4) {
        px[0] = r;
        px[1] = g;
        px[2] = b;
        px[3] = 255;
    }
    buf
}

/// Build a gradient pixel buffer (varies across x).
fn gradient_pixels(w: usize, h: usize) -> Vec<u8> {
    let mut buf = vec![0u8; w * h * 4];
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) * 4;
            let t = (x as f32 / w.max(1) as f32 * 255.0) as u8;
            buf[i] = t;
            buf[i + 1] = 128;
            buf[i + 2] = 255 - t;
            buf[i + 3] = 255;
        }
    }
    buf
}

const HUD: &str = "[1/3] Globe | FPS 60";

/// The HUD as it appears on a terminal `cols` wide.
fn hud_prefix(cols: u16) -> String {
    HUD.chars().take(cols as usize).collect()
}

fn make_frame<'a>(
    cols: u16,
    visual_rows: u16,
    pw: usize,
    ph: usize,
    pixels: &'a [u8],
    sync: bool,
) -> Frame<'a> {
    Frame {
        term_cols: cols,
        term_rows: visual_rows + 2,
        visual_rows,
        pixel_width: pw,
        pixel_height: ph,
        pixels_rgba: pixels,
        hud: HUD,
        hud_rows: 1,
        overlay: None,
        sync_updates: sync,
    }
}

// ── ASCII renderer ──────────────────────────────────────────────────────────

#[test]
fn ascii_renders_solid_frame() {
    let cols = 10u16;
    let rows = 5u16;
    let pixels = solid_pixels(cols as usize, rows as usize, 200, 200, 200);
    let frame = make_frame(cols, rows, cols as usize, rows as usize, &pixels, false);
    let mut out = Vec::new();
    let mut renderer = AsciiRenderer::new();
    renderer.render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("\x1b[H"), "missing home cursor");
    assert!(s.contains("\x1b[?7l"), "missing autowrap-off");
    assert!(s.contains("\x1b[?7h"), "missing autowrap-on");
    // Should have FG color escapes for 200,200,200
    assert!(s.contains("38;2;200;200;200"), "missing FG color");
    // HUD should be present
    assert!(s.contains(&hud_prefix(cols)), "HUD text missing");
}

#[test]
fn ascii_name() {
    assert_eq!(AsciiRenderer::new().name(), "ascii");
}

#[test]
fn ascii_skips_zero_size() {
    let pixels = solid_pixels(1, 1, 0, 0, 0);
    let frame = make_frame(0, 0, 0, 0, &pixels, false);
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    assert!(out.is_empty(), "expected empty output for zero-size frame");
}

// ── HalfBlock renderer ─────────────────────────────────────────────────────

#[test]
fn halfblock_renders_gradient_frame() {
    let cols = 8u16;
    let rows = 4u16;
    let pw = cols as usize;
    let ph = (rows as usize) * 2;
    let pixels = gradient_pixels(pw, ph);
    let frame = make_frame(cols, rows, pw, ph, &pixels, true);
    let mut out = Vec::new();
    let mut renderer = HalfBlockRenderer::new();
    renderer.render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("\x1b[?2026h"), "missing sync-begin");
    assert!(s.contains("\x1b[?2026l"), "missing sync-end");
    // Should use upper-half-block character
    assert!(s.contains("\u{2580}"), "missing half-block char");
    // Should have both FG and BG colors
    assert!(s.contains("38;2;"), "missing FG escape");
    assert!(s.contains("48;2;"), "missing BG escape");
}

#[test]
fn halfblock_name() {
    assert_eq!(HalfBlockRenderer::new().name(), "halfblock");
}

#[test]
fn halfblock_skips_dimension_mismatch() {
    // pixel_height should be visual_rows*2, but give visual_rows*1
    let cols = 4u16;
    let rows = 4u16;
    let pixels = solid_pixels(4, 4, 100, 100, 100);
    let frame = make_frame(cols, rows, 4, 4, &pixels, false);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    assert!(out.is_empty(), "expected empty output for dimension mismatch");
}

// ── Braille renderer ────────────────────────────────────────────────────────

#[test]
fn braille_renders_gradient_frame() {
    let cols = 6u16;
    let rows = 3u16;
    let pw = (cols as usize) * 2;
    let ph = (rows as usize) * 4;
    let pixels = gradient_pixels(pw, ph);
    let frame = make_frame(cols, rows, pw, ph, &pixels, false);
    let mut out = Vec::new();
    let mut renderer = BrailleRenderer::new();
    renderer.render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    // Braille characters are in U+2800..U+28FF range
    assert!(
        s.chars().any(|c| ('\u{2800}'..='\u{28FF}').contains(&c) || c == ' '),
        "no braille characters found"
    );
    assert!(s.contains(&hud_prefix(cols)), "HUD text missing");
}

#[test]
fn braille_name() {
    assert_eq!(BrailleRenderer::new().name(), "braille");
}

// ── Overlay rendering ───────────────────────────────────────────────────────

#[test]
fn ascii_renders_overlay_popup() {
    let cols = 40u16;
    let rows = 20u16;
    let pixels = solid_pixels(cols as usize, rows as usize, 50, 50, 50);
    let mut frame = make_frame(cols, rows, cols as usize, rows as usize, &pixels, false);
    frame.term_rows = rows + 2;
    frame.overlay = Some("Test Overlay\nSecond line");
    let mut out = Vec::new();
    let mut renderer = AsciiRenderer::new();
    renderer.render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("Test Overlay"), "overlay text missing");
}

// ── Multiple frames (color cache reset) ─────────────────────────────────────

#[test]
fn halfblock_resets_color_cache_each_frame() {
    let cols = 4u16;
    let rows = 2u16;
    let pw = 4;
    let ph = 4;

    // Frame 1: red
    let pixels1 = solid_pixels(pw, ph, 255, 0, 0);
    let frame1 = make_frame(cols, rows, pw, ph, &pixels1, false);
    let mut out1 = Vec::new();
    let mut renderer = HalfBlockRenderer::new();
    renderer.render(&frame1, &mut out1).unwrap();
    let s1 = String::from_utf8_lossy(&out1);
    assert!(s1.contains("38;2;255;0;0"), "first frame missing red FG");

    // Frame 2: blue - color cache should reset so new color is emitted
    let pixels2 = solid_pixels(pw, ph, 0, 0, 255);
    let frame2 = make_frame(cols, rows, pw, ph, &pixels2, false);
    let mut out2 = Vec::new();
    renderer.render(&frame2, &mut out2).unwrap();
    let s2 = String::from_utf8_lossy(&out2);
    assert!(s2.contains("38;2;0;0;255"), "second frame missing blue FG");
}

// ── Kitty renderer ──────────────────────────────────────────────────────────

#[test]
fn kitty_transmits_direct_rgba() {
    let cols = 4u16;
    let rows = 2u16;
    let (pw, ph) = (8, 8);
    let pixels = gradient_pixels(pw, ph);
    let frame = make_frame(cols, rows, pw, ph, &pixels, true);
    let mut out = Vec::new();
    KittyRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("\x1b_Ga=T,f=32,s=8,v=8,t=d"), "missing transmit header");
    assert!(s.contains("c=4,r=2"), "placement should cover the effect rows");
    assert!(s.contains(&hud_prefix(cols)), "HUD text missing");
    assert!(s.starts_with("\x1b[?2026h"));
    assert!(s.ends_with("\x1b[?2026l"));
}

#[test]
fn kitty_splits_large_frames_into_chunks() {
    let cols = 32u16;
    let rows = 8u16;
    let (pw, ph) = (64, 32);
    let pixels = solid_pixels(pw, ph, 0, 255, 136);
    let frame = make_frame(cols, rows, pw, ph, &pixels, false);
    let mut out = Vec::new();
    KittyRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    // 64*32*4 = 8192 bytes -> three chunks of at most 3072.
    assert_eq!(s.matches("\x1b_G").count(), 3);
    assert!(s.contains("m=1;"));
    assert!(s.contains("\x1b_Gm=0;"));
}

#[test]
fn kitty_hides_image_under_overlay() {
    let cols = 40u16;
    let rows = 20u16;
    let pixels = solid_pixels(40, 40, 10, 10, 10);
    let mut frame = make_frame(cols, rows, 40, 40, &pixels, false);
    frame.overlay = Some("dither_fx keys\nq quit");
    let mut out = Vec::new();
    KittyRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("\x1b_Ga=d,d=I,i=1"), "image should be deleted");
    assert!(!s.contains("a=T"), "no pixels while the popup is up");
    assert!(s.contains("dither_fx keys"));
}

#[test]
fn kitty_clear_deletes_stable_image_id() {
    let mut out = Vec::new();
    KittyRenderer::new().clear(&mut out).unwrap();
    assert_eq!(out, b"\x1b_Ga=d,d=I,i=1\x1b\\");
}

#[test]
fn kitty_name() {
    assert_eq!(KittyRenderer::new().name(), "kitty");
}

// ── Shared helpers ──────────────────────────────────────────────────────────

#[test]
fn cell_geometry_matches_renderers() {
    assert_eq!(cell_pixels(RendererMode::Ascii), (1, 1));
    assert_eq!(cell_pixels(RendererMode::HalfBlock), (1, 2));
    assert_eq!(cell_pixels(RendererMode::Braille), (2, 4));
    assert_eq!(cell_pixels(RendererMode::Kitty), (2, 4));
    assert_eq!(make_renderer(RendererMode::Braille).name(), "braille");
    assert_eq!(make_renderer(RendererMode::HalfBlock).name(), "halfblock");
}

#[test]
fn luma_spans_full_range() {
    assert_eq!(luma_u8(0, 0, 0), 0);
    assert_eq!(luma_u8(255, 255, 255), 255);
    assert!(luma_u8(0, 255, 0) > luma_u8(255, 0, 0));
    assert!(luma_u8(255, 0, 0) > luma_u8(0, 0, 255));
}

#[test]
fn hud_is_clipped_to_terminal_width() {
    let cols = 6u16;
    let rows = 2u16;
    let pixels = solid_pixels(6, 2, 0, 0, 0);
    let mut frame = make_frame(cols, rows, 6, 2, &pixels, false);
    frame.hud = "ABCDEFGHIJ";
    let mut out = Vec::new();
    AsciiRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("ABCDEF"));
    assert!(!s.contains("ABCDEFG"));
}

#[test]
fn short_pixel_buffer_reports_instead_of_panicking() {
    let pixels = solid_pixels(2, 2, 0, 0, 0);
    let frame = make_frame(4, 2, 4, 4, &pixels, false);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert!(s.contains("pixel buffer too small"));
}

#[test]
fn only_kitty_cleans_up_on_finish() {
    let mut out = Vec::new();
    KittyRenderer::new().finish(&mut out).unwrap();
    assert!(String::from_utf8_lossy(&out).contains("a=d"));

    let mut out = Vec::new();
    HalfBlockRenderer::new().finish(&mut out).unwrap();
    assert!(out.is_empty());
}

#[test]
fn default_hud_is_clipped_on_narrow_terminals() {
    let cols = 6u16;
    let rows = 2u16;
    let pixels = solid_pixels(12, 8, 0, 0, 0);
    let frame = make_frame(cols, rows, 12, 8, &pixels, false);
    let mut out = Vec::new();
    BrailleRenderer::new().render(&frame, &mut out).unwrap();
    let s = String::from_utf8_lossy(&out);
    assert_eq!(hud_prefix(cols), "[1/3] ");
    assert!(s.contains("[1/3] "));
    assert!(!s.contains("Globe"));
    assert!(!s.contains("FPS 60"));
}

#[test]
fn hud_fits_on_wide_terminals() {
    let cols = 40u16;
    let rows = 3u16;
    let pixels = solid_pixels(40, 6, 0, 0, 0);
    let frame = make_frame(cols, rows, 40, 6, &pixels, false);
    let mut out = Vec::new();
    HalfBlockRenderer::new().render(&frame, &mut out).unwrap();
    assert!(String::from_utf8_lossy(&out).contains(HUD));
}

#[test]
fn text_renderers_never_scroll_past_the_last_row() {
    let cols = 8u16;
    let rows = 4u16;
    let cases: [(Box<dyn Renderer>, usize, usize); 3] = [
        (Box::new(AsciiRenderer::new()), 1, 1),
        (Box::new(HalfBlockRenderer::new()), 1, 2),
        (Box::new(BrailleRenderer::new()), 2, 4),
    ];
    for (mut renderer, cw, ch) in cases {
        let (pw, ph) = (cols as usize * cw, rows as usize * ch);
        let pixels = gradient_pixels(pw, ph);
        let mut frame = make_frame(cols, rows, pw, ph, &pixels, false);
        // HUD hidden: the effect owns every terminal row.
        frame.hud_rows = 0;
        frame.term_rows = rows;
        let mut out = Vec::new();
        renderer.render(&frame, &mut out).unwrap();
        let s = String::from_utf8_lossy(&out);
        assert_eq!(
            s.matches("\r\n").count(),
            rows as usize - 1,
            "{} wrote a newline after the last row",
            renderer.name()
        );
    }
}

use crate::config::Config;
use crate::prefs::{prefs_storage_path, AppPrefs};
use crate::render::{cell_pixels, make_renderer, Frame, Renderer};
use crate::terminal::TerminalGuard;
use crate::tuning::Tuning;
use crate::visual::{make_effects, resolve_effect_index, EffectEngine};
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let tuning = match cfg.tuning.as_deref() {
        Some(path) => Tuning::load(path)
            .with_context(|| format!("load tuning file {}", path.display()))?,
        None => Tuning::default(),
    };

    let prefs_path = prefs_storage_path();
    let mut prefs = AppPrefs::load(prefs_path.as_deref()).unwrap_or_else(|err| {
        tracing::warn!(%err, "ignoring unreadable prefs");
        AppPrefs::default()
    });

    let effects = make_effects(&tuning);
    let names = effects.iter().map(|e| e.name()).collect::<Vec<_>>();
    let active = match cfg.effect.as_deref() {
        Some(sel) => resolve_effect_index(Some(sel), &names)?,
        None => resolve_effect_index(prefs.last_effect.as_deref(), &names).unwrap_or_else(|err| {
            tracing::warn!(%err, "saved effect no longer exists");
            0
        }),
    };
    let mut show_hud = cfg.hud.unwrap_or(prefs.hud_visible);
    let mut show_help = false;

    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());
    let mut renderer = make_renderer(cfg.renderer);
    let (cell_w, cell_h) = cell_pixels(cfg.renderer);

    let mut last_size = crossterm::terminal::size().context("get terminal size")?;
    if last_size.1 < 2 || last_size.0 < 4 {
        return Err(anyhow::anyhow!(
            "terminal too small (need at least 4x2, got {}x{})",
            last_size.0,
            last_size.1
        ));
    }

    let mut engine = EffectEngine::new(effects, active, cfg.logical_width);
    let mut layout = Layout::new(last_size, show_hud, (cell_w, cell_h));
    engine.resize(layout.pixel_w, layout.pixel_h);
    tracing::info!(
        effect = engine.effect_name(),
        renderer = renderer.name(),
        cols = last_size.0,
        rows = last_size.1,
        "starting"
    );

    let start = Instant::now();
    let mut fps = FpsCounter::new();
    let mut last_render_ms = 0.0f32;
    let target = Duration::from_secs_f32(1.0 / cfg.fps.max(1) as f32);

    let result = 'frame: loop {
        let frame_start = Instant::now();
        let now_ms = start.elapsed().as_secs_f64() * 1000.0;
        let mut quit = false;

        loop {
            match event::poll(Duration::from_millis(0)) {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => break 'frame Err(anyhow::Error::new(err).context("poll events")),
            }
            let ev = match event::read() {
                Ok(ev) => ev,
                Err(err) => break 'frame Err(anyhow::Error::new(err).context("read event")),
            };
            match ev {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    let action = key_action(k.code, k.modifiers);
                    match action {
                        KeyAction::Quit => quit = true,
                        KeyAction::Next => engine.next_effect(now_ms),
                        KeyAction::Prev => engine.prev_effect(now_ms),
                        KeyAction::Select(idx) if idx < names.len() => engine.select(idx, now_ms),
                        KeyAction::Select(_) => {}
                        KeyAction::ToggleHud => {
                            show_hud = !show_hud;
                            layout = Layout::new(last_size, show_hud, (cell_w, cell_h));
                            engine.resize(layout.pixel_w, layout.pixel_h);
                        }
                        KeyAction::ToggleHelp => show_help = !show_help,
                        KeyAction::None => {}
                    }
                }
                Event::Mouse(m) => match m.kind {
                    MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                        match layout.cell_to_pixel(m.column, m.row) {
                            Some((x, y)) => engine.pointer_move(x, y),
                            None => engine.pointer_leave(),
                        }
                    }
                    _ => {}
                },
                Event::FocusLost => engine.pointer_leave(),
                Event::Resize(c, r) => {
                    last_size = (c, r);
                    layout = Layout::new(last_size, show_hud, (cell_w, cell_h));
                    engine.resize(layout.pixel_w, layout.pixel_h);
                    tracing::info!(cols = c, rows = r, "terminal resized");
                }
                _ => {}
            }
        }
        if quit {
            break Ok(());
        }

        // Resize events can be missed by some terminals.
        let sz = match crossterm::terminal::size() {
            Ok(sz) => sz,
            Err(err) => break Err(anyhow::Error::new(err).context("get terminal size")),
        };
        if sz != last_size {
            last_size = sz;
            layout = Layout::new(last_size, show_hud, (cell_w, cell_h));
            engine.resize(layout.pixel_w, layout.pixel_h);
        }

        let hud = if show_hud {
            build_hud(
                &engine.effect_names(),
                engine.active_index(),
                fps.fps(),
                last_render_ms,
                engine.device_pixel_ratio(),
                renderer.name(),
            )
        } else {
            String::new()
        };

        let pixels = engine.render(now_ms);
        let frame = Frame {
            term_cols: last_size.0,
            term_rows: last_size.1,
            visual_rows: layout.visual_rows,
            pixel_width: layout.pixel_w,
            pixel_height: layout.pixel_h,
            pixels_rgba: pixels,
            hud: &hud,
            hud_rows: layout.hud_rows,
            overlay: show_help.then_some(HELP_TEXT),
            sync_updates: cfg.sync_updates,
        };
        if let Err(err) = renderer.render(&frame, &mut out) {
            break Err(err.context("render frame"));
        }

        fps.tick();
        last_render_ms = frame_start.elapsed().as_secs_f32() * 1000.0;

        let elapsed = frame_start.elapsed();
        if elapsed < target {
            std::thread::sleep(target - elapsed);
        }
    };

    if let Err(err) = &result {
        tracing::error!(error = %format!("{err:#}"), "frame loop aborted");
    }
    finish_session(
        &mut engine,
        renderer.as_mut(),
        &mut out,
        &mut prefs,
        show_hud,
        prefs_path.as_deref(),
    );
    result
}

/// Teardown that runs however the frame loop ended. Failures here are logged, never returned,
/// so they cannot mask the loop's own error.
fn finish_session(
    engine: &mut EffectEngine,
    renderer: &mut dyn Renderer,
    out: &mut dyn Write,
    prefs: &mut AppPrefs,
    show_hud: bool,
    prefs_path: Option<&Path>,
) {
    engine.shutdown();
    if let Err(err) = renderer.finish(out) {
        tracing::warn!(%err, "renderer cleanup failed");
    }
    prefs.last_effect = Some(engine.effect_name().to_string());
    prefs.hud_visible = show_hud;
    if let Err(err) = prefs.save(prefs_path) {
        tracing::warn!(%err, "could not save prefs");
    }
}

/// Terminal split between effect rows and HUD rows, in cells and effect pixels.
#[derive(Clone, Copy, Debug)]
struct Layout {
    visual_rows: u16,
    hud_rows: u16,
    cell: (usize, usize),
    pixel_w: usize,
    pixel_h: usize,
}

impl Layout {
    fn new((cols, rows): (u16, u16), show_hud: bool, cell: (usize, usize)) -> Self {
        let hud_rows = if show_hud && rows > 1 { 1 } else { 0 };
        let visual_rows = rows.saturating_sub(hud_rows).max(1);
        Self {
            visual_rows,
            hud_rows,
            cell,
            pixel_w: (cols as usize).saturating_mul(cell.0),
            pixel_h: (visual_rows as usize).saturating_mul(cell.1),
        }
    }

    /// Centre of a terminal cell in effect pixels, or `None` over the HUD.
    fn cell_to_pixel(&self, col: u16, row: u16) -> Option<(f32, f32)> {
        if row >= self.visual_rows {
            return None;
        }
        Some((
            (col as f32 + 0.5) * self.cell.0 as f32,
            (row as f32 + 0.5) * self.cell.1 as f32,
        ))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyAction {
    None,
    Quit,
    Next,
    Prev,
    Select(usize),
    ToggleHud,
    ToggleHelp,
}

fn key_action(code: KeyCode, mods: KeyModifiers) -> KeyAction {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return KeyAction::Quit;
    }
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => KeyAction::Quit,
        KeyCode::Right | KeyCode::Char('n') | KeyCode::Char(' ') => KeyAction::Next,
        KeyCode::Left | KeyCode::Char('p') => KeyAction::Prev,
        KeyCode::Char(c @ '1'..='9') => KeyAction::Select(c as usize - '1' as usize),
        KeyCode::Char('i') | KeyCode::Char('I') => KeyAction::ToggleHud,
        KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::F(1) | KeyCode::Tab => {
            KeyAction::ToggleHelp
        }
        _ => KeyAction::None,
    }
}

fn build_hud(
    names: &[&str],
    active: usize,
    fps: f32,
    frame_ms: f32,
    dpr: f32,
    renderer: &str,
) -> String {
    let name = names.get(active).copied().unwrap_or("-");
    format!(
        "[{}/{}] {} | FPS {:>4.1} | {:>4.1} ms | dpr {:.2} | {} | ←/→ effect  i HUD  ? help  q quit",
        active + 1,
        names.len(),
        name,
        fps,
        frame_ms,
        dpr,
        renderer
    )
}

const HELP_TEXT: &str = "dither_fx keys\n\
←/→ or n/p  next/previous effect\n\
space  next effect\n\
1-9  jump to effect\n\
mouse  steer the globe, push particles\n\
i  show/hide HUD\n\
? or h or F1 or tab  toggle this help\n\
q or esc  quit";

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = self.frames as f32 / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_reserves_one_hud_row() {
        let l = Layout::new((80, 24), true, (1, 2));
        assert_eq!((l.visual_rows, l.hud_rows), (23, 1));
        assert_eq!((l.pixel_w, l.pixel_h), (80, 46));
        let l = Layout::new((80, 24), false, (2, 4));
        assert_eq!((l.pixel_w, l.pixel_h), (160, 96));
    }

    #[test]
    fn mouse_over_hud_is_not_a_pointer() {
        let l = Layout::new((80, 24), true, (2, 4));
        assert_eq!(l.cell_to_pixel(0, 0), Some((1.0, 2.0)));
        assert_eq!(l.cell_to_pixel(10, 23), None);
    }

    #[test]
    fn digit_keys_select_zero_based() {
        assert_eq!(key_action(KeyCode::Char('1'), KeyModifiers::NONE), KeyAction::Select(0));
        assert_eq!(key_action(KeyCode::Char('3'), KeyModifiers::NONE), KeyAction::Select(2));
        assert_eq!(key_action(KeyCode::Char('c'), KeyModifiers::CONTROL), KeyAction::Quit);
    }

    #[test]
    fn finish_session_tears_down_and_saves_prefs() {
        let mut tuning = Tuning::default();
        tuning.globe.points = 300;
        let mut engine = EffectEngine::new(make_effects(&tuning), 1, 160.0);
        engine.resize(160, 120);
        assert!(engine.canvas().is_some_and(|c| c.is_running()));

        let dir = std::env::temp_dir().join(format!("dither_fx_finish_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("prefs.txt");

        let mut renderer = crate::render::KittyRenderer::new();
        let mut out = Vec::new();
        let mut prefs = AppPrefs::default();
        finish_session(&mut engine, &mut renderer, &mut out, &mut prefs, false, Some(&path));

        assert!(!engine.canvas().is_some_and(|c| c.is_running()));
        assert!(String::from_utf8_lossy(&out).contains("a=d"));
        let saved = AppPrefs::load(Some(&path)).unwrap();
        assert_eq!(saved.last_effect.as_deref(), Some(engine.effect_name()));
        assert!(!saved.hud_visible);

        let _ = std::fs::remove_dir_all(&dir);
    }
}

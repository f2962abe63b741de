use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};
use dither_fx::tuning::Tuning;
use dither_fx::visual::{make_effects, resolve_effect_index, EffectEngine};

const DEFAULT_OUTPUT: &str = "export.mp4";

/// Scripted pointer motion, standing in for a mouse during offline export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum PointerPath {
    None,
    /// Slow Lissajous loop around the centre.
    Orbit,
    /// Left-to-right pass along the middle row, then off-canvas.
    Sweep,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "export_video",
    version,
    about = "Offline effect export (raw RGBA frames -> MP4 via ffmpeg)"
)]
pub(crate) struct Cli {
    #[arg(long, value_name = "MP4", default_value = DEFAULT_OUTPUT)]
    pub(crate) out: PathBuf,

    #[arg(long, default_value_t = 1280)]
    pub(crate) width: usize,

    #[arg(long, default_value_t = 720)]
    pub(crate) height: usize,

    #[arg(long, default_value_t = 60)]
    pub(crate) fps: u32,

    #[arg(long, value_name = "SECONDS", default_value_t = 10.0)]
    pub(crate) duration: f32,

    #[arg(long, value_name = "INDEX_OR_SUBSTRING")]
    pub(crate) effect: Option<String>,

    /// Logical width; defaults to `--width` (one device pixel per logical pixel).
    #[arg(long)]
    pub(crate) logical_width: Option<f32>,

    #[arg(long)]
    pub(crate) tuning: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = PointerPath::None)]
    pub(crate) pointer: PointerPath,
}

pub(crate) fn compute_frame_count(duration_s: f32, fps: u32) -> usize {
    ((duration_s.max(0.0) * fps as f32).floor() as usize).max(1)
}

pub(crate) fn validate_args(args: &Cli) -> Result<()> {
    if args.width == 0 {
        bail!("--width must be >= 1");
    }
    if args.height == 0 {
        bail!("--height must be >= 1");
    }
    if args.fps == 0 {
        bail!("--fps must be >= 1");
    }
    if !(args.duration > 0.0) {
        bail!("--duration must be > 0 seconds");
    }
    if let Some(lw) = args.logical_width {
        if !(lw > 0.0) {
            bail!("--logical-width must be > 0");
        }
    }
    Ok(())
}

/// Pointer position in physical pixels at `t_s`, or `None` when it is off the canvas.
pub(crate) fn pointer_at(path: PointerPath, t_s: f32, w: f32, h: f32) -> Option<(f32, f32)> {
    match path {
        PointerPath::None => None,
        PointerPath::Orbit => {
            let x = w * (0.5 + 0.35 * (t_s * 0.7).sin());
            let y = h * (0.5 + 0.3 * (t_s * 1.1).sin());
            Some((x, y))
        }
        PointerPath::Sweep => {
            // 6 s on the canvas, 2 s away.
            let phase = t_s.rem_euclid(8.0);
            (phase < 6.0).then(|| (w * phase / 6.0, h * 0.5))
        }
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();
    run(args)
}

fn run(args: Cli) -> Result<()> {
    validate_args(&args)?;
    ensure_ffmpeg_available()?;

    let tuning = match args.tuning.as_deref() {
        Some(path) => {
            Tuning::load(path).with_context(|| format!("load tuning file {}", path.display()))?
        }
        None => Tuning::default(),
    };
    let effects = make_effects(&tuning);
    let names = effects.iter().map(|e| e.name()).collect::<Vec<_>>();
    let active = resolve_effect_index(args.effect.as_deref(), &names)?;
    let logical_width = args.logical_width.unwrap_or(args.width as f32);
    let mut engine = EffectEngine::new(effects, active, logical_width);
    engine.resize(args.width, args.height);

    let mut parent = args.out.parent().unwrap_or_else(|| Path::new(""));
    if parent == Path::new("") {
        parent = Path::new(".");
    }
    fs::create_dir_all(parent)
        .with_context(|| format!("create output directory {}", parent.display()))?;

    let frame_count = compute_frame_count(args.duration, args.fps);
    let mut ffmpeg = spawn_ffmpeg(&args.out, args.width, args.height, args.fps)?;
    let mut ffmpeg_in = ffmpeg
        .stdin
        .take()
        .context("failed to open ffmpeg stdin for rawvideo input")?;

    render_frames(
        &mut engine,
        args.pointer,
        frame_count,
        args.fps,
        (args.width, args.height),
        &mut ffmpeg_in,
    )?;
    drop(ffmpeg_in);
    engine.shutdown();

    let status = ffmpeg.wait().context("wait for ffmpeg")?;
    if !status.success() {
        bail!("ffmpeg exited with status {status}");
    }

    println!(
        "exported {} frames of '{}' @ {} fps -> {}",
        frame_count,
        engine.effect_name(),
        args.fps,
        args.out.display()
    );
    Ok(())
}

fn ensure_ffmpeg_available() -> Result<()> {
    match Command::new("ffmpeg")
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            bail!("ffmpeg not found in PATH (install ffmpeg and retry)")
        }
        Err(err) => Err(anyhow!("failed to run ffmpeg: {err}")),
    }
}

fn spawn_ffmpeg(out_path: &Path, width: usize, height: usize, fps: u32) -> Result<std::process::Child> {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-hide_banner", "-loglevel", "error", "-y"])
        .args(["-f", "rawvideo", "-pix_fmt", "rgba"])
        .arg("-video_size")
        .arg(format!("{width}x{height}"))
        .arg("-framerate")
        .arg(fps.to_string())
        .args(["-i", "-"])
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p"])
        .args(["-movflags", "+faststart"])
        .arg(out_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    cmd.spawn()
        .with_context(|| format!("spawn ffmpeg for output {}", out_path.display()))
}

fn render_frames(
    engine: &mut EffectEngine,
    pointer: PointerPath,
    frame_count: usize,
    fps: u32,
    (width, height): (usize, usize),
    sink: &mut dyn Write,
) -> Result<()> {
    let fps_f = fps as f64;
    for frame_idx in 0..frame_count {
        let t_s = frame_idx as f64 / fps_f;
        match pointer_at(pointer, t_s as f32, width as f32, height as f32) {
            Some((x, y)) => engine.pointer_move(x, y),
            None => engine.pointer_leave(),
        }
        let pixels = engine.render(t_s * 1000.0);
        sink.write_all(pixels).context("write frame to ffmpeg stdin")?;
    }
    Ok(())
}

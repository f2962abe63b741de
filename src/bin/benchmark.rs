use std::time::{Duration, Instant};

use anyhow::Result;
use dither_fx::tuning::Tuning;
use dither_fx::visual::{make_effects, EffectEngine};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Args {
    pub(crate) frames: usize,
    pub(crate) switch_frames: usize,
    pub(crate) w: usize,
    pub(crate) h: usize,
    pub(crate) logical_width: Option<f32>,
    pub(crate) pointer: bool,
    pub(crate) ci_smoke: bool,
    pub(crate) quick: bool,
    pub(crate) max_ms: f64,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            frames: 120,
            switch_frames: 60,
            w: 800,
            h: 600,
            logical_width: None,
            pointer: true,
            ci_smoke: false,
            quick: false,
            max_ms: 20.0,
        }
    }
}

pub(crate) fn parse_args_from(argv: &[String]) -> Args {
    let mut args = Args::default();
    let mut i = 0usize;
    while i < argv.len() {
        let k = argv[i].as_str();
        let v = argv.get(i + 1).map(|s| s.as_str());
        match (k, v) {
            ("--frames", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.frames = n.max(1);
                }
                i += 2;
            }
            ("--switch-frames", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.switch_frames = n.max(1);
                }
                i += 2;
            }
            ("--w", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.w = n.max(1);
                }
                i += 2;
            }
            ("--h", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.h = n.max(1);
                }
                i += 2;
            }
            ("--logical-width", Some(x)) => {
                if let Ok(v) = x.parse::<f32>() {
                    args.logical_width = (v > 0.0).then_some(v);
                }
                i += 2;
            }
            ("--pointer", Some(x)) => {
                if let Some(v) = parse_bool(x) {
                    args.pointer = v;
                }
                i += 2;
            }
            ("--ci-smoke", Some(x)) if !x.starts_with("--") => {
                args.ci_smoke = parse_bool(x).unwrap_or(true);
                i += 2;
            }
            ("--ci-smoke", _) => {
                args.ci_smoke = true;
                i += 1;
            }
            ("--quick", Some(x)) if !x.starts_with("--") => {
                args.quick = parse_bool(x).unwrap_or(true);
                i += 2;
            }
            ("--quick", _) => {
                args.quick = true;
                i += 1;
            }
            ("--max-ms", Some(x)) => {
                if let Ok(v) = x.parse::<f64>() {
                    args.max_ms = v.max(0.1);
                }
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    if args.quick {
        args.frames = args.frames.min(30);
        args.switch_frames = args.switch_frames.min(24);
    }
    args
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Slow loop over the canvas in physical pixels.
fn synth_pointer(t: f32, w: usize, h: usize) -> (f32, f32) {
    (
        w as f32 * (0.5 + 0.35 * (t * 0.7).sin()),
        h as f32 * (0.5 + 0.3 * (t * 1.1).sin()),
    )
}

fn lit(px: &[u8]) -> bool {
    px.chunks_exact(4).any(|p| p[0] != 0 || p[1] != 0 || p[2] != 0)
}

fn new_engine(args: &Args, active: usize) -> EffectEngine {
    let effects = make_effects(&Tuning::default());
    let mut engine = EffectEngine::new(effects, active, args.logical_width.unwrap_or(args.w as f32));
    engine.resize(args.w, args.h);
    engine
}

fn bench_switching(args: &Args) {
    let mut engine = new_engine(args, 0);
    let frames = args.switch_frames.max(1);
    let start = Instant::now();
    let mut lit_frames = 0usize;
    for f in 0..frames {
        let now_ms = f as f64 * 1000.0 / 60.0;
        // Remount every 8 frames so resize/regeneration cost is included.
        if f > 0 && f % 8 == 0 {
            engine.next_effect(now_ms);
        }
        if lit(engine.render(now_ms)) {
            lit_frames += 1;
        }
    }
    let ms = start.elapsed().as_secs_f64() * 1000.0 / frames as f64;
    println!(
        "Effect switching:   {:>8.3} ms/frame  final={}  lit={:>3}/{}",
        ms,
        engine.effect_name(),
        lit_frames,
        frames
    );
}

fn bench_effects(args: &Args) -> Result<()> {
    let count = make_effects(&Tuning::default()).len();
    let mut total_time = Duration::ZERO;
    let mut total_frames = 0usize;
    let mut black = Vec::new();
    let mut slow = Vec::new();

    println!(
        "Effect benchmark: effects={} frames/effect={} size={}x{} pointer={} quick={}",
        count, args.frames, args.w, args.h, args.pointer, args.quick
    );

    for idx in 0..count {
        let mut engine = new_engine(args, idx);
        let name = engine.effect_name();
        let start = Instant::now();
        let mut lit_frames = 0usize;
        for f in 0..args.frames {
            let t = f as f32 / 60.0;
            if args.pointer {
                let (x, y) = synth_pointer(t, args.w, args.h);
                engine.pointer_move(x, y);
            }
            if lit(engine.render(t as f64 * 1000.0)) {
                lit_frames += 1;
            }
        }
        engine.shutdown();

        let elapsed = start.elapsed();
        total_time += elapsed;
        total_frames += args.frames;
        let ms = elapsed.as_secs_f64() * 1000.0 / args.frames as f64;
        println!(
            "{:>2}. {:<28} {:>8.3} ms/frame  dpr={:.2}  lit={:>3}/{}",
            idx,
            name,
            ms,
            engine.device_pixel_ratio(),
            lit_frames,
            args.frames
        );
        if lit_frames == 0 {
            black.push(name.to_string());
        }
        if args.ci_smoke && ms > args.max_ms {
            slow.push((name.to_string(), ms));
        }
    }

    let avg_ms = total_time.as_secs_f64() * 1000.0 / total_frames.max(1) as f64;
    let fps = if avg_ms > 0.0 { 1000.0 / avg_ms } else { 0.0 };
    println!("Summary: {:>8.3} ms/frame avg  {:>7.2} FPS", avg_ms, fps);

    bench_switching(args);

    if args.ci_smoke {
        if !black.is_empty() || !slow.is_empty() {
            eprintln!("CI smoke: FAIL");
            if !black.is_empty() {
                eprintln!("  black effects: {}", black.join(", "));
            }
            for (name, ms) in slow {
                eprintln!("  slow effect: {} ({:.3} ms/frame > {:.3})", name, ms, args.max_ms);
            }
            anyhow::bail!("ci smoke failed");
        }
        println!("CI smoke: PASS (max_ms={:.3})", args.max_ms);
    }
    Ok(())
}

fn main() -> Result<()> {
    let argv = std::env::args().skip(1).collect::<Vec<_>>();
    let args = parse_args_from(&argv);
    bench_effects(&args)
}

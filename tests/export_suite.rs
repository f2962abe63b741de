#[allow(dead_code)]
#[path = "../src/bin/export_video.rs"]
mod export_video;

#[allow(dead_code)]
#[path = "../src/bin/benchmark.rs"]
mod benchmark;

use clap::Parser;
use export_video::PointerPath;
use std::path::PathBuf;

fn argv(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn parse_args_defaults_are_stable() {
    let args = export_video::Cli::try_parse_from(["export_video"]).expect("parse should succeed");

    assert_eq!(args.out, PathBuf::from("export.mp4"));
    assert_eq!(args.width, 1280);
    assert_eq!(args.height, 720);
    assert_eq!(args.fps, 60);
    assert_eq!(args.duration, 10.0);
    assert_eq!(args.effect, None);
    assert_eq!(args.logical_width, None);
    assert_eq!(args.tuning, None);
    assert_eq!(args.pointer, PointerPath::None);
}

#[test]
fn parse_args_overrides_work() {
    let args = export_video::Cli::try_parse_from([
        "export_video",
        "--out",
        "clips/out.mp4",
        "--width",
        "640",
        "--height",
        "360",
        "--fps",
        "30",
        "--duration",
        "12.5",
        "--effect",
        "terrain",
        "--logical-width",
        "320",
        "--tuning",
        "look.tuning",
        "--pointer",
        "sweep",
    ])
    .expect("parse should succeed");

    assert_eq!(args.out, PathBuf::from("clips/out.mp4"));
    assert_eq!(args.width, 640);
    assert_eq!(args.height, 360);
    assert_eq!(args.fps, 30);
    assert_eq!(args.duration, 12.5);
    assert_eq!(args.effect.as_deref(), Some("terrain"));
    assert_eq!(args.logical_width, Some(320.0));
    assert_eq!(args.tuning, Some(PathBuf::from("look.tuning")));
    assert_eq!(args.pointer, PointerPath::Sweep);
}

#[test]
fn parse_rejects_unknown_pointer_path() {
    let err = export_video::Cli::try_parse_from(["export_video", "--pointer", "zigzag"]);
    assert!(err.is_err());
}

#[test]
fn validate_rejects_degenerate_geometry() {
    let mut args = export_video::Cli::try_parse_from(["export_video"]).unwrap();
    assert!(export_video::validate_args(&args).is_ok());

    args.width = 0;
    let err = export_video::validate_args(&args).unwrap_err();
    assert!(err.to_string().contains("--width"));

    args.width = 64;
    args.fps = 0;
    let err = export_video::validate_args(&args).unwrap_err();
    assert!(err.to_string().contains("--fps"));
}

#[test]
fn validate_rejects_non_positive_duration_and_logical_width() {
    let mut args = export_video::Cli::try_parse_from(["export_video"]).unwrap();
    args.duration = 0.0;
    let err = export_video::validate_args(&args).unwrap_err();
    assert!(err.to_string().contains("--duration"));

    args.duration = f32::NAN;
    assert!(export_video::validate_args(&args).is_err());

    args.duration = 1.0;
    args.logical_width = Some(0.0);
    let err = export_video::validate_args(&args).unwrap_err();
    assert!(err.to_string().contains("--logical-width"));
}

#[test]
fn duration_and_frame_math_is_deterministic() {
    assert_eq!(export_video::compute_frame_count(10.0, 60), 600);
    assert_eq!(export_video::compute_frame_count(2.5, 24), 60);
    assert_eq!(export_video::compute_frame_count(0.01, 30), 1);
}

#[test]
fn frame_count_is_repeatable_for_fractional_edges() {
    let a = export_video::compute_frame_count(1.999, 60);
    let b = export_video::compute_frame_count(1.999, 60);
    assert_eq!(a, b);
    assert_eq!(a, 119);
}

#[test]
fn orbit_pointer_stays_on_canvas() {
    for i in 0..600 {
        let t = i as f32 / 60.0;
        let (x, y) = export_video::pointer_at(PointerPath::Orbit, t, 800.0, 600.0)
            .expect("orbit is always on the canvas");
        assert!((0.0..=800.0).contains(&x));
        assert!((0.0..=600.0).contains(&y));
    }
}

#[test]
fn sweep_pointer_leaves_between_passes() {
    let (x, y) = export_video::pointer_at(PointerPath::Sweep, 3.0, 600.0, 400.0).unwrap();
    assert_eq!((x, y), (300.0, 200.0));
    assert_eq!(export_video::pointer_at(PointerPath::Sweep, 7.0, 600.0, 400.0), None);
    assert!(export_video::pointer_at(PointerPath::Sweep, 8.5, 600.0, 400.0).is_some());
    assert_eq!(export_video::pointer_at(PointerPath::None, 1.0, 600.0, 400.0), None);
}

#[test]
fn benchmark_defaults() {
    let args = benchmark::parse_args_from(&[]);
    assert_eq!(args, benchmark::Args::default());
    assert_eq!((args.w, args.h), (800, 600));
    assert!(args.pointer);
    assert!(!args.ci_smoke);
}

#[test]
fn benchmark_flags_override_and_clamp() {
    let args = benchmark::parse_args_from(&argv(&[
        "--frames",
        "0",
        "--w",
        "320",
        "--h",
        "240",
        "--logical-width",
        "160",
        "--pointer",
        "off",
        "--max-ms",
        "0",
        "--ci-smoke",
    ]));
    assert_eq!(args.frames, 1);
    assert_eq!((args.w, args.h), (320, 240));
    assert_eq!(args.logical_width, Some(160.0));
    assert!(!args.pointer);
    assert_eq!(args.max_ms, 0.1);
    assert!(args.ci_smoke);
}

#[test]
fn benchmark_quick_caps_frame_counts() {
    let args = benchmark::parse_args_from(&argv(&["--quick", "--frames", "500"]));
    assert!(args.quick);
    assert_eq!(args.frames, 30);
    assert_eq!(args.switch_frames, 24);
}

#[test]
fn benchmark_ignores_unparseable_values() {
    let args = benchmark::parse_args_from(&argv(&["--frames", "many", "--bogus", "--w", "-3"]));
    assert_eq!(args.frames, 120);
    assert_eq!(args.w, 800);
}

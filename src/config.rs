use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "dither_fx",
    version,
    about = "Dithered globe, Voronoi terrain and particle network effects in the terminal"
)]
pub struct Config {
    /// Effect to start with: index or (partial) name. Defaults to the last one used.
    #[arg(long)]
    pub effect: Option<String>,

    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..=240))]
    pub fps: u32,

    /// Logical canvas width; physical pixels per logical pixel are derived from it.
    #[arg(long, default_value_t = 720.0)]
    pub logical_width: f32,

    /// `key=value` tuning file.
    #[arg(long)]
    pub tuning: Option<PathBuf>,

    /// Write tracing output here; nothing is logged without it.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Show the status line. Defaults to the last saved choice.
    #[arg(long, action = clap::ArgAction::Set)]
    pub hud: Option<bool>,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(alias = "ansi", alias = "text")]
    Ascii,
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
    #[value(alias = "hires", alias = "dots")]
    Braille,
    Kitty,
}

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cfg = dither_fx::config::Config::parse();
    dither_fx::logging::init(cfg.log_file.as_deref())?;
    dither_fx::app::run(cfg)
}

pub mod app;
pub mod config;
pub mod logging;
pub mod prefs;
pub mod render;
pub mod terminal;
pub mod tuning;
pub mod visual;

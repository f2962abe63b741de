use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::visual::{GlobeParams, ParticleParams, TerrainParams};

pub const DEFAULT_SEED: u64 = 0x00D1_7E5F_2026;

/// Visual knobs loaded from a `key=value` file. Every key is optional; absent keys keep
/// the stock look.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub seed: u64,
    pub globe: GlobeParams,
    pub globe_smoothing: f32,
    pub terrain: TerrainParams,
    pub particles: ParticleParams,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            globe: GlobeParams::default(),
            globe_smoothing: 0.06,
            terrain: TerrainParams::default(),
            particles: ParticleParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TuningError {
    Io(String),
    Parse { line: usize, message: String },
    InvalidValue { field: &'static str, message: String },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Parse { line, message } => write!(f, "parse error at line {line}: {message}"),
            Self::InvalidValue { field, message } => {
                write!(f, "invalid value for {field}: {message}")
            }
        }
    }
}

impl std::error::Error for TuningError {}

impl Tuning {
    pub fn parse(text: &str) -> Result<Self, TuningError> {
        let mut tuning = Self::default();
        let mut seen = HashSet::new();

        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (key, value) = trimmed.split_once('=').ok_or(TuningError::Parse {
                line: line_no,
                message: "expected <key>=<value>".to_string(),
            })?;
            let key = key.trim();
            let value = value.trim();

            match key {
                "seed" => tuning.seed = parse_u64(value, line_no, "seed")?,
                "globe.points" => tuning.globe.points = parse_usize(value, line_no, "globe.points")?,
                "globe.land_threshold" => {
                    tuning.globe.land_threshold = parse_f32(value, line_no, "globe.land_threshold")?
                }
                "globe.node_fraction" => {
                    tuning.globe.node_fraction = parse_f32(value, line_no, "globe.node_fraction")?
                }
                "globe.edge_distance" => {
                    tuning.globe.edge_distance = parse_f32(value, line_no, "globe.edge_distance")?
                }
                "globe.smoothing" => {
                    tuning.globe_smoothing = parse_f32(value, line_no, "globe.smoothing")?
                }
                "terrain.seeds" => {
                    tuning.terrain.seeds = parse_usize(value, line_no, "terrain.seeds")?
                }
                "terrain.ridge_falloff" => {
                    tuning.terrain.ridge_falloff =
                        parse_f32(value, line_no, "terrain.ridge_falloff")?
                }
                "terrain.height_scale" => {
                    tuning.terrain.height_scale = parse_f32(value, line_no, "terrain.height_scale")?
                }
                "particles.max_nodes" => {
                    tuning.particles.max_nodes = parse_usize(value, line_no, "particles.max_nodes")?
                }
                "particles.link_distance" => {
                    tuning.particles.link_distance =
                        parse_f32(value, line_no, "particles.link_distance")?
                }
                _ => {
                    return Err(TuningError::Parse {
                        line: line_no,
                        message: format!("unknown key '{key}'"),
                    });
                }
            }
            if !seen.insert(key) {
                return Err(TuningError::Parse {
                    line: line_no,
                    message: format!("duplicate '{key}' field"),
                });
            }
        }

        tuning.validate()?;
        Ok(tuning)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let text =
            std::fs::read_to_string(path.as_ref()).map_err(|e| TuningError::Io(e.to_string()))?;
        Self::parse(&text)
    }

    pub fn to_text(&self) -> String {
        [
            format!("seed={}", self.seed),
            format!("globe.points={}", self.globe.points),
            format!("globe.land_threshold={}", self.globe.land_threshold),
            format!("globe.node_fraction={}", self.globe.node_fraction),
            format!("globe.edge_distance={}", self.globe.edge_distance),
            format!("globe.smoothing={}", self.globe_smoothing),
            format!("terrain.seeds={}", self.terrain.seeds),
            format!("terrain.ridge_falloff={}", self.terrain.ridge_falloff),
            format!("terrain.height_scale={}", self.terrain.height_scale),
            format!("particles.max_nodes={}", self.particles.max_nodes),
            format!("particles.link_distance={}", self.particles.link_distance),
        ]
        .join("\n")
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        if self.globe.points == 0 || self.globe.points > 200_000 {
            return Err(invalid("globe.points", "must be in 1..=200000"));
        }
        if !(0.0..=1.0).contains(&self.globe.land_threshold) {
            return Err(invalid("globe.land_threshold", "must be in [0,1]"));
        }
        if !(0.0..=1.0).contains(&self.globe.node_fraction) {
            return Err(invalid("globe.node_fraction", "must be in [0,1]"));
        }
        if !(0.0..=2.0).contains(&self.globe.edge_distance) {
            return Err(invalid("globe.edge_distance", "must be in [0,2]"));
        }
        if !(self.globe_smoothing > 0.0 && self.globe_smoothing <= 1.0) {
            return Err(invalid("globe.smoothing", "must be in (0,1]"));
        }
        if self.terrain.seeds > 4096 {
            return Err(invalid("terrain.seeds", "must be <= 4096"));
        }
        if !(self.terrain.ridge_falloff > 0.0) {
            return Err(invalid("terrain.ridge_falloff", "must be > 0"));
        }
        if self.terrain.height_scale < 0.0 {
            return Err(invalid("terrain.height_scale", "must be >= 0"));
        }
        if self.particles.max_nodes > 2000 {
            return Err(invalid("particles.max_nodes", "must be <= 2000"));
        }
        if !(self.particles.link_distance > 0.0) {
            return Err(invalid("particles.link_distance", "must be > 0"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, message: &str) -> TuningError {
    TuningError::InvalidValue {
        field,
        message: message.to_string(),
    }
}

fn parse_u64(s: &str, line: usize, field: &'static str) -> Result<u64, TuningError> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse::<u64>(),
    };
    parsed.map_err(|_| TuningError::Parse {
        line,
        message: format!("invalid integer for {field}"),
    })
}

fn parse_usize(s: &str, line: usize, field: &'static str) -> Result<usize, TuningError> {
    s.parse::<usize>().map_err(|_| TuningError::Parse {
        line,
        message: format!("invalid integer for {field}"),
    })
}

fn parse_f32(s: &str, line: usize, field: &'static str) -> Result<f32, TuningError> {
    let v = s.parse::<f32>().map_err(|_| TuningError::Parse {
        line,
        message: format!("invalid float for {field}"),
    })?;
    if !v.is_finite() {
        return Err(TuningError::Parse {
            line,
            message: format!("invalid float for {field}"),
        });
    }
    Ok(v)
}

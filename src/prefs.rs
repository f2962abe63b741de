use std::fmt;
use std::path::{Path, PathBuf};

/// Settings remembered between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPrefs {
    /// Name of the effect that was showing on exit.
    pub last_effect: Option<String>,
    pub hud_visible: bool,
}

impl Default for AppPrefs {
    fn default() -> Self {
        Self {
            last_effect: None,
            hud_visible: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefsError {
    Io(String),
    Parse { line: usize, message: String },
}

impl fmt::Display for PrefsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Parse { line, message } => write!(f, "parse error at line {line}: {message}"),
        }
    }
}

impl std::error::Error for PrefsError {}

impl AppPrefs {
    pub fn parse(text: &str) -> Result<Self, PrefsError> {
        let mut prefs = Self::default();
        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(PrefsError::Parse {
                    line: line_no,
                    message: "expected <key>=<value>".to_string(),
                });
            };
            let value = value.trim();
            match key.trim() {
                "last_effect" => {
                    prefs.last_effect = (!value.is_empty()).then(|| value.to_string());
                }
                "hud" => {
                    prefs.hud_visible = parse_bool(value).ok_or_else(|| PrefsError::Parse {
                        line: line_no,
                        message: "hud must be true/false".to_string(),
                    })?;
                }
                // Keys from newer versions are ignored.
                _ => {}
            }
        }
        Ok(prefs)
    }

    pub fn load(path: Option<&Path>) -> Result<Self, PrefsError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(PrefsError::Io(err.to_string())),
        }
    }

    pub fn to_text(&self) -> String {
        format!(
            "# dither_fx prefs v1\nlast_effect={}\nhud={}\n",
            self.last_effect.as_deref().unwrap_or(""),
            self.hud_visible
        )
    }

    /// Writes through a sibling temp file and renames it into place.
    pub fn save(&self, path: Option<&Path>) -> Result<(), PrefsError> {
        let Some(path) = path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PrefsError::Io(e.to_string()))?;
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, self.to_text()).map_err(|e| PrefsError::Io(e.to_string()))?;
        std::fs::rename(&tmp, path).map_err(|e| PrefsError::Io(e.to_string()))
    }
}

pub fn prefs_storage_path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            return Some(PathBuf::from(xdg).join("dither_fx").join("prefs.txt"));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("dither_fx")
            .join("prefs.txt"),
    )
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::engine::mapper::{Clef, StaffMode};

pub const MAX_NOTE_LIMIT: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClefMode {
    #[default]
    Treble,
    Bass,
    Grand,
}

impl ClefMode {
    pub const ALL: [ClefMode; 3] = [ClefMode::Treble, ClefMode::Bass, ClefMode::Grand];

    pub fn staff_mode(self) -> StaffMode {
        match self {
            ClefMode::Treble => StaffMode::Single(Clef::Treble),
            ClefMode::Bass => StaffMode::Single(Clef::Bass),
            ClefMode::Grand => StaffMode::Grand,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClefMode::Treble => "treble",
            ClefMode::Bass => "bass",
            ClefMode::Grand => "grand",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_min_notes")]
    pub min_notes: usize,
    #[serde(default = "default_max_notes")]
    pub max_notes: usize,
    #[serde(default = "default_limit_enabled")]
    pub limit_enabled: bool,
    #[serde(default = "default_volume")]
    pub volume: u8,
    #[serde(default)]
    pub clef_mode: ClefMode,
    #[serde(default = "default_include_accidentals")]
    pub include_accidentals: bool,
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_min_notes() -> usize {
    1
}
fn default_max_notes() -> usize {
    3
}
fn default_limit_enabled() -> bool {
    true
}
fn default_volume() -> u8 {
    80
}
fn default_include_accidentals() -> bool {
    false
}
fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_notes: default_min_notes(),
            max_notes: default_max_notes(),
            limit_enabled: default_limit_enabled(),
            volume: default_volume(),
            clef_mode: ClefMode::default(),
            include_accidentals: default_include_accidentals(),
            theme: default_theme(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.normalize();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("earstaff")
            .join("config.toml")
    }

    /// Pull hand-edited values back into range. `max_notes` wins over
    /// `min_notes` when they cross.
    pub fn normalize(&mut self) {
        self.max_notes = self.max_notes.clamp(1, MAX_NOTE_LIMIT);
        self.min_notes = self.min_notes.clamp(1, self.max_notes);
        self.volume = self.volume.min(100);
    }
}

//! Game settings and preferences
//!
//! Chosen before a session starts; a running session never reads them again.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{BALL_BASE_SPEED, DEFAULT_MESSAGE};

/// Difficulty tier: fixes ball speed and selects the leaderboard partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Ball speed multiplier for this tier
    pub fn speed_multiplier(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.8,
            Difficulty::Medium => 1.2,
            Difficulty::Hard => 1.6,
        }
    }

    /// Ball speed per step before the playfield scale is applied
    pub fn ball_speed(&self) -> f32 {
        BALL_BASE_SPEED * self.speed_multiplier()
    }
}

/// Pre-start configuration for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub difficulty: Difficulty,
    /// Identity tag shown on the leaderboard
    pub company_name: String,
    /// Text rendered as destructible cells
    pub message: String,
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Fixed launch seed; the start timestamp is used when unset
    pub seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            company_name: String::new(),
            message: DEFAULT_MESSAGE.to_string(),
            viewport_width: crate::consts::BASE_VIEWPORT_WIDTH,
            viewport_height: crate::consts::BASE_VIEWPORT_HEIGHT,
            seed: None,
        }
    }
}

impl GameSettings {
    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring malformed settings in {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Identity after trimming; empty means the player has not entered one
    pub fn trimmed_company_name(&self) -> &str {
        self.company_name.trim()
    }
}

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Segments in a fresh snake. They start stacked in one column.
pub const START_LENGTH: i32 = 3;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("grid must be at least {}x1 to fit the starting snake, got {height}x{width}", START_LENGTH)]
    GridTooSmall { height: i32, width: i32 },
    #[error("{kind} min_life {min} is greater than max_life {max}")]
    LifeRange { kind: &'static str, min: u32, max: u32 },
    #[error("tick interval must be a positive number of seconds, got {0}")]
    TickInterval(f64),
}

/// Spawning and scoring for one kind of timed entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Chance of one spawn per tick
    pub probability: f64,
    /// Shortest lifetime, in ticks
    pub min_life: u32,
    /// Longest lifetime, in ticks
    pub max_life: u32,
    pub score: i64,
}

impl EntityConfig {
    pub fn food() -> Self {
        EntityConfig { probability: 0.06, min_life: 80, max_life: 110, score: 300 }
    }

    pub fn trap() -> Self {
        EntityConfig { probability: 0.04, min_life: 250, max_life: 300, score: 250 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Symbols {
    pub snake: char,
    pub food: char,
    pub trap: char,
    pub blank: char,
}

impl Default for Symbols {
    fn default() -> Self {
        Symbols { snake: '0', food: '%', trap: '^', blank: ' ' }
    }
}

/// Configuration for a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub height: i32,
    pub width: i32,
    /// Seconds between ticks
    pub tick_interval: f64,
    pub food: EntityConfig,
    pub trap: EntityConfig,
    /// Tail segments a trap takes off
    pub trap_damage: usize,
    pub symbols: Symbols,
    /// Fixes food and trap placement when set
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            height: 15,
            width: 40,
            tick_interval: 1.0 / 6.5,
            food: EntityConfig::food(),
            trap: EntityConfig::trap(),
            trap_damage: 8,
            symbols: Symbols::default(),
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.height < START_LENGTH || self.width < 1 {
            return Err(ConfigError::GridTooSmall { height: self.height, width: self.width });
        }

        for (kind, entity) in [("food", &self.food), ("trap", &self.trap)].iter() {
            if entity.min_life > entity.max_life {
                return Err(ConfigError::LifeRange { kind: *kind, min: entity.min_life, max: entity.max_life });
            }
        }

        if !self.tick_interval.is_finite() || self.tick_interval <= 0.0 {
            return Err(ConfigError::TickInterval(self.tick_interval));
        }

        Ok(())
    }
}

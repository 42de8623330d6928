//! Scenario loading and configuration.
//!
//! Scenarios define the initial state for headless runs: map size,
//! players with their starting units and balances, resource fields, and
//! per-player AI settings.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use skirmish_ai::types::ResourceKind;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
}

/// One starting unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UnitPlacement {
    /// Unit type id.
    pub ty: u32,
    /// Cell x.
    pub x: i32,
    /// Cell y.
    pub y: i32,
}

impl UnitPlacement {
    /// Shorthand constructor.
    #[must_use]
    pub const fn new(ty: u32, x: i32, y: i32) -> Self {
        Self { ty, x, y }
    }
}

/// One resource field cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResourcePlacement {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Cell x.
    pub x: i32,
    /// Cell y.
    pub y: i32,
}

/// One player's starting state and AI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSetup {
    /// Player id.
    pub id: u32,
    /// Difficulty-derived decision delay in seconds.
    pub delay_seconds: f32,
    /// Controller RNG seed (combined with the run seed).
    pub seed: u64,
    /// Starting minerals.
    pub minerals: i64,
    /// Starting oil.
    pub oil: i64,
    /// Starting units.
    pub units: Vec<UnitPlacement>,
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Map dimensions (width, height) in cells.
    pub map_size: (i32, i32),
    /// Player setups.
    pub players: Vec<PlayerSetup>,
    /// Resource fields.
    pub resources: Vec<ResourcePlacement>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::skirmish_1v1()
    }
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// The standard 1v1 skirmish: a command centre and a scout each,
    /// with mineral and oil fields near both bases.
    #[must_use]
    pub fn skirmish_1v1() -> Self {
        // Stock roster type ids.
        let command_center = 5;
        let tank = 10010;

        Self {
            name: "Standard 1v1 Skirmish".to_string(),
            description: "Two AI players on mirrored starts".to_string(),
            map_size: (128, 128),
            players: vec![
                PlayerSetup {
                    id: 1,
                    delay_seconds: 1.0,
                    seed: 101,
                    minerals: 4000,
                    oil: 2000,
                    units: vec![
                        UnitPlacement::new(command_center, 16, 64),
                        UnitPlacement::new(tank, 20, 64),
                    ],
                },
                PlayerSetup {
                    id: 2,
                    delay_seconds: 1.0,
                    seed: 202,
                    minerals: 4000,
                    oil: 2000,
                    units: vec![
                        UnitPlacement::new(command_center, 112, 64),
                        UnitPlacement::new(tank, 108, 64),
                    ],
                },
            ],
            resources: vec![
                ResourcePlacement { kind: ResourceKind::Minerals, x: 24, y: 56 },
                ResourcePlacement { kind: ResourceKind::Minerals, x: 25, y: 56 },
                ResourcePlacement { kind: ResourceKind::Oil, x: 24, y: 72 },
                ResourcePlacement { kind: ResourceKind::Minerals, x: 104, y: 56 },
                ResourcePlacement { kind: ResourceKind::Minerals, x: 103, y: 56 },
                ResourcePlacement { kind: ResourceKind::Oil, x: 104, y: 72 },
            ],
        }
    }
}

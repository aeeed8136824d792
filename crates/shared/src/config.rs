//! Configuration types for Tally

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::TallyError;

/// Where the store reads and writes in the document database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Collection holding one document per sector
    pub sectors_collection: String,

    /// Path of the event config singleton
    pub config_document: String,

    /// Capacity of the store event broadcast channel
    pub event_buffer: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sectors_collection: "sectores".to_string(),
            config_document: "config/evento".to_string(),
            event_buffer: 64,
        }
    }
}

/// Board display settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardConfig {
    /// How often the countdown is recomputed
    pub tick_interval_ms: u64,

    /// Time zone the event date/time is expressed in.
    /// `None` means the machine's local time zone.
    pub utc_offset_minutes: Option<i32>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            utc_offset_minutes: None,
        }
    }
}

impl BoardConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Initial data loaded into a fresh gateway
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedConfig {
    #[serde(default)]
    pub event: Option<SeedEvent>,

    #[serde(default)]
    pub sectors: Vec<SeedSector>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedEvent {
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSector {
    pub name: String,
    pub manager: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendee_count: Option<u64>,
}

/// Top-level configuration file (`tally.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TallyConfig {
    pub store: StoreConfig,

    pub board: BoardConfig,

    /// Fallback filter when `RUST_LOG` is unset
    pub log_level: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<SeedConfig>,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            board: BoardConfig::default(),
            log_level: "info".to_string(),
            seed: None,
        }
    }
}

impl TallyConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from JSON text
    pub fn from_json(content: &str) -> crate::Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> crate::Result<()> {
        if self.store.sectors_collection.trim().is_empty() {
            return Err(TallyError::Config(
                "store.sectorsCollection must not be empty".to_string(),
            ));
        }
        if self.store.config_document.trim().is_empty() {
            return Err(TallyError::Config(
                "store.configDocument must not be empty".to_string(),
            ));
        }
        if self.store.event_buffer == 0 {
            return Err(TallyError::Config(
                "store.eventBuffer must be at least 1".to_string(),
            ));
        }
        if self.board.tick_interval_ms == 0 {
            return Err(TallyError::Config(
                "board.tickIntervalMs must be at least 1".to_string(),
            ));
        }
        if let Some(offset) = self.board.utc_offset_minutes {
            if !(-14 * 60..=14 * 60).contains(&offset) {
                return Err(TallyError::Config(format!(
                    "board.utcOffsetMinutes out of range: {}",
                    offset
                )));
            }
        }
        if let Some(seed) = &self.seed {
            for sector in &seed.sectors {
                if sector.name.trim().is_empty() || sector.manager.trim().is_empty() {
                    return Err(TallyError::Config(
                        "seed sectors need a name and a manager".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Starter configuration written by `tally init`
    pub fn example() -> Self {
        Self {
            seed: Some(SeedConfig {
                event: Some(SeedEvent {
                    date: "2026-10-17".to_string(),
                    time: "21:00".to_string(),
                }),
                sectors: vec![
                    SeedSector {
                        name: "Platea".to_string(),
                        manager: "Juan".to_string(),
                        attendee_count: None,
                    },
                    SeedSector {
                        name: "Pullman".to_string(),
                        manager: "Ana".to_string(),
                        attendee_count: None,
                    },
                ],
            }),
            ..Self::default()
        }
    }
}

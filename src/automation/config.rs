//! Engine configuration: click coordinates, marker templates and timings.
//!
//! Everything is immutable for a run and overridable from a JSON file; the
//! defaults mirror a 1600x900 emulator layout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fixed tap target on the device screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickPoint {
    pub x: u32,
    pub y: u32,
}

impl ClickPoint {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// One step of the emergency recovery sequence: a tap plus its settle delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyClick {
    pub point: ClickPoint,
    #[serde(with = "duration_ms")]
    pub settle: Duration,
}

/// Tap targets for every action the state handlers perform.
///
/// One typed field per action, so a handler referencing a missing entry is
/// a compile error rather than a runtime lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickMap {
    pub start_battle: ClickPoint,
    pub confirm_battle: ClickPoint,
    pub auto_battle: ClickPoint,
    pub exit_after_win: ClickPoint,
    pub refresh_opponents: ClickPoint,
    pub reconnect_button: ClickPoint,
    /// Unconditional tap sequence used to unstick the game: back button,
    /// screen center, exit button, refresh button.
    pub emergency: Vec<EmergencyClick>,
}

impl Default for ClickMap {
    fn default() -> Self {
        Self {
            start_battle: ClickPoint::new(1227, 832),
            confirm_battle: ClickPoint::new(1430, 830),
            auto_battle: ClickPoint::new(66, 642),
            exit_after_win: ClickPoint::new(743, 819),
            refresh_opponents: ClickPoint::new(215, 826),
            reconnect_button: ClickPoint::new(803, 821),
            emergency: vec![
                EmergencyClick {
                    point: ClickPoint::new(49, 50),
                    settle: Duration::from_secs(2),
                },
                EmergencyClick {
                    point: ClickPoint::new(588, 825),
                    settle: Duration::from_secs(2),
                },
                EmergencyClick {
                    point: ClickPoint::new(743, 819),
                    settle: Duration::from_secs(10),
                },
                EmergencyClick {
                    point: ClickPoint::new(215, 826),
                    settle: Duration::from_secs(2),
                },
            ],
        }
    }
}

/// Template file names for the screens the bot recognizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSet {
    pub select_battle: String,
    pub confirm_battle: String,
    pub in_battle: String,
    pub victory: String,
    pub defeat: String,
    pub waiting_for_server: String,
    pub contact_us: String,
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self {
            select_battle: "select_battle.png".to_string(),
            confirm_battle: "confirm_battle.png".to_string(),
            in_battle: "auto_battle.png".to_string(),
            victory: "victory.png".to_string(),
            defeat: "defeat.png".to_string(),
            waiting_for_server: "waiting_for_server.png".to_string(),
            contact_us: "contact_us.png".to_string(),
        }
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding the marker template images.
    pub template_dir: PathBuf,
    /// Confidence threshold for template matching (0.0 to 1.0).
    pub match_threshold: f32,
    pub clicks: ClickMap,
    pub markers: MarkerSet,

    /// Sleep between worker loop iterations.
    #[serde(with = "duration_ms")]
    pub tick: Duration,
    /// Sleep per Idle iteration.
    #[serde(with = "duration_ms")]
    pub idle_tick: Duration,
    /// Delay before Starting re-probes when no known screen was found.
    #[serde(with = "duration_ms")]
    pub probe_retry: Duration,
    /// Settle delay after tapping start_battle.
    #[serde(with = "duration_ms")]
    pub select_settle: Duration,
    /// How long ConfirmingBattle waits for the in-battle marker.
    #[serde(with = "duration_ms")]
    pub confirm_wait: Duration,
    /// How long InBattle waits for the victory/defeat marker.
    #[serde(with = "duration_ms")]
    pub battle_wait: Duration,
    /// Poll cadence for the bounded waits above.
    #[serde(with = "duration_ms")]
    pub poll_interval: Duration,
    /// Settle delay after tapping exit_after_win on a victory screen.
    #[serde(with = "duration_ms")]
    pub victory_settle: Duration,
    /// Settle delay after tapping exit_after_win on a defeat screen.
    #[serde(with = "duration_ms")]
    pub defeat_settle: Duration,
    /// Settle delay after tapping refresh_opponents.
    #[serde(with = "duration_ms")]
    pub refresh_settle: Duration,
    /// How long ConnectionLost waits for the contact-us marker.
    #[serde(with = "duration_ms")]
    pub contact_us_wait: Duration,
    /// Settle delay after tapping the reconnect button.
    #[serde(with = "duration_ms")]
    pub reconnect_settle: Duration,
    /// Timeout of each step of the reconnect priority cascade.
    #[serde(with = "duration_ms")]
    pub reconnect_probe: Duration,
    /// Poll cadence inside the reconnect cascade.
    #[serde(with = "duration_ms")]
    pub reconnect_poll: Duration,
    /// Pause in the Error state before retrying from Starting.
    #[serde(with = "duration_ms")]
    pub error_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("templates"),
            match_threshold: 0.8,
            clicks: ClickMap::default(),
            markers: MarkerSet::default(),
            tick: Duration::from_millis(100),
            idle_tick: Duration::from_millis(500),
            probe_retry: Duration::from_secs(2),
            select_settle: Duration::from_secs(2),
            confirm_wait: Duration::from_secs(50),
            battle_wait: Duration::from_secs(120),
            poll_interval: Duration::from_secs(3),
            victory_settle: Duration::from_secs(5),
            defeat_settle: Duration::from_secs(10),
            refresh_settle: Duration::from_secs(2),
            contact_us_wait: Duration::from_secs(60),
            reconnect_settle: Duration::from_secs(7),
            reconnect_probe: Duration::from_secs(5),
            reconnect_poll: Duration::from_secs(1),
            error_delay: Duration::from_secs(5),
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON file. Missing fields fall back to
    /// the defaults, so partial overrides are fine.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(de)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_emulator_layout() {
        let config = EngineConfig::default();
        assert_eq!(config.clicks.start_battle, ClickPoint::new(1227, 832));
        assert_eq!(config.markers.in_battle, "auto_battle.png");
        assert_eq!(config.clicks.emergency.len(), 4);
        assert_eq!(config.match_threshold, 0.8);
    }

    #[test]
    fn partial_json_overrides_keep_defaults() {
        let json = r#"{ "match_threshold": 0.9, "confirm_wait": 10000 }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.match_threshold, 0.9);
        assert_eq!(config.confirm_wait, Duration::from_secs(10));
        assert_eq!(config.battle_wait, Duration::from_secs(120));
        assert_eq!(config.clicks, ClickMap::default());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}

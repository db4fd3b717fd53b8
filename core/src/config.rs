// core/src/config.rs
use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::aggregate::DEFAULT_CALORIE_GOAL;
use crate::error::{Result, WorkoutError};
use crate::history::HISTORY_KEY;
use crate::sensor::SessionConfiguration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    #[default]
    Running,
    Walking,
    Cycling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Indoor,
    #[default]
    Outdoor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkoutConfig {
    pub activity_type: ActivityType,
    pub location_type: LocationType,
    pub calorie_goal: f64,
    pub tick_interval_ms: u64,
    pub history_key: String,
    pub event_buffer: usize,
}

impl Default for WorkoutConfig {
    fn default() -> Self {
        Self {
            activity_type: ActivityType::Running,
            location_type: LocationType::Outdoor,
            calorie_goal: DEFAULT_CALORIE_GOAL,
            tick_interval_ms: 100,
            history_key: HISTORY_KEY.to_string(),
            event_buffer: 64,
        }
    }
}

impl WorkoutConfig {
    pub fn session_configuration(&self) -> SessionConfiguration {
        SessionConfiguration {
            activity_type: self.activity_type,
            location_type: self.location_type,
        }
    }

    /// Aldri null: tokio::time::interval godtar ikke 0.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.calorie_goal.is_finite() || self.calorie_goal < 0.0 {
            return Err(WorkoutError::Config(format!(
                "calorie_goal must be a finite, non-negative number (got {})",
                self.calorie_goal
            )));
        }
        if self.history_key.trim().is_empty() {
            return Err(WorkoutError::Config("history_key must not be empty".into()));
        }
        if self.event_buffer == 0 {
            return Err(WorkoutError::Config("event_buffer must be at least 1".into()));
        }
        Ok(())
    }
}

/// Leser inn konfig fra disk (JSON).
/// Hvis filen ikke finnes, returneres default-konfig.
pub fn load_config(path: impl AsRef<Path>) -> Result<WorkoutConfig> {
    let path = path.as_ref();
    if !path.exists() {
        warn!("⚠️ Fant ikke konfig på {}, bruker default", path.display());
        return Ok(WorkoutConfig::default());
    }
    let contents = std::fs::read_to_string(path)?;
    let cfg: WorkoutConfig = serde_json::from_str(&contents)
        .map_err(|e| WorkoutError::Config(format!("{}: {}", path.display(), e)))?;
    cfg.validate()?;
    info!(
        "📂 Konfig lastet fra {} (goal={}, tick={}ms)",
        path.display(),
        cfg.calorie_goal,
        cfg.tick_interval_ms
    );
    Ok(cfg)
}

/// Lagrer konfig til disk som JSON (pretty-print).
pub fn save_config(cfg: &WorkoutConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(cfg).map_err(|e| WorkoutError::Config(e.to_string()))?;
    std::fs::write(path, json)?;
    info!("✅ Konfig lagret til {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: WorkoutConfig = serde_json::from_str(r#"{"calorie_goal": 12.0}"#).unwrap();
        assert_eq!(cfg.calorie_goal, 12.0);
        assert_eq!(cfg.history_key, "workouts");
        assert_eq!(cfg.activity_type, ActivityType::Running);
        assert_eq!(cfg.location_type, LocationType::Outdoor);
        assert_eq!(cfg.tick_interval(), Duration::from_millis(100));
    }

    #[test]
    fn negative_goal_is_rejected() {
        let cfg = WorkoutConfig { calorie_goal: -1.0, ..WorkoutConfig::default() };
        assert!(matches!(cfg.validate(), Err(WorkoutError::Config(_))));
    }
}

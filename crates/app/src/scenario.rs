use std::fs;
use std::path::{Path, PathBuf};

use electrical::analysis::Profile;
use electrical::ModelConfig;
use serde::{Deserialize, Serialize};

fn default_dt() -> f64 {
    1.0
}

fn default_output() -> PathBuf {
    PathBuf::from("battery_simulation.csv")
}

fn default_model() -> ModelConfig {
    ModelConfig {
        capacity_ah: 52.0,
        ..ModelConfig::default()
    }
}

/// A simulation run as loaded from a JSON scenario file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_model")]
    pub model: ModelConfig,
    #[serde(default)]
    pub profile: Profile,
    /// Model step, seconds.
    #[serde(default = "default_dt")]
    pub dt: f64,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for Scenario {
    fn default() -> Self {
        Scenario {
            model: default_model(),
            profile: Profile::default(),
            dt: default_dt(),
            output: default_output(),
        }
    }
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_scenario_uses_defaults() {
        let scenario: Scenario = serde_json::from_str("{}").unwrap();
        assert_eq!(scenario.model.capacity_ah, 52.0);
        assert_eq!(scenario.model.reference_temperature, 25.0);
        assert_eq!(scenario.profile, Profile::default());
        assert_eq!(scenario.dt, 1.0);
        assert_eq!(scenario.output, PathBuf::from("battery_simulation.csv"));
    }

    #[test]
    fn test_partial_scenario() {
        let scenario: Scenario = serde_json::from_str(
            r#"{
                "model": { "capacity_ah": 5.0, "temperature_policy": "clamp_to_table" },
                "profile": { "segments": [ { "current": 2.0, "temperature": 0.0, "duration": 60 } ] },
                "dt": 0.5
            }"#,
        )
        .unwrap();
        assert_eq!(scenario.model.capacity_ah, 5.0);
        assert_eq!(
            scenario.model.temperature_policy,
            electrical::TemperaturePolicy::ClampToTable
        );
        assert_eq!(scenario.profile.segments.len(), 1);
        assert_eq!(scenario.dt, 0.5);
    }

    #[test]
    fn test_bundled_demo_parses() {
        let scenario: Scenario =
            serde_json::from_str(include_str!("../../../demos/cold_cycle.json")).unwrap();
        assert_eq!(scenario.profile.segments.len(), 4);
        assert_eq!(scenario.profile.duration(), 10800.0);
        assert_eq!(scenario.output, PathBuf::from("cold_cycle.csv"));
    }
}

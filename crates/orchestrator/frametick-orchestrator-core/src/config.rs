use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use frametick_timing::TimingConfig;

/// Host-facing configuration, usually loaded from JSON.
///
/// ```json
/// { "timing": { "start_paused": true, "idle": { "max_batch": 5 } } }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub timing: TimingConfig,
}

impl OrchestratorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json).context("parsing orchestrator config")?;
        cfg.timing.validate().context("validating timing config")?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let cfg = OrchestratorConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, OrchestratorConfig::default());
        assert!(cfg.timing.start_paused);
        assert_eq!(cfg.timing.idle.max_batch, 5);
    }

    #[test]
    fn partial_idle_override() {
        let cfg =
            OrchestratorConfig::from_json_str(r#"{"timing":{"idle":{"max_batch":2}}}"#).unwrap();
        assert_eq!(cfg.timing.idle.max_batch, 2);
        assert_eq!(cfg.timing.idle.frame_budget_ms, 17);
        assert_eq!(cfg.timing.idle.min_remaining_ms, 12);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = OrchestratorConfig::from_json_str(r#"{"timing":{"idle":{"max_batch":0}}}"#)
            .unwrap_err();
        assert!(format!("{err:#}").contains("max_batch"));
        assert!(OrchestratorConfig::from_json_str("[1]").is_err());
    }
}

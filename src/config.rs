//! Run configuration from environment variables.
//!
//! `QSAR_DELTA_MODEL` names the model bundle (default `model.json`) and
//! `QSAR_DELTA_PARALLEL` switches parallel descriptor batches off when set to
//! `0`, `false`, `no` or `off`. A `.env` file in the working directory is
//! honoured.

use std::env;
use std::path::PathBuf;

/// Environment variable holding the model bundle path.
pub const MODEL_PATH_VAR: &str = "QSAR_DELTA_MODEL";
/// Environment variable toggling parallel descriptor computation.
pub const PARALLEL_VAR: &str = "QSAR_DELTA_PARALLEL";
/// Bundle path used when none is configured.
pub const DEFAULT_MODEL_PATH: &str = "model.json";

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Path of the JSON model bundle.
    pub model_path: PathBuf,
    /// Compute descriptor batches on the rayon pool.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            parallel: true,
        }
    }
}

impl PipelineConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // a missing .env is fine
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let model_path = lookup(MODEL_PATH_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.model_path);
        let parallel = lookup(PARALLEL_VAR)
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(defaults.parallel);
        PipelineConfig {
            model_path,
            parallel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> PipelineConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PipelineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        assert_eq!(config(&[]), PipelineConfig::default());
        assert_eq!(config(&[]).model_path, PathBuf::from("model.json"));
        assert!(config(&[]).parallel);
    }

    #[test]
    fn overrides() {
        let c = config(&[(MODEL_PATH_VAR, "/models/co2.json"), (PARALLEL_VAR, "Off")]);
        assert_eq!(c.model_path, PathBuf::from("/models/co2.json"));
        assert!(!c.parallel);
        assert!(config(&[(PARALLEL_VAR, "1")]).parallel);
        assert_eq!(config(&[(MODEL_PATH_VAR, "  ")]).model_path, PathBuf::from("model.json"));
    }
}

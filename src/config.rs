//! Extractor tuning, persisted as TOML.
//!
//! Every heuristic constant the extractors use lives here so a deployment can
//! adjust them without a rebuild. A missing config file means defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Tunable constants for narrative extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Days between consecutive `GATE n` checkpoints (`day = n * cadence`).
    pub gate_cadence_days: u32,
    /// Days assigned to the keyword-fallback gates, in
    /// inspection / negotiation / closing order.
    pub fallback_gate_days: [u32; 3],
    /// Rationale lines to aim for when backfilling from bullets.
    pub rationale_target: usize,
    /// Minimum bullet length (chars, inclusive) eligible for rationale backfill.
    pub bullet_min_chars: usize,
    /// Maximum bullet length (chars, exclusive) eligible for rationale backfill.
    pub bullet_max_chars: usize,
    /// How far (chars) past a branch mention to look for its value and strength.
    pub branch_window_chars: usize,
    /// Maximum conditions collected per branch.
    pub max_conditions: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            gate_cadence_days: 7,
            fallback_gate_days: [7, 14, 30],
            rationale_target: 4,
            bullet_min_chars: 20,
            bullet_max_chars: 150,
            branch_window_chars: 400,
            max_conditions: 4,
        }
    }
}

impl ExtractorConfig {
    /// Check the invariants the extractors rely on.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.gate_cadence_days == 0 {
            return Err(ConfigError::Invalid {
                field: "gate_cadence_days",
                message: "must be at least 1".into(),
            });
        }
        if self.bullet_min_chars >= self.bullet_max_chars {
            return Err(ConfigError::Invalid {
                field: "bullet_min_chars",
                message: format!(
                    "must be below bullet_max_chars ({} >= {})",
                    self.bullet_min_chars, self.bullet_max_chars
                ),
            });
        }
        if self.branch_window_chars == 0 {
            return Err(ConfigError::Invalid {
                field: "branch_window_chars",
                message: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading extractor config");
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no extractor config, using defaults");
            Ok(Self::default())
        }
    }

    /// Save to a TOML file, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gate_cadence_days, 7);
        assert_eq!(config.fallback_gate_days, [7, 14, 30]);
        assert_eq!(config.rationale_target, 4);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let config = ExtractorConfig {
            gate_cadence_days: 14,
            rationale_target: 6,
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = ExtractorConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "gate_cadence_days = 10\n").unwrap();

        let loaded = ExtractorConfig::load(&path).unwrap();
        assert_eq!(loaded.gate_cadence_days, 10);
        assert_eq!(loaded.bullet_max_chars, 150);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ExtractorConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, ExtractorConfig::default());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "bullet_min_chars = 200\nbullet_max_chars = 100\n").unwrap();

        let err = ExtractorConfig::load(&path).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "bullet_min_chars",
                ..
            }
        ));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "gate_cadence_days = = 3").unwrap();

        assert!(matches!(
            ExtractorConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}

//! Batch pipeline configuration parsing from environment variables.

use super::{EnvLookup, parse_bool, parse_or};
use crate::application::features::feature_pipeline::{DEFAULT_HISTORY_DAYS, MIN_RAW_BARS};
use crate::application::signal_curator::DEFAULT_STRONG_SIGNAL_CONFIDENCE;
use anyhow::{Result, bail};

/// Pipeline environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineEnvConfig {
    pub history_days: usize,
    pub min_raw_bars: usize,
    pub strong_signal_confidence: f64,
    pub parallel_predictions: bool,
}

impl Default for PipelineEnvConfig {
    fn default() -> Self {
        Self {
            history_days: DEFAULT_HISTORY_DAYS,
            min_raw_bars: MIN_RAW_BARS,
            strong_signal_confidence: DEFAULT_STRONG_SIGNAL_CONFIDENCE,
            parallel_predictions: true,
        }
    }
}

impl PipelineEnvConfig {
    pub fn from_lookup(lookup: &EnvLookup) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            history_days: parse_or(lookup, "HISTORY_DAYS", defaults.history_days)?,
            min_raw_bars: parse_or(lookup, "MIN_RAW_BARS", defaults.min_raw_bars)?,
            strong_signal_confidence: parse_or(
                lookup,
                "STRONG_SIGNAL_CONFIDENCE",
                defaults.strong_signal_confidence,
            )?,
            parallel_predictions: parse_bool(
                lookup,
                "PARALLEL_PREDICTIONS",
                defaults.parallel_predictions,
            ),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.min_raw_bars < MIN_RAW_BARS {
            bail!(
                "MIN_RAW_BARS must be at least {}, got {}",
                MIN_RAW_BARS,
                self.min_raw_bars
            );
        }
        if self.history_days < self.min_raw_bars {
            bail!(
                "HISTORY_DAYS ({}) must not be below MIN_RAW_BARS ({})",
                self.history_days,
                self.min_raw_bars
            );
        }
        if !(self.strong_signal_confidence > 0.5 && self.strong_signal_confidence <= 1.0) {
            bail!(
                "STRONG_SIGNAL_CONFIDENCE must be in (0.5, 1], got {}",
                self.strong_signal_confidence
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_pipeline_config_defaults() {
        let config = PipelineEnvConfig::from_lookup(&lookup(&[])).unwrap();
        assert_eq!(config, PipelineEnvConfig::default());
        assert_eq!(config.history_days, 250);
        assert_eq!(config.min_raw_bars, 70);
        assert!(config.parallel_predictions);
    }

    #[test]
    fn test_pipeline_config_overrides() {
        let config = PipelineEnvConfig::from_lookup(&lookup(&[
            ("HISTORY_DAYS", "400"),
            ("STRONG_SIGNAL_CONFIDENCE", "0.8"),
            ("PARALLEL_PREDICTIONS", "false"),
        ]))
        .unwrap();
        assert_eq!(config.history_days, 400);
        assert!((config.strong_signal_confidence - 0.8).abs() < 1e-12);
        assert!(!config.parallel_predictions);
    }

    #[test]
    fn test_pipeline_config_rejects_invalid_values() {
        assert!(PipelineEnvConfig::from_lookup(&lookup(&[("MIN_RAW_BARS", "50")])).is_err());
        assert!(PipelineEnvConfig::from_lookup(&lookup(&[("HISTORY_DAYS", "abc")])).is_err());
        assert!(
            PipelineEnvConfig::from_lookup(&lookup(&[("STRONG_SIGNAL_CONFIDENCE", "0.5")]))
                .is_err()
        );
        assert!(
            PipelineEnvConfig::from_lookup(&lookup(&[("STRONG_SIGNAL_CONFIDENCE", "1.2")]))
                .is_err()
        );
    }
}

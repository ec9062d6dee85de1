//! Configuration module for the curation pipeline.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Pipeline, Artifacts, and Data.

mod artifact_config;
mod data_config;
mod pipeline_config;

pub use artifact_config::ArtifactEnvConfig;
pub use data_config::DataEnvConfig;
pub use pipeline_config::PipelineEnvConfig;

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Source of configuration values, keyed by environment variable name.
pub type EnvLookup = dyn Fn(&str) -> Option<String>;

fn parse_or<T>(lookup: &EnvLookup, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .context(format!("Failed to parse {}", key)),
        None => Ok(default),
    }
}

fn parse_bool(lookup: &EnvLookup, key: &str, default: bool) -> bool {
    lookup(key)
        .and_then(|raw| raw.trim().parse::<bool>().ok())
        .unwrap_or(default)
}

/// Main application configuration.
///
/// Aggregates the sub-configs; each one carries its own defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub pipeline: PipelineEnvConfig,
    pub artifacts: ArtifactEnvConfig,
    pub data: DataEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    pub fn from_lookup(lookup: &EnvLookup) -> Result<Self> {
        let pipeline =
            PipelineEnvConfig::from_lookup(lookup).context("Failed to load pipeline config")?;
        let artifacts = ArtifactEnvConfig::from_lookup(lookup);
        let data = DataEnvConfig::from_lookup(lookup);

        Ok(Self {
            pipeline,
            artifacts,
            data,
        })
    }
}

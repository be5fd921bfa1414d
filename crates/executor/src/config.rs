use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use super::error::Error;
use common::types::{AssetId, AssetPair};

#[derive(Debug, Deserialize, Clone)]
pub struct SearcherConfig {
    /// Seconds between search rounds; `0` runs a single round and exits.
    pub interval_seconds: u64,
    pub max_concurrent_fetches: usize,
    pub min_cycle_assets: usize,
    #[serde(default)]
    pub max_cycle_assets: Option<usize>,
    /// Decimal places of the ratio shown in reports.
    pub display_decimals: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketConfig {
    #[serde(default)]
    pub pairs: Vec<AssetPair>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulatedAsset {
    pub id: AssetId,
    pub usd_price: f64,
    pub decimals: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulatorConfig {
    pub seed: u64,
    /// Maximum price deviation per round, in basis points.
    pub fluctuation_bps: u32,
    /// Chance that a single fetch reports the pair as unavailable.
    pub unavailable_probability: f64,
    pub assets: Vec<SimulatedAsset>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReportConfig {
    pub csv_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub searcher: SearcherConfig,
    pub market: MarketConfig,
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    /// Rejects settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        let searcher = &self.searcher;
        if searcher.max_concurrent_fetches == 0 {
            return invalid("searcher.max_concurrent_fetches must be at least 1");
        }
        if searcher.min_cycle_assets < 2 {
            return invalid("searcher.min_cycle_assets must be at least 2");
        }
        if let Some(max) = searcher.max_cycle_assets {
            if max < searcher.min_cycle_assets {
                return invalid("searcher.max_cycle_assets must not be below min_cycle_assets");
            }
        }
        if searcher.display_decimals < 0 {
            return invalid("searcher.display_decimals must not be negative");
        }

        if self.market.pairs.is_empty() {
            return invalid("market.pairs must list at least one pair");
        }

        let simulator = &self.simulator;
        if !(0.0..=1.0).contains(&simulator.unavailable_probability) {
            return invalid("simulator.unavailable_probability must be within [0, 1]");
        }
        if simulator.fluctuation_bps >= 10_000 {
            return invalid("simulator.fluctuation_bps must be below 10000");
        }
        if let Some(asset) = simulator
            .assets
            .iter()
            .find(|asset| !(asset.usd_price.is_finite() && asset.usd_price > 0.0))
        {
            return Err(Error::InvalidConfig(format!(
                "simulator asset {} needs a positive usd_price",
                asset.id
            )));
        }

        Ok(())
    }
}

fn invalid(reason: &str) -> Result<(), Error> {
    Err(Error::InvalidConfig(reason.to_string()))
}

/// Path used when no `--config` is given: `crates/executor/Config.toml` under the
/// current directory.
pub fn default_config_path() -> Result<PathBuf, Error> {
    let base_path = env::current_dir().map_err(|e| {
        Error::ConfigLoadError(format!("Failed to determine current directory: {}", e))
    })?;

    Ok(base_path
        .join("crates")
        .join("executor")
        .join("Config.toml"))
}

/// Loads configuration from a file and `EXECUTOR__*` environment variables,
/// then validates it.
///
/// Environment keys use `__` between sections, e.g.
/// `EXECUTOR__SEARCHER__INTERVAL_SECONDS=5`.
pub fn load_config(path: Option<&Path>) -> Result<Config, Error> {
    let config_file_path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    if !config_file_path.exists() {
        return Err(Error::ConfigLoadError(format!(
            "Configuration file not found at path: {}",
            config_file_path.display()
        )));
    }

    let s = ConfigLoader::builder()
        .add_source(File::from(config_file_path.as_path()).required(true))
        .add_source(
            Environment::with_prefix("EXECUTOR")
                .try_parsing(true)
                .separator("__"),
        )
        .build()
        .map_err(|e| Error::ConfigLoadError(e.to_string()))?;

    let app_config: Config = s
        .try_deserialize()
        .map_err(|e| Error::ConfigLoadError(format!("Failed to deserialize config: {}", e)))?;

    app_config.validate()?;
    Ok(app_config)
}

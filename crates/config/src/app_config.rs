// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::load_config::{find_in_parent, resolve_config_path};
use crate::yaml::load_yaml_with_env;
use anyhow::{anyhow, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, env, path::PathBuf, str::FromStr};
use tracing::Level;
use veil_events::EventBusConfig;
use veil_optimizer::{Channel, Objective, ObjectiveWeights};

pub const DEFAULT_CONFIG_NAME: &str = "veil.config.yaml";
pub const ENV_PREFIX: &str = "VEIL_";

/// Settings for the simulated ciphertext backend
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FheConfig {
    /// Seed for the backend key and every nonce it draws
    pub seed: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Per-objective channel weights. An objective listed here replaces the built in row.
    pub weights: BTreeMap<Objective, BTreeMap<Channel, u32>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EventBusSettings {
    pub deduplicate: bool,
    pub capacity: u32,
}

impl Default for EventBusSettings {
    fn default() -> Self {
        let defaults = EventBusConfig::default();
        Self {
            deduplicate: defaults.deduplicate,
            capacity: defaults.capacity,
        }
    }
}

/// The complete configuration of a veil process.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct VeilConfig {
    /// Name used in logs
    pub name: String,
    /// One of trace, debug, info, warn, error
    pub log_level: String,
    pub fhe: FheConfig,
    pub optimizer: OptimizerConfig,
    pub event_bus: EventBusSettings,
    /// The file this configuration was read from, if any
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
}

impl Default for VeilConfig {
    fn default() -> Self {
        Self {
            name: "veil".to_string(),
            log_level: "warn".to_string(),
            fhe: FheConfig::default(),
            optimizer: OptimizerConfig::default(),
            event_bus: EventBusSettings::default(),
            config_file: None,
        }
    }
}

impl VeilConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log_level(&self) -> Result<Level> {
        Level::from_str(&self.log_level)
            .map_err(|_| anyhow!("Invalid log level '{}'", self.log_level))
    }

    pub fn seed(&self) -> u64 {
        self.fhe.seed
    }

    /// Built in weights with the configured rows applied on top.
    pub fn weights(&self) -> ObjectiveWeights {
        let mut weights = ObjectiveWeights::default();
        for (objective, row) in &self.optimizer.weights {
            weights.set(*objective, row.clone());
        }
        weights
    }

    pub fn event_bus(&self) -> EventBusConfig {
        EventBusConfig {
            deduplicate: self.event_bus.deduplicate,
            capacity: self.event_bus.capacity,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.log_level()?;
        for (objective, row) in &self.optimizer.weights {
            if row.values().all(|w| *w == 0) {
                return Err(anyhow!(
                    "Weights for objective '{}' must not all be zero",
                    objective
                ));
            }
        }
        if self.event_bus.deduplicate && self.event_bus.capacity == 0 {
            return Err(anyhow!("event_bus.capacity must be positive when deduplicating"));
        }
        Ok(())
    }
}

/// Load configuration from `config_file`, or from the first `veil.config.yaml` found walking up
/// from the working directory. Values from `VEIL_` prefixed environment variables win; nested keys
/// are separated by `__` (eg. `VEIL_FHE__SEED=7`).
pub fn load_config(config_file: Option<&str>) -> Result<VeilConfig> {
    let resolved_config_path = resolve_config_path(
        find_in_parent,
        env::current_dir()?,
        DEFAULT_CONFIG_NAME,
        config_file.map(PathBuf::from),
    );

    let mut figment = Figment::from(Serialized::defaults(VeilConfig::default()));
    if let Some(path) = &resolved_config_path {
        let loaded_yaml = load_yaml_with_env(path).context("Configuration file not found")?;
        figment = figment.merge(Yaml::string(&loaded_yaml));
    }

    let mut config: VeilConfig = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("Could not parse configuration")?;
    config.config_file = resolved_config_path;
    config.validate()?;

    Ok(config)
}

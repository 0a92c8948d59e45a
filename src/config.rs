// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ConfiguratorError, ConfiguratorResult};
use crate::retry::{RetryConfig, RetryPolicy};
use crate::signer::SubmitStrategy;

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// File-backed configuration. YAML for `.yaml`/`.yml` files, JSON otherwise.
pub trait Config: Serialize + DeserializeOwned {
    fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        Ok(config)
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EngineConfig {
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub submit_strategy: SubmitStrategy,
}

impl Config for EngineConfig {}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfiguratorResult<Self> {
        let path = path.as_ref();
        Self::load(path).map_err(|e| {
            ConfiguratorError::Config(format!("Failed to load {}: {}", path.display(), e))
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry.clone())
    }
}

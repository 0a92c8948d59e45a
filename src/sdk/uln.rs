// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Ultra light node (ULN) verification and executor configuration.
//!
//! On chain, "follow the default" and "explicitly none" are both encoded as
//! sentinels inside plain integers:
//!
//! | Field                    | `0`     | sentinel                        |
//! |--------------------------|---------|---------------------------------|
//! | `confirmations`          | default | `u64::MAX`: explicitly zero     |
//! | `required_dvn_count`     | default | `255`: explicitly no DVNs       |
//! | `optional_dvn_count`     | default | `255`: explicitly no DVNs       |
//! | `max_message_size`       | default | none, zero is not configurable  |
//! | `executor`               | default | none, zero address              |
//!
//! [`OnChainUlnConfig::decode`] and [`OnChainUlnConfig::encode`] translate
//! between this encoding and [`Setting`] so the diff never compares a
//! sentinel with a literal zero.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::OmniSdk;
use crate::address::{normalize, normalize_sorted};
use crate::chain::ChainId;
use crate::error::{ConfiguratorError, ConfiguratorResult};
use crate::setting::{address_setting_satisfied, Setting};
use crate::transactions::OmniTransaction;

pub const NIL_DVN_COUNT: u8 = u8::MAX;
pub const NIL_CONFIRMATIONS: u64 = u64::MAX;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionalDvns {
    pub dvns: Vec<String>,
    pub threshold: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UlnConfig {
    #[serde(default, skip_serializing_if = "Setting::is_absent")]
    pub confirmations: Setting<u64>,
    #[serde(default, skip_serializing_if = "Setting::is_absent")]
    pub required_dvns: Setting<Vec<String>>,
    #[serde(default, skip_serializing_if = "Setting::is_absent")]
    pub optional_dvns: Setting<OptionalDvns>,
}

impl UlnConfig {
    /// Whether `current` (as read from `chain_id`) satisfies this desired config.
    ///
    /// DVN lists are compared as sets of canonical addresses.
    pub fn is_satisfied_by(
        &self,
        current: &UlnConfig,
        chain_id: ChainId,
    ) -> ConfiguratorResult<bool> {
        if !self.confirmations.is_satisfied_by(&current.confirmations) {
            return Ok(false);
        }
        if !dvns_satisfied(&self.required_dvns, &current.required_dvns, chain_id)? {
            return Ok(false);
        }
        let desired_optional = self.optional_dvns.as_ref().map(|o| o.dvns.clone());
        let current_optional = current.optional_dvns.as_ref().map(|o| o.dvns.clone());
        if !dvns_satisfied(&desired_optional, &current_optional, chain_id)? {
            return Ok(false);
        }
        Ok(self.optional_dvns.is_satisfied_by_with(&current.optional_dvns, |d, c| {
            d.threshold == c.threshold
        }))
    }

    /// Checks DVN addresses, counts, thresholds and reserved values, none of
    /// which depend on chain state.
    pub fn validate(&self, chain_id: ChainId) -> ConfiguratorResult<()> {
        OnChainUlnConfig::encode(self, chain_id)
            .map(|_| ())
            .map_err(ConfiguratorError::into_malformed)
    }

    /// Fills unmanaged fields from `current`.
    pub fn merged_with(self, current: UlnConfig) -> UlnConfig {
        UlnConfig {
            confirmations: self.confirmations.or_current(current.confirmations),
            required_dvns: self.required_dvns.or_current(current.required_dvns),
            optional_dvns: self.optional_dvns.or_current(current.optional_dvns),
        }
    }
}

fn dvns_satisfied(
    desired: &Setting<Vec<String>>,
    current: &Setting<Vec<String>>,
    chain_id: ChainId,
) -> ConfiguratorResult<bool> {
    match (desired, current) {
        (Setting::Value(desired), Setting::Value(current)) => {
            let desired = normalize_sorted(desired, chain_id)?;
            let current = normalize_sorted(current, chain_id)
                .map_err(|e| ConfiguratorError::DiffComparison(e.to_string()))?;
            Ok(desired == current)
        }
        (desired, current) => Ok(desired.is_satisfied_by_with(current, |_, _| true)),
    }
}

/// ULN config exactly as stored by the library.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OnChainUlnConfig {
    pub confirmations: u64,
    pub required_dvn_count: u8,
    pub optional_dvn_count: u8,
    pub optional_dvn_threshold: u8,
    pub required_dvns: Vec<String>,
    pub optional_dvns: Vec<String>,
}

impl OnChainUlnConfig {
    pub fn decode(self) -> ConfiguratorResult<UlnConfig> {
        let confirmations = match self.confirmations {
            0 => Setting::Default,
            NIL_CONFIRMATIONS => Setting::Value(0),
            n => Setting::Value(n),
        };
        let required_dvns = match self.required_dvn_count {
            0 => Setting::Default,
            NIL_DVN_COUNT => Setting::Value(vec![]),
            n if n as usize == self.required_dvns.len() => Setting::Value(self.required_dvns),
            n => {
                return Err(ConfiguratorError::DiffComparison(format!(
                    "required DVN count {} does not match {} DVNs",
                    n,
                    self.required_dvns.len()
                )))
            }
        };
        let optional_dvns = match self.optional_dvn_count {
            0 => Setting::Default,
            NIL_DVN_COUNT => Setting::Value(OptionalDvns::default()),
            n if n as usize == self.optional_dvns.len() => Setting::Value(OptionalDvns {
                dvns: self.optional_dvns,
                threshold: self.optional_dvn_threshold,
            }),
            n => {
                return Err(ConfiguratorError::DiffComparison(format!(
                    "optional DVN count {} does not match {} DVNs",
                    n,
                    self.optional_dvns.len()
                )))
            }
        };
        Ok(UlnConfig {
            confirmations,
            required_dvns,
            optional_dvns,
        })
    }

    /// Encodes a fully resolved config. `Absent` fields encode as default.
    pub fn encode(config: &UlnConfig, chain_id: ChainId) -> ConfiguratorResult<Self> {
        let invalid = |reason: String| ConfiguratorError::MalformedGraph(reason);

        let confirmations = match config.confirmations {
            Setting::Absent | Setting::Default => 0,
            Setting::Value(0) => NIL_CONFIRMATIONS,
            Setting::Value(NIL_CONFIRMATIONS) => {
                return Err(invalid(format!("{} confirmations is reserved", NIL_CONFIRMATIONS)))
            }
            Setting::Value(n) => n,
        };

        let (required_dvn_count, required_dvns) = match &config.required_dvns {
            Setting::Absent | Setting::Default => (0, vec![]),
            Setting::Value(dvns) if dvns.is_empty() => (NIL_DVN_COUNT, vec![]),
            Setting::Value(dvns) => (dvn_count(dvns)?, sorted_dvns(dvns, chain_id)?),
        };

        let optional = match &config.optional_dvns {
            Setting::Absent | Setting::Default => (0, 0, vec![]),
            Setting::Value(optional) if optional.dvns.is_empty() => {
                if optional.threshold != 0 {
                    return Err(invalid(
                        "optional DVN threshold must be 0 without optional DVNs".to_string(),
                    ));
                }
                (NIL_DVN_COUNT, 0, vec![])
            }
            Setting::Value(optional) => {
                let count = dvn_count(&optional.dvns)?;
                if optional.threshold == 0 || optional.threshold > count {
                    return Err(invalid(format!(
                        "optional DVN threshold {} must be between 1 and {}",
                        optional.threshold, count
                    )));
                }
                (count, optional.threshold, sorted_dvns(&optional.dvns, chain_id)?)
            }
        };
        let (optional_dvn_count, optional_dvn_threshold, optional_dvns) = optional;

        Ok(Self {
            confirmations,
            required_dvn_count,
            optional_dvn_count,
            optional_dvn_threshold,
            required_dvns,
            optional_dvns,
        })
    }
}

fn dvn_count(dvns: &[String]) -> ConfiguratorResult<u8> {
    u8::try_from(dvns.len())
        .ok()
        .filter(|n| *n < NIL_DVN_COUNT)
        .ok_or_else(|| ConfiguratorError::MalformedGraph(format!("too many DVNs: {}", dvns.len())))
}

/// Libraries require DVN addresses in ascending order without duplicates.
fn sorted_dvns(dvns: &[String], chain_id: ChainId) -> ConfiguratorResult<Vec<String>> {
    let mut keyed = dvns
        .iter()
        .map(|d| Ok((normalize(d, chain_id)?, d.clone())))
        .collect::<ConfiguratorResult<Vec<_>>>()?;
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    if keyed.windows(2).any(|w| w[0].0 == w[1].0) {
        return Err(ConfiguratorError::MalformedGraph("duplicate DVN address".to_string()));
    }
    Ok(keyed.into_iter().map(|(_, d)| d).collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorConfig {
    #[serde(default, skip_serializing_if = "Setting::is_absent")]
    pub max_message_size: Setting<u32>,
    #[serde(default, skip_serializing_if = "Setting::is_absent")]
    pub executor: Setting<String>,
}

impl ExecutorConfig {
    pub fn is_satisfied_by(
        &self,
        current: &ExecutorConfig,
        chain_id: ChainId,
    ) -> ConfiguratorResult<bool> {
        if !self.max_message_size.is_satisfied_by(&current.max_message_size) {
            return Ok(false);
        }
        address_setting_satisfied(&self.executor, &current.executor, chain_id)
    }

    pub fn validate(&self, chain_id: ChainId) -> ConfiguratorResult<()> {
        OnChainExecutorConfig::encode(self, chain_id)
            .map(|_| ())
            .map_err(ConfiguratorError::into_malformed)
    }

    pub fn merged_with(self, current: ExecutorConfig) -> ExecutorConfig {
        ExecutorConfig {
            max_message_size: self.max_message_size.or_current(current.max_message_size),
            executor: self.executor.or_current(current.executor),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OnChainExecutorConfig {
    pub max_message_size: u32,
    pub executor: String,
}

impl OnChainExecutorConfig {
    pub fn decode(self, chain_id: ChainId) -> ConfiguratorResult<ExecutorConfig> {
        let zero = crate::address::normalize_or_zero(&self.executor, chain_id)
            .map_err(|e| ConfiguratorError::DiffComparison(e.to_string()))?
            .is_zero();
        Ok(ExecutorConfig {
            max_message_size: match self.max_message_size {
                0 => Setting::Default,
                n => Setting::Value(n),
            },
            executor: if zero {
                Setting::Default
            } else {
                Setting::Value(self.executor)
            },
        })
    }

    pub fn encode(config: &ExecutorConfig, chain_id: ChainId) -> ConfiguratorResult<Self> {
        let max_message_size = match config.max_message_size {
            Setting::Absent | Setting::Default => 0,
            Setting::Value(0) => {
                return Err(ConfiguratorError::MalformedGraph(
                    "max message size must be positive".to_string(),
                ))
            }
            Setting::Value(n) => n,
        };
        let executor = match &config.executor {
            Setting::Absent | Setting::Default => {
                crate::address::denormalize(&crate::address::CanonicalAddress::ZERO, chain_id)?
            }
            Setting::Value(executor) => {
                if normalize(executor, chain_id)?.is_zero() {
                    return Err(ConfiguratorError::MalformedGraph(
                        "executor must not be the zero address".to_string(),
                    ));
                }
                executor.clone()
            }
        };
        Ok(Self {
            max_message_size,
            executor,
        })
    }
}

/// Message library holding default verification and executor configs.
#[async_trait]
pub trait Uln302Sdk: OmniSdk {
    async fn get_default_uln_config(&self, eid: ChainId) -> ConfiguratorResult<UlnConfig>;

    async fn set_default_uln_config(
        &self,
        eid: ChainId,
        config: &UlnConfig,
    ) -> ConfiguratorResult<OmniTransaction>;

    async fn get_default_executor_config(&self, eid: ChainId) -> ConfiguratorResult<ExecutorConfig>;

    async fn set_default_executor_config(
        &self,
        eid: ChainId,
        config: &ExecutorConfig,
    ) -> ConfiguratorResult<OmniTransaction>;
}

// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ExecutorConfig, OmniSdk, UlnConfig};
use crate::chain::ChainId;
use crate::error::{ConfiguratorError, ConfiguratorResult};
use crate::setting::Setting;
use crate::transactions::OmniTransaction;

/// Grace window during which a previous receive library stays valid.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeout {
    pub lib: String,
    pub expiry: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetConfigParam {
    Executor { eid: ChainId, config: ExecutorConfig },
    Uln { eid: ChainId, config: UlnConfig },
}

impl SetConfigParam {
    pub fn eid(&self) -> ChainId {
        match self {
            SetConfigParam::Executor { eid, .. } | SetConfigParam::Uln { eid, .. } => *eid,
        }
    }
}

/// Messaging endpoint: library registry plus per-application library and
/// config selection.
#[async_trait]
pub trait EndpointSdk: OmniSdk {
    async fn is_registered_library(&self, lib: &str) -> ConfiguratorResult<bool>;

    async fn register_library(&self, lib: &str) -> ConfiguratorResult<OmniTransaction>;

    async fn get_default_send_library(&self, eid: ChainId) -> ConfiguratorResult<Option<String>>;

    async fn set_default_send_library(
        &self,
        eid: ChainId,
        lib: &str,
    ) -> ConfiguratorResult<OmniTransaction>;

    async fn get_default_receive_library(&self, eid: ChainId)
        -> ConfiguratorResult<Option<String>>;

    async fn set_default_receive_library(
        &self,
        eid: ChainId,
        lib: &str,
        grace_period: u64,
    ) -> ConfiguratorResult<OmniTransaction>;

    /// `Setting::Default` when the application follows the endpoint default.
    async fn get_send_library(&self, oapp: &str, eid: ChainId)
        -> ConfiguratorResult<Setting<String>>;

    /// `None` resets the application to the endpoint default.
    async fn set_send_library(
        &self,
        oapp: &str,
        eid: ChainId,
        lib: Option<&str>,
    ) -> ConfiguratorResult<OmniTransaction>;

    async fn get_receive_library(
        &self,
        oapp: &str,
        eid: ChainId,
    ) -> ConfiguratorResult<Setting<String>>;

    async fn set_receive_library(
        &self,
        oapp: &str,
        eid: ChainId,
        lib: Option<&str>,
        grace_period: u64,
    ) -> ConfiguratorResult<OmniTransaction>;

    async fn get_receive_library_timeout(
        &self,
        oapp: &str,
        eid: ChainId,
    ) -> ConfiguratorResult<Timeout>;

    async fn set_receive_library_timeout(
        &self,
        oapp: &str,
        eid: ChainId,
        lib: &str,
        expiry: u64,
    ) -> ConfiguratorResult<OmniTransaction>;

    /// Application-specific ULN config stored in `lib`, unresolved against defaults.
    async fn get_app_uln_config(
        &self,
        oapp: &str,
        lib: &str,
        eid: ChainId,
    ) -> ConfiguratorResult<UlnConfig>;

    async fn get_app_executor_config(
        &self,
        oapp: &str,
        lib: &str,
        eid: ChainId,
    ) -> ConfiguratorResult<ExecutorConfig>;

    async fn set_config(
        &self,
        oapp: &str,
        lib: &str,
        params: &[SetConfigParam],
    ) -> ConfiguratorResult<OmniTransaction>;

    /// Library actually used for sending: the pinned one or the endpoint default.
    async fn get_effective_send_library(
        &self,
        oapp: &str,
        eid: ChainId,
    ) -> ConfiguratorResult<String> {
        match self.get_send_library(oapp, eid).await? {
            Setting::Value(lib) => Ok(lib),
            _ => self.get_default_send_library(eid).await?.ok_or_else(|| {
                ConfiguratorError::Read(format!("No default send library for {}", eid))
            }),
        }
    }

    async fn get_effective_receive_library(
        &self,
        oapp: &str,
        eid: ChainId,
    ) -> ConfiguratorResult<String> {
        match self.get_receive_library(oapp, eid).await? {
            Setting::Value(lib) => Ok(lib),
            _ => self.get_default_receive_library(eid).await?.ok_or_else(|| {
                ConfiguratorError::Read(format!("No default receive library for {}", eid))
            }),
        }
    }
}

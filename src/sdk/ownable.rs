// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use super::OmniSdk;
use crate::error::ConfiguratorResult;
use crate::transactions::OmniTransaction;

#[async_trait]
pub trait OwnableSdk: OmniSdk {
    /// Current owner, `None` when ownership was renounced.
    async fn get_owner(&self) -> ConfiguratorResult<Option<String>>;

    async fn set_owner(&self, address: &str) -> ConfiguratorResult<OmniTransaction>;
}

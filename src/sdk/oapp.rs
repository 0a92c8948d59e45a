// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{EndpointSdk, OwnableSdk};
use crate::address::matches_read_address;
use crate::chain::ChainId;
use crate::error::ConfiguratorResult;
use crate::transactions::OmniTransaction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnforcedOptionParam {
    pub eid: ChainId,
    pub msg_type: u16,
    /// Encoded executor options, see [`crate::options`]
    pub options: Vec<u8>,
}

/// Cross-chain application bound to an endpoint.
#[async_trait]
pub trait OAppSdk: OwnableSdk {
    /// SDK for the endpoint this application is registered with.
    async fn get_endpoint_sdk(&self) -> ConfiguratorResult<Arc<dyn EndpointSdk>>;

    /// Peer configured for `eid`, rendered for the remote chain's family.
    async fn get_peer(&self, eid: ChainId) -> ConfiguratorResult<Option<String>>;

    async fn has_peer(&self, eid: ChainId, address: Option<&str>) -> ConfiguratorResult<bool> {
        let current = self.get_peer(eid).await?.unwrap_or_default();
        matches_read_address(address.unwrap_or_default(), &current, eid)
    }

    /// `None` clears the peer.
    async fn set_peer(&self, eid: ChainId, address: Option<&str>)
        -> ConfiguratorResult<OmniTransaction>;

    async fn get_delegate(&self) -> ConfiguratorResult<Option<String>>;

    async fn is_delegate(&self, address: &str) -> ConfiguratorResult<bool> {
        let current = self.get_delegate().await?.unwrap_or_default();
        matches_read_address(address, &current, self.point().chain_id)
    }

    async fn set_delegate(&self, address: &str) -> ConfiguratorResult<OmniTransaction>;

    /// Encoded enforced options for one message type, empty when unset.
    async fn get_enforced_options(&self, eid: ChainId, msg_type: u16)
        -> ConfiguratorResult<Vec<u8>>;

    async fn set_enforced_options(
        &self,
        options: &[EnforcedOptionParam],
    ) -> ConfiguratorResult<OmniTransaction>;
}

// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use super::OmniSdk;
use crate::chain::ChainId;
use crate::error::ConfiguratorResult;
use crate::transactions::OmniTransaction;

/// Gas pricing of a remote chain as seen by the local price oracle.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceData {
    #[serde_as(as = "DisplayFromStr")]
    pub price_ratio: u128,
    #[serde_as(as = "DisplayFromStr")]
    pub gas_price_in_unit: u64,
    pub gas_per_byte: u32,
}

#[async_trait]
pub trait PriceFeedSdk: OmniSdk {
    async fn get_price(&self, eid: ChainId) -> ConfiguratorResult<PriceData>;

    async fn set_price(&self, eid: ChainId, price: &PriceData)
        -> ConfiguratorResult<OmniTransaction>;
}

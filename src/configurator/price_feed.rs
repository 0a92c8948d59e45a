// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use futures::FutureExt;
use serde::{Deserialize, Serialize};

use super::{configure_edges, ConfiguratorFuture};
use crate::omnigraph::OmniGraph;
use crate::sdk::{PriceData, PriceFeedSdk, SdkFactory};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceFeedEdgeConfig {
    pub price: PriceData,
}

/// Keeps the price of every remote chain in line with the edge config.
pub fn configure_price_feed<'a, N: Sync>(
    graph: &'a OmniGraph<N, PriceFeedEdgeConfig>,
    create_sdk: &'a dyn SdkFactory<dyn PriceFeedSdk>,
) -> ConfiguratorFuture<'a> {
    configure_edges(graph, create_sdk, |edge, sdk| async move {
        let eid = edge.vector.to.chain_id;
        let desired = &edge.config.price;
        tracing::debug!("[PriceFeed] Checking price for {}", edge.vector);
        let current = sdk.get_price(eid).await?;
        if current == *desired {
            return Ok(vec![]);
        }
        tracing::info!(
            "[PriceFeed] Price for {} is {:?}, setting {:?}",
            edge.vector,
            current,
            desired
        );
        let tx = sdk.set_price(eid, desired).await?;
        Ok(vec![tx.with_description(format!(
            "Set price for {}: ratio {}, gas price {}, gas per byte {}",
            edge.vector, desired.price_ratio, desired.gas_price_in_unit, desired.gas_per_byte
        ))])
    })
    .boxed()
}

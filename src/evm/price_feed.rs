// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::providers::JsonRpcClient;
use ethers::types::Address as EthAddress;

use super::abi::price_feed_function;
use super::{uint, write_transaction, EvmContext};
use crate::chain::ChainId;
use crate::error::ConfiguratorResult;
use crate::omnigraph::OmniPoint;
use crate::sdk::{OmniSdk, PriceData, PriceFeedSdk};
use crate::transactions::OmniTransaction;

pub struct EvmPriceFeed<P> {
    point: OmniPoint,
    address: EthAddress,
    context: EvmContext<P>,
}

impl<P: JsonRpcClient + 'static> EvmPriceFeed<P> {
    pub fn new(point: OmniPoint, address: EthAddress, context: EvmContext<P>) -> Self {
        Self {
            point,
            address,
            context,
        }
    }
}

impl<P: JsonRpcClient + 'static> OmniSdk for EvmPriceFeed<P> {
    fn point(&self) -> &OmniPoint {
        &self.point
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> PriceFeedSdk for EvmPriceFeed<P> {
    async fn get_price(&self, eid: ChainId) -> ConfiguratorResult<PriceData> {
        let mut price = self
            .context
            .call(self.address, price_feed_function("getPrice")?, &[uint(eid.eid())])
            .await?
            .tuple()?;
        Ok(PriceData {
            price_ratio: price.uint()?,
            gas_price_in_unit: price.uint()?,
            gas_per_byte: price.uint()?,
        })
    }

    async fn set_price(
        &self,
        eid: ChainId,
        price: &PriceData,
    ) -> ConfiguratorResult<OmniTransaction> {
        let update = Token::Tuple(vec![
            uint(eid.eid()),
            Token::Tuple(vec![
                uint(price.price_ratio),
                uint(price.gas_price_in_unit),
                uint(price.gas_per_byte),
            ]),
        ]);
        write_transaction(
            &self.point,
            price_feed_function("setPrice")?,
            &[Token::Array(vec![update])],
        )
    }
}

// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::providers::JsonRpcClient;
use ethers::types::Address as EthAddress;

use super::abi::uln302_function;
use super::{eth_address, format_eth_address, uint, write_transaction, Decoded, EvmContext};
use crate::chain::ChainId;
use crate::error::ConfiguratorResult;
use crate::omnigraph::OmniPoint;
use crate::sdk::{
    ExecutorConfig, OmniSdk, OnChainExecutorConfig, OnChainUlnConfig, Uln302Sdk, UlnConfig,
};
use crate::transactions::OmniTransaction;

pub(crate) fn decode_uln_config(mut out: Decoded) -> ConfiguratorResult<UlnConfig> {
    OnChainUlnConfig {
        confirmations: out.uint()?,
        required_dvn_count: out.uint()?,
        optional_dvn_count: out.uint()?,
        optional_dvn_threshold: out.uint()?,
        required_dvns: out.addresses()?.into_iter().map(format_eth_address).collect(),
        optional_dvns: out.addresses()?.into_iter().map(format_eth_address).collect(),
    }
    .decode()
}

pub(crate) fn decode_executor_config(
    mut out: Decoded,
    chain_id: ChainId,
) -> ConfiguratorResult<ExecutorConfig> {
    OnChainExecutorConfig {
        max_message_size: out.uint()?,
        executor: format_eth_address(out.address()?),
    }
    .decode(chain_id)
}

fn address_tokens(addresses: &[String], chain_id: ChainId) -> ConfiguratorResult<Token> {
    Ok(Token::Array(
        addresses
            .iter()
            .map(|a| eth_address(a, chain_id).map(Token::Address))
            .collect::<ConfiguratorResult<Vec<_>>>()?,
    ))
}

pub(crate) fn uln_config_token(config: &UlnConfig, chain_id: ChainId) -> ConfiguratorResult<Token> {
    let encoded = OnChainUlnConfig::encode(config, chain_id)?;
    Ok(Token::Tuple(vec![
        uint(encoded.confirmations),
        uint(encoded.required_dvn_count),
        uint(encoded.optional_dvn_count),
        uint(encoded.optional_dvn_threshold),
        address_tokens(&encoded.required_dvns, chain_id)?,
        address_tokens(&encoded.optional_dvns, chain_id)?,
    ]))
}

pub(crate) fn executor_config_token(
    config: &ExecutorConfig,
    chain_id: ChainId,
) -> ConfiguratorResult<Token> {
    let encoded = OnChainExecutorConfig::encode(config, chain_id)?;
    Ok(Token::Tuple(vec![
        uint(encoded.max_message_size),
        Token::Address(eth_address(&encoded.executor, chain_id)?),
    ]))
}

/// ULN302 message library. Defaults live in the slot of the zero OApp.
pub struct EvmUln302<P> {
    point: OmniPoint,
    address: EthAddress,
    context: EvmContext<P>,
}

impl<P: JsonRpcClient + 'static> EvmUln302<P> {
    pub fn new(point: OmniPoint, address: EthAddress, context: EvmContext<P>) -> Self {
        Self {
            point,
            address,
            context,
        }
    }
}

impl<P: JsonRpcClient + 'static> OmniSdk for EvmUln302<P> {
    fn point(&self) -> &OmniPoint {
        &self.point
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> Uln302Sdk for EvmUln302<P> {
    async fn get_default_uln_config(&self, eid: ChainId) -> ConfiguratorResult<UlnConfig> {
        let mut out = self
            .context
            .call(
                self.address,
                uln302_function("getAppUlnConfig")?,
                &[Token::Address(EthAddress::zero()), uint(eid.eid())],
            )
            .await?;
        decode_uln_config(out.tuple()?)
    }

    async fn set_default_uln_config(
        &self,
        eid: ChainId,
        config: &UlnConfig,
    ) -> ConfiguratorResult<OmniTransaction> {
        let param = Token::Tuple(vec![
            uint(eid.eid()),
            uln_config_token(config, self.point.chain_id)?,
        ]);
        write_transaction(
            &self.point,
            uln302_function("setDefaultUlnConfigs")?,
            &[Token::Array(vec![param])],
        )
    }

    async fn get_default_executor_config(
        &self,
        eid: ChainId,
    ) -> ConfiguratorResult<ExecutorConfig> {
        let out = self
            .context
            .call(
                self.address,
                uln302_function("executorConfigs")?,
                &[Token::Address(EthAddress::zero()), uint(eid.eid())],
            )
            .await?;
        decode_executor_config(out, self.point.chain_id)
    }

    async fn set_default_executor_config(
        &self,
        eid: ChainId,
        config: &ExecutorConfig,
    ) -> ConfiguratorResult<OmniTransaction> {
        let param = Token::Tuple(vec![
            uint(eid.eid()),
            executor_config_token(config, self.point.chain_id)?,
        ]);
        write_transaction(
            &self.point,
            uln302_function("setDefaultExecutorConfigs")?,
            &[Token::Array(vec![param])],
        )
    }
}

// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::providers::JsonRpcClient;
use ethers::types::Address as EthAddress;

use super::abi::{endpoint_function, uln302_function};
use super::uln302::{
    decode_executor_config, decode_uln_config, executor_config_token, uln_config_token,
};
use super::{eth_address, format_eth_address, non_zero_address, uint, write_transaction, EvmContext};
use crate::chain::ChainId;
use crate::error::ConfiguratorResult;
use crate::omnigraph::OmniPoint;
use crate::sdk::{EndpointSdk, ExecutorConfig, OmniSdk, SetConfigParam, Timeout, UlnConfig};
use crate::setting::Setting;
use crate::transactions::OmniTransaction;

const CONFIG_TYPE_EXECUTOR: u32 = 1;
const CONFIG_TYPE_ULN: u32 = 2;

pub struct EvmEndpointV2<P> {
    point: OmniPoint,
    address: EthAddress,
    context: EvmContext<P>,
}

impl<P: JsonRpcClient + 'static> EvmEndpointV2<P> {
    pub fn new(point: OmniPoint, address: EthAddress, context: EvmContext<P>) -> Self {
        Self {
            point,
            address,
            context,
        }
    }

    fn chain_id(&self) -> ChainId {
        self.point.chain_id
    }

    fn address_of(&self, address: &str) -> ConfiguratorResult<EthAddress> {
        eth_address(address, self.chain_id())
    }

    /// Delegate registered by `oapp`, `None` when unset.
    pub async fn get_delegate_of(&self, oapp: EthAddress) -> ConfiguratorResult<Option<String>> {
        let mut out = self
            .context
            .call(self.address, endpoint_function("delegates")?, &[Token::Address(oapp)])
            .await?;
        Ok(non_zero_address(out.address()?))
    }

    fn config_param(&self, param: &SetConfigParam) -> ConfiguratorResult<Token> {
        let (eid, config_type, config) = match param {
            SetConfigParam::Executor { eid, config } => (
                eid,
                CONFIG_TYPE_EXECUTOR,
                executor_config_token(config, self.chain_id())?,
            ),
            SetConfigParam::Uln { eid, config } => {
                (eid, CONFIG_TYPE_ULN, uln_config_token(config, self.chain_id())?)
            }
        };
        Ok(Token::Tuple(vec![
            uint(eid.eid()),
            uint(config_type),
            Token::Bytes(ethers::abi::encode(&[config])),
        ]))
    }
}

impl<P: JsonRpcClient + 'static> OmniSdk for EvmEndpointV2<P> {
    fn point(&self) -> &OmniPoint {
        &self.point
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> EndpointSdk for EvmEndpointV2<P> {
    async fn is_registered_library(&self, lib: &str) -> ConfiguratorResult<bool> {
        let lib = self.address_of(lib)?;
        self.context
            .call(self.address, endpoint_function("isRegisteredLibrary")?, &[Token::Address(lib)])
            .await?
            .boolean()
    }

    async fn register_library(&self, lib: &str) -> ConfiguratorResult<OmniTransaction> {
        let lib = self.address_of(lib)?;
        write_transaction(
            &self.point,
            endpoint_function("registerLibrary")?,
            &[Token::Address(lib)],
        )
    }

    async fn get_default_send_library(&self, eid: ChainId) -> ConfiguratorResult<Option<String>> {
        let mut out = self
            .context
            .call(self.address, endpoint_function("defaultSendLibrary")?, &[uint(eid.eid())])
            .await?;
        Ok(non_zero_address(out.address()?))
    }

    async fn set_default_send_library(
        &self,
        eid: ChainId,
        lib: &str,
    ) -> ConfiguratorResult<OmniTransaction> {
        let lib = self.address_of(lib)?;
        write_transaction(
            &self.point,
            endpoint_function("setDefaultSendLibrary")?,
            &[uint(eid.eid()), Token::Address(lib)],
        )
    }

    async fn get_default_receive_library(
        &self,
        eid: ChainId,
    ) -> ConfiguratorResult<Option<String>> {
        let mut out = self
            .context
            .call(self.address, endpoint_function("defaultReceiveLibrary")?, &[uint(eid.eid())])
            .await?;
        Ok(non_zero_address(out.address()?))
    }

    async fn set_default_receive_library(
        &self,
        eid: ChainId,
        lib: &str,
        grace_period: u64,
    ) -> ConfiguratorResult<OmniTransaction> {
        let lib = self.address_of(lib)?;
        write_transaction(
            &self.point,
            endpoint_function("setDefaultReceiveLibrary")?,
            &[uint(eid.eid()), Token::Address(lib), uint(grace_period)],
        )
    }

    async fn get_send_library(
        &self,
        oapp: &str,
        eid: ChainId,
    ) -> ConfiguratorResult<Setting<String>> {
        let args = [Token::Address(self.address_of(oapp)?), uint(eid.eid())];
        let is_default = self
            .context
            .call(self.address, endpoint_function("isDefaultSendLibrary")?, &args)
            .await?
            .boolean()?;
        if is_default {
            return Ok(Setting::Default);
        }
        let lib = self
            .context
            .call(self.address, endpoint_function("getSendLibrary")?, &args)
            .await?
            .address()?;
        Ok(Setting::Value(format_eth_address(lib)))
    }

    async fn set_send_library(
        &self,
        oapp: &str,
        eid: ChainId,
        lib: Option<&str>,
    ) -> ConfiguratorResult<OmniTransaction> {
        // the zero address resets to the default library
        let lib = lib.map(|lib| self.address_of(lib)).transpose()?.unwrap_or_default();
        write_transaction(
            &self.point,
            endpoint_function("setSendLibrary")?,
            &[Token::Address(self.address_of(oapp)?), uint(eid.eid()), Token::Address(lib)],
        )
    }

    async fn get_receive_library(
        &self,
        oapp: &str,
        eid: ChainId,
    ) -> ConfiguratorResult<Setting<String>> {
        let mut out = self
            .context
            .call(
                self.address,
                endpoint_function("getReceiveLibrary")?,
                &[Token::Address(self.address_of(oapp)?), uint(eid.eid())],
            )
            .await?;
        let lib = out.address()?;
        Ok(if out.boolean()? {
            Setting::Default
        } else {
            Setting::Value(format_eth_address(lib))
        })
    }

    async fn set_receive_library(
        &self,
        oapp: &str,
        eid: ChainId,
        lib: Option<&str>,
        grace_period: u64,
    ) -> ConfiguratorResult<OmniTransaction> {
        let lib = lib.map(|lib| self.address_of(lib)).transpose()?.unwrap_or_default();
        write_transaction(
            &self.point,
            endpoint_function("setReceiveLibrary")?,
            &[
                Token::Address(self.address_of(oapp)?),
                uint(eid.eid()),
                Token::Address(lib),
                uint(grace_period),
            ],
        )
    }

    async fn get_receive_library_timeout(
        &self,
        oapp: &str,
        eid: ChainId,
    ) -> ConfiguratorResult<Timeout> {
        let mut out = self
            .context
            .call(
                self.address,
                endpoint_function("receiveLibraryTimeout")?,
                &[Token::Address(self.address_of(oapp)?), uint(eid.eid())],
            )
            .await?;
        Ok(Timeout {
            lib: format_eth_address(out.address()?),
            expiry: out.uint()?,
        })
    }

    async fn set_receive_library_timeout(
        &self,
        oapp: &str,
        eid: ChainId,
        lib: &str,
        expiry: u64,
    ) -> ConfiguratorResult<OmniTransaction> {
        write_transaction(
            &self.point,
            endpoint_function("setReceiveLibraryTimeout")?,
            &[
                Token::Address(self.address_of(oapp)?),
                uint(eid.eid()),
                Token::Address(self.address_of(lib)?),
                uint(expiry),
            ],
        )
    }

    async fn get_app_uln_config(
        &self,
        oapp: &str,
        lib: &str,
        eid: ChainId,
    ) -> ConfiguratorResult<UlnConfig> {
        let mut out = self
            .context
            .call(
                self.address_of(lib)?,
                uln302_function("getAppUlnConfig")?,
                &[Token::Address(self.address_of(oapp)?), uint(eid.eid())],
            )
            .await?;
        decode_uln_config(out.tuple()?)
    }

    async fn get_app_executor_config(
        &self,
        oapp: &str,
        lib: &str,
        eid: ChainId,
    ) -> ConfiguratorResult<ExecutorConfig> {
        let out = self
            .context
            .call(
                self.address_of(lib)?,
                uln302_function("executorConfigs")?,
                &[Token::Address(self.address_of(oapp)?), uint(eid.eid())],
            )
            .await?;
        decode_executor_config(out, self.chain_id())
    }

    async fn set_config(
        &self,
        oapp: &str,
        lib: &str,
        params: &[SetConfigParam],
    ) -> ConfiguratorResult<OmniTransaction> {
        let params = params
            .iter()
            .map(|param| self.config_param(param))
            .collect::<ConfiguratorResult<Vec<_>>>()?;
        write_transaction(
            &self.point,
            endpoint_function("setConfig")?,
            &[
                Token::Address(self.address_of(oapp)?),
                Token::Address(self.address_of(lib)?),
                Token::Array(params),
            ],
        )
    }
}

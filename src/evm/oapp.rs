// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::providers::JsonRpcClient;
use ethers::types::Address as EthAddress;
use tokio::sync::OnceCell;
use tracing::debug;

use super::abi::oapp_function;
use super::{eth_address, non_zero_address, uint, write_transaction, EvmContext, EvmEndpointV2};
use crate::address::{denormalize, normalize_or_zero, CanonicalAddress};
use crate::chain::ChainId;
use crate::error::{ConfiguratorError, ConfiguratorResult};
use crate::omnigraph::OmniPoint;
use crate::sdk::{EndpointSdk, EnforcedOptionParam, OAppSdk, OmniSdk, OwnableSdk};
use crate::transactions::OmniTransaction;

/// OApp contract. Peers are stored as `bytes32` and rendered for the remote
/// chain on read.
pub struct EvmOApp<P> {
    point: OmniPoint,
    address: EthAddress,
    context: EvmContext<P>,
    endpoint: OnceCell<Arc<EvmEndpointV2<P>>>,
}

impl<P: JsonRpcClient + 'static> EvmOApp<P> {
    pub fn new(point: OmniPoint, address: EthAddress, context: EvmContext<P>) -> Self {
        Self {
            point,
            address,
            context,
            endpoint: OnceCell::new(),
        }
    }

    async fn endpoint(&self) -> ConfiguratorResult<&Arc<EvmEndpointV2<P>>> {
        self.endpoint
            .get_or_try_init(|| async {
                let mut out = self
                    .context
                    .call(self.address, oapp_function("endpoint")?, &[])
                    .await?;
                let address = out.address()?;
                debug!("[OApp] {} is bound to endpoint {:#x}", self.point, address);
                let point = OmniPoint::new(self.point.chain_id, super::format_eth_address(address));
                Ok(Arc::new(EvmEndpointV2::new(point, address, self.context.clone())))
            })
            .await
    }
}

impl<P: JsonRpcClient + 'static> OmniSdk for EvmOApp<P> {
    fn point(&self) -> &OmniPoint {
        &self.point
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> OwnableSdk for EvmOApp<P> {
    async fn get_owner(&self) -> ConfiguratorResult<Option<String>> {
        let mut out = self
            .context
            .call(self.address, oapp_function("owner")?, &[])
            .await?;
        Ok(non_zero_address(out.address()?))
    }

    async fn set_owner(&self, address: &str) -> ConfiguratorResult<OmniTransaction> {
        let owner = eth_address(address, self.point.chain_id)?;
        Ok(write_transaction(
            &self.point,
            oapp_function("transferOwnership")?,
            &[Token::Address(owner)],
        )?
        .with_description(format!("Transferring ownership to {}", address)))
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> OAppSdk for EvmOApp<P> {
    async fn get_endpoint_sdk(&self) -> ConfiguratorResult<Arc<dyn EndpointSdk>> {
        let endpoint: Arc<dyn EndpointSdk> = self.endpoint().await?.clone();
        Ok(endpoint)
    }

    async fn get_peer(&self, eid: ChainId) -> ConfiguratorResult<Option<String>> {
        let mut out = self
            .context
            .call(self.address, oapp_function("peers")?, &[uint(eid.eid())])
            .await?;
        let peer = CanonicalAddress::new(out.bytes32()?);
        if peer.is_zero() {
            return Ok(None);
        }
        denormalize(&peer, eid)
            .map(Some)
            .map_err(|e| ConfiguratorError::DiffComparison(e.to_string()))
    }

    async fn set_peer(
        &self,
        eid: ChainId,
        address: Option<&str>,
    ) -> ConfiguratorResult<OmniTransaction> {
        let peer = normalize_or_zero(address.unwrap_or_default(), eid)?;
        let description = match address {
            Some(address) => format!("Setting peer for eid {} ({}) to {}", eid.eid(), eid, address),
            None => format!("Clearing peer for eid {} ({})", eid.eid(), eid),
        };
        Ok(write_transaction(
            &self.point,
            oapp_function("setPeer")?,
            &[uint(eid.eid()), Token::FixedBytes(peer.as_bytes().to_vec())],
        )?
        .with_description(description))
    }

    async fn get_delegate(&self) -> ConfiguratorResult<Option<String>> {
        self.endpoint().await?.get_delegate_of(self.address).await
    }

    async fn set_delegate(&self, address: &str) -> ConfiguratorResult<OmniTransaction> {
        let delegate = eth_address(address, self.point.chain_id)?;
        Ok(write_transaction(
            &self.point,
            oapp_function("setDelegate")?,
            &[Token::Address(delegate)],
        )?
        .with_description(format!("Setting delegate to {}", address)))
    }

    async fn get_enforced_options(
        &self,
        eid: ChainId,
        msg_type: u16,
    ) -> ConfiguratorResult<Vec<u8>> {
        let mut out = self
            .context
            .call(
                self.address,
                oapp_function("enforcedOptions")?,
                &[uint(eid.eid()), uint(msg_type)],
            )
            .await?;
        out.bytes()
    }

    async fn set_enforced_options(
        &self,
        options: &[EnforcedOptionParam],
    ) -> ConfiguratorResult<OmniTransaction> {
        let params = options
            .iter()
            .map(|param| {
                Token::Tuple(vec![
                    uint(param.eid.eid()),
                    uint(param.msg_type),
                    Token::Bytes(param.options.clone()),
                ])
            })
            .collect();
        Ok(write_transaction(
            &self.point,
            oapp_function("setEnforcedOptions")?,
            &[Token::Array(params)],
        )?
        .with_description(format!("Setting {} enforced option(s)", options.len())))
    }
}

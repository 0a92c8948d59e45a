// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! EVM chain family.
//!
//! SDKs encode calls against static ABI tables and read through `eth_call`.
//! Every read goes through the [`RetryPolicy`] of the [`EvmContext`]; provider
//! transport failures are transient, reverts and undecodable output are not.

mod abi;
mod endpoint;
mod oapp;
mod price_feed;
mod signer;
mod uln302;

pub use endpoint::EvmEndpointV2;
pub use oapp::EvmOApp;
pub use price_feed::EvmPriceFeed;
pub use signer::EvmSigner;
pub use uln302::EvmUln302;

use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::{Function, Token};
use ethers::providers::{JsonRpcClient, Middleware, Provider, ProviderError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address as EthAddress, TransactionRequest, U256};
use ethers::utils::to_checksum;

use crate::address::normalize;
use crate::chain::{ChainFamily, ChainId};
use crate::error::{ConfiguratorError, ConfiguratorResult};
use crate::omnigraph::OmniPoint;
use crate::retry::RetryPolicy;
use crate::sdk::{EndpointSdk, OAppSdk, PriceFeedSdk, SdkFactory, Uln302Sdk};
use crate::transactions::OmniTransaction;

/// Provider plus the retry policy applied to every read.
#[derive(Debug)]
pub struct EvmContext<P> {
    provider: Arc<Provider<P>>,
    retry: RetryPolicy,
}

impl<P> Clone for EvmContext<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            retry: self.retry.clone(),
        }
    }
}

impl<P: JsonRpcClient + 'static> EvmContext<P> {
    pub fn new(provider: Arc<Provider<P>>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    pub fn provider(&self) -> &Arc<Provider<P>> {
        &self.provider
    }

    /// `eth_call`s `function` on `to` and decodes its output.
    pub(crate) async fn call(
        &self,
        to: EthAddress,
        function: &Function,
        args: &[Token],
    ) -> ConfiguratorResult<Decoded> {
        let data = encode_call(function, args)?;
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        let output = self
            .retry
            .retry(&function.name, || async {
                self.provider
                    .call(&tx, None)
                    .await
                    .map_err(|e| classify_provider_error(&function.name, e))
            })
            .await?;
        let tokens = function.decode_output(&output).map_err(|e| {
            ConfiguratorError::DiffComparison(format!(
                "Failed to decode output of {}: {}",
                function.name, e
            ))
        })?;
        Ok(Decoded::new(&function.name, tokens))
    }
}

/// Transport failures may succeed on retry; a JSON-RPC error response (a
/// revert included) is deterministic.
pub(crate) fn classify_provider_error(label: &str, error: ProviderError) -> ConfiguratorError {
    match &error {
        ProviderError::JsonRpcClientError(inner) if inner.as_error_response().is_some() => {
            ConfiguratorError::Read(format!("{} failed: {}", label, error))
        }
        ProviderError::JsonRpcClientError(_) | ProviderError::HTTPError(_) => {
            ConfiguratorError::TransientRead(format!("{} failed: {}", label, error))
        }
        _ => ConfiguratorError::Read(format!("{} failed: {}", label, error)),
    }
}

pub(crate) fn encode_call(function: &Function, args: &[Token]) -> ConfiguratorResult<Vec<u8>> {
    function.encode_input(args).map_err(|e| {
        ConfiguratorError::Read(format!("Failed to encode {}: {}", function.name, e))
    })
}

/// Unsigned write of `function(args)` to `point`.
pub(crate) fn write_transaction(
    point: &OmniPoint,
    function: &Function,
    args: &[Token],
) -> ConfiguratorResult<OmniTransaction> {
    let data = encode_call(function, args)?;
    Ok(OmniTransaction::new(
        point.clone(),
        format!("0x{}", hex::encode(data)),
    ))
}

pub(crate) fn eth_address(address: &str, chain_id: ChainId) -> ConfiguratorResult<EthAddress> {
    let canonical = normalize(address, chain_id)?;
    Ok(EthAddress::from_slice(&canonical.as_bytes()[12..]))
}

pub(crate) fn format_eth_address(address: EthAddress) -> String {
    to_checksum(&address, None)
}

/// `None` for the zero address, which is how unset slots read back.
pub(crate) fn non_zero_address(address: EthAddress) -> Option<String> {
    (!address.is_zero()).then(|| format_eth_address(address))
}

pub(crate) fn uint(value: impl Into<U256>) -> Token {
    Token::Uint(value.into())
}

/// Typed cursor over decoded output tokens.
pub(crate) struct Decoded {
    label: String,
    tokens: std::vec::IntoIter<Token>,
}

impl Decoded {
    fn new(label: &str, tokens: Vec<Token>) -> Self {
        Self {
            label: label.to_string(),
            tokens: tokens.into_iter(),
        }
    }

    fn mismatch(&self, expected: &str, token: Option<Token>) -> ConfiguratorError {
        ConfiguratorError::DiffComparison(format!(
            "{}: expected {}, got {:?}",
            self.label, expected, token
        ))
    }

    fn next_token(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    pub fn address(&mut self) -> ConfiguratorResult<EthAddress> {
        match self.next_token() {
            Some(Token::Address(address)) => Ok(address),
            other => Err(self.mismatch("address", other)),
        }
    }

    pub fn addresses(&mut self) -> ConfiguratorResult<Vec<EthAddress>> {
        match self.next_token() {
            Some(Token::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Token::Address(address) => Ok(address),
                    other => Err(self.mismatch("address", Some(other))),
                })
                .collect(),
            other => Err(self.mismatch("address[]", other)),
        }
    }

    pub fn boolean(&mut self) -> ConfiguratorResult<bool> {
        match self.next_token() {
            Some(Token::Bool(value)) => Ok(value),
            other => Err(self.mismatch("bool", other)),
        }
    }

    pub fn bytes(&mut self) -> ConfiguratorResult<Vec<u8>> {
        match self.next_token() {
            Some(Token::Bytes(value)) => Ok(value),
            other => Err(self.mismatch("bytes", other)),
        }
    }

    pub fn bytes32(&mut self) -> ConfiguratorResult<[u8; 32]> {
        match self.next_token() {
            Some(Token::FixedBytes(value)) if value.len() == 32 => {
                let mut out = [0u8; 32];
                out.copy_from_slice(&value);
                Ok(out)
            }
            other => Err(self.mismatch("bytes32", other)),
        }
    }

    pub fn uint<T: TryFrom<U256>>(&mut self) -> ConfiguratorResult<T> {
        match self.next_token() {
            Some(Token::Uint(value)) => T::try_from(value).map_err(|_| {
                ConfiguratorError::DiffComparison(format!(
                    "{}: {} is out of range for {}",
                    self.label,
                    value,
                    std::any::type_name::<T>()
                ))
            }),
            other => Err(self.mismatch("uint", other)),
        }
    }

    pub fn tuple(&mut self) -> ConfiguratorResult<Decoded> {
        match self.next_token() {
            Some(Token::Tuple(items)) => Ok(Decoded::new(&self.label, items)),
            other => Err(self.mismatch("tuple", other)),
        }
    }
}

fn ensure_evm(point: &OmniPoint) -> ConfiguratorResult<EthAddress> {
    if point.chain_id.family() != ChainFamily::Evm {
        return Err(ConfiguratorError::SdkConstruction {
            point: point.clone(),
            reason: format!("{} is not an EVM chain", point.chain_id),
        });
    }
    eth_address(&point.address, point.chain_id).map_err(|e| ConfiguratorError::SdkConstruction {
        point: point.clone(),
        reason: e.to_string(),
    })
}

/// Creates EVM SDKs of every kind over one provider.
///
/// Configurators memoize it per run. Wrap it in a
/// [`crate::sdk::MemoizedSdkFactory`] to share SDKs across runs.
pub struct EvmSdkFactory<P> {
    context: EvmContext<P>,
}

impl<P> Clone for EvmSdkFactory<P> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
        }
    }
}

impl<P: JsonRpcClient + 'static> EvmSdkFactory<P> {
    pub fn new(context: EvmContext<P>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> SdkFactory<dyn OAppSdk> for EvmSdkFactory<P> {
    async fn create(&self, point: &OmniPoint) -> ConfiguratorResult<Arc<dyn OAppSdk>> {
        let address = ensure_evm(point)?;
        Ok(Arc::new(EvmOApp::new(point.clone(), address, self.context.clone())))
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> SdkFactory<dyn EndpointSdk> for EvmSdkFactory<P> {
    async fn create(&self, point: &OmniPoint) -> ConfiguratorResult<Arc<dyn EndpointSdk>> {
        let address = ensure_evm(point)?;
        Ok(Arc::new(EvmEndpointV2::new(point.clone(), address, self.context.clone())))
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> SdkFactory<dyn Uln302Sdk> for EvmSdkFactory<P> {
    async fn create(&self, point: &OmniPoint) -> ConfiguratorResult<Arc<dyn Uln302Sdk>> {
        let address = ensure_evm(point)?;
        Ok(Arc::new(EvmUln302::new(point.clone(), address, self.context.clone())))
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> SdkFactory<dyn PriceFeedSdk> for EvmSdkFactory<P> {
    async fn create(&self, point: &OmniPoint) -> ConfiguratorResult<Arc<dyn PriceFeedSdk>> {
        let address = ensure_evm(point)?;
        Ok(Arc::new(EvmPriceFeed::new(point.clone(), address, self.context.clone())))
    }
}

// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory chain backing every SDK trait, for configurator tests.
//!
//! Writes are encoded as JSON [`MockCall`]s in the transaction data and take
//! effect only when [`MockChain::apply`] executes them, so a test can diff,
//! apply the output and diff again.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::address::{denormalize, normalize, normalize_or_zero, CanonicalAddress};
use crate::chain::ChainId;
use crate::error::{ConfiguratorError, ConfiguratorResult};
use crate::omnigraph::OmniPoint;
use crate::retry::{RetryConfig, RetryPolicy};
use crate::sdk::{
    EndpointSdk, EnforcedOptionParam, ExecutorConfig, MemoizedSdkFactory, OAppSdk, OmniSdk,
    OnChainExecutorConfig, OnChainUlnConfig, OwnableSdk, PriceData, PriceFeedSdk, SetConfigParam,
    Timeout, Uln302Sdk, UlnConfig,
};
use crate::setting::Setting;
use crate::signer::{OmniSigner, SignerFactory, TransactionReceipt, TransactionResponse};
use crate::transactions::OmniTransaction;

type Key = (ChainId, CanonicalAddress);

fn key(chain_id: ChainId, address: &str) -> ConfiguratorResult<Key> {
    Ok((chain_id, normalize(address, chain_id)?))
}

fn point_key(point: &OmniPoint) -> ConfiguratorResult<Key> {
    key(point.chain_id, &point.address)
}

/// What an unset ULN config slot reads as.
pub fn unset_uln_config() -> UlnConfig {
    UlnConfig {
        confirmations: Setting::Default,
        required_dvns: Setting::Default,
        optional_dvns: Setting::Default,
    }
}

pub fn unset_executor_config() -> ExecutorConfig {
    ExecutorConfig {
        max_message_size: Setting::Default,
        executor: Setting::Default,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MockConfigParam {
    Executor { eid: ChainId, config: ExecutorConfig },
    Uln { eid: ChainId, config: UlnConfig },
}

impl From<&SetConfigParam> for MockConfigParam {
    fn from(param: &SetConfigParam) -> Self {
        match param {
            SetConfigParam::Executor { eid, config } => MockConfigParam::Executor {
                eid: *eid,
                config: config.clone(),
            },
            SetConfigParam::Uln { eid, config } => MockConfigParam::Uln {
                eid: *eid,
                config: config.clone(),
            },
        }
    }
}

/// A write, addressed to the point of the transaction carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum MockCall {
    BindEndpoint { endpoint: String },
    SetOwner { owner: String },
    SetPeer { eid: ChainId, peer: Option<String> },
    SetDelegate { delegate: String },
    SetEnforcedOptions { options: Vec<EnforcedOptionParam> },
    RegisterLibrary { lib: String },
    SetDefaultSendLibrary { eid: ChainId, lib: String },
    SetDefaultReceiveLibrary { eid: ChainId, lib: String, grace_period: u64 },
    SetSendLibrary { oapp: String, eid: ChainId, lib: Option<String> },
    SetReceiveLibrary { oapp: String, eid: ChainId, lib: Option<String>, grace_period: u64 },
    SetReceiveLibraryTimeout { oapp: String, eid: ChainId, lib: String, expiry: u64 },
    SetConfig { oapp: String, lib: String, params: Vec<MockConfigParam> },
    SetDefaultUlnConfig { eid: ChainId, config: UlnConfig },
    SetDefaultExecutorConfig { eid: ChainId, config: ExecutorConfig },
    SetPrice { eid: ChainId, price: PriceData },
}

#[derive(Debug, Default)]
pub struct MockState {
    pub reads: usize,
    pub sdk_creations: usize,
    pub applied: Vec<MockCall>,
    failures: VecDeque<ConfiguratorError>,
    endpoints: HashMap<Key, String>,
    owners: HashMap<Key, String>,
    delegates: HashMap<Key, String>,
    peers: HashMap<(Key, ChainId), CanonicalAddress>,
    enforced_options: HashMap<(Key, ChainId, u16), Vec<u8>>,
    registered_libraries: HashMap<Key, Vec<CanonicalAddress>>,
    default_send_libraries: HashMap<(Key, ChainId), String>,
    default_receive_libraries: HashMap<(Key, ChainId), String>,
    send_libraries: HashMap<(Key, ChainId), String>,
    receive_libraries: HashMap<(Key, ChainId), String>,
    receive_library_timeouts: HashMap<(Key, ChainId), Timeout>,
    app_uln_configs: HashMap<(Key, Key, ChainId), UlnConfig>,
    app_executor_configs: HashMap<(Key, Key, ChainId), ExecutorConfig>,
    default_uln_configs: HashMap<(Key, ChainId), UlnConfig>,
    default_executor_configs: HashMap<(Key, ChainId), ExecutorConfig>,
    prices: HashMap<(Key, ChainId), PriceData>,
}

/// Shared state of every simulated chain. Clones share the state.
#[derive(Clone)]
pub struct MockChain {
    state: Arc<Mutex<MockState>>,
    retry: RetryPolicy,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            retry: RetryPolicy::new(
                RetryConfig::default().with_initial_interval(Duration::from_millis(1)),
            ),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn reads(&self) -> usize {
        self.lock().reads
    }

    pub fn sdk_creations(&self) -> usize {
        self.lock().sdk_creations
    }

    /// The next reads fail with `errors`, in order.
    pub fn fail_next_reads(&self, errors: impl IntoIterator<Item = ConfiguratorError>) {
        self.lock().failures.extend(errors);
    }

    async fn read<T, F>(&self, label: &str, f: F) -> ConfiguratorResult<T>
    where
        T: Send,
        F: Fn(&MockState) -> ConfiguratorResult<T> + Send + Sync,
    {
        self.retry
            .retry(label, || {
                let result = self.try_read(&f);
                async move { result }
            })
            .await
    }

    fn try_read<T>(
        &self,
        f: &impl Fn(&MockState) -> ConfiguratorResult<T>,
    ) -> ConfiguratorResult<T> {
        let mut state = self.lock();
        state.reads += 1;
        if let Some(error) = state.failures.pop_front() {
            return Err(error);
        }
        f(&state)
    }

    fn write(&self, point: &OmniPoint, call: MockCall) -> ConfiguratorResult<OmniTransaction> {
        let data = serde_json::to_string(&call)
            .map_err(|e| ConfiguratorError::Read(format!("Failed to encode {:?}: {}", call, e)))?;
        Ok(OmniTransaction::new(point.clone(), data))
    }

    /// Applies `call` as if a transaction carrying it was executed at `point`.
    pub fn seed(&self, point: &OmniPoint, call: MockCall) {
        let tx = self.write(point, call).unwrap();
        self.apply(&tx).unwrap();
    }

    /// Executes a transaction produced by one of the mock SDKs.
    pub fn apply(&self, tx: &OmniTransaction) -> ConfiguratorResult<()> {
        let call: MockCall = serde_json::from_str(&tx.data)
            .map_err(|e| ConfiguratorError::Signer(format!("Not a mock call: {}", e)))?;
        let chain_id = tx.point.chain_id;
        let target = point_key(&tx.point)?;
        let mut state = self.lock();
        match call.clone() {
            MockCall::BindEndpoint { endpoint } => {
                state.endpoints.insert(target, endpoint);
            }
            MockCall::SetOwner { owner } => {
                state.owners.insert(target, owner);
            }
            MockCall::SetPeer { eid, peer } => {
                let peer = normalize_or_zero(peer.as_deref().unwrap_or_default(), eid)?;
                if peer.is_zero() {
                    state.peers.remove(&(target, eid));
                } else {
                    state.peers.insert((target, eid), peer);
                }
            }
            MockCall::SetDelegate { delegate } => {
                state.delegates.insert(target, delegate);
            }
            MockCall::SetEnforcedOptions { options } => {
                for param in options {
                    let slot = (target, param.eid, param.msg_type);
                    if param.options.is_empty() {
                        state.enforced_options.remove(&slot);
                    } else {
                        state.enforced_options.insert(slot, param.options);
                    }
                }
            }
            MockCall::RegisterLibrary { lib } => {
                let lib = normalize(&lib, chain_id)?;
                let registered = state.registered_libraries.entry(target).or_default();
                if registered.contains(&lib) {
                    return Err(ConfiguratorError::Signer("Library already registered".to_string()));
                }
                registered.push(lib);
            }
            MockCall::SetDefaultSendLibrary { eid, lib } => {
                state.default_send_libraries.insert((target, eid), lib);
            }
            MockCall::SetDefaultReceiveLibrary { eid, lib, .. } => {
                state.default_receive_libraries.insert((target, eid), lib);
            }
            MockCall::SetSendLibrary { oapp, eid, lib } => {
                let slot = (key(chain_id, &oapp)?, eid);
                match lib {
                    Some(lib) => state.send_libraries.insert(slot, lib),
                    None => state.send_libraries.remove(&slot),
                };
            }
            MockCall::SetReceiveLibrary { oapp, eid, lib, .. } => {
                let slot = (key(chain_id, &oapp)?, eid);
                match lib {
                    Some(lib) => state.receive_libraries.insert(slot, lib),
                    None => state.receive_libraries.remove(&slot),
                };
            }
            MockCall::SetReceiveLibraryTimeout { oapp, eid, lib, expiry } => {
                state
                    .receive_library_timeouts
                    .insert((key(chain_id, &oapp)?, eid), Timeout { lib, expiry });
            }
            MockCall::SetConfig { oapp, lib, params } => {
                let (oapp, lib) = (key(chain_id, &oapp)?, key(chain_id, &lib)?);
                for param in params {
                    // stored the way the library stores it, sentinels included
                    match param {
                        MockConfigParam::Executor { eid, config } => {
                            let config =
                                OnChainExecutorConfig::encode(&config, chain_id)?.decode(chain_id)?;
                            state.app_executor_configs.insert((oapp, lib, eid), config);
                        }
                        MockConfigParam::Uln { eid, config } => {
                            let config = OnChainUlnConfig::encode(&config, chain_id)?.decode()?;
                            state.app_uln_configs.insert((oapp, lib, eid), config);
                        }
                    }
                }
            }
            MockCall::SetDefaultUlnConfig { eid, config } => {
                let config = OnChainUlnConfig::encode(&config, chain_id)?.decode()?;
                state.default_uln_configs.insert((target, eid), config);
            }
            MockCall::SetDefaultExecutorConfig { eid, config } => {
                let config = OnChainExecutorConfig::encode(&config, chain_id)?.decode(chain_id)?;
                state.default_executor_configs.insert((target, eid), config);
            }
            MockCall::SetPrice { eid, price } => {
                state.prices.insert((target, eid), price);
            }
        }
        state.applied.push(call);
        Ok(())
    }

    /// Applies every transaction in order.
    pub fn apply_all(&self, txs: &[OmniTransaction]) -> ConfiguratorResult<()> {
        txs.iter().try_for_each(|tx| self.apply(tx))
    }

    fn created(&self) {
        self.lock().sdk_creations += 1;
    }

    pub fn oapp_factory(&self) -> MemoizedSdkFactory<'static, dyn OAppSdk> {
        let chain = self.clone();
        MemoizedSdkFactory::from_fn(move |point: OmniPoint| {
            let chain = chain.clone();
            async move {
                chain.created();
                Ok(Arc::new(MockOApp { point, chain }) as Arc<dyn OAppSdk>)
            }
        })
    }

    pub fn endpoint_factory(&self) -> MemoizedSdkFactory<'static, dyn EndpointSdk> {
        let chain = self.clone();
        MemoizedSdkFactory::from_fn(move |point: OmniPoint| {
            let chain = chain.clone();
            async move {
                chain.created();
                Ok(Arc::new(MockEndpoint { point, chain }) as Arc<dyn EndpointSdk>)
            }
        })
    }

    pub fn uln302_factory(&self) -> MemoizedSdkFactory<'static, dyn Uln302Sdk> {
        let chain = self.clone();
        MemoizedSdkFactory::from_fn(move |point: OmniPoint| {
            let chain = chain.clone();
            async move {
                chain.created();
                Ok(Arc::new(MockUln302 { point, chain }) as Arc<dyn Uln302Sdk>)
            }
        })
    }

    pub fn price_feed_factory(&self) -> MemoizedSdkFactory<'static, dyn PriceFeedSdk> {
        let chain = self.clone();
        MemoizedSdkFactory::from_fn(move |point: OmniPoint| {
            let chain = chain.clone();
            async move {
                chain.created();
                Ok(Arc::new(MockPriceFeed { point, chain }) as Arc<dyn PriceFeedSdk>)
            }
        })
    }
}

pub struct MockOApp {
    point: OmniPoint,
    chain: MockChain,
}

impl OmniSdk for MockOApp {
    fn point(&self) -> &OmniPoint {
        &self.point
    }
}

#[async_trait]
impl OwnableSdk for MockOApp {
    async fn get_owner(&self) -> ConfiguratorResult<Option<String>> {
        let this = point_key(&self.point)?;
        self.chain
            .read("owner", |state| Ok(state.owners.get(&this).cloned()))
            .await
    }

    async fn set_owner(&self, address: &str) -> ConfiguratorResult<OmniTransaction> {
        normalize(address, self.point.chain_id)?;
        self.chain.write(
            &self.point,
            MockCall::SetOwner {
                owner: address.to_string(),
            },
        )
    }
}

#[async_trait]
impl OAppSdk for MockOApp {
    async fn get_endpoint_sdk(&self) -> ConfiguratorResult<Arc<dyn EndpointSdk>> {
        let this = point_key(&self.point)?;
        let endpoint = self
            .chain
            .read("endpoint", |state| Ok(state.endpoints.get(&this).cloned()))
            .await?
            .ok_or_else(|| {
                ConfiguratorError::Read(format!("{} is not bound to an endpoint", self.point))
            })?;
        Ok(Arc::new(MockEndpoint {
            point: OmniPoint::new(self.point.chain_id, endpoint),
            chain: self.chain.clone(),
        }))
    }

    async fn get_peer(&self, eid: ChainId) -> ConfiguratorResult<Option<String>> {
        let this = point_key(&self.point)?;
        let peer = self
            .chain
            .read("peers", |state| Ok(state.peers.get(&(this, eid)).copied()))
            .await?;
        peer.map(|peer| denormalize(&peer, eid)).transpose()
    }

    async fn set_peer(
        &self,
        eid: ChainId,
        address: Option<&str>,
    ) -> ConfiguratorResult<OmniTransaction> {
        normalize_or_zero(address.unwrap_or_default(), eid)?;
        self.chain.write(
            &self.point,
            MockCall::SetPeer {
                eid,
                peer: address.map(str::to_string),
            },
        )
    }

    async fn get_delegate(&self) -> ConfiguratorResult<Option<String>> {
        let this = point_key(&self.point)?;
        self.chain
            .read("delegates", |state| Ok(state.delegates.get(&this).cloned()))
            .await
    }

    async fn set_delegate(&self, address: &str) -> ConfiguratorResult<OmniTransaction> {
        normalize(address, self.point.chain_id)?;
        self.chain.write(
            &self.point,
            MockCall::SetDelegate {
                delegate: address.to_string(),
            },
        )
    }

    async fn get_enforced_options(
        &self,
        eid: ChainId,
        msg_type: u16,
    ) -> ConfiguratorResult<Vec<u8>> {
        let this = point_key(&self.point)?;
        self.chain
            .read("enforcedOptions", |state| {
                Ok(state
                    .enforced_options
                    .get(&(this, eid, msg_type))
                    .cloned()
                    .unwrap_or_default())
            })
            .await
    }

    async fn set_enforced_options(
        &self,
        options: &[EnforcedOptionParam],
    ) -> ConfiguratorResult<OmniTransaction> {
        self.chain.write(
            &self.point,
            MockCall::SetEnforcedOptions {
                options: options.to_vec(),
            },
        )
    }
}

pub struct MockEndpoint {
    point: OmniPoint,
    chain: MockChain,
}

impl MockEndpoint {
    fn key_of(&self, address: &str) -> ConfiguratorResult<Key> {
        key(self.point.chain_id, address)
    }
}

impl OmniSdk for MockEndpoint {
    fn point(&self) -> &OmniPoint {
        &self.point
    }
}

#[async_trait]
impl EndpointSdk for MockEndpoint {
    async fn is_registered_library(&self, lib: &str) -> ConfiguratorResult<bool> {
        let this = point_key(&self.point)?;
        let lib = normalize(lib, self.point.chain_id)?;
        self.chain
            .read("isRegisteredLibrary", |state| {
                Ok(state
                    .registered_libraries
                    .get(&this)
                    .map(|libs| libs.contains(&lib))
                    .unwrap_or(false))
            })
            .await
    }

    async fn register_library(&self, lib: &str) -> ConfiguratorResult<OmniTransaction> {
        normalize(lib, self.point.chain_id)?;
        self.chain.write(
            &self.point,
            MockCall::RegisterLibrary {
                lib: lib.to_string(),
            },
        )
    }

    async fn get_default_send_library(&self, eid: ChainId) -> ConfiguratorResult<Option<String>> {
        let this = point_key(&self.point)?;
        self.chain
            .read("defaultSendLibrary", |state| {
                Ok(state.default_send_libraries.get(&(this, eid)).cloned())
            })
            .await
    }

    async fn set_default_send_library(
        &self,
        eid: ChainId,
        lib: &str,
    ) -> ConfiguratorResult<OmniTransaction> {
        self.chain.write(
            &self.point,
            MockCall::SetDefaultSendLibrary {
                eid,
                lib: lib.to_string(),
            },
        )
    }

    async fn get_default_receive_library(
        &self,
        eid: ChainId,
    ) -> ConfiguratorResult<Option<String>> {
        let this = point_key(&self.point)?;
        self.chain
            .read("defaultReceiveLibrary", |state| {
                Ok(state.default_receive_libraries.get(&(this, eid)).cloned())
            })
            .await
    }

    async fn set_default_receive_library(
        &self,
        eid: ChainId,
        lib: &str,
        grace_period: u64,
    ) -> ConfiguratorResult<OmniTransaction> {
        self.chain.write(
            &self.point,
            MockCall::SetDefaultReceiveLibrary {
                eid,
                lib: lib.to_string(),
                grace_period,
            },
        )
    }

    async fn get_send_library(
        &self,
        oapp: &str,
        eid: ChainId,
    ) -> ConfiguratorResult<Setting<String>> {
        let oapp = self.key_of(oapp)?;
        self.chain
            .read("getSendLibrary", |state| {
                Ok(state.send_libraries.get(&(oapp, eid)).cloned().into())
            })
            .await
    }

    async fn set_send_library(
        &self,
        oapp: &str,
        eid: ChainId,
        lib: Option<&str>,
    ) -> ConfiguratorResult<OmniTransaction> {
        self.chain.write(
            &self.point,
            MockCall::SetSendLibrary {
                oapp: oapp.to_string(),
                eid,
                lib: lib.map(str::to_string),
            },
        )
    }

    async fn get_receive_library(
        &self,
        oapp: &str,
        eid: ChainId,
    ) -> ConfiguratorResult<Setting<String>> {
        let oapp = self.key_of(oapp)?;
        self.chain
            .read("getReceiveLibrary", |state| {
                Ok(state.receive_libraries.get(&(oapp, eid)).cloned().into())
            })
            .await
    }

    async fn set_receive_library(
        &self,
        oapp: &str,
        eid: ChainId,
        lib: Option<&str>,
        grace_period: u64,
    ) -> ConfiguratorResult<OmniTransaction> {
        self.chain.write(
            &self.point,
            MockCall::SetReceiveLibrary {
                oapp: oapp.to_string(),
                eid,
                lib: lib.map(str::to_string),
                grace_period,
            },
        )
    }

    async fn get_receive_library_timeout(
        &self,
        oapp: &str,
        eid: ChainId,
    ) -> ConfiguratorResult<Timeout> {
        let oapp = self.key_of(oapp)?;
        self.chain
            .read("receiveLibraryTimeout", |state| {
                Ok(state
                    .receive_library_timeouts
                    .get(&(oapp, eid))
                    .cloned()
                    .unwrap_or_default())
            })
            .await
    }

    async fn set_receive_library_timeout(
        &self,
        oapp: &str,
        eid: ChainId,
        lib: &str,
        expiry: u64,
    ) -> ConfiguratorResult<OmniTransaction> {
        self.chain.write(
            &self.point,
            MockCall::SetReceiveLibraryTimeout {
                oapp: oapp.to_string(),
                eid,
                lib: lib.to_string(),
                expiry,
            },
        )
    }

    async fn get_app_uln_config(
        &self,
        oapp: &str,
        lib: &str,
        eid: ChainId,
    ) -> ConfiguratorResult<UlnConfig> {
        let slot = (self.key_of(oapp)?, self.key_of(lib)?, eid);
        self.chain
            .read("getAppUlnConfig", |state| {
                Ok(state
                    .app_uln_configs
                    .get(&slot)
                    .cloned()
                    .unwrap_or_else(unset_uln_config))
            })
            .await
    }

    async fn get_app_executor_config(
        &self,
        oapp: &str,
        lib: &str,
        eid: ChainId,
    ) -> ConfiguratorResult<ExecutorConfig> {
        let slot = (self.key_of(oapp)?, self.key_of(lib)?, eid);
        self.chain
            .read("executorConfigs", |state| {
                Ok(state
                    .app_executor_configs
                    .get(&slot)
                    .cloned()
                    .unwrap_or_else(unset_executor_config))
            })
            .await
    }

    async fn set_config(
        &self,
        oapp: &str,
        lib: &str,
        params: &[SetConfigParam],
    ) -> ConfiguratorResult<OmniTransaction> {
        self.chain.write(
            &self.point,
            MockCall::SetConfig {
                oapp: oapp.to_string(),
                lib: lib.to_string(),
                params: params.iter().map(MockConfigParam::from).collect(),
            },
        )
    }
}

pub struct MockUln302 {
    point: OmniPoint,
    chain: MockChain,
}

impl OmniSdk for MockUln302 {
    fn point(&self) -> &OmniPoint {
        &self.point
    }
}

#[async_trait]
impl Uln302Sdk for MockUln302 {
    async fn get_default_uln_config(&self, eid: ChainId) -> ConfiguratorResult<UlnConfig> {
        let this = point_key(&self.point)?;
        self.chain
            .read("getAppUlnConfig", |state| {
                Ok(state
                    .default_uln_configs
                    .get(&(this, eid))
                    .cloned()
                    .unwrap_or_else(unset_uln_config))
            })
            .await
    }

    async fn set_default_uln_config(
        &self,
        eid: ChainId,
        config: &UlnConfig,
    ) -> ConfiguratorResult<OmniTransaction> {
        self.chain.write(
            &self.point,
            MockCall::SetDefaultUlnConfig {
                eid,
                config: config.clone(),
            },
        )
    }

    async fn get_default_executor_config(
        &self,
        eid: ChainId,
    ) -> ConfiguratorResult<ExecutorConfig> {
        let this = point_key(&self.point)?;
        self.chain
            .read("executorConfigs", |state| {
                Ok(state
                    .default_executor_configs
                    .get(&(this, eid))
                    .cloned()
                    .unwrap_or_else(unset_executor_config))
            })
            .await
    }

    async fn set_default_executor_config(
        &self,
        eid: ChainId,
        config: &ExecutorConfig,
    ) -> ConfiguratorResult<OmniTransaction> {
        self.chain.write(
            &self.point,
            MockCall::SetDefaultExecutorConfig {
                eid,
                config: config.clone(),
            },
        )
    }
}

pub struct MockPriceFeed {
    point: OmniPoint,
    chain: MockChain,
}

impl OmniSdk for MockPriceFeed {
    fn point(&self) -> &OmniPoint {
        &self.point
    }
}

#[async_trait]
impl PriceFeedSdk for MockPriceFeed {
    async fn get_price(&self, eid: ChainId) -> ConfiguratorResult<PriceData> {
        let this = point_key(&self.point)?;
        self.chain
            .read("getPrice", |state| {
                Ok(state.prices.get(&(this, eid)).cloned().unwrap_or_default())
            })
            .await
    }

    async fn set_price(
        &self,
        eid: ChainId,
        price: &PriceData,
    ) -> ConfiguratorResult<OmniTransaction> {
        self.chain.write(
            &self.point,
            MockCall::SetPrice {
                eid,
                price: price.clone(),
            },
        )
    }
}

/// Executes transactions against the [`MockChain`] on submission.
pub struct MockSigner {
    chain_id: ChainId,
    chain: MockChain,
}

#[async_trait]
impl OmniSigner for MockSigner {
    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    async fn sign(&self, transaction: &OmniTransaction) -> ConfiguratorResult<String> {
        self.ensure_chain(transaction)?;
        Ok(transaction.data.clone())
    }

    async fn sign_and_send(
        &self,
        transaction: &OmniTransaction,
    ) -> ConfiguratorResult<TransactionResponse> {
        self.ensure_chain(transaction)?;
        self.chain.apply(transaction)?;
        let block = self.chain.lock().applied.len() as u64;
        let hash = format!("0x{:064x}", block);
        let receipt = TransactionReceipt {
            transaction_hash: hash.clone(),
            block_number: Some(block),
        };
        Ok(TransactionResponse::new(hash, async move { Ok(receipt) }))
    }
}

#[async_trait]
impl SignerFactory for MockChain {
    async fn create(&self, chain_id: ChainId) -> ConfiguratorResult<Arc<dyn OmniSigner>> {
        Ok(Arc::new(MockSigner {
            chain_id,
            chain: self.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configurator::*;
    use crate::omnigraph::{OmniEdge, OmniGraph, OmniGraphBuilder, OmniNode, OmniVector};
    use crate::options::ExecutorOption;
    use crate::sdk::{OptionalDvns, SdkFactory};
    use crate::signer::{sign_and_send, SubmitStrategy};
    use crate::test_utils::init_tracing_for_testing;

    const EVM_OAPP: &str = "0x00000000000000000000000000000000000000a1";
    const EVM_OAPP_2: &str = "0x00000000000000000000000000000000000000a2";
    const EVM_ENDPOINT: &str = "0x00000000000000000000000000000000000000e1";
    const EVM_SEND_LIB: &str = "0x0000000000000000000000000000000000000051";
    const EVM_RECEIVE_LIB: &str = "0x0000000000000000000000000000000000000052";
    const EVM_OTHER_LIB: &str = "0x0000000000000000000000000000000000000053";
    const EVM_DVN: &str = "0x00000000000000000000000000000000000000d1";
    const EVM_DVN_2: &str = "0x00000000000000000000000000000000000000d2";
    const EVM_EXECUTOR: &str = "0x00000000000000000000000000000000000000ee";
    const EVM_OWNER: &str = "0x00000000000000000000000000000000000000F1";
    const APTOS_OAPP: &str = "0x000000000000000000000000000000000000000000000000000000000000beef";
    const APTOS_ENDPOINT: &str = "0xe1";
    const STARCOIN_OAPP: &str = "0x0000000000000000000000000000000c";

    fn evm() -> OmniPoint {
        OmniPoint::new(ChainId::EthSepolia, EVM_OAPP)
    }

    fn evm_2() -> OmniPoint {
        OmniPoint::new(ChainId::EthSepolia, EVM_OAPP_2)
    }

    fn aptos() -> OmniPoint {
        OmniPoint::new(ChainId::AptosTestnet, APTOS_OAPP)
    }

    fn starcoin() -> OmniPoint {
        OmniPoint::new(ChainId::StarcoinTestnet, STARCOIN_OAPP)
    }

    fn evm_endpoint() -> OmniPoint {
        OmniPoint::new(ChainId::EthSepolia, EVM_ENDPOINT)
    }

    fn graph<N: PartialEq, E: PartialEq>(
        nodes: Vec<(OmniPoint, N)>,
        edges: Vec<(OmniPoint, OmniPoint, E)>,
    ) -> OmniGraph<N, E> {
        let mut builder = OmniGraphBuilder::new();
        builder
            .add_nodes(nodes.into_iter().map(|(point, config)| OmniNode { point, config }))
            .unwrap()
            .add_edges(edges.into_iter().map(|(from, to, config)| OmniEdge {
                vector: OmniVector::new(from, to),
                config,
            }))
            .unwrap();
        builder.build()
    }

    /// Two OApps on Sepolia and Aptos, wired both ways, both bound to endpoints
    /// with default libraries for each other.
    fn chain_with_endpoints() -> MockChain {
        init_tracing_for_testing();
        let chain = MockChain::new();
        for oapp in [evm(), evm_2()] {
            chain.seed(
                &oapp,
                MockCall::BindEndpoint {
                    endpoint: EVM_ENDPOINT.to_string(),
                },
            );
        }
        chain.seed(
            &aptos(),
            MockCall::BindEndpoint {
                endpoint: APTOS_ENDPOINT.to_string(),
            },
        );
        for eid in [ChainId::AptosTestnet, ChainId::StarcoinTestnet] {
            chain.seed(
                &evm_endpoint(),
                MockCall::SetDefaultSendLibrary {
                    eid,
                    lib: EVM_SEND_LIB.to_string(),
                },
            );
            chain.seed(
                &evm_endpoint(),
                MockCall::SetDefaultReceiveLibrary {
                    eid,
                    lib: EVM_RECEIVE_LIB.to_string(),
                    grace_period: 0,
                },
            );
        }
        chain
    }

    fn two_way(
        forward: OAppEdgeConfig,
        backward: OAppEdgeConfig,
    ) -> OAppOmniGraph {
        graph(
            vec![(evm(), OAppNodeConfig::default()), (aptos(), OAppNodeConfig::default())],
            vec![(evm(), aptos(), forward), (aptos(), evm(), backward)],
        )
    }

    #[tokio::test]
    async fn test_peers_are_set_once() {
        let chain = chain_with_endpoints();
        let graph = two_way(OAppEdgeConfig::default(), OAppEdgeConfig::default());
        let factory = chain.oapp_factory();

        let txs = configure_oapp_peers(&graph, &factory).await.unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].point, evm());
        assert_eq!(txs[1].point, aptos());
        assert!(txs.iter().all(|tx| tx.description.is_some()));

        chain.apply_all(&txs).unwrap();
        assert!(configure_oapp_peers(&graph, &factory).await.unwrap().is_empty());
        // one SDK per point no matter how many times it is used
        assert_eq!(chain.sdk_creations(), 2);
    }

    #[tokio::test]
    async fn test_short_move_peer_matches_padded_address() {
        let chain = chain_with_endpoints();
        chain.seed(
            &evm(),
            MockCall::SetPeer {
                eid: ChainId::AptosTestnet,
                peer: Some("0xBEEF".to_string()),
            },
        );
        let graph = graph(
            vec![(evm(), OAppNodeConfig::default())],
            vec![(evm(), aptos(), OAppEdgeConfig::default())],
        );
        let txs = configure_oapp_peers(&graph, &chain.oapp_factory()).await.unwrap();
        assert!(txs.is_empty());
    }

    #[tokio::test]
    async fn test_peer_drift_is_corrected() {
        let chain = chain_with_endpoints();
        chain.seed(
            &evm(),
            MockCall::SetPeer {
                eid: ChainId::AptosTestnet,
                peer: Some("0xdead".to_string()),
            },
        );
        let graph = graph(
            vec![(evm(), OAppNodeConfig::default())],
            vec![(evm(), aptos(), OAppEdgeConfig::default())],
        );
        let factory = chain.oapp_factory();
        let txs = configure_oapp_peers(&graph, &factory).await.unwrap();
        assert_eq!(txs.len(), 1);
        chain.apply_all(&txs).unwrap();
        let peer = factory
            .create(&evm())
            .await
            .unwrap()
            .get_peer(ChainId::AptosTestnet)
            .await
            .unwrap();
        assert_eq!(peer.as_deref(), Some(APTOS_OAPP));
    }

    #[tokio::test]
    async fn test_delegates_and_owners() {
        let chain = chain_with_endpoints();
        let config = OAppNodeConfig {
            owner: Some(EVM_OWNER.to_string()),
            delegate: Some(EVM_OWNER.to_lowercase()),
        };
        let graph: OAppOmniGraph = graph(vec![(evm(), config)], vec![]);
        let factory = chain.oapp_factory();

        let delegates = configure_oapp_delegates(&graph, &factory).await.unwrap();
        let owners = configure_ownable::<_, _, dyn OAppSdk>(&graph, &factory)
            .await
            .unwrap();
        assert_eq!(delegates.len(), 1);
        assert_eq!(owners.len(), 1);
        chain.apply_all(&delegates).unwrap();
        chain.apply_all(&owners).unwrap();

        assert!(configure_oapp_delegates(&graph, &factory).await.unwrap().is_empty());
        assert!(configure_ownable::<_, _, dyn OAppSdk>(&graph, &factory)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_pinned_send_library_equal_to_default_is_still_pinned() {
        let chain = chain_with_endpoints();
        let forward = OAppEdgeConfig {
            send_library: Setting::Value(EVM_SEND_LIB.to_string()),
            ..Default::default()
        };
        let graph = graph(
            vec![(evm(), OAppNodeConfig::default())],
            vec![(evm(), aptos(), forward)],
        );
        let factory = chain.oapp_factory();

        // following the default is not the same as pinning the default library
        let txs = configure_oapp_send_libraries(&graph, &factory).await.unwrap();
        assert_eq!(txs.len(), 1);
        chain.apply_all(&txs).unwrap();
        assert!(matches!(
            chain.lock().applied.last(),
            Some(MockCall::SetSendLibrary { lib: Some(_), .. })
        ));
        assert!(configure_oapp_send_libraries(&graph, &factory).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_default_send_library_resets_a_pinned_one() {
        let chain = chain_with_endpoints();
        chain.seed(
            &evm_endpoint(),
            MockCall::SetSendLibrary {
                oapp: EVM_OAPP.to_string(),
                eid: ChainId::AptosTestnet,
                lib: Some(EVM_OTHER_LIB.to_string()),
            },
        );
        let forward = OAppEdgeConfig {
            send_library: Setting::Default,
            ..Default::default()
        };
        let graph = graph(
            vec![(evm(), OAppNodeConfig::default())],
            vec![(evm(), aptos(), forward)],
        );
        let factory = chain.oapp_factory();
        let txs = configure_oapp_send_libraries(&graph, &factory).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].point, evm_endpoint());
        chain.apply_all(&txs).unwrap();
        assert!(configure_oapp_send_libraries(&graph, &factory).await.unwrap().is_empty());

        // absent leaves whatever is there alone
        chain.seed(
            &evm_endpoint(),
            MockCall::SetSendLibrary {
                oapp: EVM_OAPP.to_string(),
                eid: ChainId::AptosTestnet,
                lib: Some(EVM_OTHER_LIB.to_string()),
            },
        );
        let unmanaged = two_way(OAppEdgeConfig::default(), OAppEdgeConfig::default());
        assert!(configure_oapp_send_libraries(&unmanaged, &factory).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_receive_library_and_timeout() {
        let chain = chain_with_endpoints();
        let forward = OAppEdgeConfig {
            receive_library_config: Setting::Value(ReceiveLibraryConfig {
                receive_library: EVM_OTHER_LIB.to_string(),
                grace_period: 100,
            }),
            receive_library_timeout_config: Some(Timeout {
                lib: EVM_RECEIVE_LIB.to_string(),
                expiry: 1_000,
            }),
            ..Default::default()
        };
        let graph = graph(
            vec![(evm(), OAppNodeConfig::default())],
            vec![(evm(), aptos(), forward)],
        );
        let factory = chain.oapp_factory();

        let libraries = configure_oapp_receive_libraries(&graph, &factory).await.unwrap();
        let timeouts = configure_oapp_receive_library_timeouts(&graph, &factory)
            .await
            .unwrap();
        assert_eq!(libraries.len(), 1);
        assert_eq!(timeouts.len(), 1);
        chain.apply_all(&libraries).unwrap();
        chain.apply_all(&timeouts).unwrap();
        assert!(matches!(
            chain.lock().applied.iter().rev().nth(1),
            Some(MockCall::SetReceiveLibrary { grace_period: 100, .. })
        ));

        assert!(configure_oapp_receive_libraries(&graph, &factory)
            .await
            .unwrap()
            .is_empty());
        assert!(configure_oapp_receive_library_timeouts(&graph, &factory)
            .await
            .unwrap()
            .is_empty());
    }

    fn send_config() -> SendConfig {
        SendConfig {
            executor_config: Some(ExecutorConfig {
                max_message_size: Setting::Value(10_000),
                executor: Setting::Value(EVM_EXECUTOR.to_string()),
            }),
            uln_config: Some(UlnConfig {
                confirmations: Setting::Value(15),
                required_dvns: Setting::Value(vec![EVM_DVN_2.to_string(), EVM_DVN.to_string()]),
                optional_dvns: Setting::Absent,
            }),
        }
    }

    #[tokio::test]
    async fn test_send_config_is_batched_per_library() {
        let chain = chain_with_endpoints();
        let edge = OAppEdgeConfig {
            send_config: Some(send_config()),
            ..Default::default()
        };
        let graph = graph(
            vec![(evm(), OAppNodeConfig::default())],
            vec![
                (evm(), aptos(), edge.clone()),
                (evm(), starcoin(), edge),
            ],
        );
        let factory = chain.oapp_factory();

        let txs = configure_oapp_send_config(&graph, &factory).await.unwrap();
        assert_eq!(txs.len(), 1);
        chain.apply_all(&txs).unwrap();
        match chain.lock().applied.last() {
            Some(MockCall::SetConfig { lib, params, .. }) => {
                assert_eq!(lib, EVM_SEND_LIB);
                assert_eq!(params.len(), 4);
            }
            other => panic!("unexpected call {:?}", other),
        }
        assert!(configure_oapp_send_config(&graph, &factory).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_send_config_drift_keeps_unmanaged_fields() {
        let chain = chain_with_endpoints();
        let edge = OAppEdgeConfig {
            send_config: Some(send_config()),
            ..Default::default()
        };
        let graph = graph(
            vec![(evm(), OAppNodeConfig::default())],
            vec![(evm(), aptos(), edge)],
        );
        let factory = chain.oapp_factory();
        chain
            .apply_all(&configure_oapp_send_config(&graph, &factory).await.unwrap())
            .unwrap();

        // someone adds optional DVNs and changes confirmations on chain
        chain.seed(
            &evm_endpoint(),
            MockCall::SetConfig {
                oapp: EVM_OAPP.to_string(),
                lib: EVM_SEND_LIB.to_string(),
                params: vec![MockConfigParam::Uln {
                    eid: ChainId::AptosTestnet,
                    config: UlnConfig {
                        confirmations: Setting::Value(1),
                        required_dvns: Setting::Value(vec![
                            EVM_DVN.to_string(),
                            EVM_DVN_2.to_string(),
                        ]),
                        optional_dvns: Setting::Value(OptionalDvns {
                            dvns: vec![EVM_EXECUTOR.to_string()],
                            threshold: 1,
                        }),
                    },
                }],
            },
        );

        let txs = configure_oapp_send_config(&graph, &factory).await.unwrap();
        assert_eq!(txs.len(), 1);
        chain.apply_all(&txs).unwrap();
        let endpoint = factory.create(&evm()).await.unwrap().get_endpoint_sdk().await.unwrap();
        let current = endpoint
            .get_app_uln_config(EVM_OAPP, EVM_SEND_LIB, ChainId::AptosTestnet)
            .await
            .unwrap();
        assert_eq!(current.confirmations, Setting::Value(15));
        // optional DVNs were not managed and survive the write
        assert_eq!(
            current.optional_dvns.as_value().map(|o| o.threshold),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_receive_config_uses_pinned_library() {
        let chain = chain_with_endpoints();
        let edge = OAppEdgeConfig {
            receive_library_config: Setting::Value(ReceiveLibraryConfig {
                receive_library: EVM_OTHER_LIB.to_string(),
                grace_period: 0,
            }),
            receive_config: Some(ReceiveConfig {
                uln_config: Some(UlnConfig {
                    confirmations: Setting::Value(0),
                    required_dvns: Setting::Value(vec![]),
                    optional_dvns: Setting::Value(OptionalDvns {
                        dvns: vec![EVM_DVN.to_string()],
                        threshold: 1,
                    }),
                }),
            }),
            ..Default::default()
        };
        let graph = graph(
            vec![(evm(), OAppNodeConfig::default())],
            vec![(evm(), aptos(), edge)],
        );
        let factory = chain.oapp_factory();
        let txs = configure_oapp_receive_config(&graph, &factory).await.unwrap();
        assert_eq!(txs.len(), 1);
        chain.apply_all(&txs).unwrap();
        match chain.lock().applied.last() {
            Some(MockCall::SetConfig { lib, .. }) => assert_eq!(lib, EVM_OTHER_LIB),
            other => panic!("unexpected call {:?}", other),
        }
        // explicit zero confirmations and explicitly no required DVNs read back as such
        assert!(configure_oapp_receive_config(&graph, &factory).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_enforced_options_are_merged_and_batched_per_oapp() {
        let chain = chain_with_endpoints();
        let options = vec![
            EnforcedOptionConfig {
                msg_type: 1,
                option: ExecutorOption::LzReceive {
                    gas: 200_000,
                    value: 0,
                },
            },
            EnforcedOptionConfig {
                msg_type: 2,
                option: ExecutorOption::LzReceive {
                    gas: 100_000,
                    value: 0,
                },
            },
            EnforcedOptionConfig {
                msg_type: 1,
                option: ExecutorOption::OrderedExecution,
            },
        ];
        let edge = OAppEdgeConfig {
            enforced_options: Some(options),
            ..Default::default()
        };
        let graph = graph(
            vec![(evm(), OAppNodeConfig::default())],
            vec![(evm(), aptos(), edge.clone()), (evm(), starcoin(), edge)],
        );
        let factory = chain.oapp_factory();

        let txs = configure_oapp_enforced_options(&graph, &factory).await.unwrap();
        assert_eq!(txs.len(), 1);
        chain.apply_all(&txs).unwrap();
        match chain.lock().applied.last() {
            Some(MockCall::SetEnforcedOptions { options }) => {
                let slots: Vec<_> = options.iter().map(|o| (o.eid, o.msg_type)).collect();
                assert_eq!(
                    slots,
                    vec![
                        (ChainId::AptosTestnet, 1),
                        (ChainId::AptosTestnet, 2),
                        (ChainId::StarcoinTestnet, 1),
                        (ChainId::StarcoinTestnet, 2),
                    ]
                );
            }
            other => panic!("unexpected call {:?}", other),
        }
        assert!(configure_oapp_enforced_options(&graph, &factory)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_configure_oapp_end_to_end() {
        let chain = chain_with_endpoints();
        let forward = OAppEdgeConfig {
            send_library: Setting::Value(EVM_SEND_LIB.to_string()),
            send_config: Some(send_config()),
            enforced_options: Some(vec![EnforcedOptionConfig {
                msg_type: 1,
                option: ExecutorOption::LzReceive {
                    gas: 200_000,
                    value: 0,
                },
            }]),
            ..Default::default()
        };
        let graph = graph(
            vec![
                (
                    evm(),
                    OAppNodeConfig {
                        owner: None,
                        delegate: Some(EVM_OWNER.to_string()),
                    },
                ),
                (aptos(), OAppNodeConfig::default()),
            ],
            vec![(evm(), aptos(), forward), (aptos(), evm(), OAppEdgeConfig::default())],
        );
        let factory = chain.oapp_factory();

        let txs = configure_oapp(&graph, &factory).await.unwrap();
        // 2 peers, delegate, send library, send config, enforced options
        assert_eq!(txs.len(), 6);

        let result = sign_and_send(&txs, &chain, SubmitStrategy::WaitBeforeSubmittingNext).await;
        assert!(result.is_complete());
        assert_eq!(result.successful.len(), 6);

        assert!(configure_oapp(&graph, &factory).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transient_read_failures_are_retried() {
        let chain = chain_with_endpoints();
        let graph = two_way(OAppEdgeConfig::default(), OAppEdgeConfig::default());
        chain.fail_next_reads(vec![
            ConfiguratorError::TransientRead("connection reset".to_string()),
            ConfiguratorError::TransientRead("rate limited".to_string()),
        ]);
        let reads = chain.reads();
        let txs = configure_oapp_peers(&graph, &chain.oapp_factory()).await.unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(chain.reads() - reads, 4);
    }

    #[tokio::test]
    async fn test_permanent_read_failure_fails_the_configurator() {
        let chain = chain_with_endpoints();
        let graph = two_way(OAppEdgeConfig::default(), OAppEdgeConfig::default());
        chain.fail_next_reads(vec![ConfiguratorError::Read("execution reverted".to_string())]);
        let reads = chain.reads();
        let err = configure_oapp_peers(&graph, &chain.oapp_factory())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), "read");
        assert!(chain.reads() - reads <= 2);
    }

    #[tokio::test]
    async fn test_unbound_oapp_fails_library_checks() {
        let chain = MockChain::new();
        let forward = OAppEdgeConfig {
            send_library: Setting::Default,
            ..Default::default()
        };
        let graph = graph(
            vec![(evm(), OAppNodeConfig::default())],
            vec![(evm(), aptos(), forward)],
        );
        let err = configure_oapp_send_libraries(&graph, &chain.oapp_factory())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), "read");
    }

    #[tokio::test]
    async fn test_invalid_desired_config_fails_before_any_read() {
        let chain = chain_with_endpoints();
        let mut config = send_config();
        if let Some(uln) = config.uln_config.as_mut() {
            uln.optional_dvns = Setting::Value(OptionalDvns {
                dvns: vec![EVM_DVN.to_string()],
                threshold: 3,
            });
        }
        let edge = OAppEdgeConfig {
            send_config: Some(config),
            ..Default::default()
        };
        let graph = two_way(edge, OAppEdgeConfig::default());
        let factory = chain.oapp_factory();
        let (reads, creations) = (chain.reads(), chain.sdk_creations());

        for result in [
            configure_oapp(&graph, &factory).await,
            configure_oapp_send_config(&graph, &factory).await,
            configure_oapp_peers(&graph, &factory).await,
        ] {
            assert!(matches!(result, Err(ConfiguratorError::MalformedGraph(_))));
        }
        assert_eq!(chain.reads(), reads);
        assert_eq!(chain.sdk_creations(), creations);
    }

    #[tokio::test]
    async fn test_invalid_enforced_option_fails_before_any_read() {
        let chain = chain_with_endpoints();
        let edge = OAppEdgeConfig {
            enforced_options: Some(vec![EnforcedOptionConfig {
                msg_type: 1,
                option: ExecutorOption::NativeDrop {
                    amount: 1,
                    receiver: "not an address".to_string(),
                },
            }]),
            ..Default::default()
        };
        let graph = two_way(edge, OAppEdgeConfig::default());
        let reads = chain.reads();
        let err = configure_oapp_enforced_options(&graph, &chain.oapp_factory())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), "malformed_graph");
        assert_eq!(chain.reads(), reads);
    }

    #[tokio::test]
    async fn test_invalid_uln302_default_fails_before_any_read() {
        init_tracing_for_testing();
        let chain = MockChain::new();
        let config = Uln302NodeConfig {
            default_uln_configs: vec![(
                ChainId::AptosTestnet,
                UlnConfig {
                    required_dvns: Setting::Value(vec![EVM_DVN.to_string(), EVM_DVN.to_string()]),
                    ..Default::default()
                },
            )],
            default_executor_configs: vec![],
        };
        let uln = OmniPoint::new(ChainId::EthSepolia, EVM_SEND_LIB);
        let graph: OmniGraph<Uln302NodeConfig, ()> = graph(vec![(uln, config)], vec![]);
        let err = configure_uln302(&graph, &chain.uln302_factory())
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), "malformed_graph");
        assert_eq!(chain.reads(), 0);
        assert_eq!(chain.sdk_creations(), 0);
    }

    fn endpoint_graph() -> OmniGraph<(), EndpointEdgeConfig> {
        let config = EndpointEdgeConfig {
            default_send_library: EVM_SEND_LIB.to_string(),
            default_receive_library: EVM_RECEIVE_LIB.to_string(),
            default_receive_library_grace_period: 0,
        };
        let aptos_endpoint = OmniPoint::new(ChainId::AptosTestnet, APTOS_ENDPOINT);
        let starcoin_endpoint = OmniPoint::new(ChainId::StarcoinTestnet, "0xe1");
        graph(
            vec![],
            vec![
                (evm_endpoint(), aptos_endpoint, config.clone()),
                (evm_endpoint(), starcoin_endpoint, config),
            ],
        )
    }

    #[tokio::test]
    async fn test_endpoint_registers_each_library_once() {
        init_tracing_for_testing();
        let chain = MockChain::new();
        let graph = endpoint_graph();
        let factory = chain.endpoint_factory();

        let txs = configure_endpoint(&graph, &factory).await.unwrap();
        // 2 registrations, 2 default send libraries, 2 default receive libraries
        assert_eq!(txs.len(), 6);
        assert!(matches!(
            serde_json::from_str::<MockCall>(&txs[0].data).unwrap(),
            MockCall::RegisterLibrary { .. }
        ));
        chain.apply_all(&txs).unwrap();
        assert!(configure_endpoint(&graph, &factory).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_endpoint_default_library_drift() {
        let chain = chain_with_endpoints();
        chain.seed(
            &evm_endpoint(),
            MockCall::SetDefaultReceiveLibrary {
                eid: ChainId::StarcoinTestnet,
                lib: EVM_OTHER_LIB.to_string(),
                grace_period: 0,
            },
        );
        let graph = endpoint_graph();
        let factory = chain.endpoint_factory();
        assert!(configure_endpoint_default_send_libraries(&graph, &factory)
            .await
            .unwrap()
            .is_empty());
        let txs = configure_endpoint_default_receive_libraries(&graph, &factory)
            .await
            .unwrap();
        assert_eq!(txs.len(), 1);
        assert!(txs[0].description.as_deref().unwrap().contains(EVM_OTHER_LIB));
    }

    #[tokio::test]
    async fn test_uln302_defaults() {
        init_tracing_for_testing();
        let chain = MockChain::new();
        let uln = OmniPoint::new(ChainId::EthSepolia, EVM_SEND_LIB);
        let config = Uln302NodeConfig {
            default_uln_configs: vec![(
                ChainId::AptosTestnet,
                UlnConfig {
                    confirmations: Setting::Value(20),
                    required_dvns: Setting::Value(vec![EVM_DVN.to_string()]),
                    optional_dvns: Setting::Absent,
                },
            )],
            default_executor_configs: vec![(
                ChainId::AptosTestnet,
                ExecutorConfig {
                    max_message_size: Setting::Value(10_000),
                    executor: Setting::Value(EVM_EXECUTOR.to_string()),
                },
            )],
        };
        let graph: OmniGraph<Uln302NodeConfig, ()> = graph(vec![(uln, config)], vec![]);
        let factory = chain.uln302_factory();

        let txs = configure_uln302(&graph, &factory).await.unwrap();
        assert_eq!(txs.len(), 2);
        chain.apply_all(&txs).unwrap();
        assert!(configure_uln302(&graph, &factory).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_price_feed() {
        init_tracing_for_testing();
        let chain = MockChain::new();
        let feed = OmniPoint::new(ChainId::EthSepolia, EVM_EXECUTOR);
        let remote = OmniPoint::new(ChainId::AptosTestnet, "0xfeed");
        let config = PriceFeedEdgeConfig {
            price: PriceData {
                price_ratio: 10_000_000_000,
                gas_price_in_unit: 1,
                gas_per_byte: 16,
            },
        };
        let graph: OmniGraph<(), PriceFeedEdgeConfig> =
            graph(vec![], vec![(feed, remote, config)]);
        let factory = chain.price_feed_factory();

        let txs = configure_price_feed(&graph, &factory).await.unwrap();
        assert_eq!(txs.len(), 1);
        chain.apply_all(&txs).unwrap();
        assert!(configure_price_feed(&graph, &factory).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_submission_leaves_pending_work() {
        let chain = chain_with_endpoints();
        let graph = two_way(OAppEdgeConfig::default(), OAppEdgeConfig::default());
        let factory = chain.oapp_factory();
        let mut txs = configure_oapp_peers(&graph, &factory).await.unwrap();
        // the Sepolia queue hits a transaction the chain rejects
        txs.insert(
            0,
            OmniTransaction::new(evm(), "not a call".to_string()),
        );
        let result = sign_and_send(&txs, &chain, SubmitStrategy::WaitBeforeSubmittingNext).await;
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.successful.len(), 1);
        assert_eq!(result.successful[0].transaction.point, aptos());
        assert_eq!(result.pending.len(), 2);

        // the next run only reports what is still missing
        let remaining = configure_oapp_peers(&graph, &factory).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].point, evm());
    }
}

// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! SDK abstraction.
//!
//! An SDK is a chain-family binding for one on-chain entity at one
//! [`OmniPoint`]. Configurators never construct SDKs themselves; they ask an
//! [`SdkFactory`], which every configurator entry point wraps in a
//! [`MemoizedSdkFactory`] so that a point gets one SDK instance per run, even
//! when many edges referencing it are diffed concurrently. Callers that hold
//! their own [`MemoizedSdkFactory`] share instances across runs as well.

mod endpoint;
mod oapp;
mod ownable;
mod price_feed;
mod uln;

pub use endpoint::{EndpointSdk, SetConfigParam, Timeout};
pub use oapp::{EnforcedOptionParam, OAppSdk};
pub use ownable::OwnableSdk;
pub use price_feed::{PriceData, PriceFeedSdk};
pub use uln::{
    ExecutorConfig, OnChainExecutorConfig, OnChainUlnConfig, OptionalDvns, Uln302Sdk, UlnConfig,
    NIL_CONFIRMATIONS, NIL_DVN_COUNT,
};

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tap::TapFallible;
use tokio::sync::Mutex;

use crate::error::{ConfiguratorError, ConfiguratorResult};
use crate::omnigraph::OmniPoint;

pub trait OmniSdk: Send + Sync {
    fn point(&self) -> &OmniPoint;
}

#[async_trait]
pub trait SdkFactory<S: ?Sized + Send + Sync>: Send + Sync {
    async fn create(&self, point: &OmniPoint) -> ConfiguratorResult<Arc<S>>;
}

#[async_trait]
impl<S, F> SdkFactory<S> for &F
where
    S: ?Sized + Send + Sync,
    F: SdkFactory<S> + ?Sized,
{
    async fn create(&self, point: &OmniPoint) -> ConfiguratorResult<Arc<S>> {
        (**self).create(point).await
    }
}

/// Adapts an async closure `Fn(OmniPoint) -> Future<Output = Result<Arc<S>>>`.
pub struct FnSdkFactory<F>(pub F);

#[async_trait]
impl<S, F, Fut> SdkFactory<S> for FnSdkFactory<F>
where
    S: ?Sized + Send + Sync + 'static,
    F: Fn(OmniPoint) -> Fut + Send + Sync,
    Fut: Future<Output = ConfiguratorResult<Arc<S>>> + Send + 'static,
{
    async fn create(&self, point: &OmniPoint) -> ConfiguratorResult<Arc<S>> {
        (self.0)(point.clone()).await
    }
}

type SharedSdkFuture<'a, S> = Shared<BoxFuture<'a, ConfiguratorResult<Arc<S>>>>;

/// Caches one SDK per point.
///
/// Concurrent callers for the same point await one shared in-flight
/// construction. A failed construction is handed to every waiter and then
/// evicted, so a later call tries again. The inner factory may be borrowed
/// (`&dyn SdkFactory<S>`), in which case the cache lives as long as the borrow.
pub struct MemoizedSdkFactory<'a, S: ?Sized + Send + Sync + 'static> {
    inner: Arc<dyn SdkFactory<S> + 'a>,
    cache: Mutex<HashMap<OmniPoint, SharedSdkFuture<'a, S>>>,
}

impl<'a, S: ?Sized + Send + Sync + 'static> MemoizedSdkFactory<'a, S> {
    pub fn new(inner: impl SdkFactory<S> + 'a) -> Self {
        Self {
            inner: Arc::new(inner),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_fn<F, Fut>(f: F) -> Self
    where
        F: Fn(OmniPoint) -> Fut + Send + Sync + 'a,
        Fut: Future<Output = ConfiguratorResult<Arc<S>>> + Send + 'static,
    {
        Self::new(FnSdkFactory(f))
    }

    /// Number of points with a cached or in-flight SDK.
    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn get_cache_entry(&self, point: &OmniPoint) -> SharedSdkFuture<'a, S> {
        // The lock makes insertion atomic, so every caller gets the same entry.
        let mut cache = self.cache.lock().await;
        cache
            .entry(point.clone())
            .or_insert_with(|| {
                let inner = self.inner.clone();
                let point = point.clone();
                async move {
                    tracing::debug!("[SdkFactory] Creating SDK for {}", point);
                    inner
                        .create(&point)
                        .await
                        .map_err(|e| match e {
                            ConfiguratorError::SdkConstruction { .. } => e,
                            other => ConfiguratorError::SdkConstruction {
                                point: point.clone(),
                                reason: other.to_string(),
                            },
                        })
                        .tap_err(|e| tracing::error!("[SdkFactory] ❌ {}", e))
                }
                .boxed()
                .shared()
            })
            .clone()
    }
}

#[async_trait]
impl<'a, S: ?Sized + Send + Sync + 'static> SdkFactory<S> for MemoizedSdkFactory<'a, S> {
    async fn create(&self, point: &OmniPoint) -> ConfiguratorResult<Arc<S>> {
        let entry = self.get_cache_entry(point).await;
        let result = entry.clone().await;
        if result.is_err() {
            let mut cache = self.cache.lock().await;
            if cache
                .get(point)
                .map(|cached| cached.ptr_eq(&entry))
                .unwrap_or(false)
            {
                cache.remove(point);
            }
        }
        result
    }
}

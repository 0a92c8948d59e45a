// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Retry wrapper for chain reads.
//!
//! Only errors classified as transient ([`ConfiguratorError::is_transient`]) are
//! retried; every other error is returned from the first attempt. Writes are
//! never wrapped: producing a transaction has no side effect to repeat.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{ConfiguratorError, ConfiguratorResult};

fn default_enabled() -> bool {
    true
}

fn default_num_attempts() -> u32 {
    3
}

fn default_initial_interval_ms() -> u64 {
    400
}

fn default_max_interval_ms() -> u64 {
    10_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_randomization_factor() -> f64 {
    0.1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Total attempts including the first one
    #[serde(default = "default_num_attempts")]
    pub num_attempts: u32,
    #[serde(default = "default_initial_interval_ms")]
    pub initial_interval_ms: u64,
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_randomization_factor")]
    pub randomization_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            num_attempts: default_num_attempts(),
            initial_interval_ms: default_initial_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            multiplier: default_multiplier(),
            randomization_factor: default_randomization_factor(),
        }
    }
}

impl RetryConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn with_num_attempts(mut self, num_attempts: u32) -> Self {
        self.num_attempts = num_attempts;
        self
    }

    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval_ms = interval.as_millis() as u64;
        self
    }
}

/// Called before every retry with the failed attempt number (1-based) and its
/// error. Returning `false` stops retrying and surfaces the error.
pub type OnRetry = Arc<dyn Fn(u32, &ConfiguratorError) -> bool + Send + Sync>;

#[derive(Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
    cancellation: Option<CancellationToken>,
    on_retry: Option<OnRetry>,
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("config", &self.config)
            .field("cancellable", &self.cancellation.is_some())
            .field("on_retry", &self.on_retry.is_some())
            .finish()
    }
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            cancellation: None,
            on_retry: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_on_retry(mut self, on_retry: OnRetry) -> Self {
        self.on_retry = Some(on_retry);
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    fn backoff(&self) -> backoff::ExponentialBackoff {
        backoff::ExponentialBackoff {
            initial_interval: Duration::from_millis(self.config.initial_interval_ms),
            randomization_factor: self.config.randomization_factor,
            multiplier: self.config.multiplier,
            max_interval: Duration::from_millis(self.config.max_interval_ms),
            // attempts are bounded by count, not by time
            max_elapsed_time: None,
            ..Default::default()
        }
    }

    /// Runs `operation`, retrying transient failures within the attempt budget.
    pub async fn retry<T, F, Fut>(&self, label: &str, mut operation: F) -> ConfiguratorResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ConfiguratorResult<T>>,
    {
        if let Some(token) = &self.cancellation {
            if token.is_cancelled() {
                return Err(ConfiguratorError::Cancelled);
            }
        }
        if !self.config.enabled {
            return operation().await;
        }

        let max_attempts = self.config.num_attempts.max(1);
        let mut attempt = 0u32;
        let run = backoff::future::retry_notify(
            self.backoff(),
            || {
                attempt += 1;
                let current = attempt;
                let on_retry = self.on_retry.clone();
                let fut = operation();
                async move {
                    fut.await.map_err(|e| {
                        if !e.is_transient() {
                            return backoff::Error::permanent(e);
                        }
                        if current >= max_attempts {
                            tracing::error!(
                                "[Retry] {} failed after {} attempts: {}",
                                label,
                                current,
                                e
                            );
                            return backoff::Error::permanent(e);
                        }
                        if let Some(on_retry) = &on_retry {
                            if !on_retry(current, &e) {
                                tracing::debug!(
                                    "[Retry] {} retry vetoed after attempt {}",
                                    label,
                                    current
                                );
                                return backoff::Error::permanent(e);
                            }
                        }
                        backoff::Error::transient(e)
                    })
                }
            },
            |e: ConfiguratorError, wait: Duration| {
                tracing::warn!(
                    error_type = e.error_type(),
                    "[Retry] {} failed, retrying in {:?}: {}",
                    label,
                    wait,
                    e
                );
            },
        );

        match &self.cancellation {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::debug!("[Retry] {} cancelled", label);
                        Err(ConfiguratorError::Cancelled)
                    }
                    result = run => result,
                }
            }
            None => run.await,
        }
    }
}

/// Wraps a read operation so that every call goes through `policy`.
pub fn retriable<A, T, F, Fut>(
    policy: RetryPolicy,
    label: impl Into<String>,
    operation: F,
) -> impl Fn(A) -> BoxFuture<'static, ConfiguratorResult<T>>
where
    A: Clone + Send + Sync + 'static,
    T: Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ConfiguratorResult<T>> + Send + 'static,
{
    let label: Arc<str> = Arc::from(label.into());
    let operation = Arc::new(operation);
    move |arg: A| {
        let policy = policy.clone();
        let label = label.clone();
        let operation = operation.clone();
        async move { policy.retry(&label, || operation(arg.clone())).await }.boxed()
    }
}

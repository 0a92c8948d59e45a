// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use futures::FutureExt;
use serde::{Deserialize, Serialize};

use super::{configure_edges, configure_multiple, describe, ConfiguratorFuture};
use crate::address::{matches_read_address, validate_address};
use crate::error::ConfiguratorResult;
use crate::omnigraph::{OmniGraph, OmniPointMap};
use crate::sdk::{EndpointSdk, SdkFactory};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointEdgeConfig {
    pub default_send_library: String,
    pub default_receive_library: String,
    #[serde(default)]
    pub default_receive_library_grace_period: u64,
}

/// Checks every default library address before any read.
pub fn validate_endpoint_graph<N>(
    graph: &OmniGraph<N, EndpointEdgeConfig>,
) -> ConfiguratorResult<()> {
    for edge in graph.edges() {
        let chain_id = edge.vector.from.chain_id;
        validate_address(&edge.config.default_send_library, chain_id)?;
        validate_address(&edge.config.default_receive_library, chain_id)?;
    }
    Ok(())
}

/// Registers every library referenced as a default, once per endpoint.
pub fn configure_endpoint_register_libraries<'a, N: Sync>(
    graph: &'a OmniGraph<N, EndpointEdgeConfig>,
    create_sdk: &'a dyn SdkFactory<dyn EndpointSdk>,
) -> ConfiguratorFuture<'a> {
    async move {
        validate_endpoint_graph(graph)?;
        let mut libraries: OmniPointMap<Vec<&str>> = OmniPointMap::new();
        for edge in graph.edges() {
            let from = &edge.vector.from;
            let listed = libraries.get_or_insert_with(from, Vec::new);
            for lib in [
                edge.config.default_send_library.as_str(),
                edge.config.default_receive_library.as_str(),
            ] {
                let mut seen = false;
                for known in listed.iter() {
                    seen |= matches_read_address(known, lib, from.chain_id)?;
                }
                if !seen {
                    listed.push(lib);
                }
            }
        }

        tracing::debug!("[EndpointV2] Checking libraries for registration");
        let mut txs = vec![];
        for (endpoint, libraries) in libraries {
            let sdk = create_sdk.create(&endpoint).await?;
            for lib in libraries {
                if sdk.is_registered_library(lib).await? {
                    tracing::debug!("[EndpointV2] ✅ Library {} is registered on {}", lib, endpoint);
                    continue;
                }
                tracing::info!("[EndpointV2] Registering library {} on {}", lib, endpoint);
                let tx = sdk.register_library(lib).await?;
                txs.push(tx.with_description(format!("Register library {} on {}", lib, endpoint)));
            }
        }
        Ok(txs)
    }
    .boxed()
}

pub fn configure_endpoint_default_send_libraries<'a, N: Sync>(
    graph: &'a OmniGraph<N, EndpointEdgeConfig>,
    create_sdk: &'a dyn SdkFactory<dyn EndpointSdk>,
) -> ConfiguratorFuture<'a> {
    async move {
        validate_endpoint_graph(graph)?;
        configure_edges(graph, create_sdk, |edge, sdk| async move {
            let (from, to) = (&edge.vector.from, &edge.vector.to);
            let desired = &edge.config.default_send_library;
            tracing::debug!("[EndpointV2] Checking default send library for {}", edge.vector);
            let current = sdk.get_default_send_library(to.chain_id).await?;
            if matches_read_address(
                desired,
                current.as_deref().unwrap_or_default(),
                from.chain_id,
            )? {
                tracing::debug!(
                    "[EndpointV2] ✅ Default send library already {} for {}",
                    desired,
                    edge.vector
                );
                return Ok(vec![]);
            }
            tracing::info!(
                "[EndpointV2] Setting default send library to {} for {}",
                desired,
                edge.vector
            );
            let tx = sdk.set_default_send_library(to.chain_id, desired).await?;
            Ok(vec![tx.with_description(format!(
                "Set default send library for {} from {} to {}",
                edge.vector,
                describe(current.as_deref()),
                desired
            ))])
        })
        .await
    }
    .boxed()
}

pub fn configure_endpoint_default_receive_libraries<'a, N: Sync>(
    graph: &'a OmniGraph<N, EndpointEdgeConfig>,
    create_sdk: &'a dyn SdkFactory<dyn EndpointSdk>,
) -> ConfiguratorFuture<'a> {
    async move {
        validate_endpoint_graph(graph)?;
        configure_edges(graph, create_sdk, |edge, sdk| async move {
            let (from, to) = (&edge.vector.from, &edge.vector.to);
            let desired = &edge.config.default_receive_library;
            tracing::debug!("[EndpointV2] Checking default receive library for {}", edge.vector);
            let current = sdk.get_default_receive_library(to.chain_id).await?;
            if matches_read_address(
                desired,
                current.as_deref().unwrap_or_default(),
                from.chain_id,
            )? {
                tracing::debug!(
                    "[EndpointV2] ✅ Default receive library already {} for {}",
                    desired,
                    edge.vector
                );
                return Ok(vec![]);
            }
            let grace_period = edge.config.default_receive_library_grace_period;
            tracing::info!(
                "[EndpointV2] Setting default receive library to {} for {} with grace period {}",
                desired,
                edge.vector,
                grace_period
            );
            let tx = sdk
                .set_default_receive_library(to.chain_id, desired, grace_period)
                .await?;
            Ok(vec![tx.with_description(format!(
                "Set default receive library for {} from {} to {}",
                edge.vector,
                describe(current.as_deref()),
                desired
            ))])
        })
        .await
    }
    .boxed()
}

/// Registration first: a library must be registered before it can become a default.
pub fn configure_endpoint<'a, N: Sync>(
    graph: &'a OmniGraph<N, EndpointEdgeConfig>,
    create_sdk: &'a dyn SdkFactory<dyn EndpointSdk>,
) -> ConfiguratorFuture<'a> {
    async move {
        validate_endpoint_graph(graph)?;
        configure_multiple(
            graph,
            create_sdk,
            &[
                configure_endpoint_register_libraries,
                configure_endpoint_default_send_libraries,
                configure_endpoint_default_receive_libraries,
            ],
        )
        .await
    }
    .boxed()
}

// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Diff engine.
//!
//! A configurator reads the current value of one property for every node or
//! edge that declares it, compares it with the desired value and emits at most
//! one corrective transaction per property:
//!
//! ```text
//!   graph ──► for each node/edge (concurrently) ──► factory.create(point)
//!                                                        │
//!                                       read current ◄───┘
//!                                            │
//!                          equal? ── yes ──► nothing
//!                            │
//!                            no ──► sdk.set_x(desired) ──► transaction
//! ```
//!
//! Desired values are validated for the whole graph before the first read, so a
//! malformed config fails with no chain I/O at all.
//!
//! Output order follows graph declaration order. Every entry point memoizes the
//! factory it is given, so a point's SDK is constructed once per run however
//! many nodes, edges or configurators reference it. Configurators never sign or
//! submit anything. Any read or comparison failure fails the whole call so a
//! caller never receives a list that silently skips a property.

mod endpoint;
mod oapp;
mod ownable;
mod price_feed;
mod uln;

pub use endpoint::{
    configure_endpoint, configure_endpoint_default_receive_libraries,
    configure_endpoint_default_send_libraries, configure_endpoint_register_libraries,
    validate_endpoint_graph, EndpointEdgeConfig,
};
pub use oapp::{
    configure_oapp, configure_oapp_delegates, configure_oapp_enforced_options,
    configure_oapp_peers, configure_oapp_receive_config, configure_oapp_receive_libraries,
    configure_oapp_receive_library_timeouts, configure_oapp_send_config,
    configure_oapp_send_libraries, validate_oapp_graph, EnforcedOptionConfig, OAppEdgeConfig,
    OAppNodeConfig, OAppOmniGraph, ReceiveConfig, ReceiveLibraryConfig, SendConfig,
};
pub use ownable::{configure_ownable, OwnableConfig, OwnableNodeConfig};
pub use price_feed::{configure_price_feed, PriceFeedEdgeConfig};
pub use uln::{
    configure_uln302, configure_uln302_default_executor_configs,
    configure_uln302_default_uln_configs, validate_uln302_graph, Uln302NodeConfig,
};

use std::future::Future;
use std::sync::Arc;

use futures::future::{try_join_all, BoxFuture};

use crate::error::ConfiguratorResult;
use crate::omnigraph::{OmniEdge, OmniGraph, OmniNode};
use crate::sdk::{MemoizedSdkFactory, SdkFactory};
use crate::transactions::{flatten_transactions, OmniTransaction};

pub type ConfiguratorFuture<'a> = BoxFuture<'a, ConfiguratorResult<Vec<OmniTransaction>>>;

/// `(graph, factory) -> transactions`
pub type Configurator<N, E, S> =
    for<'a> fn(&'a OmniGraph<N, E>, &'a dyn SdkFactory<S>) -> ConfiguratorFuture<'a>;

/// Runs `configure_node` for every node, concurrently, keeping declaration order.
pub async fn configure_nodes<'a, N, E, S, F, Fut>(
    graph: &'a OmniGraph<N, E>,
    create_sdk: &'a dyn SdkFactory<S>,
    configure_node: F,
) -> ConfiguratorResult<Vec<OmniTransaction>>
where
    S: ?Sized + Send + Sync + 'static,
    F: Fn(&'a OmniNode<N>, Arc<S>) -> Fut,
    Fut: Future<Output = ConfiguratorResult<Vec<OmniTransaction>>>,
{
    let create_sdk = &MemoizedSdkFactory::<S>::new(create_sdk);
    let configure_node = &configure_node;
    let tasks = graph.nodes().iter().map(|node| async move {
        let sdk = create_sdk.create(&node.point).await?;
        configure_node(node, sdk).await
    });
    Ok(flatten_transactions(try_join_all(tasks).await?))
}

/// Runs `configure_edge` with the SDK of every edge's `from` point.
pub async fn configure_edges<'a, N, E, S, F, Fut>(
    graph: &'a OmniGraph<N, E>,
    create_sdk: &'a dyn SdkFactory<S>,
    configure_edge: F,
) -> ConfiguratorResult<Vec<OmniTransaction>>
where
    S: ?Sized + Send + Sync + 'static,
    F: Fn(&'a OmniEdge<E>, Arc<S>) -> Fut,
    Fut: Future<Output = ConfiguratorResult<Vec<OmniTransaction>>>,
{
    let create_sdk = &MemoizedSdkFactory::<S>::new(create_sdk);
    let configure_edge = &configure_edge;
    let tasks = graph.edges().iter().map(|edge| async move {
        let sdk = create_sdk.create(&edge.vector.from).await?;
        configure_edge(edge, sdk).await
    });
    Ok(flatten_transactions(try_join_all(tasks).await?))
}

/// Runs independent configurators over the same graph and concatenates their
/// output in the order given.
pub async fn configure_multiple<N, E, S>(
    graph: &OmniGraph<N, E>,
    create_sdk: &dyn SdkFactory<S>,
    configurators: &[Configurator<N, E, S>],
) -> ConfiguratorResult<Vec<OmniTransaction>>
where
    S: ?Sized + Send + Sync + 'static,
{
    let create_sdk = MemoizedSdkFactory::<S>::new(create_sdk);
    let outputs = try_join_all(
        configurators
            .iter()
            .map(|configure| configure(graph, &create_sdk)),
    )
    .await?;
    Ok(flatten_transactions(outputs))
}

fn describe(current: Option<&str>) -> &str {
    match current {
        Some(value) if !value.is_empty() => value,
        _ => "<unset>",
    }
}

// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use futures::future::try_join_all;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use super::ownable::OwnableNodeConfig;
use super::{configure_edges, configure_multiple, configure_nodes, describe, ConfiguratorFuture};
use crate::address::{matches_read_address, validate_address};
use crate::error::{ConfiguratorError, ConfiguratorResult};
use crate::omnigraph::{OmniEdge, OmniGraph, OmniPoint, OmniPointMap};
use crate::options::{encode_executor_options, format_options, ExecutorOption};
use crate::sdk::{
    EnforcedOptionParam, ExecutorConfig, MemoizedSdkFactory, OAppSdk, SdkFactory, SetConfigParam,
    Timeout, UlnConfig,
};
use crate::setting::{address_setting_satisfied, Setting};
use crate::transactions::OmniTransaction;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAppNodeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegate: Option<String>,
}

impl OwnableNodeConfig for OAppNodeConfig {
    fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveLibraryConfig {
    pub receive_library: String,
    /// Seconds the previous library stays valid after the switch
    #[serde(default)]
    pub grace_period: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor_config: Option<ExecutorConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uln_config: Option<UlnConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uln_config: Option<UlnConfig>,
}

/// One enforced option for one message type. Entries sharing a message type
/// are merged in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnforcedOptionConfig {
    pub msg_type: u16,
    pub option: ExecutorOption,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAppEdgeConfig {
    #[serde(default, skip_serializing_if = "Setting::is_absent")]
    pub send_library: Setting<String>,
    #[serde(default, skip_serializing_if = "Setting::is_absent")]
    pub receive_library_config: Setting<ReceiveLibraryConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_library_timeout_config: Option<Timeout>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_config: Option<SendConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_config: Option<ReceiveConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforced_options: Option<Vec<EnforcedOptionConfig>>,
}

pub type OAppOmniGraph = OmniGraph<OAppNodeConfig, OAppEdgeConfig>;

/// Checks every desired value that does not depend on chain state: addresses,
/// ULN and executor configs, and enforced option encoding. Every OApp
/// configurator runs this before its first read.
pub fn validate_oapp_graph(graph: &OAppOmniGraph) -> ConfiguratorResult<()> {
    for node in graph.nodes() {
        let chain_id = node.point.chain_id;
        for address in [node.config.owner.as_deref(), node.config.delegate.as_deref()]
            .into_iter()
            .flatten()
        {
            validate_address(address, chain_id)?;
        }
    }
    for edge in graph.edges() {
        let (from, to) = (&edge.vector.from, &edge.vector.to);
        let config = &edge.config;
        if let Some(lib) = config.send_library.as_value() {
            validate_address(lib, from.chain_id)?;
        }
        if let Some(receive) = config.receive_library_config.as_value() {
            validate_address(&receive.receive_library, from.chain_id)?;
        }
        if let Some(timeout) = &config.receive_library_timeout_config {
            validate_address(&timeout.lib, from.chain_id)?;
        }
        if let Some(send) = &config.send_config {
            if let Some(executor) = &send.executor_config {
                executor.validate(from.chain_id)?;
            }
            if let Some(uln) = &send.uln_config {
                uln.validate(from.chain_id)?;
            }
        }
        if let Some(uln) = config.receive_config.as_ref().and_then(|c| c.uln_config.as_ref()) {
            uln.validate(from.chain_id)?;
        }
        if let Some(options) = &config.enforced_options {
            for (_, options) in merge_enforced_options(options) {
                encode_executor_options(&options, to.chain_id)
                    .map_err(ConfiguratorError::into_malformed)?;
            }
        }
    }
    Ok(())
}

/// Points every OApp at the OApp on the other end of each edge.
pub fn configure_oapp_peers<'a>(
    graph: &'a OAppOmniGraph,
    create_sdk: &'a dyn SdkFactory<dyn OAppSdk>,
) -> ConfiguratorFuture<'a> {
    async move {
        validate_oapp_graph(graph)?;
        configure_edges(graph, create_sdk, |edge, sdk| async move {
            let to = &edge.vector.to;
            tracing::debug!("[OApp] Checking peer for {}", edge.vector);
            let current = sdk.get_peer(to.chain_id).await?;
            if matches_read_address(
                &to.address,
                current.as_deref().unwrap_or_default(),
                to.chain_id,
            )? {
                tracing::debug!("[OApp] ✅ Peer already set for {}", edge.vector);
                return Ok(vec![]);
            }
            tracing::info!("[OApp] Setting peer for {} to {}", edge.vector, to.address);
            let tx = sdk.set_peer(to.chain_id, Some(&to.address)).await?;
            Ok(vec![tx.with_description(format!(
                "Set peer for {} from {} to {}",
                edge.vector,
                describe(current.as_deref()),
                to.address
            ))])
        })
        .await
    }
    .boxed()
}

pub fn configure_oapp_delegates<'a>(
    graph: &'a OAppOmniGraph,
    create_sdk: &'a dyn SdkFactory<dyn OAppSdk>,
) -> ConfiguratorFuture<'a> {
    async move {
        validate_oapp_graph(graph)?;
        configure_nodes(graph, create_sdk, |node, sdk| async move {
            let Some(delegate) = node.config.delegate.as_deref() else {
                return Ok(vec![]);
            };
            tracing::debug!("[OApp] Checking delegate of {}", node.point);
            let current = sdk.get_delegate().await?;
            if matches_read_address(
                delegate,
                current.as_deref().unwrap_or_default(),
                node.point.chain_id,
            )? {
                tracing::debug!("[OApp] ✅ Delegate of {} is already {}", node.point, delegate);
                return Ok(vec![]);
            }
            tracing::info!("[OApp] Setting delegate of {} to {}", node.point, delegate);
            let tx = sdk.set_delegate(delegate).await?;
            Ok(vec![tx.with_description(format!(
                "Set delegate of {} from {} to {}",
                node.point,
                describe(current.as_deref()),
                delegate
            ))])
        })
        .await
    }
    .boxed()
}

pub fn configure_oapp_send_libraries<'a>(
    graph: &'a OAppOmniGraph,
    create_sdk: &'a dyn SdkFactory<dyn OAppSdk>,
) -> ConfiguratorFuture<'a> {
    async move {
        validate_oapp_graph(graph)?;
        configure_edges(graph, create_sdk, |edge, sdk| async move {
            let desired = &edge.config.send_library;
            if desired.is_absent() {
                return Ok(vec![]);
            }
            let (from, to) = (&edge.vector.from, &edge.vector.to);
            let endpoint = sdk.get_endpoint_sdk().await?;
            tracing::debug!("[OApp] Checking send library for {}", edge.vector);
            let current = endpoint.get_send_library(&from.address, to.chain_id).await?;
            if address_setting_satisfied(desired, &current, from.chain_id)? {
                tracing::debug!("[OApp] ✅ Send library already {} for {}", current, edge.vector);
                return Ok(vec![]);
            }
            tracing::info!("[OApp] Setting send library for {} to {}", edge.vector, desired);
            let tx = endpoint
                .set_send_library(
                    &from.address,
                    to.chain_id,
                    desired.as_value().map(String::as_str),
                )
                .await?;
            Ok(vec![tx.with_description(format!(
                "Set send library for {} from {} to {}",
                edge.vector, current, desired
            ))])
        })
        .await
    }
    .boxed()
}

pub fn configure_oapp_receive_libraries<'a>(
    graph: &'a OAppOmniGraph,
    create_sdk: &'a dyn SdkFactory<dyn OAppSdk>,
) -> ConfiguratorFuture<'a> {
    async move {
        validate_oapp_graph(graph)?;
        configure_edges(graph, create_sdk, |edge, sdk| async move {
            let config = &edge.config.receive_library_config;
            if config.is_absent() {
                return Ok(vec![]);
            }
            let desired = config.as_ref().map(|c| c.receive_library.clone());
            let (from, to) = (&edge.vector.from, &edge.vector.to);
            let endpoint = sdk.get_endpoint_sdk().await?;
            tracing::debug!("[OApp] Checking receive library for {}", edge.vector);
            let current = endpoint.get_receive_library(&from.address, to.chain_id).await?;
            if address_setting_satisfied(&desired, &current, from.chain_id)? {
                tracing::debug!("[OApp] ✅ Receive library already {} for {}", current, edge.vector);
                return Ok(vec![]);
            }
            tracing::info!("[OApp] Setting receive library for {} to {}", edge.vector, desired);
            let grace_period = config.as_value().map(|c| c.grace_period).unwrap_or_default();
            let tx = endpoint
                .set_receive_library(
                    &from.address,
                    to.chain_id,
                    desired.as_value().map(String::as_str),
                    grace_period,
                )
                .await?;
            Ok(vec![tx.with_description(format!(
                "Set receive library for {} from {} to {} with grace period {}",
                edge.vector, current, desired, grace_period
            ))])
        })
        .await
    }
    .boxed()
}

pub fn configure_oapp_receive_library_timeouts<'a>(
    graph: &'a OAppOmniGraph,
    create_sdk: &'a dyn SdkFactory<dyn OAppSdk>,
) -> ConfiguratorFuture<'a> {
    async move {
        validate_oapp_graph(graph)?;
        configure_edges(graph, create_sdk, |edge, sdk| async move {
            let Some(desired) = &edge.config.receive_library_timeout_config else {
                return Ok(vec![]);
            };
            let (from, to) = (&edge.vector.from, &edge.vector.to);
            let endpoint = sdk.get_endpoint_sdk().await?;
            tracing::debug!("[OApp] Checking receive library timeout for {}", edge.vector);
            let current = endpoint
                .get_receive_library_timeout(&from.address, to.chain_id)
                .await?;
            if current.expiry == desired.expiry
                && matches_read_address(&desired.lib, &current.lib, from.chain_id)?
            {
                tracing::debug!("[OApp] ✅ Receive library timeout already set for {}", edge.vector);
                return Ok(vec![]);
            }
            tracing::info!(
                "[OApp] Setting receive library timeout for {} to {} until {}",
                edge.vector,
                desired.lib,
                desired.expiry
            );
            let tx = endpoint
                .set_receive_library_timeout(
                    &from.address,
                    to.chain_id,
                    &desired.lib,
                    desired.expiry,
                )
                .await?;
            Ok(vec![tx.with_description(format!(
                "Set receive library timeout for {} from {} until {} to {} until {}",
                edge.vector,
                describe(Some(&current.lib)),
                current.expiry,
                desired.lib,
                desired.expiry
            ))])
        })
        .await
    }
    .boxed()
}

/// Config changes for one (OApp, library) pair, collected across edges.
struct ConfigBatch {
    lib: String,
    params: Vec<SetConfigParam>,
}

/// Groups per-edge config params into one `set_config` transaction per
/// (OApp, library), in first-seen order.
async fn emit_config_batches(
    create_sdk: &dyn SdkFactory<dyn OAppSdk>,
    per_edge: Vec<(OmniPoint, String, Vec<SetConfigParam>)>,
    kind: &str,
) -> ConfiguratorResult<Vec<OmniTransaction>> {
    let mut batches: OmniPointMap<Vec<ConfigBatch>> = OmniPointMap::new();
    for (oapp, lib, params) in per_edge {
        if params.is_empty() {
            continue;
        }
        let batches = batches.get_or_insert_with(&oapp, Vec::new);
        let mut existing = None;
        for (index, batch) in batches.iter().enumerate() {
            if matches_read_address(&batch.lib, &lib, oapp.chain_id)? {
                existing = Some(index);
                break;
            }
        }
        match existing {
            Some(index) => batches[index].params.extend(params),
            None => batches.push(ConfigBatch { lib, params }),
        }
    }

    let mut txs = vec![];
    for (oapp, batches) in batches {
        let endpoint = create_sdk.create(&oapp).await?.get_endpoint_sdk().await?;
        for batch in batches {
            let eids: Vec<String> = batch.params.iter().map(|p| p.eid().to_string()).collect();
            tracing::info!(
                "[OApp] Setting {} config for {} in library {} for {}",
                kind,
                oapp,
                batch.lib,
                eids.join(", ")
            );
            let tx = endpoint.set_config(&oapp.address, &batch.lib, &batch.params).await?;
            txs.push(tx.with_description(format!(
                "Set {} config for {} in library {} for {}",
                kind,
                oapp,
                batch.lib,
                eids.join(", ")
            )));
        }
    }
    Ok(txs)
}

pub fn configure_oapp_send_config<'a>(
    graph: &'a OAppOmniGraph,
    create_sdk: &'a dyn SdkFactory<dyn OAppSdk>,
) -> ConfiguratorFuture<'a> {
    async move {
        validate_oapp_graph(graph)?;
        let create_sdk = &MemoizedSdkFactory::<dyn OAppSdk>::new(create_sdk);
        let per_edge = try_join_all(
            graph.edges().iter().map(|edge| send_config_params(edge, create_sdk)),
        )
            .await?
            .into_iter()
            .flatten()
            .collect();
        emit_config_batches(create_sdk, per_edge, "send").await
    }
    .boxed()
}

async fn send_config_params(
    edge: &OmniEdge<OAppEdgeConfig>,
    create_sdk: &dyn SdkFactory<dyn OAppSdk>,
) -> ConfiguratorResult<Option<(OmniPoint, String, Vec<SetConfigParam>)>> {
    let Some(config) = &edge.config.send_config else {
        return Ok(None);
    };
    let (from, to) = (&edge.vector.from, &edge.vector.to);
    let endpoint = create_sdk.create(from).await?.get_endpoint_sdk().await?;
    let lib = match edge.config.send_library.as_value() {
        Some(lib) => lib.clone(),
        None => endpoint.get_effective_send_library(&from.address, to.chain_id).await?,
    };
    tracing::debug!("[OApp] Checking send config for {} in library {}", edge.vector, lib);

    let mut params = vec![];
    if let Some(desired) = &config.executor_config {
        let current = endpoint
            .get_app_executor_config(&from.address, &lib, to.chain_id)
            .await?;
        if !desired.is_satisfied_by(&current, from.chain_id)? {
            params.push(SetConfigParam::Executor {
                eid: to.chain_id,
                config: desired.clone().merged_with(current),
            });
        }
    }
    if let Some(desired) = &config.uln_config {
        let current = endpoint.get_app_uln_config(&from.address, &lib, to.chain_id).await?;
        if !desired.is_satisfied_by(&current, from.chain_id)? {
            params.push(SetConfigParam::Uln {
                eid: to.chain_id,
                config: desired.clone().merged_with(current),
            });
        }
    }
    Ok(Some((from.clone(), lib, params)))
}

pub fn configure_oapp_receive_config<'a>(
    graph: &'a OAppOmniGraph,
    create_sdk: &'a dyn SdkFactory<dyn OAppSdk>,
) -> ConfiguratorFuture<'a> {
    async move {
        validate_oapp_graph(graph)?;
        let create_sdk = &MemoizedSdkFactory::<dyn OAppSdk>::new(create_sdk);
        let per_edge = try_join_all(
            graph.edges().iter().map(|edge| receive_config_params(edge, create_sdk)),
        )
            .await?
            .into_iter()
            .flatten()
            .collect();
        emit_config_batches(create_sdk, per_edge, "receive").await
    }
    .boxed()
}

async fn receive_config_params(
    edge: &OmniEdge<OAppEdgeConfig>,
    create_sdk: &dyn SdkFactory<dyn OAppSdk>,
) -> ConfiguratorResult<Option<(OmniPoint, String, Vec<SetConfigParam>)>> {
    let desired = edge.config.receive_config.as_ref().and_then(|c| c.uln_config.as_ref());
    let Some(desired) = desired else {
        return Ok(None);
    };
    let (from, to) = (&edge.vector.from, &edge.vector.to);
    let endpoint = create_sdk.create(from).await?.get_endpoint_sdk().await?;
    let lib = match edge.config.receive_library_config.as_value() {
        Some(config) => config.receive_library.clone(),
        None => {
            endpoint
                .get_effective_receive_library(&from.address, to.chain_id)
                .await?
        }
    };
    tracing::debug!("[OApp] Checking receive config for {} in library {}", edge.vector, lib);

    let current = endpoint.get_app_uln_config(&from.address, &lib, to.chain_id).await?;
    let mut params = vec![];
    if !desired.is_satisfied_by(&current, from.chain_id)? {
        params.push(SetConfigParam::Uln {
            eid: to.chain_id,
            config: desired.clone().merged_with(current),
        });
    }
    Ok(Some((from.clone(), lib, params)))
}

/// Merges entries by message type, keeping first-seen message type order.
fn merge_enforced_options(
    options: &[EnforcedOptionConfig],
) -> Vec<(u16, Vec<ExecutorOption>)> {
    let mut merged: Vec<(u16, Vec<ExecutorOption>)> = vec![];
    for entry in options {
        match merged.iter_mut().find(|(msg_type, _)| *msg_type == entry.msg_type) {
            Some((_, list)) => list.push(entry.option.clone()),
            None => merged.push((entry.msg_type, vec![entry.option.clone()])),
        }
    }
    merged
}

async fn enforced_option_params(
    edge: &OmniEdge<OAppEdgeConfig>,
    create_sdk: &dyn SdkFactory<dyn OAppSdk>,
) -> ConfiguratorResult<Vec<EnforcedOptionParam>> {
    let Some(options) = &edge.config.enforced_options else {
        return Ok(vec![]);
    };
    let to = &edge.vector.to;
    let sdk = create_sdk.create(&edge.vector.from).await?;
    let mut params = vec![];
    for (msg_type, options) in merge_enforced_options(options) {
        let desired = encode_executor_options(&options, to.chain_id)?;
        tracing::debug!(
            "[OApp] Checking enforced options for {} message type {}",
            edge.vector,
            msg_type
        );
        let current = sdk.get_enforced_options(to.chain_id, msg_type).await?;
        if current == desired {
            continue;
        }
        tracing::info!(
            "[OApp] Enforced options for {} message type {} are {}, expected {}",
            edge.vector,
            msg_type,
            format_options(&current),
            format_options(&desired)
        );
        params.push(EnforcedOptionParam {
            eid: to.chain_id,
            msg_type,
            options: desired,
        });
    }
    Ok(params)
}

/// Sets enforced options, one transaction per OApp covering all its edges.
pub fn configure_oapp_enforced_options<'a>(
    graph: &'a OAppOmniGraph,
    create_sdk: &'a dyn SdkFactory<dyn OAppSdk>,
) -> ConfiguratorFuture<'a> {
    async move {
        validate_oapp_graph(graph)?;
        let create_sdk = &MemoizedSdkFactory::<dyn OAppSdk>::new(create_sdk);
        let per_edge = try_join_all(
            graph
                .edges()
                .iter()
                .map(|edge| enforced_option_params(edge, create_sdk)),
        )
        .await?;

        let mut batches: OmniPointMap<Vec<EnforcedOptionParam>> = OmniPointMap::new();
        for (edge, params) in graph.edges().iter().zip(per_edge) {
            if !params.is_empty() {
                batches
                    .get_or_insert_with(&edge.vector.from, Vec::new)
                    .extend(params);
            }
        }

        let mut txs = vec![];
        for (oapp, params) in batches {
            let summary: Vec<String> = params
                .iter()
                .map(|p| format!("{}/{}: {}", p.eid, p.msg_type, format_options(&p.options)))
                .collect();
            let tx = create_sdk.create(&oapp).await?.set_enforced_options(&params).await?;
            txs.push(tx.with_description(format!(
                "Set enforced options for {}: {}",
                oapp,
                summary.join(", ")
            )));
        }
        Ok(txs)
    }
    .boxed()
}

/// Every OApp property except ownership, in dependency order: libraries before
/// the configs stored in them.
pub fn configure_oapp<'a>(
    graph: &'a OAppOmniGraph,
    create_sdk: &'a dyn SdkFactory<dyn OAppSdk>,
) -> ConfiguratorFuture<'a> {
    async move {
        validate_oapp_graph(graph)?;
        configure_multiple(
            graph,
            create_sdk,
            &[
                configure_oapp_peers,
                configure_oapp_delegates,
                configure_oapp_send_libraries,
                configure_oapp_receive_libraries,
                configure_oapp_receive_library_timeouts,
                configure_oapp_send_config,
                configure_oapp_receive_config,
                configure_oapp_enforced_options,
            ],
        )
        .await
    }
    .boxed()
}

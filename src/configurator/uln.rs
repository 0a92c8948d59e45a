// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use futures::FutureExt;
use serde::{Deserialize, Serialize};

use super::{configure_multiple, configure_nodes, ConfiguratorFuture};
use crate::chain::ChainId;
use crate::error::ConfiguratorResult;
use crate::omnigraph::OmniGraph;
use crate::sdk::{ExecutorConfig, SdkFactory, Uln302Sdk, UlnConfig};

/// Default configs of one ULN302 library, keyed by remote chain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Uln302NodeConfig {
    #[serde(default)]
    pub default_uln_configs: Vec<(ChainId, UlnConfig)>,
    #[serde(default)]
    pub default_executor_configs: Vec<(ChainId, ExecutorConfig)>,
}

/// Checks every desired default config before any read.
pub fn validate_uln302_graph<E>(graph: &OmniGraph<Uln302NodeConfig, E>) -> ConfiguratorResult<()> {
    for node in graph.nodes() {
        for (_, config) in &node.config.default_uln_configs {
            config.validate(node.point.chain_id)?;
        }
        for (_, config) in &node.config.default_executor_configs {
            config.validate(node.point.chain_id)?;
        }
    }
    Ok(())
}

pub fn configure_uln302_default_uln_configs<'a, E: Sync>(
    graph: &'a OmniGraph<Uln302NodeConfig, E>,
    create_sdk: &'a dyn SdkFactory<dyn Uln302Sdk>,
) -> ConfiguratorFuture<'a> {
    async move {
        validate_uln302_graph(graph)?;
        configure_nodes(graph, create_sdk, |node, sdk| async move {
            let mut txs = vec![];
            for (eid, desired) in &node.config.default_uln_configs {
                tracing::debug!(
                    "[Uln302] Checking default ULN config of {} for {}",
                    node.point,
                    eid
                );
                let current = sdk.get_default_uln_config(*eid).await?;
                if desired.is_satisfied_by(&current, node.point.chain_id)? {
                    tracing::debug!(
                        "[Uln302] ✅ Default ULN config of {} for {} is up to date",
                        node.point,
                        eid
                    );
                    continue;
                }
                let config = desired.clone().merged_with(current.clone());
                tracing::info!(
                    "[Uln302] Default ULN config of {} for {} is {:?}, setting {:?}",
                    node.point,
                    eid,
                    current,
                    config
                );
                let tx = sdk.set_default_uln_config(*eid, &config).await?;
                txs.push(tx.with_description(format!(
                    "Set default ULN config of {} for {}",
                    node.point, eid
                )));
            }
            Ok(txs)
        })
        .await
    }
    .boxed()
}

pub fn configure_uln302_default_executor_configs<'a, E: Sync>(
    graph: &'a OmniGraph<Uln302NodeConfig, E>,
    create_sdk: &'a dyn SdkFactory<dyn Uln302Sdk>,
) -> ConfiguratorFuture<'a> {
    async move {
        validate_uln302_graph(graph)?;
        configure_nodes(graph, create_sdk, |node, sdk| async move {
            let mut txs = vec![];
            for (eid, desired) in &node.config.default_executor_configs {
                tracing::debug!(
                    "[Uln302] Checking default executor config of {} for {}",
                    node.point,
                    eid
                );
                let current = sdk.get_default_executor_config(*eid).await?;
                if desired.is_satisfied_by(&current, node.point.chain_id)? {
                    continue;
                }
                let config = desired.clone().merged_with(current);
                tracing::info!(
                    "[Uln302] Setting default executor config of {} for {} to {:?}",
                    node.point,
                    eid,
                    config
                );
                let tx = sdk.set_default_executor_config(*eid, &config).await?;
                txs.push(tx.with_description(format!(
                    "Set default executor config of {} for {}: executor {}, max message size {}",
                    node.point, eid, config.executor, config.max_message_size
                )));
            }
            Ok(txs)
        })
        .await
    }
    .boxed()
}

pub fn configure_uln302<'a, E: Sync>(
    graph: &'a OmniGraph<Uln302NodeConfig, E>,
    create_sdk: &'a dyn SdkFactory<dyn Uln302Sdk>,
) -> ConfiguratorFuture<'a> {
    async move {
        validate_uln302_graph(graph)?;
        configure_multiple(
            graph,
            create_sdk,
            &[
                configure_uln302_default_uln_configs,
                configure_uln302_default_executor_configs,
            ],
        )
        .await
    }
    .boxed()
}

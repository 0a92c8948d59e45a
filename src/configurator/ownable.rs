// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use futures::FutureExt;
use serde::{Deserialize, Serialize};

use super::{configure_nodes, describe, ConfiguratorFuture};
use crate::address::matches_read_address;
use crate::omnigraph::OmniGraph;
use crate::sdk::{OwnableSdk, SdkFactory};

/// Node configs that may declare an owner.
pub trait OwnableNodeConfig {
    fn owner(&self) -> Option<&str>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnableConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl OwnableNodeConfig for OwnableConfig {
    fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }
}

/// Transfers ownership where the declared owner differs.
///
/// The new owner takes over write authority, so callers usually run this after
/// every other configurator of the same graph.
pub fn configure_ownable<'a, N, E, S>(
    graph: &'a OmniGraph<N, E>,
    create_sdk: &'a dyn SdkFactory<S>,
) -> ConfiguratorFuture<'a>
where
    N: OwnableNodeConfig + Sync,
    E: Sync,
    S: OwnableSdk + ?Sized + 'static,
{
    configure_nodes(graph, create_sdk, |node, sdk| async move {
        let Some(owner) = node.config.owner() else {
            return Ok(vec![]);
        };
        tracing::debug!("[Ownable] Checking owner of {}", node.point);
        let current = sdk.get_owner().await?;
        if matches_read_address(
            owner,
            current.as_deref().unwrap_or_default(),
            node.point.chain_id,
        )? {
            tracing::debug!("[Ownable] ✅ Owner of {} is already {}", node.point, owner);
            return Ok(vec![]);
        }
        tracing::info!(
            "[Ownable] Owner of {} is {}, transferring to {}",
            node.point,
            describe(current.as_deref()),
            owner
        );
        let tx = sdk.set_owner(owner).await?;
        Ok(vec![tx.with_description(format!(
            "Transfer ownership of {} from {} to {}",
            node.point,
            describe(current.as_deref()),
            owner
        ))])
    })
    .boxed()
}

// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chain::ChainId;

/// One deployed entity on one chain.
///
/// Equality is raw: addresses are compared as strings, so two spellings of the
/// same account are different points. Normalize through [`crate::address`] before
/// comparing values that came from different sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OmniPoint {
    pub chain_id: ChainId,
    pub address: String,
}

impl OmniPoint {
    pub fn new(chain_id: ChainId, address: impl Into<String>) -> Self {
        Self {
            chain_id,
            address: address.into(),
        }
    }
}

impl fmt::Display for OmniPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.chain_id, self.address)
    }
}

/// Directed relationship: how `from` is configured with respect to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OmniVector {
    pub from: OmniPoint,
    pub to: OmniPoint,
}

impl OmniVector {
    pub fn new(from: OmniPoint, to: OmniPoint) -> Self {
        Self { from, to }
    }

    /// Both ends must live on the same network stage.
    pub fn is_possible(&self) -> bool {
        self.from.chain_id.stage() == self.to.chain_id.stage()
    }

    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl fmt::Display for OmniVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.from, self.to)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmniNode<N> {
    pub point: OmniPoint,
    pub config: N,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OmniEdge<E> {
    pub vector: OmniVector,
    pub config: E,
}

/// Desired state of a set of contracts and their connections.
///
/// Built through [`crate::omnigraph::OmniGraphBuilder`] or
/// [`crate::omnigraph::build_graph`], which enforce point and vector uniqueness.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OmniGraph<N, E> {
    pub(crate) nodes: Vec<OmniNode<N>>,
    pub(crate) edges: Vec<OmniEdge<E>>,
}

impl<N, E> OmniGraph<N, E> {
    pub fn nodes(&self) -> &[OmniNode<N>] {
        &self.nodes
    }

    pub fn edges(&self) -> &[OmniEdge<E>] {
        &self.edges
    }

    /// An empty graph is a valid no-op configuration.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

impl<N, E> Default for OmniGraph<N, E> {
    fn default() -> Self {
        Self {
            nodes: vec![],
            edges: vec![],
        }
    }
}

pub fn is_empty<N, E>(graph: &OmniGraph<N, E>) -> bool {
    graph.is_empty()
}

// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use super::types::{OmniEdge, OmniGraph, OmniNode, OmniPoint, OmniVector};
use crate::address::normalize;
use crate::chain::ChainId;
use crate::error::{ConfiguratorError, ConfiguratorResult};

/// Point as it arrives from an external configuration source, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOmniPoint {
    pub chain_id: u8,
    pub address: String,
}

impl RawOmniPoint {
    pub fn new(chain_id: impl Into<u8>, address: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            address: address.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOmniNode<N> {
    pub point: RawOmniPoint,
    pub config: N,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOmniEdge<E> {
    pub from: RawOmniPoint,
    pub to: RawOmniPoint,
    pub config: E,
}

/// Validates the shape of a raw point. Never touches the chain.
pub fn validate_point(raw: &RawOmniPoint) -> ConfiguratorResult<OmniPoint> {
    let chain_id = ChainId::try_from(raw.chain_id).map_err(|_| {
        ConfiguratorError::MalformedGraph(format!("Unknown chain id {}", raw.chain_id))
    })?;
    if raw.address.trim().is_empty() {
        return Err(ConfiguratorError::MalformedGraph(format!(
            "Empty address on {}",
            chain_id
        )));
    }
    normalize(&raw.address, chain_id)
        .map_err(|e| ConfiguratorError::MalformedGraph(e.to_string()))?;
    Ok(OmniPoint::new(chain_id, raw.address.clone()))
}

/// Incremental graph construction with structural validation on every insert.
#[derive(Debug, Clone)]
pub struct OmniGraphBuilder<N, E> {
    nodes: Vec<OmniNode<N>>,
    edges: Vec<OmniEdge<E>>,
}

impl<N, E> Default for OmniGraphBuilder<N, E> {
    fn default() -> Self {
        Self {
            nodes: vec![],
            edges: vec![],
        }
    }
}

impl<N: PartialEq, E: PartialEq> OmniGraphBuilder<N, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_nodes(
        &mut self,
        nodes: impl IntoIterator<Item = OmniNode<N>>,
    ) -> ConfiguratorResult<&mut Self> {
        for node in nodes {
            self.assert_can_add_node(&node)?;
            self.nodes.push(node);
        }
        Ok(self)
    }

    pub fn add_edges(
        &mut self,
        edges: impl IntoIterator<Item = OmniEdge<E>>,
    ) -> ConfiguratorResult<&mut Self> {
        for edge in edges {
            self.assert_can_add_edge(&edge)?;
            self.edges.push(edge);
        }
        Ok(self)
    }

    pub fn remove_node_at(&mut self, point: &OmniPoint) -> Option<OmniNode<N>> {
        let index = self.nodes.iter().position(|n| &n.point == point)?;
        Some(self.nodes.remove(index))
    }

    pub fn remove_edge_at(&mut self, vector: &OmniVector) -> Option<OmniEdge<E>> {
        let index = self.edges.iter().position(|e| &e.vector == vector)?;
        Some(self.edges.remove(index))
    }

    pub fn node_at(&self, point: &OmniPoint) -> Option<&OmniNode<N>> {
        self.nodes.iter().find(|n| &n.point == point)
    }

    pub fn edge_at(&self, vector: &OmniVector) -> Option<&OmniEdge<E>> {
        self.edges.iter().find(|e| &e.vector == vector)
    }

    pub fn edges_from<'a>(&'a self, point: &'a OmniPoint) -> impl Iterator<Item = &'a OmniEdge<E>> {
        self.edges.iter().filter(move |e| &e.vector.from == point)
    }

    pub fn edges_to<'a>(&'a self, point: &'a OmniPoint) -> impl Iterator<Item = &'a OmniEdge<E>> {
        self.edges.iter().filter(move |e| &e.vector.to == point)
    }

    pub fn build(self) -> OmniGraph<N, E> {
        OmniGraph {
            nodes: self.nodes,
            edges: self.edges,
        }
    }

    fn assert_can_add_node(&self, node: &OmniNode<N>) -> ConfiguratorResult<()> {
        assert_point(&node.point)?;
        if self.node_at(&node.point).is_some() {
            return Err(ConfiguratorError::MalformedGraph(format!(
                "Duplicate node at {}",
                node.point
            )));
        }
        Ok(())
    }

    fn assert_can_add_edge(&self, edge: &OmniEdge<E>) -> ConfiguratorResult<()> {
        assert_point(&edge.vector.from)?;
        assert_point(&edge.vector.to)?;
        if !edge.vector.is_possible() {
            return Err(ConfiguratorError::MalformedGraph(format!(
                "Cannot connect {}: chains are on different stages",
                edge.vector
            )));
        }
        if self.edge_at(&edge.vector).is_some() {
            return Err(ConfiguratorError::MalformedGraph(format!(
                "Duplicate edge at {}",
                edge.vector
            )));
        }
        Ok(())
    }
}

fn assert_point(point: &OmniPoint) -> ConfiguratorResult<()> {
    validate_point(&RawOmniPoint::new(point.chain_id, point.address.clone())).map(|_| ())
}

/// Validates raw configuration input and produces an immutable graph.
pub fn build_graph<N: PartialEq, E: PartialEq>(
    raw_nodes: impl IntoIterator<Item = RawOmniNode<N>>,
    raw_edges: impl IntoIterator<Item = RawOmniEdge<E>>,
) -> ConfiguratorResult<OmniGraph<N, E>> {
    let nodes = raw_nodes
        .into_iter()
        .map(|raw| {
            Ok(OmniNode {
                point: validate_point(&raw.point)?,
                config: raw.config,
            })
        })
        .collect::<ConfiguratorResult<Vec<_>>>()?;
    let edges = raw_edges
        .into_iter()
        .map(|raw| {
            Ok(OmniEdge {
                vector: OmniVector::new(validate_point(&raw.from)?, validate_point(&raw.to)?),
                config: raw.config,
            })
        })
        .collect::<ConfiguratorResult<Vec<_>>>()?;

    let mut builder = OmniGraphBuilder::new();
    builder.add_nodes(nodes)?.add_edges(edges)?;
    Ok(builder.build())
}

// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Graph model.
//!
//! A graph is the declarative desired state of a multi-chain deployment:
//!
//! ```text
//!   nodes: one config per point        edges: one config per directed vector
//!
//!   [EthSepolia] 0xA ────────────────► [AptosTestnet] 0xB
//!        ▲                                   │
//!        └───────────────────────────────────┘
//! ```
//!
//! Vectors need not be symmetric. The graph is validated once on construction
//! and is read-only for the rest of a run.

mod builder;
mod map;
mod types;

pub use builder::{
    build_graph, validate_point, OmniGraphBuilder, RawOmniEdge, RawOmniNode, RawOmniPoint,
};
pub use map::OmniPointMap;
pub use types::{is_empty, OmniEdge, OmniGraph, OmniNode, OmniPoint, OmniVector};

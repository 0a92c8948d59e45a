// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Declarative configuration reconciliation for cross-chain messaging
//! deployments.
//!
//! The desired state is an [`omnigraph::OmniGraph`]: nodes carry per-contract
//! config, directed edges carry per-pathway config. Configurators read the
//! current on-chain state through SDKs, diff it against the graph and return
//! the minimal list of unsigned [`transactions::OmniTransaction`]s that close
//! the gap. Signing and submission ([`signer::sign_and_send`]) are a separate,
//! caller-driven step.

#![allow(clippy::new_without_default, clippy::too_many_arguments)]

pub mod address;
pub mod chain;
pub mod config;
pub mod configurator;
pub mod error;
pub mod evm;
pub mod omnigraph;
pub mod options;
pub mod retry;
pub mod sdk;
pub mod setting;
pub mod signer;
pub mod transactions;

#[cfg(test)]
pub mod mock_sdk;


pub use chain::ChainId;
pub use error::{ConfiguratorError, ConfiguratorResult};
pub use omnigraph::{OmniEdge, OmniGraph, OmniNode, OmniPoint, OmniVector};
pub use setting::Setting;
pub use transactions::OmniTransaction;

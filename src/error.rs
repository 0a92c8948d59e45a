// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

use crate::omnigraph::OmniPoint;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfiguratorError {
    // Graph input violates a structural invariant: duplicate point or vector, invalid point
    #[error("Malformed graph: {0}")]
    MalformedGraph(String),
    // SDK factory could not produce an SDK for the point
    #[error("Failed to create SDK for {point}: {reason}")]
    SdkConstruction { point: OmniPoint, reason: String },
    // Retryable network failure (timeout, connection reset, rate limit)
    #[error("Transient read error: {0}")]
    TransientRead(String),
    // Deterministic read failure (decode failure, revert, entity not configured)
    #[error("Read error: {0}")]
    Read(String),
    // On-chain value could not be compared against the desired shape
    #[error("Cannot compare on-chain value: {0}")]
    DiffComparison(String),
    // Address does not parse for the chain family of its chain
    #[error("Invalid address {address:?} on {chain}: {reason}")]
    InvalidAddress {
        address: String,
        chain: String,
        reason: String,
    },
    // Signing or submission failure in the execution layer
    #[error("Signer error: {0}")]
    Signer(String),
    // The surrounding caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,
    // Engine configuration could not be loaded or saved
    #[error("Config error: {0}")]
    Config(String),
}

impl ConfiguratorError {
    /// Returns a short string identifying the error type for log fields
    pub fn error_type(&self) -> &'static str {
        match self {
            ConfiguratorError::MalformedGraph(_) => "malformed_graph",
            ConfiguratorError::SdkConstruction { .. } => "sdk_construction",
            ConfiguratorError::TransientRead(_) => "transient_read",
            ConfiguratorError::Read(_) => "read",
            ConfiguratorError::DiffComparison(_) => "diff_comparison",
            ConfiguratorError::InvalidAddress { .. } => "invalid_address",
            ConfiguratorError::Signer(_) => "signer",
            ConfiguratorError::Cancelled => "cancelled",
            ConfiguratorError::Config(_) => "config",
        }
    }

    /// Whether a read that failed with this error may succeed when repeated.
    pub fn is_transient(&self) -> bool {
        matches!(self, ConfiguratorError::TransientRead(_))
    }

    /// Reports a failure found while checking desired values as a graph defect.
    pub fn into_malformed(self) -> Self {
        match self {
            ConfiguratorError::MalformedGraph(_) => self,
            other => ConfiguratorError::MalformedGraph(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ConfiguratorError {
    fn from(e: anyhow::Error) -> Self {
        ConfiguratorError::Read(e.to_string())
    }
}

pub type ConfiguratorResult<T> = Result<T, ConfiguratorError>;

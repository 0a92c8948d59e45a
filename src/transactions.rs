// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chain::ChainId;
use crate::omnigraph::OmniPoint;

/// An unsigned write destined for `point.chain_id`.
///
/// `data` is opaque to the engine; its encoding belongs to the SDK that
/// produced it (hex calldata for EVM chains).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OmniTransaction {
    pub point: OmniPoint,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<u64>,
}

impl OmniTransaction {
    pub fn new(point: OmniPoint, data: impl Into<String>) -> Self {
        Self {
            point,
            data: data.into(),
            description: None,
            gas_limit: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

/// One configurator step's output: nothing, one transaction, or a batch that
/// may itself contain holes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaybeTransactions {
    None,
    One(OmniTransaction),
    Many(Vec<Option<OmniTransaction>>),
}

impl From<OmniTransaction> for MaybeTransactions {
    fn from(tx: OmniTransaction) -> Self {
        MaybeTransactions::One(tx)
    }
}

impl From<Option<OmniTransaction>> for MaybeTransactions {
    fn from(tx: Option<OmniTransaction>) -> Self {
        match tx {
            Some(tx) => MaybeTransactions::One(tx),
            None => MaybeTransactions::None,
        }
    }
}

impl From<Vec<OmniTransaction>> for MaybeTransactions {
    fn from(txs: Vec<OmniTransaction>) -> Self {
        MaybeTransactions::Many(txs.into_iter().map(Some).collect())
    }
}

impl From<Vec<Option<OmniTransaction>>> for MaybeTransactions {
    fn from(txs: Vec<Option<OmniTransaction>>) -> Self {
        MaybeTransactions::Many(txs)
    }
}

impl From<Option<Vec<OmniTransaction>>> for MaybeTransactions {
    fn from(txs: Option<Vec<OmniTransaction>>) -> Self {
        txs.map(Into::into).unwrap_or(MaybeTransactions::None)
    }
}

/// Drops empty entries, unwraps one level of nesting and keeps relative order.
pub fn flatten_transactions<I, T>(items: I) -> Vec<OmniTransaction>
where
    I: IntoIterator<Item = T>,
    T: Into<MaybeTransactions>,
{
    let mut out = vec![];
    for item in items {
        match item.into() {
            MaybeTransactions::None => {}
            MaybeTransactions::One(tx) => out.push(tx),
            MaybeTransactions::Many(txs) => out.extend(txs.into_iter().flatten()),
        }
    }
    out
}

/// Buckets transactions per destination chain, preserving within-chain order.
pub fn group_transactions_by_chain_id(
    transactions: impl IntoIterator<Item = OmniTransaction>,
) -> BTreeMap<ChainId, Vec<OmniTransaction>> {
    let mut groups: BTreeMap<ChainId, Vec<OmniTransaction>> = BTreeMap::new();
    for tx in transactions {
        groups.entry(tx.point.chain_id).or_default().push(tx);
    }
    groups
}

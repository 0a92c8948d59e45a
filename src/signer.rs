// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Submission of configurator output.
//!
//! Configurators never call into this module. It is the caller-side step that
//! turns a flat transaction list into submitted transactions, one chain at a
//! time per chain and all chains concurrently.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::chain::ChainId;
use crate::error::{ConfiguratorError, ConfiguratorResult};
use crate::transactions::OmniTransaction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

/// A submitted transaction whose receipt can be awaited once.
pub struct TransactionResponse {
    pub transaction_hash: String,
    wait: BoxFuture<'static, ConfiguratorResult<TransactionReceipt>>,
}

impl TransactionResponse {
    pub fn new(
        transaction_hash: impl Into<String>,
        wait: impl Future<Output = ConfiguratorResult<TransactionReceipt>> + Send + 'static,
    ) -> Self {
        Self {
            transaction_hash: transaction_hash.into(),
            wait: wait.boxed(),
        }
    }

    pub async fn wait(self) -> ConfiguratorResult<TransactionReceipt> {
        self.wait.await
    }
}

impl std::fmt::Debug for TransactionResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionResponse")
            .field("transaction_hash", &self.transaction_hash)
            .finish()
    }
}

#[async_trait]
pub trait OmniSigner: Send + Sync {
    fn chain_id(&self) -> ChainId;

    /// Signed payload, ready for broadcast.
    async fn sign(&self, transaction: &OmniTransaction) -> ConfiguratorResult<String>;

    async fn sign_and_send(
        &self,
        transaction: &OmniTransaction,
    ) -> ConfiguratorResult<TransactionResponse>;

    fn ensure_chain(&self, transaction: &OmniTransaction) -> ConfiguratorResult<()> {
        if transaction.point.chain_id != self.chain_id() {
            return Err(ConfiguratorError::Signer(format!(
                "Signer for {} cannot sign a transaction for {}",
                self.chain_id(),
                transaction.point
            )));
        }
        Ok(())
    }
}

#[async_trait]
pub trait SignerFactory: Send + Sync {
    async fn create(&self, chain_id: ChainId) -> ConfiguratorResult<Arc<dyn OmniSigner>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OmniTransactionWithReceipt {
    pub transaction: OmniTransaction,
    pub receipt: TransactionReceipt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OmniTransactionWithError {
    pub transaction: OmniTransaction,
    pub error: ConfiguratorError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmitStrategy {
    /// Await every receipt before submitting the next transaction. A revert
    /// stops the chain's queue.
    #[default]
    WaitBeforeSubmittingNext,
    /// Submit the chain's whole queue, then await the receipts.
    WaitAfterSendingAll,
}

#[derive(Debug, Default)]
pub struct SignAndSendResult {
    pub successful: Vec<OmniTransactionWithReceipt>,
    pub errors: Vec<OmniTransactionWithError>,
    /// Everything that did not succeed, failed transactions included, in input order.
    pub pending: Vec<OmniTransaction>,
}

impl SignAndSendResult {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty() && self.pending.is_empty()
    }
}

enum Outcome {
    Success(usize, TransactionReceipt),
    Failure(usize, ConfiguratorError),
}

pub async fn sign_and_send(
    transactions: &[OmniTransaction],
    signer_factory: &dyn SignerFactory,
    strategy: SubmitStrategy,
) -> SignAndSendResult {
    if transactions.is_empty() {
        tracing::debug!("[Signer] No transactions to sign");
        return SignAndSendResult::default();
    }
    tracing::debug!("[Signer] Signing {} transaction(s)", transactions.len());

    let mut groups: BTreeMap<ChainId, Vec<usize>> = BTreeMap::new();
    for (index, tx) in transactions.iter().enumerate() {
        groups.entry(tx.point.chain_id).or_default().push(index);
    }

    let outcomes = join_all(groups.into_iter().map(|(chain_id, indices)| async move {
        let signer = match signer_factory.create(chain_id).await {
            Ok(signer) => signer,
            Err(e) => {
                tracing::error!("[Signer] Failed to create a signer for {}: {}", chain_id, e);
                return vec![Outcome::Failure(
                    indices[0],
                    ConfiguratorError::Signer(format!(
                        "Failed to create a signer for {}: {}",
                        chain_id, e
                    )),
                )];
            }
        };
        match strategy {
            SubmitStrategy::WaitBeforeSubmittingNext => {
                wait_before_submitting_next(signer.as_ref(), transactions, &indices).await
            }
            SubmitStrategy::WaitAfterSendingAll => {
                wait_after_sending_all(signer.as_ref(), transactions, &indices).await
            }
        }
    }))
    .await;

    let mut result = SignAndSendResult::default();
    let mut done = vec![false; transactions.len()];
    let mut outcomes: Vec<Outcome> = outcomes.into_iter().flatten().collect();
    outcomes.sort_by_key(|o| match o {
        Outcome::Success(i, _) | Outcome::Failure(i, _) => *i,
    });
    for outcome in outcomes {
        match outcome {
            Outcome::Success(index, receipt) => {
                done[index] = true;
                result.successful.push(OmniTransactionWithReceipt {
                    transaction: transactions[index].clone(),
                    receipt,
                });
            }
            Outcome::Failure(index, error) => result.errors.push(OmniTransactionWithError {
                transaction: transactions[index].clone(),
                error,
            }),
        }
    }
    result.pending = transactions
        .iter()
        .zip(done)
        .filter(|(_, done)| !done)
        .map(|(tx, _)| tx.clone())
        .collect();
    result
}

async fn wait_before_submitting_next(
    signer: &dyn OmniSigner,
    transactions: &[OmniTransaction],
    indices: &[usize],
) -> Vec<Outcome> {
    let mut outcomes = vec![];
    for (ordinal, index) in indices.iter().enumerate() {
        let tx = &transactions[*index];
        let receipt = async {
            signer.ensure_chain(tx)?;
            let response = signer.sign_and_send(tx).await?;
            tracing::debug!(
                "[Signer] Sent transaction #{} for {}, hash {}",
                ordinal + 1,
                signer.chain_id(),
                response.transaction_hash
            );
            response.wait().await
        }
        .await;
        match receipt {
            Ok(receipt) => outcomes.push(Outcome::Success(*index, receipt)),
            Err(e) => {
                tracing::error!(
                    "[Signer] Transaction #{} for {} failed: {}",
                    ordinal + 1,
                    signer.chain_id(),
                    e
                );
                outcomes.push(Outcome::Failure(*index, e));
                break;
            }
        }
    }
    outcomes
}

async fn wait_after_sending_all(
    signer: &dyn OmniSigner,
    transactions: &[OmniTransaction],
    indices: &[usize],
) -> Vec<Outcome> {
    let mut outcomes = vec![];
    let mut responses = vec![];
    for index in indices {
        let tx = &transactions[*index];
        let sent = async {
            signer.ensure_chain(tx)?;
            signer.sign_and_send(tx).await
        }
        .await;
        match sent {
            Ok(response) => responses.push((*index, response)),
            Err(e) => {
                tracing::error!("[Signer] Failed to send transaction for {}: {}", tx.point, e);
                outcomes.push(Outcome::Failure(*index, e));
                break;
            }
        }
    }
    for (index, response) in responses {
        match response.wait().await {
            Ok(receipt) => outcomes.push(Outcome::Success(index, receipt)),
            Err(e) => outcomes.push(Outcome::Failure(index, e)),
        }
    }
    outcomes
}

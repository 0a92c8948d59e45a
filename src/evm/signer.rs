// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Middleware, PendingTransaction};
use ethers::signers::Signer;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::TransactionRequest;
use tracing::{debug, info};

use super::eth_address;
use crate::chain::ChainId;
use crate::error::{ConfiguratorError, ConfiguratorResult};
use crate::signer::{OmniSigner, TransactionReceipt, TransactionResponse};
use crate::transactions::OmniTransaction;

/// Signs and submits transactions for one EVM chain through a
/// [`SignerMiddleware`].
pub struct EvmSigner<M, S> {
    chain_id: ChainId,
    client: Arc<SignerMiddleware<M, S>>,
}

impl<M, S> EvmSigner<M, S>
where
    M: Middleware + 'static,
    S: Signer + 'static,
{
    pub fn new(chain_id: ChainId, client: Arc<SignerMiddleware<M, S>>) -> Self {
        Self { chain_id, client }
    }

    pub fn address(&self) -> ethers::types::Address {
        self.client.address()
    }
}

fn signer_error(context: &str, error: impl std::fmt::Display) -> ConfiguratorError {
    ConfiguratorError::Signer(format!("{}: {}", context, error))
}

/// Unsigned request for `transaction`. Nonce, fees and gas are filled by the
/// middleware unless `gas_limit` pins the gas.
pub(crate) fn transaction_request(
    transaction: &OmniTransaction,
) -> ConfiguratorResult<TypedTransaction> {
    let to = eth_address(&transaction.point.address, transaction.point.chain_id)?;
    let data = hex::decode(transaction.data.trim_start_matches("0x"))
        .map_err(|e| signer_error("Invalid transaction data", e))?;
    let mut request = TransactionRequest::new().to(to).data(data);
    if let Some(gas_limit) = transaction.gas_limit {
        request = request.gas(gas_limit);
    }
    Ok(request.into())
}

#[async_trait]
impl<M, S> OmniSigner for EvmSigner<M, S>
where
    M: Middleware + 'static,
    S: Signer + 'static,
{
    fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    async fn sign(&self, transaction: &OmniTransaction) -> ConfiguratorResult<String> {
        self.ensure_chain(transaction)?;
        let mut request = transaction_request(transaction)?;
        self.client
            .fill_transaction(&mut request, None)
            .await
            .map_err(|e| signer_error("Failed to fill transaction", e))?;
        let signature = self
            .client
            .signer()
            .sign_transaction(&request)
            .await
            .map_err(|e| signer_error("Failed to sign transaction", e))?;
        Ok(format!("0x{}", hex::encode(request.rlp_signed(&signature))))
    }

    async fn sign_and_send(
        &self,
        transaction: &OmniTransaction,
    ) -> ConfiguratorResult<TransactionResponse> {
        self.ensure_chain(transaction)?;
        let request = transaction_request(transaction)?;
        let pending = self
            .client
            .send_transaction(request, None)
            .await
            .map_err(|e| signer_error("Failed to send transaction", e))?;
        let hash = pending.tx_hash();
        info!("[Signer] Sent transaction {:#x} to {}", hash, transaction.point);

        let client = self.client.clone();
        let wait = async move {
            let receipt = PendingTransaction::new(hash, client.provider())
                .await
                .map_err(|e| signer_error("Failed to await receipt", e))?
                .ok_or_else(|| {
                    ConfiguratorError::Signer(format!("Transaction {:#x} was dropped", hash))
                })?;
            if receipt.status.map(|s| s.as_u64()) != Some(1) {
                return Err(ConfiguratorError::Signer(format!(
                    "Transaction {:#x} reverted",
                    hash
                )));
            }
            debug!(
                "[Signer] Transaction {:#x} confirmed in block {:?}",
                hash,
                receipt.block_number
            );
            Ok(TransactionReceipt {
                transaction_hash: format!("{:#x}", hash),
                block_number: receipt.block_number.map(|n| n.as_u64()),
            })
        };
        Ok(TransactionResponse::new(format!("{:#x}", hash), wait))
    }
}

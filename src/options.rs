// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Executor options (type 3).
//!
//! ```text
//! | type: u16 = 3 | worker_id: u8 | size: u16 | option_type: u8 | payload | worker_id ...
//! ```
//!
//! `size` counts `option_type` plus payload. All integers are big-endian.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::address::normalize;
use crate::chain::ChainId;
use crate::error::{ConfiguratorError, ConfiguratorResult};

pub const OPTIONS_TYPE_3: u16 = 3;
pub const EXECUTOR_WORKER_ID: u8 = 1;

const OPTION_TYPE_LZRECEIVE: u8 = 1;
const OPTION_TYPE_NATIVE_DROP: u8 = 2;
const OPTION_TYPE_LZCOMPOSE: u8 = 3;
const OPTION_TYPE_ORDERED_EXECUTION: u8 = 4;

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "optionType", rename_all = "camelCase")]
pub enum ExecutorOption {
    #[serde(rename_all = "camelCase")]
    LzReceive {
        #[serde_as(as = "DisplayFromStr")]
        gas: u128,
        #[serde_as(as = "DisplayFromStr")]
        #[serde(default)]
        value: u128,
    },
    #[serde(rename_all = "camelCase")]
    NativeDrop {
        #[serde_as(as = "DisplayFromStr")]
        amount: u128,
        /// Receiver on the remote chain
        receiver: String,
    },
    #[serde(rename_all = "camelCase")]
    Compose {
        index: u16,
        #[serde_as(as = "DisplayFromStr")]
        gas: u128,
        #[serde_as(as = "DisplayFromStr")]
        #[serde(default)]
        value: u128,
    },
    OrderedExecution,
}

impl ExecutorOption {
    fn encode_payload(&self, remote: ChainId) -> ConfiguratorResult<(u8, Vec<u8>)> {
        Ok(match self {
            ExecutorOption::LzReceive { gas, value } => {
                let mut payload = gas.to_be_bytes().to_vec();
                if *value > 0 {
                    payload.extend_from_slice(&value.to_be_bytes());
                }
                (OPTION_TYPE_LZRECEIVE, payload)
            }
            ExecutorOption::NativeDrop { amount, receiver } => {
                let mut payload = amount.to_be_bytes().to_vec();
                payload.extend_from_slice(normalize(receiver, remote)?.as_bytes());
                (OPTION_TYPE_NATIVE_DROP, payload)
            }
            ExecutorOption::Compose { index, gas, value } => {
                let mut payload = index.to_be_bytes().to_vec();
                payload.extend_from_slice(&gas.to_be_bytes());
                if *value > 0 {
                    payload.extend_from_slice(&value.to_be_bytes());
                }
                (OPTION_TYPE_LZCOMPOSE, payload)
            }
            ExecutorOption::OrderedExecution => (OPTION_TYPE_ORDERED_EXECUTION, vec![]),
        })
    }
}

/// Encodes executor options for messages delivered on `remote`.
///
/// An empty option list encodes as empty bytes, which is how an unset
/// enforced option reads back from chain.
pub fn encode_executor_options(
    options: &[ExecutorOption],
    remote: ChainId,
) -> ConfiguratorResult<Vec<u8>> {
    if options.is_empty() {
        return Ok(vec![]);
    }
    let mut out = OPTIONS_TYPE_3.to_be_bytes().to_vec();
    for option in options {
        let (option_type, payload) = option.encode_payload(remote)?;
        let size = u16::try_from(payload.len() + 1).map_err(|_| {
            ConfiguratorError::MalformedGraph("executor option payload too large".to_string())
        })?;
        out.push(EXECUTOR_WORKER_ID);
        out.extend_from_slice(&size.to_be_bytes());
        out.push(option_type);
        out.extend_from_slice(&payload);
    }
    Ok(out)
}

pub fn format_options(options: &[u8]) -> String {
    format!("0x{}", hex::encode(options))
}

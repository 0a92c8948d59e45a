// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde_repr::{Deserialize_repr, Serialize_repr};
use strum_macros::{Display, EnumIter};

use crate::error::{ConfiguratorError, ConfiguratorResult};

#[derive(
    Debug,
    Serialize_repr,
    Deserialize_repr,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Clone,
    Copy,
    TryFromPrimitive,
    IntoPrimitive,
    Hash,
    Display,
    EnumIter,
)]
#[repr(u8)]
pub enum ChainId {
    StarcoinMainnet = 0,
    StarcoinTestnet = 1,
    StarcoinCustom = 2,

    EthMainnet = 10,
    EthSepolia = 11,
    EthCustom = 12,

    AptosMainnet = 20,
    AptosTestnet = 21,
    AptosCustom = 22,
}

/// Address encoding family of a chain.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Display)]
pub enum ChainFamily {
    /// 20-byte accounts, EIP-55 checksummed hex
    Evm,
    /// 16-byte Move accounts (Starcoin)
    Move16,
    /// 32-byte Move accounts (Aptos)
    Move32,
}

impl ChainFamily {
    /// Native width of an account address in bytes.
    pub fn address_width(&self) -> usize {
        match self {
            ChainFamily::Evm => 20,
            ChainFamily::Move16 => 16,
            ChainFamily::Move32 => 32,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Display)]
pub enum ChainStage {
    Mainnet,
    Testnet,
    Sandbox,
}

impl ChainId {
    pub fn family(&self) -> ChainFamily {
        match self {
            ChainId::StarcoinMainnet | ChainId::StarcoinTestnet | ChainId::StarcoinCustom => {
                ChainFamily::Move16
            }
            ChainId::EthMainnet | ChainId::EthSepolia | ChainId::EthCustom => ChainFamily::Evm,
            ChainId::AptosMainnet | ChainId::AptosTestnet | ChainId::AptosCustom => {
                ChainFamily::Move32
            }
        }
    }

    pub fn stage(&self) -> ChainStage {
        match self {
            ChainId::StarcoinMainnet | ChainId::EthMainnet | ChainId::AptosMainnet => {
                ChainStage::Mainnet
            }
            ChainId::StarcoinTestnet | ChainId::EthSepolia | ChainId::AptosTestnet => {
                ChainStage::Testnet
            }
            ChainId::StarcoinCustom | ChainId::EthCustom | ChainId::AptosCustom => {
                ChainStage::Sandbox
            }
        }
    }

    /// Endpoint id as passed to on-chain calls (`uint32 eid`).
    pub fn eid(&self) -> u32 {
        u8::from(*self) as u32
    }

    pub fn from_eid(eid: u32) -> ConfiguratorResult<Self> {
        u8::try_from(eid)
            .ok()
            .and_then(|id| ChainId::try_from(id).ok())
            .ok_or_else(|| ConfiguratorError::Read(format!("Unknown endpoint id {}", eid)))
    }
}

// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Address normalization.
//!
//! Every chain family encodes account addresses differently: EVM chains use
//! 20-byte EIP-55 checksummed hex, Starcoin uses 16-byte hex and Aptos uses
//! 32-byte hex that may be written in short form (`0x1`). Comparing a peer
//! configured on one chain with a value read on another therefore goes through
//! a fixed-width 32-byte [`CanonicalAddress`], left-padded with zeros.
//!
//! Canonical textual forms produced by [`denormalize`]:
//!
//! | Family  | Form                               |
//! |---------|------------------------------------|
//! | EVM     | `0x` + 40 hex, EIP-55 checksummed  |
//! | Move16  | `0x` + 32 lowercase hex            |
//! | Move32  | `0x` + 64 lowercase hex            |

use std::fmt;

use ethers::types::Address as EthAddress;
use ethers::utils::to_checksum;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::chain::{ChainFamily, ChainId};
use crate::error::{ConfiguratorError, ConfiguratorResult};

pub const CANONICAL_ADDRESS_LENGTH: usize = 32;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CanonicalAddress([u8; CANONICAL_ADDRESS_LENGTH]);

impl CanonicalAddress {
    pub const ZERO: CanonicalAddress = CanonicalAddress([0u8; CANONICAL_ADDRESS_LENGTH]);

    pub fn new(bytes: [u8; CANONICAL_ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Left-pads `bytes` into the canonical width.
    pub fn from_slice(bytes: &[u8]) -> ConfiguratorResult<Self> {
        if bytes.len() > CANONICAL_ADDRESS_LENGTH {
            return Err(ConfiguratorError::DiffComparison(format!(
                "{} bytes do not fit a canonical address",
                bytes.len()
            )));
        }
        let mut out = [0u8; CANONICAL_ADDRESS_LENGTH];
        out[CANONICAL_ADDRESS_LENGTH - bytes.len()..].copy_from_slice(bytes);
        Ok(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8; CANONICAL_ADDRESS_LENGTH] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Display for CanonicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for CanonicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanonicalAddress({})", self)
    }
}

impl Serialize for CanonicalAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CanonicalAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = decode_hex(&s).map_err(serde::de::Error::custom)?;
        CanonicalAddress::from_slice(&bytes).map_err(serde::de::Error::custom)
    }
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

fn decode_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let digits = strip_hex_prefix(s);
    if digits.len() % 2 == 1 {
        hex::decode(format!("0{}", digits))
    } else {
        hex::decode(digits)
    }
}

fn invalid(address: &str, chain_id: ChainId, reason: impl Into<String>) -> ConfiguratorError {
    ConfiguratorError::InvalidAddress {
        address: address.to_string(),
        chain: chain_id.to_string(),
        reason: reason.into(),
    }
}

/// Converts a chain-native address into its canonical 32-byte form.
pub fn normalize(address: &str, chain_id: ChainId) -> ConfiguratorResult<CanonicalAddress> {
    let digits = strip_hex_prefix(address);
    if digits.is_empty() {
        return Err(invalid(address, chain_id, "empty address"));
    }
    let family = chain_id.family();
    let width = family.address_width();
    match family {
        ChainFamily::Evm if digits.len() != width * 2 => {
            return Err(invalid(
                address,
                chain_id,
                format!("expected {} hex digits, got {}", width * 2, digits.len()),
            ));
        }
        ChainFamily::Move16 | ChainFamily::Move32 if digits.len() > width * 2 => {
            return Err(invalid(
                address,
                chain_id,
                format!("at most {} hex digits allowed, got {}", width * 2, digits.len()),
            ));
        }
        _ => {}
    }
    let bytes = decode_hex(digits).map_err(|e| invalid(address, chain_id, e.to_string()))?;
    CanonicalAddress::from_slice(&bytes)
}

/// Renders a canonical address in the canonical textual form of the chain family.
pub fn denormalize(address: &CanonicalAddress, chain_id: ChainId) -> ConfiguratorResult<String> {
    let width = chain_id.family().address_width();
    let (padding, native) = address.as_bytes().split_at(CANONICAL_ADDRESS_LENGTH - width);
    if padding.iter().any(|b| *b != 0) {
        return Err(invalid(
            &address.to_string(),
            chain_id,
            format!("does not fit a {}-byte address", width),
        ));
    }
    Ok(match chain_id.family() {
        ChainFamily::Evm => to_checksum(&EthAddress::from_slice(native), None),
        ChainFamily::Move16 | ChainFamily::Move32 => format!("0x{}", hex::encode(native)),
    })
}

/// Like [`normalize`], but an empty string stands for an unset address.
pub fn normalize_or_zero(address: &str, chain_id: ChainId) -> ConfiguratorResult<CanonicalAddress> {
    if strip_hex_prefix(address).is_empty() {
        Ok(CanonicalAddress::ZERO)
    } else {
        normalize(address, chain_id)
    }
}

/// Compares two addresses of the same chain by their canonical form.
///
/// Empty strings and the all-zero address are both "unset" and compare equal.
pub fn addresses_equal(a: &str, b: &str, chain_id: ChainId) -> ConfiguratorResult<bool> {
    Ok(normalize_or_zero(a, chain_id)? == normalize_or_zero(b, chain_id)?)
}

pub fn is_zero(address: &str, chain_id: ChainId) -> ConfiguratorResult<bool> {
    Ok(normalize_or_zero(address, chain_id)?.is_zero())
}

/// Checks an address taken from the graph. A failure is a graph defect.
pub fn validate_address(address: &str, chain_id: ChainId) -> ConfiguratorResult<()> {
    normalize(address, chain_id)
        .map(|_| ())
        .map_err(ConfiguratorError::into_malformed)
}

/// Compares a desired address with one just read from chain.
///
/// A malformed desired address is an [`ConfiguratorError::InvalidAddress`]; a
/// malformed on-chain value cannot be compared and is a
/// [`ConfiguratorError::DiffComparison`].
pub fn matches_read_address(
    desired: &str,
    current: &str,
    chain_id: ChainId,
) -> ConfiguratorResult<bool> {
    let desired = normalize_or_zero(desired, chain_id)?;
    let current = normalize_or_zero(current, chain_id)
        .map_err(|e| ConfiguratorError::DiffComparison(e.to_string()))?;
    Ok(desired == current)
}

/// Canonical, sorted form of an address list read from chain or configured.
pub fn normalize_sorted(
    addresses: &[String],
    chain_id: ChainId,
) -> ConfiguratorResult<Vec<CanonicalAddress>> {
    let mut out = addresses
        .iter()
        .map(|a| normalize(a, chain_id))
        .collect::<ConfiguratorResult<Vec<_>>>()?;
    out.sort();
    Ok(out)
}

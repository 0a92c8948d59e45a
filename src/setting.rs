// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Three-state configuration values.
//!
//! A desired property is either not managed at all ([`Setting::Absent`]),
//! managed and meant to follow the chain default ([`Setting::Default`]), or
//! pinned to a value ([`Setting::Value`]). An empty collection inside `Value`
//! means "explicitly none" and never "use defaults".
//!
//! SDK reads resolve on-chain sentinels into the same space, so the diff is a
//! plain comparison: a pinned value that happens to equal the current default
//! still differs from `Default`.

use serde::{Deserialize, Serialize};

use crate::address::matches_read_address;
use crate::chain::ChainId;
use crate::error::ConfiguratorResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Setting<T> {
    Absent,
    Default,
    Value(T),
}

impl<T> Default for Setting<T> {
    fn default() -> Self {
        Setting::Absent
    }
}

impl<T> Setting<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Setting::Absent)
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Setting::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ref(&self) -> Setting<&T> {
        match self {
            Setting::Absent => Setting::Absent,
            Setting::Default => Setting::Default,
            Setting::Value(v) => Setting::Value(v),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Setting<U> {
        match self {
            Setting::Absent => Setting::Absent,
            Setting::Default => Setting::Default,
            Setting::Value(v) => Setting::Value(f(v)),
        }
    }

    /// Whether `current` satisfies this desired setting under `eq`.
    ///
    /// `Absent` accepts anything. `Default` only accepts `Default`.
    pub fn is_satisfied_by_with<U>(
        &self,
        current: &Setting<U>,
        eq: impl FnOnce(&T, &U) -> bool,
    ) -> bool {
        match (self, current) {
            (Setting::Absent, _) => true,
            (Setting::Default, Setting::Default) => true,
            (Setting::Value(desired), Setting::Value(current)) => eq(desired, current),
            _ => false,
        }
    }

    /// Resolves the value to write: unmanaged fields keep what is on chain.
    pub fn or_current(self, current: Setting<T>) -> Setting<T> {
        match self {
            Setting::Absent => current,
            other => other,
        }
    }
}

impl<T: PartialEq> Setting<T> {
    pub fn is_satisfied_by(&self, current: &Setting<T>) -> bool {
        self.is_satisfied_by_with(current, |a, b| a == b)
    }
}

/// [`Setting::is_satisfied_by`] for addresses read from `chain_id`.
pub fn address_setting_satisfied(
    desired: &Setting<String>,
    current: &Setting<String>,
    chain_id: ChainId,
) -> ConfiguratorResult<bool> {
    match (desired, current) {
        (Setting::Value(desired), Setting::Value(current)) => {
            matches_read_address(desired, current, chain_id)
        }
        (desired, current) => Ok(desired.is_satisfied_by_with(current, |_, _| true)),
    }
}

impl<T> From<Option<T>> for Setting<T> {
    /// `None` is read as "follow the default".
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Setting::Value(v),
            None => Setting::Default,
        }
    }
}

impl<T: std::fmt::Display> std::fmt::Display for Setting<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Setting::Absent => write!(f, "<unmanaged>"),
            Setting::Default => write!(f, "<default>"),
            Setting::Value(v) => write!(f, "{}", v),
        }
    }
}

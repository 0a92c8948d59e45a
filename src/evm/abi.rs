// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use ethers::abi::param_type::Reader;
use ethers::abi::{Function, Param, StateMutability};
use once_cell::sync::Lazy;

use crate::error::{ConfiguratorError, ConfiguratorResult};

/// `(name, input types, output types, mutability)`
type Signature = (
    &'static str,
    &'static [&'static str],
    &'static [&'static str],
    StateMutability,
);

type FunctionTable = Result<BTreeMap<String, Function>, String>;

const VIEW: StateMutability = StateMutability::View;
const WRITE: StateMutability = StateMutability::NonPayable;

/// `UlnConfig` as stored by ULN302.
const ULN_CONFIG: &str = "(uint64,uint8,uint8,uint8,address[],address[])";

static OAPP_ABI: Lazy<FunctionTable> = Lazy::new(|| {
    build(&[
        ("owner", &[], &["address"], VIEW),
        ("transferOwnership", &["address"], &[], WRITE),
        ("endpoint", &[], &["address"], VIEW),
        ("peers", &["uint32"], &["bytes32"], VIEW),
        ("setPeer", &["uint32", "bytes32"], &[], WRITE),
        ("setDelegate", &["address"], &[], WRITE),
        ("enforcedOptions", &["uint32", "uint16"], &["bytes"], VIEW),
        ("setEnforcedOptions", &["(uint32,uint16,bytes)[]"], &[], WRITE),
    ])
});

static ENDPOINT_ABI: Lazy<FunctionTable> = Lazy::new(|| {
    build(&[
        ("isRegisteredLibrary", &["address"], &["bool"], VIEW),
        ("registerLibrary", &["address"], &[], WRITE),
        ("defaultSendLibrary", &["uint32"], &["address"], VIEW),
        ("setDefaultSendLibrary", &["uint32", "address"], &[], WRITE),
        ("defaultReceiveLibrary", &["uint32"], &["address"], VIEW),
        ("setDefaultReceiveLibrary", &["uint32", "address", "uint256"], &[], WRITE),
        ("getSendLibrary", &["address", "uint32"], &["address"], VIEW),
        ("isDefaultSendLibrary", &["address", "uint32"], &["bool"], VIEW),
        ("setSendLibrary", &["address", "uint32", "address"], &[], WRITE),
        ("getReceiveLibrary", &["address", "uint32"], &["address", "bool"], VIEW),
        ("setReceiveLibrary", &["address", "uint32", "address", "uint256"], &[], WRITE),
        ("receiveLibraryTimeout", &["address", "uint32"], &["address", "uint256"], VIEW),
        ("setReceiveLibraryTimeout", &["address", "uint32", "address", "uint256"], &[], WRITE),
        ("setConfig", &["address", "address", "(uint32,uint32,bytes)[]"], &[], WRITE),
        ("delegates", &["address"], &["address"], VIEW),
    ])
});

static ULN302_ABI: Lazy<FunctionTable> = Lazy::new(|| {
    build(&[
        ("getAppUlnConfig", &["address", "uint32"], &[ULN_CONFIG], VIEW),
        ("executorConfigs", &["address", "uint32"], &["uint32", "address"], VIEW),
        (
            "setDefaultUlnConfigs",
            &["(uint32,(uint64,uint8,uint8,uint8,address[],address[]))[]"],
            &[],
            WRITE,
        ),
        ("setDefaultExecutorConfigs", &["(uint32,(uint32,address))[]"], &[], WRITE),
    ])
});

static PRICE_FEED_ABI: Lazy<FunctionTable> = Lazy::new(|| {
    build(&[
        ("getPrice", &["uint32"], &["(uint128,uint64,uint32)"], VIEW),
        ("setPrice", &["(uint32,(uint128,uint64,uint32))[]"], &[], WRITE),
    ])
});

fn build(signatures: &[Signature]) -> FunctionTable {
    signatures
        .iter()
        .map(|(name, inputs, outputs, mutability)| function(name, inputs, outputs, *mutability))
        .collect()
}

fn function(
    name: &str,
    inputs: &[&str],
    outputs: &[&str],
    state_mutability: StateMutability,
) -> Result<(String, Function), String> {
    #[allow(deprecated)]
    let function = Function {
        name: name.to_string(),
        inputs: params(name, inputs)?,
        outputs: params(name, outputs)?,
        constant: None,
        state_mutability,
    };
    Ok((name.to_string(), function))
}

fn params(function: &str, types: &[&str]) -> Result<Vec<Param>, String> {
    types
        .iter()
        .map(|ty| {
            Reader::read(ty)
                .map(|kind| Param {
                    name: String::new(),
                    kind,
                    internal_type: None,
                })
                .map_err(|e| format!("{}: bad type {}: {}", function, ty, e))
        })
        .collect()
}

fn lookup(
    table: &'static Lazy<FunctionTable>,
    name: &str,
) -> ConfiguratorResult<&'static Function> {
    let functions = match &**table {
        Ok(functions) => functions,
        Err(e) => return Err(ConfiguratorError::Config(format!("Invalid ABI: {}", e))),
    };
    functions
        .get(name)
        .ok_or_else(|| ConfiguratorError::Config(format!("Missing ABI function {}", name)))
}

pub(crate) fn oapp_function(name: &str) -> ConfiguratorResult<&'static Function> {
    lookup(&OAPP_ABI, name)
}

pub(crate) fn endpoint_function(name: &str) -> ConfiguratorResult<&'static Function> {
    lookup(&ENDPOINT_ABI, name)
}

pub(crate) fn uln302_function(name: &str) -> ConfiguratorResult<&'static Function> {
    lookup(&ULN302_ABI, name)
}

pub(crate) fn price_feed_function(name: &str) -> ConfiguratorResult<&'static Function> {
    lookup(&PRICE_FEED_ABI, name)
}

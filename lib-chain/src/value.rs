//! Positional call values.
//!
//! Contract invocations carry arguments and returns as positional lists of
//! `Value`. The node client handles ABI encoding; this enum is the typed form
//! the bindings marshal into and out of.

use crate::error::{ChainError, ChainResult};
use lib_types::{Address, Amount, Hash};
use serde::{Deserialize, Serialize};

/// A single positional argument or return value of a contract invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Address(Address),
    Hash(Hash),
    Uint(u128),
    Bool(bool),
    Str(String),
    AddressList(Vec<Address>),
    UintList(Vec<u128>),
    HashList(Vec<Hash>),
    StrList(Vec<String>),
}

impl Value {
    pub fn as_address(&self, method: &str) -> ChainResult<Address> {
        match self {
            Value::Address(a) => Ok(*a),
            _ => Err(mismatch(method, "address")),
        }
    }

    pub fn as_hash(&self, method: &str) -> ChainResult<Hash> {
        match self {
            Value::Hash(h) => Ok(*h),
            _ => Err(mismatch(method, "hash")),
        }
    }

    pub fn as_uint(&self, method: &str) -> ChainResult<u128> {
        match self {
            Value::Uint(v) => Ok(*v),
            _ => Err(mismatch(method, "uint")),
        }
    }

    pub fn as_bool(&self, method: &str) -> ChainResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => Err(mismatch(method, "bool")),
        }
    }

    pub fn as_str(&self, method: &str) -> ChainResult<&str> {
        match self {
            Value::Str(s) => Ok(s),
            _ => Err(mismatch(method, "string")),
        }
    }
}

fn mismatch(method: &str, expected: &'static str) -> ChainError {
    ChainError::UnexpectedReturn {
        method: method.to_string(),
        expected,
    }
}

/// Fetch the value at `index` from a contract return, failing with the
/// method name when the return is shorter than expected.
pub fn expect_return<'a>(values: &'a [Value], index: usize, method: &str) -> ChainResult<&'a Value> {
    values.get(index).ok_or_else(|| ChainError::UnexpectedReturn {
        method: method.to_string(),
        expected: "more return values",
    })
}

impl From<Address> for Value {
    fn from(a: Address) -> Self {
        Value::Address(a)
    }
}

impl From<Hash> for Value {
    fn from(h: Hash) -> Self {
        Value::Hash(h)
    }
}

impl From<Amount> for Value {
    fn from(a: Amount) -> Self {
        Value::Uint(a.value())
    }
}

impl From<u128> for Value {
    fn from(v: u128) -> Self {
        Value::Uint(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v as u128)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Uint(v as u128)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Address>> for Value {
    fn from(v: Vec<Address>) -> Self {
        Value::AddressList(v)
    }
}

impl From<Vec<Amount>> for Value {
    fn from(v: Vec<Amount>) -> Self {
        Value::UintList(v.into_iter().map(|a| a.value()).collect())
    }
}

impl From<Vec<Hash>> for Value {
    fn from(v: Vec<Hash>) -> Self {
        Value::HashList(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::StrList(v)
    }
}

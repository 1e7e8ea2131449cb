//! Ledger values and invocation envelopes.
//!
//! # Responsibilities
//! - Decode base64 `ScVal` payloads into `NativeValue`
//! - Encode strkey identities and symbols as XDR
//! - Build the unsigned envelope used for read-only simulation

use std::fmt;

use serde::Serialize;
use stellar_xdr::curr as xdr;
use stellar_xdr::curr::{Limits, ReadXdr, WriteXdr};

use crate::blockchain::types::{StellarError, StellarResult};

/// Base fee put on simulation envelopes. Never charged.
const SIMULATION_FEE: u32 = 100;

/// A decoded ledger value.
///
/// 128-bit integers keep full precision; they render as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NativeValue {
    Void,
    Bool(bool),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    #[serde(serialize_with = "serialize_display")]
    U128(u128),
    #[serde(serialize_with = "serialize_display")]
    I128(i128),
    Timepoint(u64),
    Duration(u64),
    Bytes(Vec<u8>),
    String(String),
    Symbol(String),
    /// Strkey form (`G...` or `C...`).
    Address(String),
    Vec(Vec<NativeValue>),
    Map(Vec<(NativeValue, NativeValue)>),
}

fn serialize_display<T: fmt::Display, S: serde::Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

impl NativeValue {
    /// Text for string-like values (string, symbol, address).
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Symbol(s) | Self::Address(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&str> {
        match self {
            Self::Address(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Any non-negative integer that fits in `u32`.
    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Self::U32(v) => Some(v),
            Self::I32(v) => u32::try_from(v).ok(),
            Self::U64(v) | Self::Timepoint(v) | Self::Duration(v) => u32::try_from(v).ok(),
            Self::I64(v) => u32::try_from(v).ok(),
            Self::U128(v) => u32::try_from(v).ok(),
            Self::I128(v) => u32::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::U32(v) => Some(v.into()),
            Self::I32(v) => u64::try_from(v).ok(),
            Self::U64(v) | Self::Timepoint(v) | Self::Duration(v) => Some(v),
            Self::I64(v) => u64::try_from(v).ok(),
            Self::U128(v) => u64::try_from(v).ok(),
            Self::I128(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Decimal rendering of any integer value.
    pub fn to_decimal_string(&self) -> Option<String> {
        match self {
            Self::U32(v) => Some(v.to_string()),
            Self::I32(v) => Some(v.to_string()),
            Self::U64(v) => Some(v.to_string()),
            Self::I64(v) => Some(v.to_string()),
            Self::U128(v) => Some(v.to_string()),
            Self::I128(v) => Some(v.to_string()),
            _ => None,
        }
    }

    pub fn as_vec(&self) -> Option<&[NativeValue]> {
        match self {
            Self::Vec(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a field of a map keyed by symbols or strings.
    pub fn field(&self, name: &str) -> Option<&NativeValue> {
        match self {
            Self::Map(entries) => entries
                .iter()
                .find(|(key, _)| key.as_str() == Some(name))
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// `Option<T>` on chain is `T` or void.
    pub fn into_option(self) -> Option<NativeValue> {
        match self {
            Self::Void => None,
            other => Some(other),
        }
    }
}

impl fmt::Display for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => write!(f, "void"),
            Self::Bool(v) => write!(f, "{}", v),
            Self::U32(v) => write!(f, "{}", v),
            Self::I32(v) => write!(f, "{}", v),
            Self::U64(v) | Self::Timepoint(v) | Self::Duration(v) => write!(f, "{}", v),
            Self::I64(v) => write!(f, "{}", v),
            Self::U128(v) => write!(f, "{}", v),
            Self::I128(v) => write!(f, "{}", v),
            Self::Bytes(bytes) => {
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            Self::String(s) | Self::Symbol(s) | Self::Address(s) => write!(f, "{}", s),
            Self::Vec(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}:{}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl TryFrom<&xdr::ScVal> for NativeValue {
    type Error = StellarError;

    fn try_from(val: &xdr::ScVal) -> StellarResult<Self> {
        use xdr::ScVal;

        let native = match val {
            ScVal::Void => Self::Void,
            ScVal::Bool(b) => Self::Bool(*b),
            ScVal::U32(v) => Self::U32(*v),
            ScVal::I32(v) => Self::I32(*v),
            ScVal::U64(v) => Self::U64(*v),
            ScVal::I64(v) => Self::I64(*v),
            ScVal::Timepoint(t) => Self::Timepoint(t.0),
            ScVal::Duration(d) => Self::Duration(d.0),
            ScVal::U128(parts) => Self::U128(((parts.hi as u128) << 64) | parts.lo as u128),
            ScVal::I128(parts) => Self::I128(((parts.hi as i128) << 64) | parts.lo as i128),
            ScVal::Bytes(bytes) => Self::Bytes(bytes.0.to_vec()),
            ScVal::String(s) => Self::String(utf8(s.0.as_slice())?),
            ScVal::Symbol(s) => Self::Symbol(utf8(s.0.as_slice())?),
            ScVal::Address(address) => Self::Address(address_to_strkey(address)),
            ScVal::Vec(items) => Self::Vec(match items {
                Some(items) => items
                    .0
                    .iter()
                    .map(NativeValue::try_from)
                    .collect::<StellarResult<_>>()?,
                None => Vec::new(),
            }),
            ScVal::Map(entries) => Self::Map(match entries {
                Some(entries) => entries
                    .0
                    .iter()
                    .map(|entry| {
                        Ok((
                            NativeValue::try_from(&entry.key)?,
                            NativeValue::try_from(&entry.val)?,
                        ))
                    })
                    .collect::<StellarResult<_>>()?,
                None => Vec::new(),
            }),
            other => {
                return Err(StellarError::ParseFailed(format!(
                    "unsupported value type {:?}",
                    other.discriminant()
                )))
            }
        };
        Ok(native)
    }
}

fn utf8(bytes: &[u8]) -> StellarResult<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| StellarError::ParseFailed(format!("invalid utf-8: {}", e)))
}

fn address_to_strkey(address: &xdr::ScAddress) -> String {
    match address {
        xdr::ScAddress::Account(xdr::AccountId(xdr::PublicKey::PublicKeyTypeEd25519(
            xdr::Uint256(key),
        ))) => stellar_strkey::ed25519::PublicKey(*key).to_string(),
        xdr::ScAddress::Contract(xdr::Hash(id)) => stellar_strkey::Contract(*id).to_string(),
    }
}

/// Decode one base64 `ScVal` into a native value.
pub fn decode_sc_val(b64: &str) -> StellarResult<NativeValue> {
    let val = xdr::ScVal::from_xdr_base64(b64, Limits::none())
        .map_err(|e| StellarError::ParseFailed(format!("malformed ScVal: {}", e)))?;
    NativeValue::try_from(&val)
}

/// Base64 XDR of a value, as used in event topic filters.
pub fn encode_sc_val(val: &xdr::ScVal) -> StellarResult<String> {
    val.to_xdr_base64(Limits::none())
        .map_err(|e| StellarError::ParseFailed(format!("cannot encode ScVal: {}", e)))
}

/// Symbol value, e.g. an event type or a method name.
pub fn symbol(name: &str) -> StellarResult<xdr::ScSymbol> {
    xdr::StringM::try_from(name.as_bytes().to_vec())
        .map(xdr::ScSymbol)
        .map_err(|_| StellarError::contract(name, "method name is not a valid symbol"))
}

/// `C...` identity as an `ScAddress`. A bad checksum is an invalid address.
pub fn contract_address(contract_id: &str) -> StellarResult<xdr::ScAddress> {
    stellar_strkey::Contract::from_string(contract_id)
        .map(|c| xdr::ScAddress::Contract(xdr::Hash(c.0)))
        .map_err(|_| StellarError::InvalidAddress(contract_id.to_string()))
}

/// Raw ed25519 key of a `G...` identity.
pub fn account_public_key(account_id: &str) -> StellarResult<[u8; 32]> {
    stellar_strkey::ed25519::PublicKey::from_string(account_id)
        .map(|key| key.0)
        .map_err(|_| StellarError::InvalidAddress(account_id.to_string()))
}

/// Unsigned single-operation envelope invoking `function` on `contract`.
///
/// `sequence` is the source account's current sequence; the envelope uses
/// the next one.
pub fn build_invocation_envelope(
    source: [u8; 32],
    sequence: i64,
    contract: &xdr::ScAddress,
    function: &xdr::ScSymbol,
    args: &[xdr::ScVal],
) -> StellarResult<String> {
    let method = String::from_utf8_lossy(function.0.as_slice()).into_owned();
    let args: xdr::VecM<xdr::ScVal> = args
        .to_vec()
        .try_into()
        .map_err(|_| StellarError::contract(&method, "too many arguments"))?;

    let operation = xdr::Operation {
        source_account: None,
        body: xdr::OperationBody::InvokeHostFunction(xdr::InvokeHostFunctionOp {
            host_function: xdr::HostFunction::InvokeContract(xdr::InvokeContractArgs {
                contract_address: contract.clone(),
                function_name: function.clone(),
                args,
            }),
            auth: xdr::VecM::default(),
        }),
    };
    let operations = vec![operation]
        .try_into()
        .map_err(|_| StellarError::contract(&method, "cannot build operation list"))?;

    let tx = xdr::Transaction {
        source_account: xdr::MuxedAccount::Ed25519(xdr::Uint256(source)),
        fee: SIMULATION_FEE,
        seq_num: xdr::SequenceNumber(sequence.saturating_add(1)),
        cond: xdr::Preconditions::None,
        memo: xdr::Memo::None,
        operations,
        ext: xdr::TransactionExt::V0,
    };

    xdr::TransactionEnvelope::Tx(xdr::TransactionV1Envelope {
        tx,
        signatures: xdr::VecM::default(),
    })
    .to_xdr_base64(Limits::none())
    .map_err(|e| StellarError::contract(&method, format!("cannot encode envelope: {}", e)))
}

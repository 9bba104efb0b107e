//! Contract interface descriptors and value (de)coding.
//!
//! Descriptors travel as hex-encoded JSON: an array of function entries,
//! each with typed `inputs` and `outputs`. Return buffers use the standard
//! head/tail word encoding: static values occupy one 32-byte head word,
//! dynamic values (`string`, `bytes`) put an offset in the head and their
//! length-prefixed payload in the tail.

use alloy_primitives::{I256, U256};
use delcore_types::Address;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

const WORD: usize = 32;

/// Errors raised while handling interface descriptors.
#[derive(Error, Debug)]
pub enum AbiError {
    /// The descriptor hex could not be decoded.
    #[error("invalid descriptor hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// The descriptor JSON could not be parsed.
    #[error("invalid descriptor json: {0}")]
    InvalidJson(String),

    /// A parameter declares a type the codec does not know.
    #[error("unknown parameter type: {0}")]
    UnknownType(String),

    /// The named method is not part of the descriptor.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// A value could not be decoded against its declared type.
    #[error("decode error: {0}")]
    Decode(String),

    /// A call argument could not be coerced to its declared type.
    #[error("argument {index}: {reason}")]
    BadArgument {
        /// Zero-based argument position
        index: usize,
        /// Why the coercion failed
        reason: String,
    },
}

/// Result type for ABI operations.
pub type AbiResult<T> = std::result::Result<T, AbiError>;

/// A declared parameter type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// `uint<N>`, N in bits
    Uint(usize),
    /// `int<N>`, N in bits
    Int(usize),
    /// `bool`
    Bool,
    /// `address`
    Address,
    /// `string`
    String,
    /// `bytes`
    Bytes,
}

impl ParamKind {
    fn parse(s: &str) -> AbiResult<Self> {
        match s {
            "bool" => return Ok(Self::Bool),
            "address" => return Ok(Self::Address),
            "string" => return Ok(Self::String),
            "bytes" => return Ok(Self::Bytes),
            _ => {}
        }
        if let Some(bits) = s.strip_prefix("uint") {
            return Ok(Self::Uint(parse_bits(s, bits)?));
        }
        if let Some(bits) = s.strip_prefix("int") {
            return Ok(Self::Int(parse_bits(s, bits)?));
        }
        Err(AbiError::UnknownType(s.to_string()))
    }

    /// Whether the value is encoded in the tail with an offset in the head.
    fn is_dynamic(&self) -> bool {
        matches!(self, Self::String | Self::Bytes)
    }
}

fn parse_bits(full: &str, bits: &str) -> AbiResult<usize> {
    if bits.is_empty() {
        return Ok(256);
    }
    let n: usize = bits
        .parse()
        .map_err(|_| AbiError::UnknownType(full.to_string()))?;
    if n == 0 || n > 256 || n % 8 != 0 {
        return Err(AbiError::UnknownType(full.to_string()));
    }
    Ok(n)
}

/// A decoded or coerced typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    /// Unsigned integer
    Uint(U256),
    /// Signed integer
    Int(I256),
    /// Boolean
    Bool(bool),
    /// Account address
    Address(Address),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
}

impl AbiValue {
    /// Renders the value for a receipt's `contractResult` list.
    ///
    /// Integers that fit 64 bits become JSON numbers; wider ones degrade to
    /// decimal strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AbiValue::Uint(v) => match u64::try_from(*v) {
                Ok(n) => serde_json::Value::from(n),
                Err(_) => serde_json::Value::from(v.to_string()),
            },
            AbiValue::Int(v) => match i64::try_from(*v) {
                Ok(n) => serde_json::Value::from(n),
                Err(_) => serde_json::Value::from(v.to_string()),
            },
            AbiValue::Bool(b) => serde_json::Value::from(*b),
            AbiValue::Address(a) => serde_json::Value::from(a.to_hex()),
            AbiValue::String(s) => serde_json::Value::from(s.clone()),
            AbiValue::Bytes(b) => serde_json::Value::from(format!("0x{}", hex::encode(b))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawParam {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    inputs: Vec<RawParam>,
    #[serde(default)]
    outputs: Vec<RawParam>,
}

/// A declared method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Declared name, possibly empty
    pub name: String,
    /// Declared type
    pub kind: ParamKind,
}

/// A contract method signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    /// Method name
    pub name: String,
    /// Declared argument types
    pub inputs: Vec<Param>,
    /// Declared return types
    pub outputs: Vec<Param>,
}

/// A parsed contract interface descriptor.
#[derive(Debug, Clone, Default)]
pub struct Abi {
    methods: HashMap<String, Method>,
}

impl Abi {
    /// Parses a hex-encoded JSON descriptor.
    pub fn from_hex(descriptor: &str) -> AbiResult<Self> {
        let bytes = hex::decode(descriptor.trim().trim_start_matches("0x"))?;
        Self::from_json(&bytes)
    }

    /// Parses a raw JSON descriptor.
    pub fn from_json(json: &[u8]) -> AbiResult<Self> {
        let entries: Vec<RawEntry> =
            serde_json::from_slice(json).map_err(|e| AbiError::InvalidJson(e.to_string()))?;

        let mut methods = HashMap::new();
        for entry in entries {
            // Constructors, events and fallbacks carry no callable name.
            if !entry.kind.is_empty() && entry.kind != "function" {
                continue;
            }
            if entry.name.is_empty() {
                continue;
            }
            let method = Method {
                name: entry.name.clone(),
                inputs: parse_params(entry.inputs)?,
                outputs: parse_params(entry.outputs)?,
            };
            methods.insert(entry.name, method);
        }
        Ok(Self { methods })
    }

    /// Looks up a method by name.
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    /// Decodes a return buffer against the named method's outputs.
    ///
    /// Returns `Ok(None)` when the method is absent from the descriptor or
    /// the buffer is empty; both mean there is nothing to record.
    pub fn unpack_values(&self, method: &str, data: &[u8]) -> AbiResult<Option<Vec<AbiValue>>> {
        let Some(method) = self.methods.get(method) else {
            return Ok(None);
        };
        if data.is_empty() {
            return Ok(None);
        }

        let mut values = Vec::with_capacity(method.outputs.len());
        for (slot, param) in method.outputs.iter().enumerate() {
            let head = read_word(data, slot * WORD)?;
            let value = if param.kind.is_dynamic() {
                let offset = word_to_usize(&head)?;
                decode_dynamic(&param.kind, data, offset)?
            } else {
                decode_static(&param.kind, &head)?
            };
            values.push(value);
        }
        Ok(Some(values))
    }

    /// Coerces JSON call arguments against the named method's inputs.
    ///
    /// The arity must match the declaration exactly.
    pub fn convert_params(
        &self,
        method: &str,
        params: &[serde_json::Value],
    ) -> AbiResult<Vec<AbiValue>> {
        let method = self
            .methods
            .get(method)
            .ok_or_else(|| AbiError::MethodNotFound(method.to_string()))?;

        if params.len() != method.inputs.len() {
            return Err(AbiError::Decode(format!(
                "method {} takes {} arguments, got {}",
                method.name,
                method.inputs.len(),
                params.len()
            )));
        }

        method
            .inputs
            .iter()
            .zip(params)
            .enumerate()
            .map(|(index, (param, value))| {
                coerce(&param.kind, value).map_err(|reason| AbiError::BadArgument { index, reason })
            })
            .collect()
    }
}

fn parse_params(raw: Vec<RawParam>) -> AbiResult<Vec<Param>> {
    raw.into_iter()
        .map(|p| {
            Ok(Param {
                name: p.name,
                kind: ParamKind::parse(&p.kind)?,
            })
        })
        .collect()
}

fn read_word(data: &[u8], offset: usize) -> AbiResult<[u8; WORD]> {
    let end = offset
        .checked_add(WORD)
        .ok_or_else(|| AbiError::Decode("offset overflow".into()))?;
    if end > data.len() {
        return Err(AbiError::Decode(format!(
            "buffer too short: need {end} bytes, have {}",
            data.len()
        )));
    }
    let mut word = [0u8; WORD];
    word.copy_from_slice(&data[offset..end]);
    Ok(word)
}

fn word_to_usize(word: &[u8; WORD]) -> AbiResult<usize> {
    let value = U256::from_be_slice(word);
    usize::try_from(value).map_err(|_| AbiError::Decode("offset exceeds buffer".into()))
}

fn decode_static(kind: &ParamKind, word: &[u8; WORD]) -> AbiResult<AbiValue> {
    match kind {
        ParamKind::Uint(_) => Ok(AbiValue::Uint(U256::from_be_slice(word))),
        ParamKind::Int(_) => Ok(AbiValue::Int(I256::from_raw(U256::from_be_slice(word)))),
        ParamKind::Bool => Ok(AbiValue::Bool(word[WORD - 1] != 0)),
        ParamKind::Address => {
            let addr = Address::from_slice(&word[WORD - 20..])
                .map_err(|e| AbiError::Decode(e.to_string()))?;
            Ok(AbiValue::Address(addr))
        }
        _ => Err(AbiError::Decode("dynamic kind in static slot".into())),
    }
}

fn decode_dynamic(kind: &ParamKind, data: &[u8], offset: usize) -> AbiResult<AbiValue> {
    let len_word = read_word(data, offset)?;
    let len = word_to_usize(&len_word)?;
    let start = offset + WORD;
    let end = start
        .checked_add(len)
        .ok_or_else(|| AbiError::Decode("length overflow".into()))?;
    if end > data.len() {
        return Err(AbiError::Decode(format!(
            "dynamic value runs past the buffer: need {end} bytes, have {}",
            data.len()
        )));
    }
    let bytes = data[start..end].to_vec();
    match kind {
        ParamKind::String => {
            let s = String::from_utf8(bytes).map_err(|e| AbiError::Decode(e.to_string()))?;
            Ok(AbiValue::String(s))
        }
        ParamKind::Bytes => Ok(AbiValue::Bytes(bytes)),
        _ => Err(AbiError::Decode("static kind in dynamic slot".into())),
    }
}

fn coerce(kind: &ParamKind, value: &serde_json::Value) -> std::result::Result<AbiValue, String> {
    match kind {
        ParamKind::Uint(_) => match value {
            serde_json::Value::Number(n) => {
                let n = n.as_u64().ok_or("expected a non-negative integer")?;
                Ok(AbiValue::Uint(U256::from(n)))
            }
            serde_json::Value::String(s) => {
                let parsed = if let Some(hex) = s.strip_prefix("0x") {
                    U256::from_str_radix(hex, 16)
                } else {
                    U256::from_str_radix(s, 10)
                };
                parsed.map(AbiValue::Uint).map_err(|e| e.to_string())
            }
            _ => Err("expected a number or numeric string".into()),
        },
        ParamKind::Int(_) => match value {
            serde_json::Value::Number(n) => {
                let n = n.as_i64().ok_or("expected an integer")?;
                Ok(AbiValue::Int(I256::try_from(n).map_err(|e| e.to_string())?))
            }
            serde_json::Value::String(s) => s
                .parse::<I256>()
                .map(AbiValue::Int)
                .map_err(|e| e.to_string()),
            _ => Err("expected a number or numeric string".into()),
        },
        ParamKind::Bool => match value {
            serde_json::Value::Bool(b) => Ok(AbiValue::Bool(*b)),
            serde_json::Value::String(s) => match s.as_str() {
                "true" => Ok(AbiValue::Bool(true)),
                "false" => Ok(AbiValue::Bool(false)),
                _ => Err("expected true or false".into()),
            },
            _ => Err("expected a boolean".into()),
        },
        ParamKind::Address => match value {
            serde_json::Value::String(s) => {
                Address::from_hex(s).map(AbiValue::Address).map_err(|e| e.to_string())
            }
            _ => Err("expected an address string".into()),
        },
        ParamKind::String => match value {
            serde_json::Value::String(s) => Ok(AbiValue::String(s.clone())),
            other => Ok(AbiValue::String(other.to_string())),
        },
        ParamKind::Bytes => match value {
            serde_json::Value::String(s) => hex::decode(s.trim_start_matches("0x"))
                .map(AbiValue::Bytes)
                .map_err(|e| e.to_string()),
            _ => Err("expected a hex string".into()),
        },
    }
}

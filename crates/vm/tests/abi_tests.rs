//! Tests for descriptor parsing, return-buffer unpacking, and parameter
//! conversion.

use alloy_primitives::{I256, U256};
use delcore_types::Address;
use delcore_vm::abi::{Abi, AbiError, AbiValue, ParamKind};
use serde_json::json;

const DESCRIPTOR: &str = r#"[
    {"type":"function","name":"get","inputs":[{"name":"key","type":"string"}],
     "outputs":[{"name":"value","type":"uint256"},{"name":"ok","type":"bool"}]},
    {"type":"function","name":"owner","inputs":[],
     "outputs":[{"name":"","type":"address"}]},
    {"type":"function","name":"describe","inputs":[],
     "outputs":[{"name":"","type":"string"}]},
    {"type":"function","name":"adjust","inputs":[{"name":"delta","type":"int64"}],
     "outputs":[]},
    {"type":"constructor","inputs":[{"name":"seed","type":"uint256"}]},
    {"type":"event","name":"Updated","inputs":[]}
]"#;

fn parsed() -> Abi {
    Abi::from_hex(&hex::encode(DESCRIPTOR)).unwrap()
}

fn word_u64(n: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&n.to_be_bytes());
    word
}

#[test]
fn test_parse_keeps_functions_only() {
    let abi = parsed();
    assert!(abi.method("get").is_some());
    assert!(abi.method("owner").is_some());
    // Constructors and events are not callable methods.
    assert!(abi.method("Updated").is_none());
    assert!(abi.method("").is_none());
}

#[test]
fn test_parse_rejects_garbage() {
    assert!(matches!(
        Abi::from_hex("zznothex"),
        Err(AbiError::InvalidHex(_))
    ));
    assert!(matches!(
        Abi::from_hex(&hex::encode("{not json")),
        Err(AbiError::InvalidJson(_))
    ));
    let bad_type = r#"[{"type":"function","name":"f","outputs":[{"type":"uint7"}]}]"#;
    assert!(matches!(
        Abi::from_hex(&hex::encode(bad_type)),
        Err(AbiError::UnknownType(_))
    ));
}

#[test]
fn test_unpack_static_outputs() {
    let abi = parsed();

    let mut data = Vec::new();
    data.extend_from_slice(&word_u64(42));
    data.extend_from_slice(&word_u64(1));

    let values = abi.unpack_values("get", &data).unwrap().unwrap();
    assert_eq!(
        values,
        vec![AbiValue::Uint(U256::from(42u64)), AbiValue::Bool(true)]
    );
    assert_eq!(values[0].to_json(), json!(42));
    assert_eq!(values[1].to_json(), json!(true));
}

#[test]
fn test_unpack_address_output() {
    let abi = parsed();

    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&[0xaa; 20]);

    let values = abi.unpack_values("owner", &word).unwrap().unwrap();
    assert_eq!(values, vec![AbiValue::Address(Address::from([0xaa; 20]))]);
}

#[test]
fn test_unpack_dynamic_string() {
    let abi = parsed();

    // head: offset 0x20; tail: length 5 then "token"
    let mut data = Vec::new();
    data.extend_from_slice(&word_u64(32));
    data.extend_from_slice(&word_u64(5));
    data.extend_from_slice(b"token");

    let values = abi.unpack_values("describe", &data).unwrap().unwrap();
    assert_eq!(values, vec![AbiValue::String("token".into())]);
}

#[test]
fn test_unpack_absent_method_or_empty_buffer_is_none() {
    let abi = parsed();
    assert!(abi.unpack_values("missing", &word_u64(1)).unwrap().is_none());
    assert!(abi.unpack_values("get", &[]).unwrap().is_none());
}

#[test]
fn test_unpack_truncated_buffer_errors() {
    let abi = parsed();
    // "get" needs two words; give it one and a half.
    let data = vec![0u8; 48];
    assert!(matches!(
        abi.unpack_values("get", &data),
        Err(AbiError::Decode(_))
    ));
}

#[test]
fn test_convert_params_coerces_types() {
    let abi = parsed();

    let values = abi.convert_params("get", &[json!("total")]).unwrap();
    assert_eq!(values, vec![AbiValue::String("total".into())]);

    let values = abi.convert_params("adjust", &[json!(-3)]).unwrap();
    assert_eq!(values, vec![AbiValue::Int(I256::try_from(-3i64).unwrap())]);
}

#[test]
fn test_convert_params_checks_arity_and_types() {
    let abi = parsed();

    assert!(matches!(
        abi.convert_params("get", &[]),
        Err(AbiError::Decode(_))
    ));
    assert!(matches!(
        abi.convert_params("adjust", &[json!({"not": "a number"})]),
        Err(AbiError::BadArgument { index: 0, .. })
    ));
    assert!(matches!(
        abi.convert_params("missing", &[]),
        Err(AbiError::MethodNotFound(_))
    ));
}

#[test]
fn test_wide_uint_renders_as_string() {
    let value = AbiValue::Uint(U256::from(u64::MAX) + U256::from(1u64));
    assert_eq!(value.to_json(), json!("18446744073709551616"));
}

#[test]
fn test_param_kind_defaults_to_256_bits() {
    let abi = Abi::from_hex(&hex::encode(
        r#"[{"type":"function","name":"f","inputs":[{"type":"uint"}],"outputs":[]}]"#,
    ))
    .unwrap();
    assert_eq!(abi.method("f").unwrap().inputs[0].kind, ParamKind::Uint(256));
}

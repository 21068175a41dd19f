use bytes::Bytes;
use ledgervm_common::{U256, serde_utils, types::BlockHeader};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq)]
struct Quantities {
    #[serde(
        deserialize_with = "serde_utils::u256::deser_hex_or_dec_str",
        serialize_with = "serde_utils::u256::serialize_hex"
    )]
    value: U256,
    #[serde(deserialize_with = "serde_utils::u64::deser_hex_or_dec_str")]
    nonce: u64,
    #[serde(with = "serde_utils::u64::hex_str")]
    gas: u64,
    #[serde(with = "serde_utils::bytes")]
    data: Bytes,
}

#[test]
fn test_hex_and_decimal_quantities_parse_alike() {
    let hex: Quantities = serde_json::from_str(
        r#"{ "value": "0xff", "nonce": "0x10", "gas": "0x5208", "data": "0x0102" }"#,
    )
    .unwrap();
    let dec: Quantities = serde_json::from_str(
        r#"{ "value": "255", "nonce": "16", "gas": "5208", "data": "0102" }"#,
    )
    .unwrap();

    assert_eq!(hex, dec);
    assert_eq!(hex.value, U256::from(255));
    assert_eq!(hex.nonce, 16);
    assert_eq!(hex.gas, 21_000);
    assert_eq!(hex.data, Bytes::from_static(&[1, 2]));
}

#[test]
fn test_quantities_serialize_as_prefixed_hex() {
    let quantities = Quantities {
        value: U256::from(4096),
        nonce: 1,
        gas: 21_000,
        data: Bytes::from_static(&[0xde, 0xad]),
    };
    let json = serde_json::to_value(&quantities).unwrap();

    assert_eq!(json["value"], "0x1000");
    assert_eq!(json["gas"], "0x5208");
    assert_eq!(json["data"], "0xdead");
}

#[test]
fn test_malformed_quantities_are_rejected() {
    for input in [
        r#"{ "value": "0xzz", "nonce": "1", "gas": "0x1", "data": "0x" }"#,
        r#"{ "value": "1", "nonce": "one", "gas": "0x1", "data": "0x" }"#,
        r#"{ "value": "1", "nonce": "1", "gas": "0x1", "data": "0x123" }"#,
    ] {
        assert!(
            serde_json::from_str::<Quantities>(input).is_err(),
            "{input} should not parse"
        );
    }
}

#[test]
fn test_block_header_uses_hex_numbers() {
    let header = BlockHeader {
        number: 300,
        gas_limit: 8_000_000,
        timestamp: 1_500_000_000,
        ..Default::default()
    };
    let json = serde_json::to_value(&header).unwrap();
    assert_eq!(json["number"], "0x12c");
    assert_eq!(json["gasLimit"], "0x7a1200");
    assert_eq!(json["timestamp"], "0x59682f00");

    let decoded: BlockHeader = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, header);
}

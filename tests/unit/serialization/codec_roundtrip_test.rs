use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use streamdriver::{Deserializer, JsonCodec, Keyword, KeywordCodec, Serializer, YamlCodec};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct Shipment {
    id: u64,
    carrier: String,
    parcels: Vec<Parcel>,
    notes: Option<String>,
    attributes: BTreeMap<String, i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct Parcel {
    weight_grams: u32,
    fragile: bool,
}

fn shipment() -> Shipment {
    Shipment {
        id: 9001,
        carrier: "northwind".to_string(),
        parcels: vec![
            Parcel {
                weight_grams: 1200,
                fragile: false,
            },
            Parcel {
                weight_grams: 80,
                fragile: true,
            },
        ],
        notes: None,
        attributes: BTreeMap::from([("priority".to_string(), 2), ("zone".to_string(), -4)]),
    }
}

fn roundtrip<T, C>(codec: &C, value: &T) -> Option<T>
where
    C: Serializer<T> + Deserializer<T>,
{
    let bytes = codec.serialize("roundtrip", Some(value)).unwrap();
    codec.deserialize("roundtrip", bytes.as_deref()).unwrap()
}

#[test]
fn test_yaml_roundtrip_nested_struct() {
    let codec = YamlCodec::<Shipment>::new();
    assert_eq!(roundtrip(&codec, &shipment()), Some(shipment()));
}

#[test]
fn test_json_roundtrip_nested_struct() {
    let codec = JsonCodec::<Shipment>::new();
    assert_eq!(roundtrip(&codec, &shipment()), Some(shipment()));
}

#[test]
fn test_roundtrip_dynamic_values() {
    let value = json!({
        "list": [1, "two", {"three": 3}],
        "text": "héllo",
        "count": -17,
        "nothing": null,
    });

    let json = JsonCodec::<serde_json::Value>::new();
    assert_eq!(roundtrip(&json, &value), Some(value.clone()));

    let yaml = YamlCodec::<serde_json::Value>::new();
    assert_eq!(roundtrip(&yaml, &value), Some(value));
}

#[test]
fn test_absent_payload_stays_absent() {
    let json = JsonCodec::<Shipment>::new();
    let yaml = YamlCodec::<Shipment>::new();

    assert_eq!(json.serialize("t", None).unwrap(), None);
    assert_eq!(yaml.serialize("t", None).unwrap(), None);
    assert_eq!(json.deserialize("t", None).unwrap(), None);
    assert_eq!(yaml.deserialize("t", None).unwrap(), None);
}

#[test]
fn test_present_unit_value_is_not_absent() {
    // an encoded `null` is a value, unlike an absent payload
    let codec = JsonCodec::<Option<i32>>::new();
    let bytes = codec.serialize("t", Some(&None)).unwrap();
    assert_eq!(bytes.as_deref(), Some(&b"null"[..]));
    assert_eq!(codec.deserialize("t", bytes.as_deref()).unwrap(), Some(None));
}

#[test]
fn test_text_codecs_emit_utf8() {
    let value = json!({"name": "Zoë"});
    let json_bytes = JsonCodec::<serde_json::Value>::new()
        .serialize("t", Some(&value))
        .unwrap()
        .unwrap();
    let yaml_bytes = YamlCodec::<serde_json::Value>::new()
        .serialize("t", Some(&value))
        .unwrap()
        .unwrap();

    assert!(std::str::from_utf8(&json_bytes).unwrap().contains("Zoë"));
    assert!(std::str::from_utf8(&yaml_bytes).is_ok());
}

#[test]
fn test_json_keyword_keyed_decoding() {
    let bytes: &[u8] = br#"{"status": 1, "retries": 3}"#;

    let keyed = JsonCodec::<BTreeMap<Keyword, i64>>::new()
        .deserialize("t", Some(bytes))
        .unwrap()
        .unwrap();
    assert_eq!(keyed[&Keyword::new("retries")], 3);

    let string_keyed = JsonCodec::<BTreeMap<String, i64>>::new()
        .deserialize("t", Some(bytes))
        .unwrap()
        .unwrap();
    assert_eq!(string_keyed["status"], 1);
}

#[test]
fn test_keyword_key_roundtrip() {
    let key = Keyword::new("customer-42");
    assert_eq!(roundtrip(&KeywordCodec, &key), Some(key));
}

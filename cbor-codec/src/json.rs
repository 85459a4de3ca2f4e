//! Encoding `serde_json` values through the writer

use crate::{CborWriter, WriterOptions};
use cbor_format::{CborError, Result};
use serde_json::{Number, Value};

/// How arrays and objects are framed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContainerLayout {
    /// Length-prefixed containers
    #[default]
    Definite,
    /// Containers closed by a break byte
    Indefinite,
}

/// Write `value` as one CBOR item.
///
/// Integers become major type 0 or 1, every other number a double. Object
/// members become text-keyed map entries, written in the order the JSON map
/// yields them; the writer's conformance mode decides the final order.
pub fn write_json_value(
    writer: &mut CborWriter,
    value: &Value,
    layout: ContainerLayout,
) -> Result<()> {
    match value {
        Value::Null => writer.write_null(),
        Value::Bool(flag) => writer.write_bool(*flag),
        Value::Number(number) => write_number(writer, number),
        Value::String(text) => writer.write_text(text),
        Value::Array(items) => {
            match layout {
                ContainerLayout::Definite => writer.start_array(container_len(items.len())?)?,
                ContainerLayout::Indefinite => writer.start_array_indefinite()?,
            }
            for item in items {
                write_json_value(writer, item, layout)?;
            }
            writer.end_array()
        }
        Value::Object(members) => {
            match layout {
                ContainerLayout::Definite => writer.start_map(container_len(members.len())?)?,
                ContainerLayout::Indefinite => writer.start_map_indefinite()?,
            }
            for (key, member) in members {
                writer.write_text(key)?;
                write_json_value(writer, member, layout)?;
            }
            writer.end_map()
        }
    }
}

fn write_number(writer: &mut CborWriter, number: &Number) -> Result<()> {
    if let Some(unsigned) = number.as_u64() {
        writer.write_u64(unsigned)
    } else if let Some(signed) = number.as_i64() {
        writer.write_i64(signed)
    } else if let Some(float) = number.as_f64() {
        writer.write_f64(float)
    } else {
        Err(CborError::InvalidArgument(format!(
            "number {} has no CBOR representation",
            number
        )))
    }
}

fn container_len(len: usize) -> Result<i64> {
    i64::try_from(len)
        .map_err(|_| CborError::LimitExceeded(format!("container length {} too large", len)))
}

/// Encode a JSON value into a complete CBOR document
pub fn json_to_cbor(
    value: &Value,
    opts: &WriterOptions,
    layout: ContainerLayout,
) -> Result<Vec<u8>> {
    let mut writer = CborWriter::new(opts.clone());
    write_json_value(&mut writer, value, layout)?;
    writer.encode()
}

/// Parse JSON text and encode it into a complete CBOR document
pub fn json_str_to_cbor(
    text: &str,
    opts: &WriterOptions,
    layout: ContainerLayout,
) -> Result<Vec<u8>> {
    let value: Value = serde_json::from_str(text)?;
    json_to_cbor(&value, opts, layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbor_format::Conformance;
    use serde_json::json;

    fn opts(conformance: Conformance) -> WriterOptions {
        WriterOptions {
            conformance,
            ..WriterOptions::default()
        }
    }

    #[test]
    fn test_lax_keeps_json_map_order() {
        let value = json!({"aa": 2, "b": 1});
        let bytes = json_to_cbor(&value, &opts(Conformance::Lax), ContainerLayout::Definite).unwrap();
        assert_eq!(bytes, vec![0xA2, 0x62, 0x61, 0x61, 0x02, 0x61, 0x62, 0x01]);
    }

    #[test]
    fn test_canonical_puts_shorter_keys_first() {
        let value = json!({"aa": 2, "b": 1});
        let bytes =
            json_to_cbor(&value, &opts(Conformance::Canonical), ContainerLayout::Definite).unwrap();
        assert_eq!(bytes, vec![0xA2, 0x61, 0x62, 0x01, 0x62, 0x61, 0x61, 0x02]);
    }

    #[test]
    fn test_indefinite_layout() {
        let value = json!([1, {"a": null}]);
        let bytes =
            json_to_cbor(&value, &opts(Conformance::Lax), ContainerLayout::Indefinite).unwrap();
        assert_eq!(bytes, vec![0x9F, 0x01, 0xBF, 0x61, 0x61, 0xF6, 0xFF, 0xFF]);
    }

    #[test]
    fn test_numbers() {
        let value = json!([-3, 18446744073709551615u64, 0.5]);
        let bytes = json_to_cbor(&value, &opts(Conformance::Lax), ContainerLayout::Definite).unwrap();
        let mut expected = vec![0x83, 0x22, 0x1B];
        expected.extend_from_slice(&u64::MAX.to_be_bytes());
        expected.push(0xFB);
        expected.extend_from_slice(&0.5f64.to_be_bytes());
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_invalid_json_text() {
        let err = json_str_to_cbor("{", &opts(Conformance::Lax), ContainerLayout::Definite)
            .unwrap_err();
        assert!(matches!(err, CborError::Json(_)));
    }
}

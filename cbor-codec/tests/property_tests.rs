//! Property-based tests for canonical map encoding

use cbor_codec::{compare_encoded, CborError, CborWriter, Conformance};
use ciborium::Value;
use proptest::prelude::*;
use std::cmp::Ordering;
use std::collections::HashSet;

#[derive(Debug, Clone)]
enum Key {
    Uint(u64),
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
}

impl Key {
    fn write(&self, writer: &mut CborWriter) -> Result<(), CborError> {
        match self {
            Key::Uint(v) => writer.write_u64(*v),
            Key::Int(v) => writer.write_i64(*v),
            Key::Text(s) => writer.write_text(s),
            Key::Bytes(b) => writer.write_bytes(b),
        }
    }

    fn encoded(&self) -> Vec<u8> {
        let mut writer = CborWriter::default();
        self.write(&mut writer).unwrap();
        writer.encode().unwrap()
    }

    fn to_value(&self) -> Value {
        match self {
            Key::Uint(v) => Value::Integer((*v).into()),
            Key::Int(v) => Value::Integer((*v).into()),
            Key::Text(s) => Value::Text(s.clone()),
            Key::Bytes(b) => Value::Bytes(b.clone()),
        }
    }
}

fn key_strategy() -> impl Strategy<Value = Key> {
    prop_oneof![
        any::<u64>().prop_map(Key::Uint),
        (0u64..300).prop_map(Key::Uint),
        any::<i64>().prop_map(Key::Int),
        "[a-z]{0,12}".prop_map(Key::Text),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(Key::Bytes),
    ]
}

/// Keys with pairwise distinct encodings, plus a shuffled copy
fn distinct_keys() -> impl Strategy<Value = (Vec<Key>, Vec<Key>)> {
    prop::collection::vec(key_strategy(), 0..24)
        .prop_map(|keys| {
            let mut seen = HashSet::new();
            keys.into_iter()
                .filter(|key| seen.insert(key.encoded()))
                .collect::<Vec<_>>()
        })
        .prop_flat_map(|keys| (Just(keys.clone()), Just(keys).prop_shuffle()))
}

fn encode_map(conformance: Conformance, keys: &[Key]) -> Result<Vec<u8>, CborError> {
    let mut writer = CborWriter::with_conformance(conformance);
    writer.start_map(keys.len() as i64)?;
    for (index, key) in keys.iter().enumerate() {
        key.write(&mut writer)?;
        writer.write_u64(index as u64 % 7)?;
    }
    writer.end_map()?;
    writer.encode()
}

fn decoded_keys(bytes: &[u8]) -> Vec<Vec<u8>> {
    let value: Value = ciborium::de::from_reader(bytes).expect("decode");
    match value {
        Value::Map(entries) => entries
            .iter()
            .map(|(key, _)| {
                let mut encoded = Vec::new();
                ciborium::ser::into_writer(key, &mut encoded).expect("re-encode key");
                encoded
            })
            .collect(),
        other => panic!("expected map, got {:?}", other),
    }
}

fn major_type(encoded: &[u8]) -> u8 {
    encoded[0] >> 5
}

proptest! {
    #[test]
    fn canonical_keys_ascend_by_length_then_bytes((keys, _) in distinct_keys()) {
        let bytes = encode_map(Conformance::Canonical, &keys).unwrap();
        let emitted = decoded_keys(&bytes);
        prop_assert_eq!(emitted.len(), keys.len());
        for pair in emitted.windows(2) {
            let ordered = (pair[0].len(), &pair[0]) < (pair[1].len(), &pair[1]);
            prop_assert!(ordered, "{:02x?} before {:02x?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn ctap2_keys_ascend_by_major_length_bytes((keys, _) in distinct_keys()) {
        let bytes = encode_map(Conformance::Ctap2Canonical, &keys).unwrap();
        let emitted = decoded_keys(&bytes);
        for pair in emitted.windows(2) {
            let left = (major_type(&pair[0]), pair[0].len(), &pair[0]);
            let right = (major_type(&pair[1]), pair[1].len(), &pair[1]);
            prop_assert!(left < right, "{:02x?} before {:02x?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn canonical_output_independent_of_write_order((keys, shuffled) in distinct_keys()) {
        for conformance in [Conformance::Canonical, Conformance::Ctap2Canonical] {
            // values follow the keys so both maps hold identical entries
            let original: Vec<(Key, u64)> = keys.iter().cloned().zip(0u64..).collect();
            let mut permuted = original.clone();
            let positions: Vec<usize> = shuffled
                .iter()
                .map(|key| keys.iter().position(|k| k.encoded() == key.encoded()).unwrap())
                .collect();
            for (slot, position) in positions.iter().enumerate() {
                permuted[slot] = original[*position].clone();
            }

            let encode = |entries: &[(Key, u64)]| -> Vec<u8> {
                let mut writer = CborWriter::with_conformance(conformance);
                writer.start_map(entries.len() as i64).unwrap();
                for (key, value) in entries {
                    key.write(&mut writer).unwrap();
                    writer.write_u64(*value).unwrap();
                }
                writer.end_map().unwrap();
                writer.encode().unwrap()
            };

            prop_assert_eq!(encode(&original), encode(&permuted));
        }
    }

    #[test]
    fn round_trip_preserves_entry_set((keys, shuffled) in distinct_keys()) {
        for conformance in [Conformance::Canonical, Conformance::Ctap2Canonical] {
            let bytes = encode_map(conformance, &shuffled).unwrap();
            let value: Value = ciborium::de::from_reader(bytes.as_slice()).unwrap();
            let Value::Map(entries) = value else {
                panic!("expected map");
            };
            prop_assert_eq!(entries.len(), keys.len());
            for key in &keys {
                let expected = key.to_value();
                prop_assert!(entries.iter().any(|(k, _)| *k == expected));
            }
        }
    }

    #[test]
    fn repeated_key_rejected_under_canonical_modes(
        (keys, _) in distinct_keys(),
        pick in any::<prop::sample::Index>(),
    ) {
        prop_assume!(!keys.is_empty());
        let mut with_duplicate = keys.clone();
        with_duplicate.push(keys[pick.index(keys.len())].clone());

        for conformance in [Conformance::Canonical, Conformance::Ctap2Canonical] {
            let result = encode_map(conformance, &with_duplicate);
            prop_assert!(matches!(result, Err(CborError::DuplicateKey)));
        }

        // lax accepts it and keeps the order written
        let bytes = encode_map(Conformance::Lax, &with_duplicate).unwrap();
        let emitted = decoded_keys(&bytes);
        let written: Vec<Vec<u8>> = with_duplicate.iter().map(Key::encoded).collect();
        prop_assert_eq!(emitted, written);
    }

    #[test]
    fn comparator_is_antisymmetric(
        left in prop::collection::vec(any::<u8>(), 1..12),
        right in prop::collection::vec(any::<u8>(), 1..12),
    ) {
        for conformance in [Conformance::Canonical, Conformance::Ctap2Canonical] {
            let forward = compare_encoded(&left, &right, conformance);
            let backward = compare_encoded(&right, &left, conformance);
            prop_assert_eq!(forward, backward.reverse());
            prop_assert_eq!(forward == Ordering::Equal, left == right);
        }
    }
}

#![no_main]

use cbor_codec::{CborError, CborWriter};
use cbor_format::Conformance;
use libfuzzer_sys::arbitrary::{self, Arbitrary};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Op {
    Uint(u64),
    Int(i64),
    Text(String),
    Bytes(Vec<u8>),
    Null,
    Tag(u64),
    StartMap(i8),
    StartMapIndefinite,
    EndMap,
    StartArray(i8),
    EndArray,
}

#[derive(Arbitrary, Debug)]
struct Input {
    ctap2: bool,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let conformance = if input.ctap2 {
        Conformance::Ctap2Canonical
    } else {
        Conformance::Canonical
    };
    let mut writer = CborWriter::with_conformance(conformance);

    for op in input.ops {
        let result = match op {
            Op::Uint(v) => writer.write_u64(v),
            Op::Int(v) => writer.write_i64(v),
            Op::Text(s) => writer.write_text(&s),
            Op::Bytes(b) => writer.write_bytes(&b),
            Op::Null => writer.write_null(),
            Op::Tag(t) => writer.write_tag(t),
            Op::StartMap(n) => writer.start_map(n as i64),
            Op::StartMapIndefinite => writer.start_map_indefinite(),
            Op::EndMap => writer.end_map(),
            Op::StartArray(n) => writer.start_array(n as i64),
            Op::EndArray => writer.end_array(),
        };

        // Random call sequences hit usage errors; internal faults must never appear
        if let Err(err) = result {
            assert!(!matches!(err, CborError::Internal(_)), "{:?}", err);
            if matches!(err, CborError::DuplicateKey) {
                return;
            }
        }
    }
});

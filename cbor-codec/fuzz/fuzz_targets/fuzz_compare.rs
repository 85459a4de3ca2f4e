#![no_main]

use cbor_codec::compare_encoded;
use cbor_format::Conformance;
use libfuzzer_sys::fuzz_target;
use std::cmp::Ordering;

fuzz_target!(|input: (Vec<u8>, Vec<u8>)| {
    let (left, right) = input;
    if left.is_empty() || right.is_empty() {
        return;
    }

    for conformance in [Conformance::Canonical, Conformance::Ctap2Canonical] {
        let forward = compare_encoded(&left, &right, conformance);
        let backward = compare_encoded(&right, &left, conformance);
        assert_eq!(forward, backward.reverse());
        assert_eq!(forward == Ordering::Equal, left == right);
    }
});

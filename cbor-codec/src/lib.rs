//! CBOR Codec - Streaming writer engine
//!
//! This crate provides the encoding engine of cborw:
//!
//! - A growable output buffer with head writers
//! - A container nesting tracker
//! - Map conformance tracking with close-time canonical reordering
//! - The canonical key comparator
//! - A JSON bridge for encoding `serde_json` values

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod buffer;
pub mod compare;
pub mod json;
pub mod map;
pub mod nesting;
pub mod writer;

// Re-export commonly used types
pub use cbor_format::{CborError, Conformance, Limits, MajorType, Result};

// Re-export our own types
pub use buffer::EncodeBuffer;
pub use compare::{compare_encoded, compare_ranges};
pub use json::{json_str_to_cbor, json_to_cbor, write_json_value, ContainerLayout};
pub use map::{KeyOrder, KeyValueRange, MapFrameState};
pub use writer::CborWriter;

/// Writer configuration
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Key ordering and uniqueness rules for maps
    pub conformance: Conformance,
    /// Accept more than one top-level value (a CBOR sequence)
    pub allow_multiple_root_values: bool,
    /// Initial buffer capacity in bytes
    pub initial_capacity: usize,
    /// Size and depth limits
    pub limits: Limits,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            conformance: Conformance::Lax,
            allow_multiple_root_values: false,
            initial_capacity: 256,
            limits: Limits::default(),
        }
    }
}

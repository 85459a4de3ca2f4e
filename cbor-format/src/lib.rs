//! CBOR Format - Core primitives for the cborw writer
//!
//! This crate provides the wire-level building blocks of the CBOR encoding
//! with no I/O dependencies. It includes:
//!
//! - Major type and simple value constants
//! - Head encoding (initial byte + shortest argument)
//! - Error types
//! - Writer limits
//! - Conformance modes

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod constants;
pub mod error;
pub mod header;
pub mod limits;
pub mod types;

// Re-export commonly used types
pub use error::{CborError, Result};
pub use header::{decode_head, encode_head, head_len, indefinite_head, initial_byte, Head};
pub use limits::Limits;
pub use types::MajorType;

/// Conformance modes a writer can enforce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conformance {
    /// No key ordering or uniqueness checks
    #[default]
    Lax,
    /// RFC 7049 canonical: keys ordered by encoded length, then bytewise; no duplicates
    Canonical,
    /// CTAP2 canonical: keys ordered by major type, then length, then bytewise; no duplicates
    Ctap2Canonical,
}

impl Conformance {
    /// Whether map keys must be emitted in a deterministic order
    pub fn requires_key_ordering(&self) -> bool {
        matches!(self, Conformance::Canonical | Conformance::Ctap2Canonical)
    }

    /// Whether duplicate map keys are rejected
    pub fn requires_unique_keys(&self) -> bool {
        self.requires_key_ordering()
    }

    /// Short name used in logs and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Conformance::Lax => "lax",
            Conformance::Canonical => "canonical",
            Conformance::Ctap2Canonical => "ctap2",
        }
    }
}

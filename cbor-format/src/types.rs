//! Major type enumeration

use crate::constants::{
    MAJOR_ARRAY, MAJOR_BYTES, MAJOR_MAP, MAJOR_NEGATIVE, MAJOR_SIMPLE, MAJOR_TAG, MAJOR_TEXT,
    MAJOR_TYPE_SHIFT, MAJOR_UNSIGNED,
};

/// CBOR major types (3-bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum MajorType {
    /// Unsigned integer
    UnsignedInteger = MAJOR_UNSIGNED,
    /// Negative integer
    NegativeInteger = MAJOR_NEGATIVE,
    /// Byte string
    ByteString = MAJOR_BYTES,
    /// UTF-8 text string
    TextString = MAJOR_TEXT,
    /// Array of data items
    Array = MAJOR_ARRAY,
    /// Map of key/value pairs
    Map = MAJOR_MAP,
    /// Semantic tag
    Tag = MAJOR_TAG,
    /// Simple values and floating point numbers
    Simple = MAJOR_SIMPLE,
}

impl MajorType {
    /// Convert from the 3-bit code
    pub fn from_u8(val: u8) -> Result<Self, crate::error::CborError> {
        match val {
            MAJOR_UNSIGNED => Ok(MajorType::UnsignedInteger),
            MAJOR_NEGATIVE => Ok(MajorType::NegativeInteger),
            MAJOR_BYTES => Ok(MajorType::ByteString),
            MAJOR_TEXT => Ok(MajorType::TextString),
            MAJOR_ARRAY => Ok(MajorType::Array),
            MAJOR_MAP => Ok(MajorType::Map),
            MAJOR_TAG => Ok(MajorType::Tag),
            MAJOR_SIMPLE => Ok(MajorType::Simple),
            _ => Err(crate::error::CborError::InvalidArgument(format!(
                "Unknown major type: {}",
                val
            ))),
        }
    }

    /// Major type carried by an initial byte.
    ///
    /// Every byte maps to a major type, so this never fails.
    pub fn of_initial_byte(byte: u8) -> Self {
        match Self::from_u8(byte >> MAJOR_TYPE_SHIFT) {
            Ok(major) => major,
            // a shifted byte is at most 7
            Err(_) => MajorType::Simple,
        }
    }

    /// The 3-bit code of this major type.
    pub fn code(self) -> u8 {
        self as u8
    }
}

//! Constants for the CBOR wire format (RFC 8949)

/// Major type 0: unsigned integer.
pub const MAJOR_UNSIGNED: u8 = 0;
/// Major type 1: negative integer.
pub const MAJOR_NEGATIVE: u8 = 1;
/// Major type 2: byte string.
pub const MAJOR_BYTES: u8 = 2;
/// Major type 3: UTF-8 text string.
pub const MAJOR_TEXT: u8 = 3;
/// Major type 4: array.
pub const MAJOR_ARRAY: u8 = 4;
/// Major type 5: map.
pub const MAJOR_MAP: u8 = 5;
/// Major type 6: tagged item.
pub const MAJOR_TAG: u8 = 6;
/// Major type 7: simple values and floats.
pub const MAJOR_SIMPLE: u8 = 7;

/// Number of bits the major type is shifted by in the initial byte.
pub const MAJOR_TYPE_SHIFT: u8 = 5;
/// Mask selecting the additional-information bits of the initial byte.
pub const ADDITIONAL_INFO_MASK: u8 = 0x1F;

/// Largest argument stored directly in the initial byte.
pub const MAX_INLINE_ARGUMENT: u8 = 23;
/// Additional info: one-byte argument follows.
pub const ADDITIONAL_INFO_8BIT: u8 = 24;
/// Additional info: two-byte argument follows.
pub const ADDITIONAL_INFO_16BIT: u8 = 25;
/// Additional info: four-byte argument follows.
pub const ADDITIONAL_INFO_32BIT: u8 = 26;
/// Additional info: eight-byte argument follows.
pub const ADDITIONAL_INFO_64BIT: u8 = 27;
/// Additional info: indefinite length.
pub const ADDITIONAL_INFO_INDEFINITE: u8 = 31;

/// Terminator of an indefinite-length item.
pub const BREAK_BYTE: u8 = 0xFF;

/// Simple value `false`.
pub const SIMPLE_FALSE: u8 = 20;
/// Simple value `true`.
pub const SIMPLE_TRUE: u8 = 21;
/// Simple value `null`.
pub const SIMPLE_NULL: u8 = 22;
/// Simple value `undefined`.
pub const SIMPLE_UNDEFINED: u8 = 23;
/// First simple value that needs a trailing byte.
pub const SIMPLE_EXTENDED_MIN: u8 = 32;

/// Maximum encoded head size: initial byte plus eight argument bytes.
pub const MAX_HEAD_LEN: usize = 9;

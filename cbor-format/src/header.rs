//! Data item heads: the initial byte plus its argument bytes

use crate::constants::{
    ADDITIONAL_INFO_16BIT, ADDITIONAL_INFO_32BIT, ADDITIONAL_INFO_64BIT, ADDITIONAL_INFO_8BIT,
    ADDITIONAL_INFO_INDEFINITE, ADDITIONAL_INFO_MASK, MAJOR_TYPE_SHIFT, MAX_HEAD_LEN,
    MAX_INLINE_ARGUMENT,
};
use crate::error::{CborError, Result as CborResult};
use crate::types::MajorType;
use smallvec::SmallVec;

/// Encoded head, never longer than nine bytes.
pub type Head = SmallVec<[u8; MAX_HEAD_LEN]>;

/// Compose an initial byte from a major type and 5-bit additional info.
pub fn initial_byte(major: MajorType, additional_info: u8) -> u8 {
    debug_assert!(additional_info <= ADDITIONAL_INFO_MASK);
    (major.code() << MAJOR_TYPE_SHIFT) | (additional_info & ADDITIONAL_INFO_MASK)
}

/// Number of bytes the shortest head carrying `value` occupies.
pub fn head_len(value: u64) -> usize {
    if value <= MAX_INLINE_ARGUMENT as u64 {
        1
    } else if value <= u8::MAX as u64 {
        2
    } else if value <= u16::MAX as u64 {
        3
    } else if value <= u32::MAX as u64 {
        5
    } else {
        9
    }
}

/// Encode the shortest head for `major` with argument `value`.
pub fn encode_head(major: MajorType, value: u64) -> Head {
    let mut head = Head::new();

    if value <= MAX_INLINE_ARGUMENT as u64 {
        head.push(initial_byte(major, value as u8));
    } else if value <= u8::MAX as u64 {
        head.push(initial_byte(major, ADDITIONAL_INFO_8BIT));
        head.push(value as u8);
    } else if value <= u16::MAX as u64 {
        head.push(initial_byte(major, ADDITIONAL_INFO_16BIT));
        head.extend_from_slice(&(value as u16).to_be_bytes());
    } else if value <= u32::MAX as u64 {
        head.push(initial_byte(major, ADDITIONAL_INFO_32BIT));
        head.extend_from_slice(&(value as u32).to_be_bytes());
    } else {
        head.push(initial_byte(major, ADDITIONAL_INFO_64BIT));
        head.extend_from_slice(&value.to_be_bytes());
    }

    head
}

/// Initial byte announcing an indefinite-length item of `major`.
pub fn indefinite_head(major: MajorType) -> u8 {
    initial_byte(major, ADDITIONAL_INFO_INDEFINITE)
}

/// Decode a head from the front of `bytes`.
///
/// Returns the major type, the argument (`None` for indefinite length) and the
/// number of bytes consumed. Floats and simple values are returned with their
/// raw argument bits.
pub fn decode_head(bytes: &[u8]) -> CborResult<(MajorType, Option<u64>, usize)> {
    let first = *bytes
        .first()
        .ok_or_else(|| CborError::InvalidArgument("empty input".to_string()))?;
    let major = MajorType::of_initial_byte(first);
    let info = first & ADDITIONAL_INFO_MASK;

    let width = match info {
        0..=MAX_INLINE_ARGUMENT => return Ok((major, Some(info as u64), 1)),
        ADDITIONAL_INFO_8BIT => 1,
        ADDITIONAL_INFO_16BIT => 2,
        ADDITIONAL_INFO_32BIT => 4,
        ADDITIONAL_INFO_64BIT => 8,
        ADDITIONAL_INFO_INDEFINITE => return Ok((major, None, 1)),
        reserved => {
            return Err(CborError::InvalidArgument(format!(
                "reserved additional info {}",
                reserved
            )))
        }
    };

    let arg = bytes
        .get(1..1 + width)
        .ok_or_else(|| CborError::InvalidArgument("truncated head".to_string()))?;
    let value = arg.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64);
    Ok((major, Some(value), 1 + width))
}

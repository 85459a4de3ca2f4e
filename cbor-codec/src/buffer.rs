//! Growable output buffer and primitive head writers

use bytes::BytesMut;
use cbor_format::{encode_head, initial_byte, CborError, MajorType, Result};

/// Growable buffer the writer encodes into.
///
/// Positions handed out by [`EncodeBuffer::offset`] stay valid until the buffer
/// is reset; map ranges are recorded against them.
#[derive(Debug)]
pub struct EncodeBuffer {
    bytes: BytesMut,
    max_len: usize,
}

impl EncodeBuffer {
    /// Create a buffer with an initial capacity and a hard size cap
    pub fn new(initial_capacity: usize, max_len: usize) -> Self {
        Self {
            bytes: BytesMut::with_capacity(initial_capacity.min(max_len)),
            max_len,
        }
    }

    /// Current write offset
    pub fn offset(&self) -> usize {
        self.bytes.len()
    }

    /// Encoded bytes written so far
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable view used by the map rewrite pass
    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Make room for `additional` bytes, failing if the size cap would be exceeded
    pub fn ensure_capacity(&mut self, additional: usize) -> Result<()> {
        let required = self
            .bytes
            .len()
            .checked_add(additional)
            .ok_or_else(|| CborError::LimitExceeded("buffer length overflow".to_string()))?;
        if required > self.max_len {
            return Err(CborError::LimitExceeded(format!(
                "encoded size {} exceeds maximum {}",
                required, self.max_len
            )));
        }
        self.bytes.reserve(additional);
        Ok(())
    }

    /// Append an initial byte built from `major` and `additional_info`
    pub fn write_initial_byte(&mut self, major: MajorType, additional_info: u8) -> Result<()> {
        self.ensure_capacity(1)?;
        self.bytes.extend_from_slice(&[initial_byte(major, additional_info)]);
        Ok(())
    }

    /// Append the shortest head for `major` carrying `value`
    pub fn write_unsigned_integer(&mut self, major: MajorType, value: u64) -> Result<()> {
        let head = encode_head(major, value);
        self.ensure_capacity(head.len())?;
        self.bytes.extend_from_slice(&head);
        Ok(())
    }

    /// Append raw bytes
    pub fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_capacity(data.len())?;
        self.bytes.extend_from_slice(data);
        Ok(())
    }

    /// Drop everything written, keeping the allocation
    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Copy the encoded bytes out
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }
}

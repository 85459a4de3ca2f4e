//! Streaming CBOR writer
//!
//! Items are appended in call order. Every completed item is reported to the
//! innermost container; map frames use that to record key and value ranges, so
//! maps written under a canonical [`Conformance`] are reordered when they close.

use crate::buffer::EncodeBuffer;
use crate::map::MapFrameState;
use crate::nesting::{FrameKind, NestingStack};
use crate::WriterOptions;
use cbor_format::constants::{
    ADDITIONAL_INFO_32BIT, ADDITIONAL_INFO_64BIT, ADDITIONAL_INFO_8BIT, BREAK_BYTE,
    MAX_INLINE_ARGUMENT, SIMPLE_EXTENDED_MIN, SIMPLE_FALSE, SIMPLE_NULL, SIMPLE_TRUE,
    SIMPLE_UNDEFINED,
};
use cbor_format::{head_len, indefinite_head, CborError, Conformance, MajorType, Result};
use std::io::Write;
use tracing::debug;

/// Writer producing a single CBOR document (or a sequence, if allowed)
#[derive(Debug)]
pub struct CborWriter {
    opts: WriterOptions,
    buffer: EncodeBuffer,
    stack: NestingStack,
    /// Reused by the map rewrite pass; always empty between calls
    scratch: Vec<u8>,
}

impl Default for CborWriter {
    fn default() -> Self {
        Self::new(WriterOptions::default())
    }
}

impl CborWriter {
    /// Create a writer with the given options
    pub fn new(opts: WriterOptions) -> Self {
        let buffer = EncodeBuffer::new(opts.initial_capacity, opts.limits.max_buffer_len);
        let stack = NestingStack::new(
            opts.limits.max_nesting_depth,
            opts.allow_multiple_root_values,
        );
        Self {
            opts,
            buffer,
            stack,
            scratch: Vec::new(),
        }
    }

    /// Create a writer enforcing `conformance` with otherwise default options
    pub fn with_conformance(conformance: Conformance) -> Self {
        Self::new(WriterOptions {
            conformance,
            ..WriterOptions::default()
        })
    }

    /// Active conformance mode
    pub fn conformance(&self) -> Conformance {
        self.opts.conformance
    }

    /// Options this writer was built with
    pub fn options(&self) -> &WriterOptions {
        &self.opts
    }

    /// Number of bytes written so far
    pub fn bytes_written(&self) -> usize {
        self.buffer.offset()
    }

    /// Number of open containers
    pub fn depth(&self) -> usize {
        self.stack.depth()
    }

    /// True once a complete root value has been written and no container is open
    pub fn is_write_completed(&self) -> bool {
        self.stack.is_complete()
    }

    /// Bytes written so far, complete or not
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Return the finished encoding
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.check_completed()?;
        Ok(self.buffer.to_vec())
    }

    /// Write the finished encoding to `sink`
    pub fn encode_to<W: Write>(&self, sink: &mut W) -> Result<()> {
        self.check_completed()?;
        sink.write_all(self.buffer.as_slice())?;
        Ok(())
    }

    /// Discard everything written and all open containers.
    ///
    /// This is the only way to recover after an error such as
    /// [`CborError::DuplicateKey`] or [`CborError::UnbalancedMap`].
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.stack.reset();
        self.scratch.clear();
    }

    fn check_completed(&self) -> Result<()> {
        if !self.is_write_completed() {
            return Err(CborError::InvalidOperation(
                "document is incomplete".to_string(),
            ));
        }
        Ok(())
    }

    // Scalars

    /// Write an unsigned integer
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.stack.check_can_write(MajorType::UnsignedInteger)?;
        self.buffer
            .write_unsigned_integer(MajorType::UnsignedInteger, value)?;
        self.complete_item()
    }

    /// Write a signed integer using major type 0 or 1
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        if value >= 0 {
            self.write_u64(value as u64)
        } else {
            // -1 - value, which is the bitwise complement
            self.write_negative(!value as u64)
        }
    }

    /// Write the negative integer `-1 - raw`
    pub fn write_negative(&mut self, raw: u64) -> Result<()> {
        self.stack.check_can_write(MajorType::NegativeInteger)?;
        self.buffer
            .write_unsigned_integer(MajorType::NegativeInteger, raw)?;
        self.complete_item()
    }

    /// Write a definite-length byte string
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.stack.check_can_write(MajorType::ByteString)?;
        self.buffer
            .ensure_capacity(head_len(data.len() as u64) + data.len())?;
        self.buffer
            .write_unsigned_integer(MajorType::ByteString, data.len() as u64)?;
        self.buffer.write_raw(data)?;
        self.complete_item()
    }

    /// Write a definite-length text string
    pub fn write_text(&mut self, text: &str) -> Result<()> {
        self.stack.check_can_write(MajorType::TextString)?;
        self.buffer
            .ensure_capacity(head_len(text.len() as u64) + text.len())?;
        self.buffer
            .write_unsigned_integer(MajorType::TextString, text.len() as u64)?;
        self.buffer.write_raw(text.as_bytes())?;
        self.complete_item()
    }

    /// Write `true` or `false`
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_simple_byte(if value { SIMPLE_TRUE } else { SIMPLE_FALSE })
    }

    /// Write `null`
    pub fn write_null(&mut self) -> Result<()> {
        self.write_simple_byte(SIMPLE_NULL)
    }

    /// Write `undefined`
    pub fn write_undefined(&mut self) -> Result<()> {
        self.write_simple_byte(SIMPLE_UNDEFINED)
    }

    /// Write a simple value. Values 24 to 31 are reserved and rejected.
    pub fn write_simple(&mut self, value: u8) -> Result<()> {
        if value <= MAX_INLINE_ARGUMENT {
            return self.write_simple_byte(value);
        }
        if value < SIMPLE_EXTENDED_MIN {
            return Err(CborError::InvalidArgument(format!(
                "simple value {} is reserved",
                value
            )));
        }
        self.write_simple_with_payload(ADDITIONAL_INFO_8BIT, &[value])
    }

    fn write_simple_byte(&mut self, value: u8) -> Result<()> {
        self.stack.check_can_write(MajorType::Simple)?;
        self.buffer.write_initial_byte(MajorType::Simple, value)?;
        self.complete_item()
    }

    /// Major type 7 item with a trailing payload; all or nothing is written
    fn write_simple_with_payload(&mut self, additional_info: u8, payload: &[u8]) -> Result<()> {
        self.stack.check_can_write(MajorType::Simple)?;
        self.buffer.ensure_capacity(1 + payload.len())?;
        self.buffer
            .write_initial_byte(MajorType::Simple, additional_info)?;
        self.buffer.write_raw(payload)?;
        self.complete_item()
    }

    /// Write a single-precision float
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write_simple_with_payload(ADDITIONAL_INFO_32BIT, &value.to_be_bytes())
    }

    /// Write a double-precision float
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_simple_with_payload(ADDITIONAL_INFO_64BIT, &value.to_be_bytes())
    }

    /// Write a semantic tag. The next item written is its content.
    pub fn write_tag(&mut self, tag: u64) -> Result<()> {
        self.stack.check_can_write(MajorType::Tag)?;
        self.buffer.write_unsigned_integer(MajorType::Tag, tag)?;
        self.stack.current_mut().tag_pending = true;
        Ok(())
    }

    // Arrays

    /// Start an array of `len` items
    pub fn start_array(&mut self, len: i64) -> Result<()> {
        let len = non_negative_length(len)?;
        self.open_check(MajorType::Array)?;
        self.buffer.write_unsigned_integer(MajorType::Array, len)?;
        self.stack.push_frame(FrameKind::Array, Some(len), None)
    }

    /// Start an array terminated by [`CborWriter::end_array`]
    pub fn start_array_indefinite(&mut self) -> Result<()> {
        self.open_check(MajorType::Array)?;
        self.buffer.write_raw(&[indefinite_head(MajorType::Array)])?;
        self.stack.push_frame(FrameKind::Array, None, None)
    }

    /// Close the current array
    pub fn end_array(&mut self) -> Result<()> {
        self.end_container(FrameKind::Array)
    }

    // Maps

    /// Start a map of `len` key/value pairs.
    ///
    /// Fails with [`CborError::InvalidArgument`] for a negative length, before
    /// anything is written.
    pub fn start_map(&mut self, len: i64) -> Result<()> {
        let len = non_negative_length(len)?;
        // len <= i64::MAX, so doubling fits in u64
        let slots = len * 2;
        self.open_check(MajorType::Map)?;
        self.buffer.write_unsigned_integer(MajorType::Map, len)?;
        let state = MapFrameState::new(self.buffer.offset(), self.opts.conformance);
        self.stack
            .push_frame(FrameKind::Map, Some(slots), Some(state))
    }

    /// Start a map terminated by [`CborWriter::end_map`]
    pub fn start_map_indefinite(&mut self) -> Result<()> {
        self.open_check(MajorType::Map)?;
        self.buffer.write_raw(&[indefinite_head(MajorType::Map)])?;
        let state = MapFrameState::new(self.buffer.offset(), self.opts.conformance);
        self.stack.push_frame(FrameKind::Map, None, Some(state))
    }

    /// Close the current map.
    ///
    /// Fails with [`CborError::UnbalancedMap`] if the last key has no value; the
    /// map then stays open. Under a canonical conformance mode the entries are
    /// rewritten in key order before the map is closed.
    pub fn end_map(&mut self) -> Result<()> {
        if let Some(map) = &self.stack.current().map {
            if let Err(err) = map.check_balanced() {
                debug!(frame_offset = map.frame_offset(), "map closed with a dangling key");
                return Err(err);
            }
        }
        self.stack.check_can_pop(FrameKind::Map)?;

        if let Some(map) = &self.stack.current().map {
            map.sort_and_rewrite(&mut self.buffer, &mut self.scratch)?;
        }
        self.end_container(FrameKind::Map)
    }

    // Indefinite-length strings

    /// Start a byte string written as definite-length chunks
    pub fn start_indefinite_bytes(&mut self) -> Result<()> {
        self.open_check(MajorType::ByteString)?;
        self.buffer
            .write_raw(&[indefinite_head(MajorType::ByteString)])?;
        self.stack.push_frame(FrameKind::ByteChunks, None, None)
    }

    /// Close the current chunked byte string
    pub fn end_indefinite_bytes(&mut self) -> Result<()> {
        self.end_container(FrameKind::ByteChunks)
    }

    /// Start a text string written as definite-length chunks
    pub fn start_indefinite_text(&mut self) -> Result<()> {
        self.open_check(MajorType::TextString)?;
        self.buffer
            .write_raw(&[indefinite_head(MajorType::TextString)])?;
        self.stack.push_frame(FrameKind::TextChunks, None, None)
    }

    /// Close the current chunked text string
    pub fn end_indefinite_text(&mut self) -> Result<()> {
        self.end_container(FrameKind::TextChunks)
    }

    /// Checks run before a container head is written
    fn open_check(&self, major: MajorType) -> Result<()> {
        self.stack.check_can_write(major)?;
        self.stack.check_depth()
    }

    fn end_container(&mut self, kind: FrameKind) -> Result<()> {
        let frame = self.stack.pop_frame(kind)?;
        if frame.is_indefinite() {
            self.buffer.write_raw(&[BREAK_BYTE])?;
        }
        self.complete_item()
    }

    /// Report a completed item to the innermost container
    fn complete_item(&mut self) -> Result<()> {
        let offset = self.buffer.offset();
        let frame = self.stack.current_mut();
        if let Some(map) = frame.map.as_mut() {
            map.on_item_encoded(self.buffer.as_slice(), offset)?;
        }
        frame.record_item();
        Ok(())
    }
}

fn non_negative_length(len: i64) -> Result<u64> {
    u64::try_from(len)
        .map_err(|_| CborError::InvalidArgument(format!("negative container length {}", len)))
}

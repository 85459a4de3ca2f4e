//! Map conformance tracking
//!
//! Each open map keeps the byte range of every key and key+value pair it has
//! received. Under a canonical profile the ranges are kept sorted by key, which
//! makes duplicate detection a lookup and lets [`MapFrameState::sort_and_rewrite`]
//! permute the already-written entries into canonical order when the map closes.
//! Keys and values are never decoded or re-encoded; only bytes move.

use crate::buffer::EncodeBuffer;
use crate::compare::compare_ranges;
use cbor_format::{CborError, Conformance, Result};
use tracing::{debug, trace};

/// Location of one map entry inside the output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyValueRange {
    /// Offset of the first key byte
    pub offset: usize,
    /// Length of the key encoding
    pub key_len: usize,
    /// Length of the key and value encodings together
    pub total_len: usize,
}

impl KeyValueRange {
    /// Create a range handle
    pub fn new(offset: usize, key_len: usize, total_len: usize) -> Self {
        debug_assert!(key_len > 0 && key_len < total_len);
        Self {
            offset,
            key_len,
            total_len,
        }
    }

    /// Range of a key whose value has not been written yet
    pub fn pending(offset: usize, key_len: usize) -> Self {
        debug_assert!(key_len > 0);
        Self {
            offset,
            key_len,
            total_len: key_len,
        }
    }

    /// Key bytes of this entry
    pub fn key<'a>(&self, buffer: &'a [u8]) -> &'a [u8] {
        &buffer[self.offset..self.offset + self.key_len]
    }

    /// Key and value bytes of this entry
    pub fn entry<'a>(&self, buffer: &'a [u8]) -> &'a [u8] {
        &buffer[self.offset..self.end()]
    }

    /// Offset one past the last value byte
    pub fn end(&self) -> usize {
        self.offset + self.total_len
    }
}

/// Sorted key ranges of a map written under an ordering profile.
#[derive(Debug)]
pub struct KeyOrder {
    conformance: Conformance,
    ranges: Vec<KeyValueRange>,
}

impl KeyOrder {
    /// Key-order state for `conformance`, or `None` when the mode imposes no order
    pub fn for_conformance(conformance: Conformance) -> Option<Self> {
        conformance.requires_key_ordering().then(|| Self {
            conformance,
            ranges: Vec::new(),
        })
    }

    /// Accepted entries in ascending key order
    pub fn ranges(&self) -> &[KeyValueRange] {
        &self.ranges
    }

    fn search(
        &self,
        buffer: &[u8],
        candidate: &KeyValueRange,
    ) -> std::result::Result<usize, usize> {
        self.ranges.binary_search_by(|accepted| {
            compare_ranges(buffer, accepted, candidate, self.conformance)
        })
    }
}

/// Per-map bookkeeping for an open map frame.
#[derive(Debug)]
pub struct MapFrameState {
    frame_offset: usize,
    current_key_offset: usize,
    current_value_offset: Option<usize>,
    key_order: Option<KeyOrder>,
}

impl MapFrameState {
    /// State for a map whose first key starts at `frame_offset`
    pub fn new(frame_offset: usize, conformance: Conformance) -> Self {
        Self {
            frame_offset,
            current_key_offset: frame_offset,
            current_value_offset: None,
            key_order: KeyOrder::for_conformance(conformance),
        }
    }

    /// Offset where the map payload begins
    pub fn frame_offset(&self) -> usize {
        self.frame_offset
    }

    /// True after a key has been written and before its value completes
    pub fn is_awaiting_value(&self) -> bool {
        self.current_value_offset.is_some()
    }

    /// Key-order state, present only under ordering profiles
    pub fn key_order(&self) -> Option<&KeyOrder> {
        self.key_order.as_ref()
    }

    /// Route a completed child item to the key or value hook.
    pub fn on_item_encoded(&mut self, buffer: &[u8], offset: usize) -> Result<()> {
        if self.is_awaiting_value() {
            self.on_value_encoded(buffer, offset)
        } else {
            self.on_key_encoded(buffer, offset)
        }
    }

    /// Hook run once a key's encoding ends at `offset`.
    ///
    /// Under an ordering profile a key identical to an accepted one fails with
    /// [`CborError::DuplicateKey`]. The key bytes stay in the buffer and the
    /// writer must be reset before reuse.
    pub fn on_key_encoded(&mut self, buffer: &[u8], offset: usize) -> Result<()> {
        if self.is_awaiting_value() {
            return Err(CborError::Internal(
                "key completed while a value was pending".to_string(),
            ));
        }
        if offset <= self.current_key_offset {
            return Err(CborError::Internal("empty key encoding".to_string()));
        }

        if let Some(order) = &self.key_order {
            let candidate =
                KeyValueRange::pending(self.current_key_offset, offset - self.current_key_offset);
            if order.search(buffer, &candidate).is_ok() {
                debug!(
                    offset = self.current_key_offset,
                    key_len = candidate.key_len,
                    conformance = order.conformance.name(),
                    "duplicate map key"
                );
                return Err(CborError::DuplicateKey);
            }
        }

        self.current_value_offset = Some(offset);
        Ok(())
    }

    /// Hook run once a value's encoding ends at `offset`.
    pub fn on_value_encoded(&mut self, buffer: &[u8], offset: usize) -> Result<()> {
        let value_offset = self.current_value_offset.ok_or_else(|| {
            CborError::Internal("value completed without a pending key".to_string())
        })?;

        if let Some(order) = &mut self.key_order {
            let range = KeyValueRange::new(
                self.current_key_offset,
                value_offset - self.current_key_offset,
                offset - self.current_key_offset,
            );
            match order.search(buffer, &range) {
                Ok(_) => {
                    return Err(CborError::Internal(
                        "key accepted twice in one map".to_string(),
                    ))
                }
                Err(position) => order.ranges.insert(position, range),
            }
        }

        self.current_key_offset = offset;
        self.current_value_offset = None;
        Ok(())
    }

    /// Fail with [`CborError::UnbalancedMap`] if a key is waiting for its value
    pub fn check_balanced(&self) -> Result<()> {
        if self.is_awaiting_value() {
            return Err(CborError::UnbalancedMap);
        }
        Ok(())
    }

    /// Rewrite the map payload so entries appear in ascending key order.
    ///
    /// The payload is `[frame_offset, buffer.offset())`. Entries are gathered
    /// into `scratch` in sorted order and copied back over the payload. No-op
    /// when the map carries no key-order state.
    pub fn sort_and_rewrite(&self, buffer: &mut EncodeBuffer, scratch: &mut Vec<u8>) -> Result<()> {
        let Some(order) = &self.key_order else {
            return Ok(());
        };

        let end = buffer.offset();
        let payload_len = end - self.frame_offset;
        let covered: usize = order.ranges.iter().map(|range| range.total_len).sum();
        if covered != payload_len {
            return Err(CborError::Internal(format!(
                "map entries cover {} of {} payload bytes",
                covered, payload_len
            )));
        }
        if order.ranges.len() < 2 {
            return Ok(());
        }

        let mut scratch = ScratchBuffer::acquire(scratch, payload_len);
        let source = buffer.as_slice();
        for range in &order.ranges {
            scratch.extend_from_slice(range.entry(source));
        }
        buffer.as_mut_slice()[self.frame_offset..end].copy_from_slice(scratch.as_slice());

        trace!(
            frame_offset = self.frame_offset,
            entries = order.ranges.len(),
            payload_len,
            "rewrote map payload in key order"
        );
        Ok(())
    }
}

/// Scoped use of the writer's scratch allocation.
///
/// The contents are zeroed and cleared on drop so encoded entries never linger
/// in the reused allocation.
struct ScratchBuffer<'a> {
    bytes: &'a mut Vec<u8>,
}

impl<'a> ScratchBuffer<'a> {
    fn acquire(bytes: &'a mut Vec<u8>, len: usize) -> Self {
        bytes.clear();
        bytes.reserve(len);
        Self { bytes }
    }

    fn extend_from_slice(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    fn as_slice(&self) -> &[u8] {
        self.bytes.as_slice()
    }
}

impl Drop for ScratchBuffer<'_> {
    fn drop(&mut self) {
        self.bytes.fill(0);
        self.bytes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Write `bytes` as one completed item and notify the map.
    fn push_item(state: &mut MapFrameState, buffer: &mut EncodeBuffer, bytes: &[u8]) -> Result<()> {
        buffer.write_raw(bytes)?;
        let offset = buffer.offset();
        state.on_item_encoded(buffer.as_slice(), offset)
    }

    fn open_map(conformance: Conformance) -> (MapFrameState, EncodeBuffer) {
        let mut buffer = EncodeBuffer::new(64, 1024);
        buffer.write_raw(&[0xA3]).unwrap();
        let state = MapFrameState::new(buffer.offset(), conformance);
        (state, buffer)
    }

    #[test]
    fn test_lax_keeps_no_ranges() {
        let (mut state, mut buffer) = open_map(Conformance::Lax);
        push_item(&mut state, &mut buffer, &[0x02]).unwrap();
        push_item(&mut state, &mut buffer, &[0x61, 0x62]).unwrap();
        assert!(state.key_order().is_none());
        assert!(!state.is_awaiting_value());
    }

    #[test]
    fn test_ranges_sorted_on_insert() {
        let (mut state, mut buffer) = open_map(Conformance::Canonical);
        let items: [&[u8]; 6] = [&[0x03], &[0xF6], &[0x01], &[0xF5], &[0x02], &[0xF4]];
        for item in items {
            push_item(&mut state, &mut buffer, item).unwrap();
        }

        let order = state.key_order().unwrap();
        let keys: Vec<&[u8]> = order
            .ranges()
            .iter()
            .map(|range| range.key(buffer.as_slice()))
            .collect();
        assert_eq!(keys, vec![&[0x01][..], &[0x02], &[0x03]]);
        assert_eq!(order.ranges()[0], KeyValueRange::new(3, 1, 2));
    }

    #[test]
    fn test_duplicate_key_detected_before_value() {
        let (mut state, mut buffer) = open_map(Conformance::Ctap2Canonical);
        push_item(&mut state, &mut buffer, &[0x61, 0x61]).unwrap();
        push_item(&mut state, &mut buffer, &[0x01]).unwrap();

        let err = push_item(&mut state, &mut buffer, &[0x61, 0x61]).unwrap_err();
        assert!(matches!(err, CborError::DuplicateKey));
        // no rollback
        assert_eq!(&buffer.as_slice()[4..], &[0x61, 0x61]);
    }

    #[test]
    fn test_search_compares_ranges_by_key_only() {
        let (mut state, mut buffer) = open_map(Conformance::Canonical);
        // {"b": 1, 1000: h''}, accepted in key order
        push_item(&mut state, &mut buffer, &[0x61, 0x62]).unwrap();
        push_item(&mut state, &mut buffer, &[0x01]).unwrap();
        push_item(&mut state, &mut buffer, &[0x19, 0x03, 0xE8]).unwrap();
        push_item(&mut state, &mut buffer, &[0x40]).unwrap();

        let order = state.key_order().unwrap();
        let accepted = order.ranges().to_vec();
        assert_eq!(accepted[0], KeyValueRange::new(1, 2, 3));
        assert_eq!(accepted[1], KeyValueRange::new(4, 3, 4));

        // a pending key equal to an accepted one resolves to its slot
        assert_eq!(order.search(buffer.as_slice(), &KeyValueRange::pending(1, 2)), Ok(0));
        assert_eq!(order.search(buffer.as_slice(), &KeyValueRange::pending(4, 3)), Ok(1));
        // a shorter key sorts first under canonical rules
        buffer.write_raw(&[0x0A]).unwrap();
        assert_eq!(order.search(buffer.as_slice(), &KeyValueRange::pending(8, 1)), Err(0));
    }

    #[test]
    fn test_unbalanced_detection() {
        let (mut state, mut buffer) = open_map(Conformance::Lax);
        assert!(state.check_balanced().is_ok());
        push_item(&mut state, &mut buffer, &[0x01]).unwrap();
        assert!(matches!(
            state.check_balanced(),
            Err(CborError::UnbalancedMap)
        ));
    }

    #[test]
    fn test_sort_and_rewrite_reorders_payload() {
        let (mut state, mut buffer) = open_map(Conformance::Canonical);
        let items: [&[u8]; 6] = [
            &[0x18, 0x64],
            &[0x61, 0x63],
            &[0x02],
            &[0x61, 0x62],
            &[0x01],
            &[0x61, 0x61],
        ];
        for item in items {
            push_item(&mut state, &mut buffer, item).unwrap();
        }

        let mut scratch = Vec::new();
        state.sort_and_rewrite(&mut buffer, &mut scratch).unwrap();
        assert_eq!(
            buffer.as_slice(),
            &[0xA3, 0x01, 0x61, 0x61, 0x02, 0x61, 0x62, 0x18, 0x64, 0x61, 0x63]
        );
        assert!(scratch.is_empty());
    }

    #[test]
    fn test_sort_and_rewrite_detects_uncovered_bytes() {
        let (mut state, mut buffer) = open_map(Conformance::Canonical);
        push_item(&mut state, &mut buffer, &[0x02]).unwrap();
        push_item(&mut state, &mut buffer, &[0x00]).unwrap();
        // stray byte outside any recorded entry
        buffer.write_raw(&[0x01]).unwrap();

        let mut scratch = Vec::new();
        let err = state.sort_and_rewrite(&mut buffer, &mut scratch).unwrap_err();
        assert!(matches!(err, CborError::Internal(_)));
    }

    #[test]
    fn test_scratch_buffer_zeroed_on_drop() {
        let mut backing = Vec::new();
        {
            let mut scratch = ScratchBuffer::acquire(&mut backing, 4);
            scratch.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
            assert_eq!(scratch.as_slice(), &[0xDE, 0xAD, 0xBE, 0xEF]);
        }
        assert!(backing.is_empty());
        assert!(backing.capacity() >= 4);
    }
}

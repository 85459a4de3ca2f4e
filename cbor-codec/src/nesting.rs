//! Container nesting tracker

use crate::map::MapFrameState;
use cbor_format::{CborError, MajorType, Result};
use tracing::trace;

/// Kind of container a frame represents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Document root
    Root,
    /// Array of items
    Array,
    /// Map of key/value pairs
    Map,
    /// Indefinite-length byte string made of chunks
    ByteChunks,
    /// Indefinite-length text string made of chunks
    TextChunks,
}

impl FrameKind {
    fn describe(self) -> &'static str {
        match self {
            FrameKind::Root => "root",
            FrameKind::Array => "array",
            FrameKind::Map => "map",
            FrameKind::ByteChunks => "indefinite byte string",
            FrameKind::TextChunks => "indefinite text string",
        }
    }

    /// Major type a child item must have, for chunked strings
    fn required_child(self) -> Option<MajorType> {
        match self {
            FrameKind::ByteChunks => Some(MajorType::ByteString),
            FrameKind::TextChunks => Some(MajorType::TextString),
            _ => None,
        }
    }
}

/// One open container
#[derive(Debug)]
pub struct Frame {
    /// Container kind
    pub kind: FrameKind,
    /// Child items still expected; `None` for indefinite length
    pub remaining: Option<u64>,
    /// Child items completed so far
    pub items_written: u64,
    /// A tag head was written and its content has not completed yet
    pub tag_pending: bool,
    /// Map bookkeeping, present for map frames
    pub map: Option<MapFrameState>,
}

impl Frame {
    fn new(kind: FrameKind, remaining: Option<u64>, map: Option<MapFrameState>) -> Self {
        Self {
            kind,
            remaining,
            items_written: 0,
            tag_pending: false,
            map,
        }
    }

    /// Whether the frame is closed by a break byte
    pub fn is_indefinite(&self) -> bool {
        self.remaining.is_none() && self.kind != FrameKind::Root
    }

    /// Count one completed child item
    pub fn record_item(&mut self) {
        self.items_written += 1;
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        self.tag_pending = false;
    }
}

/// Stack of open containers above the document root
#[derive(Debug)]
pub struct NestingStack {
    root: Frame,
    open: Vec<Frame>,
    max_depth: usize,
    allow_multiple_roots: bool,
}

impl NestingStack {
    /// Create a stack holding only the root frame
    pub fn new(max_depth: usize, allow_multiple_roots: bool) -> Self {
        Self {
            root: Frame::new(FrameKind::Root, None, None),
            open: Vec::new(),
            max_depth,
            allow_multiple_roots,
        }
    }

    /// Number of open containers above the root
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Innermost frame
    pub fn current(&self) -> &Frame {
        self.open.last().unwrap_or(&self.root)
    }

    /// Innermost frame, mutably
    pub fn current_mut(&mut self) -> &mut Frame {
        match self.open.last_mut() {
            Some(frame) => frame,
            None => &mut self.root,
        }
    }

    /// Check that an item of `major` may start in the current frame
    pub fn check_can_write(&self, major: MajorType) -> Result<()> {
        let frame = self.current();

        if let Some(required) = frame.kind.required_child() {
            if major != required {
                return Err(CborError::InvalidOperation(format!(
                    "{} accepts only definite-length chunks of the same type",
                    frame.kind.describe()
                )));
            }
        }

        match frame.remaining {
            Some(0) => Err(CborError::InvalidOperation(format!(
                "definite-length {} is already complete",
                frame.kind.describe()
            ))),
            _ if frame.kind == FrameKind::Root
                && frame.items_written > 0
                && !frame.tag_pending
                && !self.allow_multiple_roots =>
            {
                Err(CborError::InvalidOperation(
                    "root value already written".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Check that one more container may be opened
    pub fn check_depth(&self) -> Result<()> {
        if self.depth() >= self.max_depth {
            return Err(CborError::LimitExceeded(format!(
                "nesting depth exceeds maximum {}",
                self.max_depth
            )));
        }
        Ok(())
    }

    /// Open a container expecting `expected` children (`None` for indefinite length)
    pub fn push_frame(
        &mut self,
        kind: FrameKind,
        expected: Option<u64>,
        map: Option<MapFrameState>,
    ) -> Result<()> {
        self.check_depth()?;
        trace!(kind = kind.describe(), ?expected, depth = self.depth() + 1, "push frame");
        self.open.push(Frame::new(kind, expected, map));
        Ok(())
    }

    /// Check that the current frame is a complete container of `kind`
    pub fn check_can_pop(&self, kind: FrameKind) -> Result<()> {
        let frame = self.current();
        if frame.kind == FrameKind::Root {
            return Err(CborError::InvalidOperation(format!(
                "no open {} to end",
                kind.describe()
            )));
        }
        if frame.kind != kind {
            return Err(CborError::InvalidOperation(format!(
                "cannot end {} while {} is open",
                kind.describe(),
                frame.kind.describe()
            )));
        }
        if frame.tag_pending {
            return Err(CborError::InvalidOperation(
                "tag is missing its content".to_string(),
            ));
        }
        if let Some(remaining) = frame.remaining.filter(|&remaining| remaining > 0) {
            return Err(CborError::InvalidOperation(format!(
                "definite-length {} is missing {} items",
                kind.describe(),
                remaining
            )));
        }
        Ok(())
    }

    /// Close the current container of `kind`
    pub fn pop_frame(&mut self, kind: FrameKind) -> Result<Frame> {
        self.check_can_pop(kind)?;
        let frame = self
            .open
            .pop()
            .ok_or_else(|| CborError::Internal("nesting stack underflow".to_string()))?;
        trace!(kind = kind.describe(), depth = self.depth(), "pop frame");
        Ok(frame)
    }

    /// True once the root holds a complete value and nothing is open
    pub fn is_complete(&self) -> bool {
        let root = self.current();
        self.depth() == 0 && root.items_written > 0 && !root.tag_pending
    }

    /// Drop every open frame
    pub fn reset(&mut self) {
        self.open.clear();
        self.root = Frame::new(FrameKind::Root, None, None);
    }
}

//! Host Document
//!
//! The page the enhancer runs inside of. The core never assumes a page
//! structure: it reads the live selection, asks for geometry, and mutates
//! content only through the [`Document`] trait.
//!
//! Selections are captured as [`RangeHandle`]s. A handle is a capability to
//! re-select a span later, not a copy of its content, and it goes stale as
//! soon as any node it covers is mutated or removed. Every dereference goes
//! through [`Document::restore_selection`], which returns `None` for a stale
//! handle.

pub mod memory;

pub use memory::MemoryDocument;

use crate::error::DocumentError;

pub type NodeId = u64;
pub type FieldId = u64;
pub type MarkerId = u64;

/// A point in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A box in viewport (client) coordinates, like `getBoundingClientRect`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Top-center of the box translated into page coordinates
    pub fn anchor(&self, viewport: &Viewport) -> Point {
        Point {
            x: self.left + self.width / 2.0 + viewport.scroll_x,
            y: self.top + viewport.scroll_y,
        }
    }
}

/// Visible area of the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

impl Viewport {
    /// Center of the visible area in page coordinates
    pub fn center(&self) -> Point {
        Point {
            x: self.width / 2.0 + self.scroll_x,
            y: self.height / 2.0 + self.scroll_y,
        }
    }
}

/// One end of a content range. `offset` counts chars inside the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Restorable reference to a selected span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeHandle {
    /// Span of page content. `spans` records every covered node with the
    /// version it had at capture time.
    Content {
        start: Boundary,
        end: Boundary,
        spans: Vec<(NodeId, u64)>,
    },
    /// Span inside a text-entry field's value
    Field {
        field: FieldId,
        start: usize,
        end: usize,
        version: u64,
    },
}

/// A handle that was just verified to be attached and re-selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveRange {
    handle: RangeHandle,
}

impl LiveRange {
    /// Only document implementations should mint these, after checking
    /// the handle against their current state.
    pub fn attached(handle: RangeHandle) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &RangeHandle {
        &self.handle
    }
}

/// What `replace_contents` put into the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertedSpan {
    Content { node: NodeId },
    Field { field: FieldId, start: usize, end: usize },
}

/// Page-level selection as exposed by the selection API
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSelection {
    pub text: String,
    pub handle: RangeHandle,
    /// `None` when the platform cannot produce a bounding box
    pub rect: Option<Rect>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    TextArea,
    TextInput,
    /// Any other input type (password, number, ...)
    Other(String),
}

impl FieldKind {
    /// Plain text-entry fields whose selection the page-level API hides
    pub fn is_text_entry(&self) -> bool {
        matches!(self, FieldKind::TextArea | FieldKind::TextInput)
    }
}

/// The focused form field and its caret offsets
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSelection {
    pub field: FieldId,
    pub kind: FieldKind,
    pub value: String,
    pub start: usize,
    pub end: usize,
    pub version: u64,
}

impl FieldSelection {
    /// Text between the caret offsets, if the field has a non-empty selection
    pub fn selected_text(&self) -> Option<String> {
        if self.end <= self.start {
            return None;
        }
        Some(
            self.value
                .chars()
                .skip(self.start)
                .take(self.end - self.start)
                .collect(),
        )
    }

    pub fn handle(&self) -> RangeHandle {
        RangeHandle::Field {
            field: self.field,
            start: self.start,
            end: self.end,
            version: self.version,
        }
    }
}

/// Facilities of the host page used by the enhancer.
pub trait Document: Send {
    /// Current page-level selection, possibly collapsed (empty text)
    fn selection(&self) -> Option<LiveSelection>;

    /// Focused form field, if any
    fn active_field(&self) -> Option<FieldSelection>;

    /// Bounding box of the focused element
    fn active_element_rect(&self) -> Option<Rect>;

    fn viewport(&self) -> Viewport;

    /// Re-select the exact span behind `handle`. `None` if it is detached.
    fn restore_selection(&mut self, handle: &RangeHandle) -> Option<LiveRange>;

    /// Remove the content of `range` and insert `text` as one unit in its
    /// place. On error nothing has been removed.
    fn replace_contents(
        &mut self,
        range: &LiveRange,
        text: &str,
    ) -> Result<InsertedSpan, DocumentError>;

    fn clear_selection(&mut self);

    /// Wrap inserted content in a highlight marker
    fn wrap_highlight(&mut self, span: &InsertedSpan) -> Result<MarkerId, DocumentError>;

    /// Remove a highlight marker, keeping its content where it is.
    /// Returns false when the marker no longer exists.
    fn unwrap_highlight(&mut self, marker: MarkerId) -> bool;

    /// Coarse insertion at the current caret or selection
    fn legacy_insert_text(&mut self, text: &str) -> Result<(), DocumentError>;
}

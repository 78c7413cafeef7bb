//! In-memory Document
//!
//! A small page model: an ordered run of text nodes, a set of form fields
//! with one optionally focused, and a fixed monospace layout for geometry.
//! Used by the CLI demo and throughout the tests. Fault switches let callers
//! force the failure paths the mutator has to survive.

use super::{
    Boundary, Document, FieldId, FieldKind, FieldSelection, InsertedSpan, LiveRange,
    LiveSelection, MarkerId, NodeId, RangeHandle, Rect, Viewport,
};
use crate::error::DocumentError;
use tracing::debug;

pub const CHAR_WIDTH: f64 = 8.0;
pub const LINE_HEIGHT: f64 = 18.0;
pub const COLUMNS: usize = 80;
pub const MARGIN: f64 = 8.0;

#[derive(Debug, Clone)]
struct TextNode {
    id: NodeId,
    text: String,
    version: u64,
    marker: Option<MarkerId>,
}

#[derive(Debug, Clone)]
struct Field {
    id: FieldId,
    kind: FieldKind,
    value: String,
    sel_start: usize,
    sel_end: usize,
    version: u64,
    rect: Rect,
}

/// Switches that make document operations fail on purpose
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    /// `replace_contents` rejects every insertion
    pub fail_insertions: bool,
    /// `legacy_insert_text` rejects every insertion
    pub fail_legacy_insert: bool,
    /// No bounding boxes are available
    pub hide_layout: bool,
}

#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<TextNode>,
    fields: Vec<Field>,
    active_field: Option<FieldId>,
    selection: Option<(Boundary, Boundary)>,
    viewport: Viewport,
    next_id: u64,
    next_marker: MarkerId,
    faults: Faults,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            fields: Vec::new(),
            active_field: None,
            selection: None,
            viewport: Viewport::default(),
            next_id: 1,
            next_marker: 1,
            faults: Faults::default(),
        }
    }

    /// Document made of one text node per entry
    pub fn with_text(parts: &[&str]) -> Self {
        let mut doc = Self::new();
        for part in parts {
            doc.push_text(part);
        }
        doc
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Append a text node
    pub fn push_text(&mut self, text: &str) -> NodeId {
        let id = self.alloc_id();
        self.nodes.push(TextNode {
            id,
            text: text.to_string(),
            version: 0,
            marker: None,
        });
        id
    }

    /// Append a form field; it is not focused
    pub fn add_field(&mut self, kind: FieldKind, value: &str, rect: Rect) -> FieldId {
        let id = self.alloc_id();
        self.fields.push(Field {
            id,
            kind,
            value: value.to_string(),
            sel_start: 0,
            sel_end: 0,
            version: 0,
            rect,
        });
        id
    }

    /// Focus a field. Focusing drops the page-level selection.
    pub fn focus_field(&mut self, field: FieldId) -> bool {
        if self.fields.iter().any(|f| f.id == field) {
            self.active_field = Some(field);
            self.selection = None;
            true
        } else {
            false
        }
    }

    pub fn blur(&mut self) {
        self.active_field = None;
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn faults_mut(&mut self) -> &mut Faults {
        &mut self.faults
    }

    /// Select the first occurrence of `needle` inside a single node
    pub fn select_text(&mut self, needle: &str) -> bool {
        for node in &self.nodes {
            if let Some(byte_idx) = node.text.find(needle) {
                let start = node.text[..byte_idx].chars().count();
                let end = start + needle.chars().count();
                self.selection = Some((Boundary::new(node.id, start), Boundary::new(node.id, end)));
                self.active_field = None;
                return true;
            }
        }
        false
    }

    /// Select an explicit range
    pub fn select_range(&mut self, start: Boundary, end: Boundary) -> bool {
        match (self.node_index(start.node), self.node_index(end.node)) {
            (Some(si), Some(ei)) if si < ei || (si == ei && start.offset <= end.offset) => {
                self.selection = Some((start, end));
                true
            }
            _ => false,
        }
    }

    /// Platform select-all: selects the focused field's value if a field
    /// has focus, otherwise all page content.
    pub fn select_all(&mut self) {
        if let Some(field) = self.active_field_mut() {
            field.sel_start = 0;
            field.sel_end = field.value.chars().count();
            return;
        }
        if let (Some(first), Some(last)) = (self.nodes.first(), self.nodes.last()) {
            self.selection = Some((
                Boundary::new(first.id, 0),
                Boundary::new(last.id, last.text.chars().count()),
            ));
        }
    }

    /// Set the caret offsets of a field
    pub fn select_in_field(&mut self, field: FieldId, start: usize, end: usize) -> bool {
        match self.fields.iter_mut().find(|f| f.id == field) {
            Some(f) => {
                let len = f.value.chars().count();
                f.sel_start = start.min(len);
                f.sel_end = end.min(len).max(f.sel_start);
                true
            }
            None => false,
        }
    }

    /// Rewrite a node's text in place, as a page script would
    pub fn edit_node(&mut self, node: NodeId, text: &str) -> bool {
        match self.nodes.iter_mut().find(|n| n.id == node) {
            Some(n) => {
                n.text = text.to_string();
                n.version += 1;
                true
            }
            None => false,
        }
    }

    /// Whole page content
    pub fn text(&self) -> String {
        self.nodes.iter().map(|n| n.text.as_str()).collect()
    }

    pub fn field_value(&self, field: FieldId) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.id == field)
            .map(|f| f.value.as_str())
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    /// Markers currently present in the content
    pub fn markers(&self) -> Vec<MarkerId> {
        let mut markers: Vec<MarkerId> = self.nodes.iter().filter_map(|n| n.marker).collect();
        markers.dedup();
        markers
    }

    /// Text wrapped by a marker
    pub fn highlighted_text(&self, marker: MarkerId) -> Option<String> {
        let text: String = self
            .nodes
            .iter()
            .filter(|n| n.marker == Some(marker))
            .map(|n| n.text.as_str())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    fn node_index(&self, node: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == node)
    }

    fn active_field_mut(&mut self) -> Option<&mut Field> {
        let id = self.active_field?;
        self.fields.iter_mut().find(|f| f.id == id)
    }

    /// Char offset of a boundary within the whole content
    fn global_offset(&self, boundary: Boundary) -> Option<usize> {
        let idx = self.node_index(boundary.node)?;
        let before: usize = self.nodes[..idx]
            .iter()
            .map(|n| n.text.chars().count())
            .sum();
        Some(before + boundary.offset)
    }

    fn layout_rect(&self, start: Boundary, end: Boundary) -> Option<Rect> {
        if self.faults.hide_layout {
            return None;
        }
        let g_start = self.global_offset(start)?;
        let g_end = self.global_offset(end)?;
        let (first_line, last_line) = (g_start / COLUMNS, g_end.saturating_sub(1) / COLUMNS);
        let top = MARGIN + first_line as f64 * LINE_HEIGHT - self.viewport.scroll_y;
        let height = (last_line.max(first_line) - first_line + 1) as f64 * LINE_HEIGHT;
        let (left, width) = if first_line == last_line || g_end <= g_start {
            (
                MARGIN + (g_start % COLUMNS) as f64 * CHAR_WIDTH,
                (g_end.saturating_sub(g_start)) as f64 * CHAR_WIDTH,
            )
        } else {
            (MARGIN, COLUMNS as f64 * CHAR_WIDTH)
        };
        Some(Rect::new(left - self.viewport.scroll_x, top, width, height))
    }

    fn content_text(&self, start: Boundary, end: Boundary) -> Option<String> {
        let si = self.node_index(start.node)?;
        let ei = self.node_index(end.node)?;
        let mut out = String::new();
        for (i, node) in self.nodes.iter().enumerate().take(ei + 1).skip(si) {
            let len = node.text.chars().count();
            let from = if i == si { start.offset.min(len) } else { 0 };
            let to = if i == ei { end.offset.min(len) } else { len };
            out.extend(node.text.chars().skip(from).take(to.saturating_sub(from)));
        }
        Some(out)
    }

    fn content_handle(&self, start: Boundary, end: Boundary) -> Option<RangeHandle> {
        let si = self.node_index(start.node)?;
        let ei = self.node_index(end.node)?;
        if si > ei {
            return None;
        }
        Some(RangeHandle::Content {
            start,
            end,
            spans: self.nodes[si..=ei]
                .iter()
                .map(|n| (n.id, n.version))
                .collect(),
        })
    }

    fn is_attached(&self, handle: &RangeHandle) -> bool {
        match handle {
            RangeHandle::Content { start, end, spans } => {
                let (Some(si), Some(ei)) = (self.node_index(start.node), self.node_index(end.node))
                else {
                    return false;
                };
                if si > ei || ei - si + 1 != spans.len() {
                    return false;
                }
                self.nodes[si..=ei]
                    .iter()
                    .zip(spans)
                    .all(|(node, (id, version))| node.id == *id && node.version == *version)
            }
            RangeHandle::Field {
                field,
                start,
                end,
                version,
            } => self.fields.iter().any(|f| {
                f.id == *field
                    && f.version == *version
                    && start <= end
                    && *end <= f.value.chars().count()
            }),
        }
    }

    /// Splice `text` over a content range that has already been validated
    fn splice_content(&mut self, start: Boundary, end: Boundary, text: &str) -> Option<NodeId> {
        let si = self.node_index(start.node)?;
        let ei = self.node_index(end.node)?;

        let first = self.nodes[si].clone();
        let last = self.nodes[ei].clone();
        let before: String = first.text.chars().take(start.offset).collect();
        let after: String = last.text.chars().skip(end.offset).collect();

        let inserted_id = self.alloc_id();
        let mut replacement = Vec::with_capacity(3);
        if !before.is_empty() {
            replacement.push(TextNode {
                id: first.id,
                text: before,
                version: first.version + 1,
                marker: first.marker,
            });
        }
        replacement.push(TextNode {
            id: inserted_id,
            text: text.to_string(),
            version: 0,
            marker: None,
        });
        if !after.is_empty() {
            let after_id = self.alloc_id();
            replacement.push(TextNode {
                id: after_id,
                text: after,
                version: 0,
                marker: last.marker,
            });
        }

        self.nodes.splice(si..=ei, replacement);
        self.selection = None;
        Some(inserted_id)
    }

    fn splice_field(
        &mut self,
        field: FieldId,
        start: usize,
        end: usize,
        text: &str,
    ) -> Option<InsertedSpan> {
        let f = self.fields.iter_mut().find(|f| f.id == field)?;
        let before: String = f.value.chars().take(start).collect();
        let after: String = f.value.chars().skip(end).collect();
        f.value = format!("{before}{text}{after}");
        f.version += 1;
        let inserted_end = start + text.chars().count();
        f.sel_start = inserted_end;
        f.sel_end = inserted_end;
        Some(InsertedSpan::Field {
            field,
            start,
            end: inserted_end,
        })
    }
}

impl Document for MemoryDocument {
    fn selection(&self) -> Option<LiveSelection> {
        let (start, end) = self.selection?;
        Some(LiveSelection {
            text: self.content_text(start, end)?,
            handle: self.content_handle(start, end)?,
            rect: self.layout_rect(start, end),
        })
    }

    fn active_field(&self) -> Option<FieldSelection> {
        let id = self.active_field?;
        let f = self.fields.iter().find(|f| f.id == id)?;
        Some(FieldSelection {
            field: f.id,
            kind: f.kind.clone(),
            value: f.value.clone(),
            start: f.sel_start,
            end: f.sel_end,
            version: f.version,
        })
    }

    fn active_element_rect(&self) -> Option<Rect> {
        if self.faults.hide_layout {
            return None;
        }
        let id = self.active_field?;
        self.fields.iter().find(|f| f.id == id).map(|f| f.rect)
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn restore_selection(&mut self, handle: &RangeHandle) -> Option<LiveRange> {
        if !self.is_attached(handle) {
            debug!("Range handle is detached: {:?}", handle);
            return None;
        }
        match handle {
            RangeHandle::Content { start, end, .. } => {
                self.selection = Some((*start, *end));
            }
            RangeHandle::Field {
                field, start, end, ..
            } => {
                self.active_field = Some(*field);
                self.selection = None;
                self.select_in_field(*field, *start, *end);
            }
        }
        Some(LiveRange::attached(handle.clone()))
    }

    fn replace_contents(
        &mut self,
        range: &LiveRange,
        text: &str,
    ) -> Result<InsertedSpan, DocumentError> {
        if self.faults.fail_insertions {
            return Err(DocumentError::InsertionRejected);
        }
        if !self.is_attached(range.handle()) {
            return Err(DocumentError::Detached);
        }
        match range.handle() {
            RangeHandle::Content { start, end, .. } => self
                .splice_content(*start, *end, text)
                .map(|node| InsertedSpan::Content { node })
                .ok_or(DocumentError::Detached),
            RangeHandle::Field {
                field, start, end, ..
            } => self
                .splice_field(*field, *start, *end, text)
                .ok_or(DocumentError::Detached),
        }
    }

    fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn wrap_highlight(&mut self, span: &InsertedSpan) -> Result<MarkerId, DocumentError> {
        match span {
            InsertedSpan::Content { node } => {
                let marker = self.next_marker;
                let target = self
                    .nodes
                    .iter_mut()
                    .find(|n| n.id == *node)
                    .ok_or(DocumentError::Detached)?;
                target.marker = Some(marker);
                self.next_marker += 1;
                Ok(marker)
            }
            // Field values are plain text; there is nothing to wrap.
            InsertedSpan::Field { .. } => Err(DocumentError::HighlightUnsupported),
        }
    }

    fn unwrap_highlight(&mut self, marker: MarkerId) -> bool {
        let mut found = false;
        for node in self.nodes.iter_mut().filter(|n| n.marker == Some(marker)) {
            node.marker = None;
            found = true;
        }
        found
    }

    fn legacy_insert_text(&mut self, text: &str) -> Result<(), DocumentError> {
        if self.faults.fail_legacy_insert {
            return Err(DocumentError::InsertionRejected);
        }
        if let Some(field) = self.active_field() {
            let (start, end) = (field.start, field.end);
            return self
                .splice_field(field.field, start, end, text)
                .map(|_| ())
                .ok_or(DocumentError::NoCaret);
        }
        match self.selection {
            Some((start, end)) => self
                .splice_content(start, end, text)
                .map(|_| ())
                .ok_or(DocumentError::NoCaret),
            None => Err(DocumentError::NoCaret),
        }
    }
}

//! Selection Tracker
//!
//! Watches pointer and keyboard input on the page, decides whether a
//! meaningful selection exists, and captures a restorable snapshot of it.
//! Each qualifying selection fully replaces the previous snapshot.

use crate::document::{Document, Point, RangeHandle};
use std::time::Duration;
use tracing::{debug, info};

/// Selections this short (after trimming) are never actionable
pub const MIN_SELECTION_CHARS: usize = 3;

/// Time the platform gets to finalize a selection after pointer release
pub const POINTER_SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Select-all only needs one turn of the event loop
pub const SELECT_ALL_SETTLE_DELAY: Duration = Duration::ZERO;

/// A captured selection: its text plus a handle back to the live span
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSnapshot {
    text: String,
    handle: RangeHandle,
}

impl SelectionSnapshot {
    /// Build a snapshot; `None` unless the trimmed text is actionable
    pub fn new(text: &str, handle: RangeHandle) -> Option<Self> {
        let text = text.trim();
        if !is_actionable(text) {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            handle,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn handle(&self) -> &RangeHandle {
        &self.handle
    }
}

/// What the trigger control should do after a selection event
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// Show the control anchored at this page point
    Show(Point),
    /// Hide the control
    Hide,
    /// Leave the control as it is
    Ignore,
}

/// True when trimmed `text` is long enough to act on
pub fn is_actionable(text: &str) -> bool {
    text.trim().chars().count() > MIN_SELECTION_CHARS
}

/// Owns the current selection snapshot
#[derive(Debug, Default)]
pub struct SelectionTracker {
    current: Option<SelectionSnapshot>,
    /// Number of snapshots captured so far
    captured: u64,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, if any
    pub fn snapshot(&self) -> Option<&SelectionSnapshot> {
        self.current.as_ref()
    }

    pub fn captured_count(&self) -> u64 {
        self.captured
    }

    /// Replace the current snapshot. Returns false if the text is not actionable.
    pub fn capture(&mut self, text: &str, handle: RangeHandle) -> bool {
        match SelectionSnapshot::new(text, handle) {
            Some(snapshot) => {
                debug!("Captured selection ({} chars)", snapshot.text.chars().count());
                self.current = Some(snapshot);
                self.captured += 1;
                true
            }
            None => false,
        }
    }

    /// Hand the snapshot to a consumer; the tracker no longer holds it
    pub fn take_snapshot(&mut self) -> Option<SelectionSnapshot> {
        self.current.take()
    }

    /// Drop the snapshot after its span was replaced. A newer snapshot
    /// captured in the meantime is kept.
    pub fn invalidate(&mut self, consumed: &SelectionSnapshot) {
        if self.current.as_ref() == Some(consumed) {
            self.current = None;
            debug!("Selection snapshot invalidated");
        }
    }

    /// Handle a pointer release once the settle delay has passed
    pub fn on_pointer_release<D: Document + ?Sized>(
        &mut self,
        doc: &D,
        pointer: Point,
    ) -> SelectionOutcome {
        if let Some(selection) = doc.selection() {
            if self.capture(&selection.text, selection.handle) {
                return SelectionOutcome::Show(pointer);
            }
        }

        if self.current.is_none() {
            SelectionOutcome::Hide
        } else {
            SelectionOutcome::Ignore
        }
    }

    /// Handle the select-all shortcut once the settle delay has passed
    pub fn on_select_all<D: Document + ?Sized>(&mut self, doc: &D) -> SelectionOutcome {
        let page_selection = doc
            .selection()
            .filter(|selection| !selection.text.trim().is_empty());

        let (text, handle, rect) = match page_selection {
            Some(selection) => (selection.text, selection.handle, selection.rect),
            None => {
                // Plain text-entry fields keep their selection to themselves
                let Some(field) = doc.active_field().filter(|f| f.kind.is_text_entry()) else {
                    return SelectionOutcome::Hide;
                };
                let Some(text) = field.selected_text() else {
                    return SelectionOutcome::Hide;
                };
                (text, field.handle(), None)
            }
        };

        if !self.capture(&text, handle) {
            return SelectionOutcome::Hide;
        }

        let viewport = doc.viewport();
        let anchor = rect
            .or_else(|| doc.active_element_rect())
            .map(|r| r.anchor(&viewport))
            .unwrap_or_else(|| viewport.center());

        info!("📋 Select-all captured {} chars", text.trim().chars().count());
        SelectionOutcome::Show(anchor)
    }

    /// Handle a selection-change notification
    pub fn on_selection_change<D: Document + ?Sized>(&self, doc: &D) -> SelectionOutcome {
        let page_empty = doc
            .selection()
            .map(|s| s.text.trim().is_empty())
            .unwrap_or(true);
        let field_empty = doc
            .active_field()
            .and_then(|f| f.selected_text())
            .map(|t| t.trim().is_empty())
            .unwrap_or(true);

        if page_empty && field_empty {
            SelectionOutcome::Hide
        } else {
            SelectionOutcome::Ignore
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{FieldKind, MemoryDocument, Rect, Viewport};

    #[test]
    fn test_short_selection_never_actionable() {
        for text in ["", "   ", "a", "hi", "abc", "  ab  ", "\n.,\t"] {
            assert!(!is_actionable(text), "{:?} should not be actionable", text);
        }
        assert!(is_actionable("abcd"));
        assert!(is_actionable("  héllo "));
    }

    #[test]
    fn test_pointer_release_captures() {
        let mut doc = MemoryDocument::with_text(&["please improve this sentence"]);
        doc.select_text("improve this");
        let mut tracker = SelectionTracker::new();

        let outcome = tracker.on_pointer_release(&doc, Point::new(40.0, 60.0));
        assert_eq!(outcome, SelectionOutcome::Show(Point::new(40.0, 60.0)));
        assert_eq!(tracker.snapshot().unwrap().text(), "improve this");
    }

    #[test]
    fn test_pointer_release_short_selection() {
        let mut doc = MemoryDocument::with_text(&["hi there"]);
        doc.select_text("hi");
        let mut tracker = SelectionTracker::new();

        assert_eq!(
            tracker.on_pointer_release(&doc, Point::default()),
            SelectionOutcome::Hide
        );
        assert!(tracker.snapshot().is_none());
    }

    #[test]
    fn test_newer_selection_supersedes() {
        let mut doc = MemoryDocument::with_text(&["first selection", " second selection"]);
        let mut tracker = SelectionTracker::new();

        doc.select_text("first selection");
        tracker.on_pointer_release(&doc, Point::default());
        doc.select_text("second selection");
        tracker.on_pointer_release(&doc, Point::default());

        let snapshot = tracker.snapshot().unwrap();
        assert_eq!(snapshot.text(), "second selection");
        assert_eq!(tracker.captured_count(), 2);

        // A short selection afterwards leaves the last snapshot in place
        doc.select_text("fir");
        assert_eq!(
            tracker.on_pointer_release(&doc, Point::default()),
            SelectionOutcome::Ignore
        );
        assert_eq!(tracker.snapshot().unwrap().text(), "second selection");
    }

    #[test]
    fn test_invalidate_keeps_newer_snapshot() {
        let mut doc = MemoryDocument::with_text(&["alpha beta gamma delta"]);
        let mut tracker = SelectionTracker::new();

        doc.select_text("alpha beta");
        tracker.on_pointer_release(&doc, Point::default());
        let consumed = tracker.snapshot().cloned().unwrap();

        doc.select_text("gamma delta");
        tracker.on_pointer_release(&doc, Point::default());
        tracker.invalidate(&consumed);
        assert_eq!(tracker.snapshot().unwrap().text(), "gamma delta");

        let latest = tracker.snapshot().cloned().unwrap();
        tracker.invalidate(&latest);
        assert!(tracker.snapshot().is_none());
    }

    #[test]
    fn test_select_all_uses_selection_rect() {
        let mut doc = MemoryDocument::with_text(&["whole page of text"]);
        doc.set_viewport(Viewport {
            scroll_y: 100.0,
            ..Viewport::default()
        });
        doc.select_all();
        let rect = doc.selection().unwrap().rect.unwrap();
        let mut tracker = SelectionTracker::new();

        let outcome = tracker.on_select_all(&doc);
        assert_eq!(
            outcome,
            SelectionOutcome::Show(Point::new(
                rect.left + rect.width / 2.0,
                rect.top + 100.0
            ))
        );
    }

    #[test]
    fn test_select_all_falls_back_to_field() {
        let mut doc = MemoryDocument::new();
        let field = doc.add_field(
            FieldKind::TextArea,
            "write a poem about rust",
            Rect::new(20.0, 300.0, 400.0, 120.0),
        );
        doc.focus_field(field);
        doc.select_all();
        let mut tracker = SelectionTracker::new();

        let outcome = tracker.on_select_all(&doc);
        assert_eq!(outcome, SelectionOutcome::Show(Point::new(220.0, 300.0)));
        let snapshot = tracker.snapshot().unwrap();
        assert_eq!(snapshot.text(), "write a poem about rust");
        assert!(matches!(snapshot.handle(), RangeHandle::Field { .. }));
    }

    #[test]
    fn test_select_all_ignores_password_fields() {
        let mut doc = MemoryDocument::new();
        let field = doc.add_field(
            FieldKind::Other("password".into()),
            "hunter22",
            Rect::default(),
        );
        doc.focus_field(field);
        doc.select_all();
        let mut tracker = SelectionTracker::new();

        assert_eq!(tracker.on_select_all(&doc), SelectionOutcome::Hide);
        assert!(tracker.snapshot().is_none());
    }

    #[test]
    fn test_select_all_viewport_center_without_layout() {
        let mut doc = MemoryDocument::with_text(&["text without any geometry"]);
        doc.faults_mut().hide_layout = true;
        doc.select_all();
        let mut tracker = SelectionTracker::new();

        let center = doc.viewport().center();
        assert_eq!(tracker.on_select_all(&doc), SelectionOutcome::Show(center));
    }

    #[test]
    fn test_selection_change_collapsed_hides() {
        let mut doc = MemoryDocument::with_text(&["some words here"]);
        let tracker = SelectionTracker::new();
        assert_eq!(tracker.on_selection_change(&doc), SelectionOutcome::Hide);

        doc.select_text("words");
        assert_eq!(tracker.on_selection_change(&doc), SelectionOutcome::Ignore);
    }
}

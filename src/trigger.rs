//! Trigger Control
//!
//! The floating "Enhance" button. One instance lives for the whole page and
//! is shared by reference with the handlers that need it.

use crate::document::{Point, Viewport};
use tracing::debug;

pub const CONTROL_WIDTH: f64 = 120.0;
pub const CONTROL_HEIGHT: f64 = 36.0;
pub const CONTROL_PADDING: f64 = 10.0;

/// Where a click landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// The trigger control itself
    Control,
    /// Anywhere else on the page
    Page,
}

/// Placed box of the control in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Placement {
    pub left: f64,
    pub top: f64,
}

/// Compute where the control goes for an anchor point.
///
/// Prefers sitting above the anchor, centered on it. Horizontally clamped to
/// the viewport; flips below the anchor when there is no room above.
pub fn place(anchor: Point, viewport: &Viewport) -> Placement {
    let mut left = anchor.x - CONTROL_WIDTH / 2.0;
    let mut top = anchor.y - CONTROL_HEIGHT - CONTROL_PADDING;

    let min_left = viewport.scroll_x + CONTROL_PADDING;
    let max_left = viewport.scroll_x + viewport.width - CONTROL_WIDTH - CONTROL_PADDING;
    if left < min_left {
        left = min_left;
    } else if left > max_left {
        left = max_left;
    }

    if top < viewport.scroll_y + CONTROL_PADDING {
        top = anchor.y + CONTROL_PADDING;
    }

    Placement { left, top }
}

/// State of the single trigger control
#[derive(Debug, Default)]
pub struct TriggerControl {
    visible: bool,
    processing: bool,
    placement: Placement,
    /// Bumped on every `show`, so the entrance transition replays
    entrance_generation: u64,
}

impl TriggerControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn entrance_generation(&self) -> u64 {
        self.entrance_generation
    }

    /// Show the control near `anchor`
    pub fn show(&mut self, anchor: Point, viewport: &Viewport) {
        self.placement = place(anchor, viewport);
        self.visible = true;
        self.entrance_generation += 1;
        debug!(
            "Trigger shown at ({:.0}, {:.0})",
            self.placement.left, self.placement.top
        );
    }

    /// Hide the control unless a request is in flight
    pub fn hide(&mut self) {
        if self.processing {
            return;
        }
        self.visible = false;
    }

    /// Enter the processing state. Returns false if already processing.
    pub fn begin_processing(&mut self) -> bool {
        if self.processing {
            return false;
        }
        self.processing = true;
        self.visible = true;
        true
    }

    pub fn finish_processing(&mut self) {
        self.processing = false;
    }

    /// Route a click. Returns true when the click should activate the control.
    pub fn on_click(&mut self, target: ClickTarget) -> bool {
        match target {
            ClickTarget::Control => self.visible && !self.processing,
            ClickTarget::Page => {
                self.hide();
                false
            }
        }
    }
}

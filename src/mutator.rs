//! Document Mutator
//!
//! Puts enhanced text where the snapshot was taken. The primary path
//! restores the captured range and replaces it as one unit; when the range
//! is gone or the replacement is rejected, a coarse insertion at the caret
//! is tried instead. Original content is only ever removed together with a
//! successful insertion.

use crate::document::{Document, MarkerId};
use crate::error::{DocumentError, EnhancerResult};
use crate::feedback::{FeedbackChannel, NoticeKind};
use crate::selection::SelectionSnapshot;
use crate::Shared;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long inserted text stays highlighted
pub const HIGHLIGHT_DURATION: Duration = Duration::from_secs(2);

pub const MANUAL_COPY_MESSAGE: &str = "Text replacement failed. Please try copying manually.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// Replaced at the original location. `marker` is the transient
    /// highlight, when the document could wrap the inserted content.
    Replaced { marker: Option<MarkerId> },
    /// Inserted at the caret through the legacy facility
    FallbackInserted,
    /// Nothing changed
    Failed,
}

impl ReplaceOutcome {
    /// True when the enhanced text made it into the document
    pub fn inserted(&self) -> bool {
        !matches!(self, ReplaceOutcome::Failed)
    }
}

pub struct DocumentMutator<D: Document + 'static> {
    document: Shared<D>,
    feedback: Shared<FeedbackChannel>,
    highlight: Duration,
}

impl<D: Document + 'static> DocumentMutator<D> {
    pub fn new(document: Shared<D>, feedback: Shared<FeedbackChannel>) -> Self {
        Self {
            document,
            feedback,
            highlight: HIGHLIGHT_DURATION,
        }
    }

    pub fn with_highlight(mut self, duration: Duration) -> Self {
        self.highlight = duration;
        self
    }

    /// Replace the snapshot's span with `text`
    pub fn replace(
        &self,
        snapshot: &SelectionSnapshot,
        text: &str,
    ) -> EnhancerResult<ReplaceOutcome> {
        let mut doc = self.document.lock()?;

        let primary = match doc.restore_selection(snapshot.handle()) {
            Some(range) => doc.replace_contents(&range, text),
            None => Err(DocumentError::Detached),
        };

        match primary {
            Ok(span) => {
                doc.clear_selection();
                let marker = match doc.wrap_highlight(&span) {
                    Ok(marker) => Some(marker),
                    Err(e) => {
                        debug!("No highlight for inserted text: {}", e);
                        None
                    }
                };
                drop(doc);

                if let Some(marker) = marker {
                    self.schedule_unwrap(marker);
                }
                info!("✅ Replaced {} chars in place", snapshot.text().chars().count());
                Ok(ReplaceOutcome::Replaced { marker })
            }
            Err(e) => {
                warn!("⚠️ In-place replacement failed ({}), trying legacy insert", e);
                match doc.legacy_insert_text(text) {
                    Ok(()) => {
                        info!("✅ Inserted enhanced text at the caret");
                        Ok(ReplaceOutcome::FallbackInserted)
                    }
                    Err(e) => {
                        drop(doc);
                        warn!("❌ Legacy insert failed: {}", e);
                        self.feedback
                            .lock()?
                            .notify(MANUAL_COPY_MESSAGE, NoticeKind::Error);
                        Ok(ReplaceOutcome::Failed)
                    }
                }
            }
        }
    }

    fn schedule_unwrap(&self, marker: MarkerId) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime to expire highlight {}", marker);
            return;
        };
        let document = self.document.clone();
        let delay = self.highlight;
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let mut doc = document
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if !doc.unwrap_highlight(marker) {
                debug!("Highlight {} was already gone", marker);
            }
        });
    }
}

//! Enhancement Requester
//!
//! Sends a captured selection through the relay and turns the answer into
//! an [`EnhancementResult`]. Requests are single-flight per trigger control:
//! `processing` is raised at the start and always cleared on the way out.

use super::normalize::normalize_payload;
use crate::error::RelayError;
use crate::feedback::{FeedbackChannel, NoticeKind};
use crate::relay::{EnhanceRequest, Relay};
use crate::selection::SelectionSnapshot;
use crate::trigger::TriggerControl;
use crate::Shared;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const ENHANCING_MESSAGE: &str = "Enhancing prompt...";
pub const NO_ENHANCEMENT_MESSAGE: &str = "No enhancement received. Check your webhook workflow.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The relay failed or reported an error
    Relay,
    /// The relay answered but nothing usable came back
    NoEnhancement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnhancementResult {
    Success { text: String },
    Failure { kind: FailureKind, reason: String },
}

impl EnhancementResult {
    fn relay_failure(err: RelayError) -> Self {
        EnhancementResult::Failure {
            kind: FailureKind::Relay,
            reason: err.to_string(),
        }
    }

    fn no_enhancement() -> Self {
        EnhancementResult::Failure {
            kind: FailureKind::NoEnhancement,
            reason: "no enhancement received".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, EnhancementResult::Success { .. })
    }
}

/// Page context and limits for outgoing requests
#[derive(Debug, Clone, Default)]
pub struct RequesterOptions {
    pub page_url: Option<String>,
    pub tab_id: Option<u64>,
    /// Unset keeps the relay call unbounded
    pub relay_timeout: Option<Duration>,
}

/// Clears `processing` and hides the control when dropped, whichever way
/// the request ends.
struct ProcessingGuard {
    trigger: Shared<TriggerControl>,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        let mut trigger = self
            .trigger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        trigger.finish_processing();
        trigger.hide();
    }
}

pub struct EnhancementRequester {
    relay: Arc<dyn Relay>,
    trigger: Shared<TriggerControl>,
    feedback: Shared<FeedbackChannel>,
    options: RequesterOptions,
}

impl EnhancementRequester {
    pub fn new(
        relay: Arc<dyn Relay>,
        trigger: Shared<TriggerControl>,
        feedback: Shared<FeedbackChannel>,
        options: RequesterOptions,
    ) -> Self {
        Self {
            relay,
            trigger,
            feedback,
            options,
        }
    }

    fn notify(&self, message: impl Into<String>, kind: NoticeKind) {
        let mut feedback = self
            .feedback
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        feedback.notify(message, kind);
    }

    /// Request an enhancement for `snapshot`.
    ///
    /// Returns `None` without doing anything while another request is in
    /// flight. Failures get their error notice here; success is left to the
    /// caller, which still has to put the text into the document.
    pub async fn enhance(&self, snapshot: &SelectionSnapshot) -> Option<EnhancementResult> {
        {
            let mut trigger = self
                .trigger
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if !trigger.begin_processing() {
                debug!("Enhancement already in flight, ignoring activation");
                return None;
            }
        }
        let _guard = ProcessingGuard {
            trigger: self.trigger.clone(),
        };

        self.notify(ENHANCING_MESSAGE, NoticeKind::Info);

        let request = EnhanceRequest::new(snapshot.text())
            .with_page(self.options.page_url.clone(), self.options.tab_id);
        info!(
            "✨ Enhancing {} chars via {}",
            snapshot.text().chars().count(),
            self.relay.name()
        );

        let response = match self.options.relay_timeout {
            Some(limit) => tokio::time::timeout(limit, self.relay.enhance(&request))
                .await
                .unwrap_or(Err(RelayError::Timeout)),
            None => self.relay.enhance(&request).await,
        };

        let result = match response {
            Ok(payload) => match normalize_payload(&payload) {
                Some(text) if text != snapshot.text() => EnhancementResult::Success { text },
                Some(_) => {
                    debug!("Webhook returned the original text unchanged");
                    EnhancementResult::no_enhancement()
                }
                None => {
                    debug!("Unrecognized payload shape: {}", payload);
                    EnhancementResult::no_enhancement()
                }
            },
            Err(e) => {
                warn!("❌ Relay error: {}", e);
                EnhancementResult::relay_failure(e)
            }
        };

        if let EnhancementResult::Failure { kind, reason } = &result {
            match kind {
                FailureKind::Relay => {
                    self.notify(format!("Enhancement failed: {reason}"), NoticeKind::Error)
                }
                FailureKind::NoEnhancement => {
                    self.notify(NO_ENHANCEMENT_MESSAGE, NoticeKind::Error)
                }
            }
        }

        Some(result)
    }
}

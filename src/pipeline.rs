//! Prompt Enhancer Pipeline
//!
//! Wires the components together. Page events flow into the selection
//! tracker, which drives the trigger control; activating the control runs
//! the requester and, on success, the mutator.
//!
//! Lock order is document, tracker, trigger, feedback. No lock is held
//! across an await.

use crate::core::{EnhancementRequester, EnhancementResult, RequesterOptions};
use crate::document::{Document, Point, Viewport};
use crate::error::EnhancerResult;
use crate::feedback::{FeedbackChannel, NoticeKind};
use crate::mutator::{DocumentMutator, ReplaceOutcome};
use crate::relay::Relay;
use crate::selection::{
    SelectionOutcome, SelectionTracker, POINTER_SETTLE_DELAY, SELECT_ALL_SETTLE_DELAY,
};
use crate::trigger::{ClickTarget, TriggerControl};
use crate::{shared, Shared};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const SUCCESS_MESSAGE: &str = "Prompt enhanced successfully!";

/// A keyboard event as delivered by the page
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Platform modifier + A
    pub fn is_select_all(&self) -> bool {
        (self.ctrl || self.meta) && self.key.eq_ignore_ascii_case("a")
    }

    pub fn is_escape(&self) -> bool {
        self.key == "Escape"
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    PointerRelease(Point),
    SelectionChange,
    KeyDown(KeyEvent),
    Click(ClickTarget),
}

/// What one activation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationReport {
    pub result: EnhancementResult,
    /// Set when the enhancement succeeded and the mutator ran
    pub replacement: Option<ReplaceOutcome>,
}

pub struct PromptEnhancer<D: Document + 'static> {
    document: Shared<D>,
    tracker: Shared<SelectionTracker>,
    trigger: Shared<TriggerControl>,
    feedback: Shared<FeedbackChannel>,
    requester: Arc<EnhancementRequester>,
    mutator: Arc<DocumentMutator<D>>,
}

impl<D: Document + 'static> Clone for PromptEnhancer<D> {
    fn clone(&self) -> Self {
        Self {
            document: self.document.clone(),
            tracker: self.tracker.clone(),
            trigger: self.trigger.clone(),
            feedback: self.feedback.clone(),
            requester: self.requester.clone(),
            mutator: self.mutator.clone(),
        }
    }
}

impl<D: Document + 'static> PromptEnhancer<D> {
    pub fn new(document: Shared<D>, relay: Arc<dyn Relay>, options: RequesterOptions) -> Self {
        let tracker = shared(SelectionTracker::new());
        let trigger = shared(TriggerControl::new());
        let feedback = shared(FeedbackChannel::new());
        let requester = Arc::new(EnhancementRequester::new(
            relay,
            trigger.clone(),
            feedback.clone(),
            options,
        ));
        let mutator = Arc::new(DocumentMutator::new(document.clone(), feedback.clone()));

        Self {
            document,
            tracker,
            trigger,
            feedback,
            requester,
            mutator,
        }
    }

    pub fn document(&self) -> &Shared<D> {
        &self.document
    }

    pub fn tracker(&self) -> &Shared<SelectionTracker> {
        &self.tracker
    }

    pub fn trigger(&self) -> &Shared<TriggerControl> {
        &self.trigger
    }

    pub fn feedback(&self) -> &Shared<FeedbackChannel> {
        &self.feedback
    }

    /// Route a page event. Returns the activation report when a click
    /// activated the control.
    pub async fn dispatch(&self, event: PageEvent) -> EnhancerResult<Option<ActivationReport>> {
        match event {
            PageEvent::PointerRelease(point) => self.on_pointer_release(point).await?,
            PageEvent::SelectionChange => self.on_selection_change()?,
            PageEvent::KeyDown(key) => self.on_key_down(&key).await?,
            PageEvent::Click(target) => return self.on_click(target).await,
        }
        Ok(None)
    }

    pub async fn on_pointer_release(&self, point: Point) -> EnhancerResult<()> {
        settle(POINTER_SETTLE_DELAY).await;
        let (outcome, viewport) = {
            let doc = self.document.lock()?;
            let mut tracker = self.tracker.lock()?;
            (tracker.on_pointer_release(&*doc, point), doc.viewport())
        };
        self.apply(outcome, &viewport)
    }

    pub async fn on_select_all(&self) -> EnhancerResult<()> {
        settle(SELECT_ALL_SETTLE_DELAY).await;
        let (outcome, viewport) = {
            let doc = self.document.lock()?;
            let mut tracker = self.tracker.lock()?;
            (tracker.on_select_all(&*doc), doc.viewport())
        };
        self.apply(outcome, &viewport)
    }

    pub fn on_selection_change(&self) -> EnhancerResult<()> {
        let (outcome, viewport) = {
            let doc = self.document.lock()?;
            let tracker = self.tracker.lock()?;
            (tracker.on_selection_change(&*doc), doc.viewport())
        };
        self.apply(outcome, &viewport)
    }

    pub async fn on_key_down(&self, key: &KeyEvent) -> EnhancerResult<()> {
        if key.is_select_all() {
            self.on_select_all().await
        } else if key.is_escape() {
            self.trigger.lock()?.hide();
            Ok(())
        } else {
            Ok(())
        }
    }

    pub async fn on_click(&self, target: ClickTarget) -> EnhancerResult<Option<ActivationReport>> {
        let activate = self.trigger.lock()?.on_click(target);
        if activate {
            self.activate().await
        } else {
            Ok(None)
        }
    }

    /// Run one enhancement for the current snapshot.
    ///
    /// `None` when there is nothing to enhance or a request is already in
    /// flight.
    pub async fn activate(&self) -> EnhancerResult<Option<ActivationReport>> {
        let Some(snapshot) = self.tracker.lock()?.snapshot().cloned() else {
            debug!("Activation without a snapshot");
            return Ok(None);
        };

        let Some(result) = self.requester.enhance(&snapshot).await else {
            return Ok(None);
        };

        let replacement = match &result {
            EnhancementResult::Success { text } => {
                let outcome = self.mutator.replace(&snapshot, text)?;
                if outcome.inserted() {
                    self.tracker.lock()?.invalidate(&snapshot);
                    self.feedback
                        .lock()?
                        .notify(SUCCESS_MESSAGE, NoticeKind::Success);
                    info!("🎉 Prompt enhanced");
                }
                Some(outcome)
            }
            EnhancementResult::Failure { .. } => None,
        };

        Ok(Some(ActivationReport {
            result,
            replacement,
        }))
    }

    fn apply(&self, outcome: SelectionOutcome, viewport: &Viewport) -> EnhancerResult<()> {
        let mut trigger = self.trigger.lock()?;
        match outcome {
            SelectionOutcome::Show(anchor) => trigger.show(anchor, viewport),
            SelectionOutcome::Hide => trigger.hide(),
            SelectionOutcome::Ignore => {}
        }
        Ok(())
    }
}

/// Give the platform time to finish updating the selection
async fn settle(delay: Duration) {
    if delay.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FailureKind;
    use crate::document::MemoryDocument;
    use crate::error::RelayError;
    use crate::relay::EnhanceRequest;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct FixedRelay(Result<Value, RelayError>);

    #[async_trait]
    impl Relay for FixedRelay {
        async fn enhance(&self, _request: &EnhanceRequest) -> Result<Value, RelayError> {
            self.0.clone()
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn enhancer(
        doc: MemoryDocument,
        answer: Result<Value, RelayError>,
    ) -> PromptEnhancer<MemoryDocument> {
        PromptEnhancer::new(
            shared(doc),
            Arc::new(FixedRelay(answer)),
            RequesterOptions::default(),
        )
    }

    #[test]
    fn test_key_event_shortcuts() {
        assert!(KeyEvent::new("a").with_ctrl().is_select_all());
        assert!(KeyEvent::new("A").with_meta().is_select_all());
        assert!(!KeyEvent::new("a").is_select_all());
        assert!(KeyEvent::new("Escape").is_escape());
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_click_replace() {
        let mut doc = MemoryDocument::with_text(&["Note: ", "improve this sentence please"]);
        doc.select_text("improve this sentence please");
        let enhancer = enhancer(doc, Ok(json!({"enhancedText": "Please improve this sentence."})));

        enhancer
            .dispatch(PageEvent::PointerRelease(Point::new(100.0, 200.0)))
            .await
            .unwrap();
        assert!(enhancer.trigger().lock().unwrap().is_visible());

        let report = enhancer
            .dispatch(PageEvent::Click(ClickTarget::Control))
            .await
            .unwrap()
            .unwrap();
        assert!(report.result.is_success());
        assert!(matches!(
            report.replacement,
            Some(ReplaceOutcome::Replaced { marker: Some(_) })
        ));

        assert_eq!(
            enhancer.document().lock().unwrap().text(),
            "Note: Please improve this sentence."
        );
        assert!(enhancer.tracker().lock().unwrap().snapshot().is_none());
        assert!(!enhancer.trigger().lock().unwrap().is_visible());
        let mut feedback = enhancer.feedback().lock().unwrap();
        assert_eq!(feedback.current().unwrap().message, SUCCESS_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_escape_and_outside_click_hide() {
        let mut doc = MemoryDocument::with_text(&["some longer selection"]);
        doc.select_text("longer selection");
        let enhancer = enhancer(doc, Ok(json!("unused")));

        enhancer.on_pointer_release(Point::new(50.0, 50.0)).await.unwrap();
        assert!(enhancer.trigger().lock().unwrap().is_visible());
        enhancer
            .dispatch(PageEvent::KeyDown(KeyEvent::new("Escape")))
            .await
            .unwrap();
        assert!(!enhancer.trigger().lock().unwrap().is_visible());

        enhancer.on_pointer_release(Point::new(50.0, 50.0)).await.unwrap();
        let report = enhancer
            .dispatch(PageEvent::Click(ClickTarget::Page))
            .await
            .unwrap();
        assert!(report.is_none());
        assert!(!enhancer.trigger().lock().unwrap().is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_all_shortcut_shows_control() {
        let mut doc = MemoryDocument::with_text(&["everything on this page"]);
        doc.select_all();
        let enhancer = enhancer(doc, Ok(json!("unused")));

        enhancer
            .dispatch(PageEvent::KeyDown(KeyEvent::new("a").with_ctrl()))
            .await
            .unwrap();
        assert!(enhancer.trigger().lock().unwrap().is_visible());
        assert_eq!(
            enhancer.tracker().lock().unwrap().snapshot().unwrap().text(),
            "everything on this page"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_snapshot_and_document() {
        let mut doc = MemoryDocument::with_text(&["leave this text alone"]);
        doc.select_text("this text");
        let enhancer = enhancer(doc, Err(RelayError::Http(502)));

        enhancer.on_pointer_release(Point::default()).await.unwrap();
        let report = enhancer.activate().await.unwrap().unwrap();
        assert_eq!(
            report.result,
            EnhancementResult::Failure {
                kind: FailureKind::Relay,
                reason: "HTTP error! status: 502".into()
            }
        );
        assert_eq!(report.replacement, None);
        assert_eq!(
            enhancer.document().lock().unwrap().text(),
            "leave this text alone"
        );
        assert!(enhancer.tracker().lock().unwrap().snapshot().is_some());
    }

    #[tokio::test]
    async fn test_activate_without_snapshot() {
        let enhancer = enhancer(MemoryDocument::with_text(&["nothing"]), Ok(json!("x")));
        assert!(enhancer.activate().await.unwrap().is_none());
        assert!(enhancer.feedback().lock().unwrap().current().is_none());
    }
}

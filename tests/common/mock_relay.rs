//! Mock Relay for Testing
//!
//! Answers from a script and records every request it receives.

use async_trait::async_trait;
use prompt_enhancer::error::RelayError;
use prompt_enhancer::relay::{EnhanceRequest, Relay};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Mock relay that records requests
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct MockRelay {
    /// Every request that reached the relay
    pub requests: Arc<Mutex<Vec<EnhanceRequest>>>,
    /// Answers handed out in order; the last one repeats
    pub answers: Arc<Mutex<VecDeque<Result<Value, RelayError>>>>,
    /// Hold every answer until `release` is called
    pub hold: Arc<Mutex<bool>>,
    gate: Arc<Notify>,
}

#[allow(dead_code)]
impl MockRelay {
    pub fn new(answer: Result<Value, RelayError>) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            answers: Arc::new(Mutex::new(VecDeque::from([answer]))),
            hold: Arc::new(Mutex::new(false)),
            gate: Arc::new(Notify::new()),
        }
    }

    pub fn answering(payload: Value) -> Self {
        Self::new(Ok(payload))
    }

    pub fn failing(error: RelayError) -> Self {
        Self::new(Err(error))
    }

    /// Relay that does not answer until released
    pub fn held(answer: Result<Value, RelayError>) -> Self {
        let relay = Self::new(answer);
        *relay.hold.lock().unwrap() = true;
        relay
    }

    /// Let one held request through
    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn push_answer(&self, answer: Result<Value, RelayError>) {
        self.answers.lock().unwrap().push_back(answer);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn texts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.text.clone())
            .collect()
    }

    fn next_answer(&self) -> Result<Value, RelayError> {
        let mut answers = self.answers.lock().unwrap();
        if answers.len() > 1 {
            answers.pop_front().unwrap()
        } else {
            answers.front().cloned().unwrap()
        }
    }
}

#[async_trait]
impl Relay for MockRelay {
    async fn enhance(&self, request: &EnhanceRequest) -> Result<Value, RelayError> {
        self.requests.lock().unwrap().push(request.clone());
        let held = *self.hold.lock().unwrap();
        if held {
            self.gate.notified().await;
        }
        self.next_answer()
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_relay_records_requests() {
        let mock = MockRelay::answering(json!("first"));
        mock.push_answer(Ok(json!("second")));

        let a = mock.enhance(&EnhanceRequest::new("one")).await.unwrap();
        let b = mock.enhance(&EnhanceRequest::new("two")).await.unwrap();
        let c = mock.enhance(&EnhanceRequest::new("three")).await.unwrap();

        assert_eq!((a, b, c), (json!("first"), json!("second"), json!("second")));
        assert_eq!(mock.texts(), vec!["one", "two", "three"]);
    }
}

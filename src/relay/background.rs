//! Background Relay
//!
//! Message-passing transport. A background task owns the webhook relay and
//! the settings store; the page talks to it through a [`RelayClient`] that
//! sends [`RelayRequest`]s over a channel and waits for a [`RelayResponse`].

use super::{EnhanceRequest, Relay, RelayRequest, RelayResponse, WebhookRelay};
use crate::config::SettingsStore;
use crate::error::RelayError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const CHANNEL_CAPACITY: usize = 32;

type Envelope = (RelayRequest, oneshot::Sender<RelayResponse>);

/// Request handling of the background side
pub struct BackgroundService {
    store: Arc<dyn SettingsStore>,
    webhook: WebhookRelay,
}

impl BackgroundService {
    pub fn new(store: Arc<dyn SettingsStore>, webhook: WebhookRelay) -> Self {
        Self { store, webhook }
    }

    /// Answer one request
    pub async fn handle(&self, request: RelayRequest) -> RelayResponse {
        debug!("📨 Relay request: {:?}", request);
        match request {
            RelayRequest::EnhancePrompt { text, url, tab_id } => {
                let request = EnhanceRequest::new(text).with_page(url, tab_id);
                match self.webhook.enhance(&request).await {
                    Ok(result) => RelayResponse::enhanced(result),
                    Err(e) => {
                        warn!("Enhancement error: {}", e);
                        RelayResponse::error(e.to_string())
                    }
                }
            }
            RelayRequest::GetSettings => match self.store.settings() {
                Ok(settings) => RelayResponse::settings(settings),
                Err(e) => RelayResponse::error(e.to_string()),
            },
            RelayRequest::SaveSettings { settings } => {
                if let Err(e) = settings.validate() {
                    return RelayResponse::error(e.to_string());
                }
                match self.store.save_settings(&settings) {
                    Ok(()) => RelayResponse::saved(),
                    Err(e) => RelayResponse::error(e.to_string()),
                }
            }
        }
    }

    /// Answer a raw JSON message
    pub async fn handle_value(&self, message: Value) -> RelayResponse {
        match RelayRequest::from_value(message) {
            Ok(request) => self.handle(request).await,
            Err(response) => response,
        }
    }
}

/// The running background task
pub struct BackgroundRelay {
    tx: mpsc::Sender<Envelope>,
    task: Option<JoinHandle<()>>,
}

impl BackgroundRelay {
    /// Start serving requests on the current runtime
    pub fn spawn(service: BackgroundService) -> Self {
        let (tx, mut rx) = mpsc::channel::<Envelope>(CHANNEL_CAPACITY);
        let service = Arc::new(service);

        let task = tokio::spawn(async move {
            info!("🔌 Background relay started");
            while let Some((request, reply)) = rx.recv().await {
                let service = service.clone();
                // Requests resolve independently, like async message handlers
                tokio::spawn(async move {
                    let response = service.handle(request).await;
                    if reply.send(response).is_err() {
                        debug!("Relay caller went away before the reply");
                    }
                });
            }
            info!("🔌 Background relay stopped");
        });

        Self {
            tx,
            task: Some(task),
        }
    }

    /// A page-side client for this relay
    pub fn client(&self) -> RelayClient {
        RelayClient {
            tx: self.tx.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for BackgroundRelay {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Page-side handle to the background relay
#[derive(Clone)]
pub struct RelayClient {
    tx: mpsc::Sender<Envelope>,
}

impl RelayClient {
    /// Send a request and wait for its response
    pub async fn send(&self, request: RelayRequest) -> Result<RelayResponse, RelayError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((request, reply_tx))
            .await
            .map_err(|_| RelayError::NoResponse)?;
        reply_rx.await.map_err(|_| RelayError::NoResponse)
    }
}

#[async_trait]
impl Relay for RelayClient {
    async fn enhance(&self, request: &EnhanceRequest) -> Result<Value, RelayError> {
        let response = self
            .send(RelayRequest::EnhancePrompt {
                text: request.text.clone(),
                url: request.page_url.clone(),
                tab_id: request.tab_id,
            })
            .await?;

        if let Some(error) = response.error {
            return Err(RelayError::Remote(error));
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    fn name(&self) -> &str {
        "background"
    }
}

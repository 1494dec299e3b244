use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use gsw_publish::{MessageSink, SinkError};
use gsw_schemas::WebhookMessage;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkCall {
    Create { id: String, message: WebhookMessage },
    Update { id: String, message: WebhookMessage },
}

impl SinkCall {
    pub fn message(&self) -> &WebhookMessage {
        match self {
            SinkCall::Create { message, .. } | SinkCall::Update { message, .. } => message,
        }
    }
}

/// Sink that records every successful call and hands out `msg-1`, `msg-2`, ...
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
    live: Mutex<HashSet<String>>,
    next_id: Mutex<u64>,
    fail_next: Mutex<Option<SinkError>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn creates(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, SinkCall::Create { .. }))
            .count()
    }

    pub fn updates(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, SinkCall::Update { .. }))
            .count()
    }

    pub fn last_message(&self) -> Option<WebhookMessage> {
        self.calls().last().map(|c| c.message().clone())
    }

    /// Treat `id` as a message that already exists downstream (e.g. one
    /// referenced by a loaded state file).
    pub fn adopt(&self, id: &str) {
        self.live.lock().unwrap().insert(id.to_string());
    }

    /// Simulate someone deleting the published message downstream.
    pub fn delete(&self, id: &str) {
        self.live.lock().unwrap().remove(id);
    }

    /// The next create or update fails with `err` (not recorded).
    pub fn fail_next(&self, err: SinkError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    fn take_failure(&self) -> Option<SinkError> {
        self.fail_next.lock().unwrap().take()
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn create(&self, message: &WebhookMessage) -> Result<String, SinkError> {
        if let Some(e) = self.take_failure() {
            return Err(e);
        }
        let id = {
            let mut n = self.next_id.lock().unwrap();
            *n += 1;
            format!("msg-{}", *n)
        };
        self.live.lock().unwrap().insert(id.clone());
        self.calls.lock().unwrap().push(SinkCall::Create {
            id: id.clone(),
            message: message.clone(),
        });
        Ok(id)
    }

    async fn update(&self, message_id: &str, message: &WebhookMessage) -> Result<(), SinkError> {
        if let Some(e) = self.take_failure() {
            return Err(e);
        }
        if !self.live.lock().unwrap().contains(message_id) {
            return Err(SinkError::NotFound);
        }
        self.calls.lock().unwrap().push(SinkCall::Update {
            id: message_id.to_string(),
            message: message.clone(),
        });
        Ok(())
    }
}

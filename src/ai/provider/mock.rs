//! Scripted provider for tests
//!
//! Replies are served in order. A provider built with a gate holds every
//! call until the test releases it, which keeps a task observably pending.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use super::{LlmProvider, LlmRequest, LlmResponse};
use crate::types::{CourseError, ErrorCategory, LlmError, Result};

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Image(Option<Vec<u8>>),
    Fail(ErrorCategory),
}

#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<LlmRequest>>,
    image_prompts: Mutex<Vec<String>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedProvider {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn text(reply: impl Into<String>) -> Self {
        Self::new([Reply::Text(reply.into())])
    }

    pub fn failing() -> Self {
        Self::new([Reply::Fail(ErrorCategory::RateLimit)])
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn image_prompts(&self) -> Vec<String> {
        self.image_prompts.lock().unwrap().clone()
    }

    async fn next(&self) -> Option<Reply> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.replies.lock().unwrap().pop_front()
    }
}

fn failure(category: ErrorCategory) -> CourseError {
    LlmError::with_provider(category, "scripted failure", "scripted").into()
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match self.next().await {
            Some(Reply::Text(text)) => Ok(LlmResponse::text_only(text)),
            Some(Reply::Fail(category)) => Err(failure(category)),
            Some(Reply::Image(_)) | None => Err(failure(ErrorCategory::Unknown)),
        }
    }

    async fn generate_image(&self, prompt: &str) -> Result<Option<Vec<u8>>> {
        self.image_prompts.lock().unwrap().push(prompt.to_string());
        match self.next().await {
            Some(Reply::Image(bytes)) => Ok(bytes),
            Some(Reply::Fail(category)) => Err(failure(category)),
            Some(Reply::Text(_)) | None => Err(failure(ErrorCategory::Unknown)),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

//! Test double for [`ChatModel`].

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use bidflow_llm::{ChatModel, ChatRequest, ChatResponse, LlmError, Usage};

/// Replays canned replies in order and records every request.
pub(crate) struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<ChatRequest>>,
    fail_after: Option<usize>,
}

impl ScriptedModel {
    pub(crate) fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
            fail_after: None,
        }
    }

    /// Answer `ok_calls` requests with `reply`, then fail with an auth error.
    pub(crate) fn failing_after(ok_calls: usize, reply: &str) -> Self {
        let mut model = Self::new(std::iter::repeat_n(reply, ok_calls));
        model.fail_after = Some(ok_calls);
        model
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn user_prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.messages.last().map(|m| m.content.clone()))
            .collect()
    }

    pub(crate) fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        if matches!(self.fail_after, Some(n) if call > n) {
            return Err(LlmError::AuthenticationError("invalid api key".into()));
        }

        let content = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "ok".to_string());
        Ok(ChatResponse {
            content,
            model: "scripted".into(),
            usage: Usage::default(),
            finish_reason: Some("stop".into()),
        })
    }
}

//! In-memory provider used by the unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::{ChatError, Result};
use crate::provider::{ChatRequest, Fragment, FragmentStream, LlmProvider, ModelInfo};

/// One scripted reply: either the stream fails to open, or it yields items
pub enum Reply {
    Refuse(ChatError),
    Stream(Vec<Result<Fragment>>),
}

/// Plays back scripted replies in order and records every request
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    /// Each inner vector is one successful response
    pub fn new(responses: Vec<Vec<Fragment>>) -> Self {
        Self::with_replies(
            responses
                .into_iter()
                .map(|fragments| Reply::Stream(fragments.into_iter().map(Ok).collect()))
                .collect(),
        )
    }

    pub fn with_replies(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::default(),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn chat_stream(&self, request: &ChatRequest) -> Result<FragmentStream> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Stream(items)) => Ok(Box::pin(futures::stream::iter(items))),
            Some(Reply::Refuse(error)) => Err(error),
            None => Err(ChatError::Provider("script exhausted".into())),
        }
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(Vec::new())
    }
}

//! Scripted `LanguageModel` stub for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{GroundedText, GroundingSource, LanguageModel, LlmError};

/// One scripted answer.
pub enum Reply {
    Text(String),
    Grounded(String, Vec<GroundingSource>),
    Fail,
}

/// Replays replies in order and records every `(system, user)` pair it receives.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| Reply::Text(t.into())).collect())
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn next(&self, system: &str, user: &str) -> Option<Reply> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        self.replies.lock().unwrap().pop_front()
    }
}

fn scripted_failure() -> LlmError {
    LlmError::Api {
        status: 500,
        message: "scripted failure".to_string(),
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        match self.next(system, user) {
            Some(Reply::Text(text)) | Some(Reply::Grounded(text, _)) => Ok(text),
            Some(Reply::Fail) => Err(scripted_failure()),
            None => Err(LlmError::EmptyContent),
        }
    }

    async fn complete_with_search(
        &self,
        system: &str,
        user: &str,
    ) -> Result<GroundedText, LlmError> {
        match self.next(system, user) {
            Some(Reply::Text(text)) => Ok(GroundedText {
                text,
                sources: Vec::new(),
            }),
            Some(Reply::Grounded(text, sources)) => Ok(GroundedText { text, sources }),
            Some(Reply::Fail) => Err(scripted_failure()),
            None => Err(LlmError::EmptyContent),
        }
    }
}

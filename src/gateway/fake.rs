use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{GatewayError, TextGenerator};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub prompt: String,
    pub schema: Option<Value>,
}

enum Reply {
    Text(String),
    Failure(String),
}

/// Replies with a fixed script and remembers what it was asked.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGenerator {
    pub fn replying<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with(replies.into_iter().map(|r| Reply::Text(r.into())).collect())
    }

    pub fn failing(message: &str) -> Self {
        Self::with(VecDeque::from([Reply::Failure(message.to_string())]))
    }

    pub fn silent() -> Self {
        Self::with(VecDeque::new())
    }

    fn with(replies: VecDeque<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Reply::Text(reply.into()));
    }

    pub fn push_failure(&self, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Reply::Failure(message.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, schema: Option<&Value>) -> Result<String, GatewayError> {
        self.calls.lock().unwrap().push(RecordedCall {
            prompt: prompt.to_string(),
            schema: schema.cloned(),
        });

        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Failure(message)) => Err(GatewayError::service(message)),
            None => Err(GatewayError::service("no scripted reply left")),
        }
    }
}

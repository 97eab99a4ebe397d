use async_trait::async_trait;
use chatgpt::client::ChatGPT;
use chatgpt::config::ChatGPTEngine;
use chatgpt::types::CompletionResponse;
use serde_json::Value;

use super::{prompts, GatewayError, TextGenerator};
use crate::config::Config;

/// [`TextGenerator`] backed by the OpenAI chat completion API.
///
/// The API offers no response schema here, so the schema travels inside the prompt
/// and the gateway validates the decoded reply.
pub struct ChatGptGenerator {
    chat_gpt: ChatGPT,
}

impl ChatGptGenerator {
    pub fn new(config: &Config) -> Result<Self, chatgpt::err::Error> {
        let mut chat_gpt = ChatGPT::new(&config.chatgpt_api_key)?;

        chat_gpt.config.engine = engine(&config.model);
        chat_gpt.config.timeout = config.request_timeout;

        Ok(Self { chat_gpt })
    }
}

fn engine(model: &str) -> ChatGPTEngine {
    match model {
        "gpt-3.5-turbo" => ChatGPTEngine::Gpt35Turbo,
        "gpt-4" => ChatGPTEngine::Gpt4,
        "gpt-4-32k" => ChatGPTEngine::Gpt4_32k,
        // Built once at startup, so leaking the name is fine
        other => ChatGPTEngine::Custom(Box::leak(other.to_string().into_boxed_str())),
    }
}

#[async_trait]
impl TextGenerator for ChatGptGenerator {
    async fn generate(&self, prompt: &str, schema: Option<&Value>) -> Result<String, GatewayError> {
        let prompt = match schema {
            Some(schema) => format!("{}\n\n{}", prompt, prompts::json_instruction(schema)),
            None => prompt.to_string(),
        };

        let response: CompletionResponse = self
            .chat_gpt
            .send_message(&prompt)
            .await
            .map_err(GatewayError::service)?;
        let content = response.message().clone().content;

        log::debug!("Completion of {} chars", content.len());

        Ok(content)
    }
}

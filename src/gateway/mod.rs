//! Boundary to the generative-AI service.
//!
//! [`Gateway`] turns the three requests the bot needs (structure a document,
//! generate a quiz, answer a question) into prompts for a [`TextGenerator`] and
//! decodes what comes back into the curriculum and quiz types.

pub mod chatgpt;
pub mod prompts;
pub mod schema;

#[cfg(test)]
pub mod fake;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::curriculum::Curriculum;
use crate::quiz::{QuizQuestion, QUIZ_LENGTH};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("AI service request failed: {0}")]
    Service(#[source] BoxError),
    #[error("AI service returned a malformed response: {reason}")]
    MalformedResponse { reason: String, raw: String },
}

impl GatewayError {
    pub fn service(err: impl Into<BoxError>) -> Self {
        GatewayError::Service(err.into())
    }

    /// Raw response text, if the service answered with something unusable.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            GatewayError::MalformedResponse { raw, .. } => Some(raw),
            GatewayError::Service(_) => None,
        }
    }
}

/// A text completion backend.
///
/// When `schema` is given the reply must be JSON of that shape; otherwise it is prose.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, schema: Option<&Value>) -> Result<String, GatewayError>;
}

pub struct Gateway {
    generator: Arc<dyn TextGenerator>,
    language: Option<String>,
}

impl Gateway {
    pub fn new(generator: Arc<dyn TextGenerator>, language: Option<String>) -> Self {
        Self {
            generator,
            language,
        }
    }

    pub async fn structure_curriculum(&self, document: &str) -> Result<Curriculum, GatewayError> {
        log::debug!("Structuring a document of {} bytes", document.len());
        let prompt = prompts::structure_curriculum(document, self.language.as_deref());
        let schema = schema::curriculum();

        let response = self.generator.generate(&prompt, Some(&schema)).await?;
        let curriculum: Curriculum = decode(&response)?;

        log::debug!("Curriculum has {} lessons", curriculum.lessons.len());
        Ok(curriculum)
    }

    pub async fn generate_quiz(&self, document: &str) -> Result<Vec<QuizQuestion>, GatewayError> {
        log::debug!("Generating a quiz from a document of {} bytes", document.len());
        let prompt = prompts::generate_quiz(document, QUIZ_LENGTH, self.language.as_deref());
        let schema = schema::quiz();

        let response = self.generator.generate(&prompt, Some(&schema)).await?;
        let questions: Vec<QuizQuestion> = decode(&response)?;

        if questions.is_empty() {
            return Err(GatewayError::MalformedResponse {
                reason: "the quiz has no questions".to_string(),
                raw: response,
            });
        }
        if questions.len() != QUIZ_LENGTH {
            log::warn!(
                "Asked for {} quiz questions, got {}",
                QUIZ_LENGTH,
                questions.len()
            );
        }
        for question in questions.iter().filter(|q| !q.is_well_formed()) {
            // Kept as is: such a question simply cannot be answered correctly
            log::warn!("Quiz question without exactly one correct option: {:?}", question);
        }

        Ok(questions)
    }

    pub async fn answer_general_question(
        &self,
        document: &str,
        question: &str,
    ) -> Result<String, GatewayError> {
        log::debug!("Answering question: {:?}", question);
        let prompt = prompts::answer_question(document, question);
        let response = self.generator.generate(&prompt, None).await?;
        Ok(response.trim().to_string())
    }
}

/// Decodes a JSON reply, allowing for whitespace and one markdown code fence around it.
fn decode<T: DeserializeOwned>(response: &str) -> Result<T, GatewayError> {
    serde_json::from_str(strip_code_fence(response)).map_err(|err| {
        GatewayError::MalformedResponse {
            reason: err.to_string(),
            raw: response.to_string(),
        }
    })
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening fence line
    match body.split_once('\n') {
        Some((_, inner)) => inner.trim(),
        None => body.trim(),
    }
}

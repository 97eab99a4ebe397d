use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_DOCUMENT_BYTES: u32 = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{key} must be a positive integer, got {value:?}")]
    NotPositive { key: &'static str, value: String },
}

/// Settings read from the environment (and `.env`) at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub chatgpt_api_key: String,
    pub model: String,
    pub request_timeout: Duration,
    /// Language for generated lessons and quizzes; the document's own language if unset.
    pub curriculum_language: Option<String>,
    pub max_document_bytes: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let chatgpt_api_key = var("CHATGPT_API_KEY").ok_or(ConfigError::Missing("CHATGPT_API_KEY"))?;
        let model = var("CHATGPT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let timeout_secs = match var("CHATGPT_TIMEOUT_SECS") {
            Some(value) => positive("CHATGPT_TIMEOUT_SECS", value)?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let max_document_bytes = match var("MAX_DOCUMENT_BYTES") {
            Some(value) => positive("MAX_DOCUMENT_BYTES", value)?,
            None => DEFAULT_MAX_DOCUMENT_BYTES,
        };

        Ok(Self {
            chatgpt_api_key,
            model,
            request_timeout: Duration::from_secs(timeout_secs),
            curriculum_language: var("CURRICULUM_LANGUAGE"),
            max_document_bytes,
        })
    }
}

fn positive<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(parsed),
        _ => Err(ConfigError::NotPositive { key, value }),
    }
}

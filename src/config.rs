use log::LevelFilter;
use std::env;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub allowed_origin: String,
    pub log_level: LevelFilter,
    pub log_file: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub google_api_key: Option<String>,
    pub google_cse_id: Option<String>,
    pub google_search_url: String,
    pub perplexity_api_token: Option<String>,
    pub perplexity_url: String,
    pub perplexity_model: String,
    pub wikipedia_api_url: String,
    pub geodb_url: String,
    pub summary_sentences: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5001".to_string(),
            allowed_origin: "http://localhost:3000".to_string(),
            log_level: LevelFilter::Debug,
            log_file: "logs/movewise.log".to_string(),
            openai_api_key: None,
            openai_model: "gpt-3.5-turbo".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            google_api_key: None,
            google_cse_id: None,
            google_search_url: "https://www.googleapis.com/customsearch/v1".to_string(),
            perplexity_api_token: None,
            perplexity_url: "https://api.perplexity.ai/chat/completions".to_string(),
            perplexity_model: "llama-3.1-sonar-small-128k-online".to_string(),
            wikipedia_api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            geodb_url: "http://geodb-free-service.wirefreethought.com/v1/geo/cities".to_string(),
            summary_sentences: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str, default: String| -> String {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };
        let secret = |key: &str| -> Option<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let log_level = match secret("LOG_LEVEL") {
            Some(level) => LevelFilter::from_str(&level)
                .map_err(|_| format!("LOG_LEVEL has an invalid value: {}", level))?,
            None => defaults.log_level,
        };

        let summary_sentences = match secret("SUMMARY_SENTENCES") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(format!("SUMMARY_SENTENCES must be a positive integer, got {}", raw)),
            },
            None => defaults.summary_sentences,
        };

        Ok(Self {
            bind_address: get("BIND_ADDRESS", defaults.bind_address),
            allowed_origin: get("ALLOWED_ORIGIN", defaults.allowed_origin),
            log_level,
            log_file: get("LOG_FILE", defaults.log_file),
            openai_api_key: secret("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL", defaults.openai_model),
            openai_base_url: get("OPENAI_BASE_URL", defaults.openai_base_url),
            google_api_key: secret("GOOGLE_API_KEY"),
            google_cse_id: secret("GOOGLE_CSE_ID"),
            google_search_url: get("GOOGLE_SEARCH_URL", defaults.google_search_url),
            perplexity_api_token: secret("PERPLEXITY_API_TOKEN"),
            perplexity_url: get("PERPLEXITY_URL", defaults.perplexity_url),
            perplexity_model: get("PERPLEXITY_MODEL", defaults.perplexity_model),
            wikipedia_api_url: get("WIKIPEDIA_API_URL", defaults.wikipedia_api_url),
            geodb_url: get("GEODB_URL", defaults.geodb_url),
            summary_sentences,
        })
    }
}

/// Returns the credential or a configuration error naming the variable.
pub fn require<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, AppError> {
    value.as_deref().ok_or(AppError::Config(name))
}

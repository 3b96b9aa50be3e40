use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};
use log::{info, error, debug};

use crate::config::{self, Config};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system", content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user", content: content.into() }
    }
}

pub async fn chat(client: &Client, config: &Config, messages: &[ChatMessage]) -> Result<String, AppError> {
    info!("Calling OpenAI chat completions ({} messages, model {})", messages.len(), config.openai_model);
    let api_key = config::require(&config.openai_api_key, "OPENAI_API_KEY")?;
    let url = format!("{}/chat/completions", config.openai_base_url.trim_end_matches('/'));

    let payload = json!({
        "model": config.openai_model,
        "messages": messages,
    });

    let response = client.post(&url)
        .header("Authorization", format!("Bearer {}", api_key))
        .json(&payload)
        .send()
        .await?;

    // Error bodies are JSON too
    let status = response.status();
    let body = response.json::<Value>().await?;

    if !status.is_success() || body.get("error").is_some() {
        let message = body["error"]["message"].as_str().unwrap_or("Unknown error");
        error!("OpenAI API error. Status: {}, message: {}", status, message);
        return Err(AppError::upstream("OpenAI", format!("{} - {}", status, message)));
    }

    let content = first_choice_content(&body)
        .ok_or_else(|| AppError::upstream("OpenAI", "response contained no choices"))?;
    debug!("OpenAI returned {} characters", content.len());
    Ok(content)
}

pub fn first_choice_content(body: &Value) -> Option<String> {
    body["choices"][0]["message"]["content"].as_str().map(String::from)
}

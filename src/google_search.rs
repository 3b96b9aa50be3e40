use reqwest::Client;
use serde_json::Value;
use log::{info, debug, warn};

use crate::config::{self, Config};
use crate::error::AppError;

pub const NO_RESULT: &str = "No good Google Search Result was found";

pub async fn search(client: &Client, config: &Config, query: &str) -> Result<String, AppError> {
    info!("Searching Google for: {}", query);
    let api_key = config::require(&config.google_api_key, "GOOGLE_API_KEY")?;
    let cse_id = config::require(&config.google_cse_id, "GOOGLE_CSE_ID")?;

    let params = [
        ("key", api_key),
        ("cx", cse_id),
        ("q", query),
        ("num", "10"),
    ];

    let response = client.get(&config.google_search_url)
        .query(&params)
        .send()
        .await?
        .json::<Value>()
        .await?;

    if let Some(error) = response.get("error") {
        let message = error["message"].as_str().unwrap_or("Unknown error");
        warn!("Google Search API error: {}", message);
        return Err(AppError::upstream("Google Search", message));
    }

    // Snippets only, titles and links are noise for the model
    let text = join_snippets(&response);
    debug!("Search for '{}' produced {} characters", query, text.len());
    Ok(text)
}

fn join_snippets(response: &Value) -> String {
    let snippets: Vec<String> = response["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["snippet"].as_str())
                .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if snippets.is_empty() {
        NO_RESULT.to_string()
    } else {
        snippets.join(" ")
    }
}

use reqwest::Client;
use serde_json::{json, Value};
use log::{info, error, debug};

use crate::config::{self, Config};
use crate::error::AppError;
use crate::openai;
use crate::utils;

const USER_PROMPT: &str = r#"Provide cost of living information in this YAML structure:

```yaml
city_name:
  housing:
    rent_1bed: value
    rent_2bed: value
    home_price: value
  daily_costs:
    meal_out: value
    coffee: value
    transport: value
  monthly_costs:
    utilities: value
    internet: value
    groceries: value
  salary:
    average_salary: value
```"#;

pub fn system_prompt(city: &str) -> String {
    format!(
        "Please help me find the average cost of living for {}. Format your response as valid YAML with the following rules:
- Do not use colons within value strings
- Use '-' for list items
- Use key_names_with_underscores
- Structure data hierarchically
- Start response with three backticks and yaml
- End response with three backticks",
        city
    )
}

pub fn build_payload(model: &str, city: &str) -> Value {
    json!({
        "model": model,
        "messages": [
            {"role": "system", "content": system_prompt(city)},
            {"role": "user", "content": USER_PROMPT}
        ],
        "temperature": 0.2,
        "top_p": 0.9,
        "return_citations": true,
        "search_domain_filter": ["perplexity.ai"],
        "return_images": false,
        "return_related_questions": false,
        "search_recency_filter": "month",
        "top_k": 0,
        "stream": false,
        "presence_penalty": 0,
        "frequency_penalty": 1
    })
}

pub async fn cost_of_living(client: &Client, config: &Config, city: &str) -> Result<Value, AppError> {
    info!("Requesting cost of living for {} from Perplexity", city);
    let token = config::require(&config.perplexity_api_token, "PERPLEXITY_API_TOKEN")?;

    let response = client.post(&config.perplexity_url)
        .header("Authorization", format!("Bearer {}", token))
        .json(&build_payload(&config.perplexity_model, city))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await?;
        error!("Perplexity request failed. Status: {}, body: {}", status, body);
        return Err(AppError::upstream("Perplexity", format!("{} - {}", status, body)));
    }

    // Content comes back fenced as ```yaml
    let body = response.json::<Value>().await?;
    let content = openai::first_choice_content(&body)
        .ok_or_else(|| AppError::upstream("Perplexity", "response contained no choices"))?;
    debug!("Perplexity content: {}", content);

    let breakdown = utils::parse_yaml_document(&content)?;
    if !breakdown.is_object() {
        return Err(AppError::upstream("Perplexity", "cost of living is not a YAML mapping"));
    }
    Ok(breakdown)
}

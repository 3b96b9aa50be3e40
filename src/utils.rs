use log::{debug, error};
use serde_json::Value as Json;
use serde_yaml::Value as Yaml;

use crate::error::AppError;

const MAX_CITY_NAME_LEN: usize = 100;

/// Trims a city name and rejects blank or oversized input.
pub fn validate_city_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        error!("City name is empty");
        return Err(AppError::invalid("City name must not be empty"));
    }
    if trimmed.chars().count() > MAX_CITY_NAME_LEN {
        error!("City name exceeds maximum length");
        return Err(AppError::invalid(format!(
            "City name exceeds maximum length of {} characters",
            MAX_CITY_NAME_LEN
        )));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        error!("City name contains control characters");
        return Err(AppError::invalid("City name contains control characters"));
    }
    debug!("Validated city name: {}", trimmed);
    Ok(trimmed.to_string())
}

/// Drops markdown code fences the models like to wrap YAML in.
pub fn strip_code_fences(content: &str) -> String {
    content
        .replace("```yaml", "")
        .replace("```yml", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parses model output as YAML (fences tolerated) and converts it to JSON.
pub fn parse_yaml_document(content: &str) -> Result<Json, AppError> {
    let cleaned = strip_code_fences(content);
    let document: Yaml = serde_yaml::from_str(&cleaned)?;
    Ok(yaml_to_json(document))
}

/// Mapping keys become strings; tags are dropped.
pub fn yaml_to_json(value: Yaml) -> Json {
    match value {
        Yaml::Null => Json::Null,
        Yaml::Bool(b) => Json::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Json::from(i)
            } else if let Some(u) = n.as_u64() {
                Json::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Json::Number)
                    .unwrap_or(Json::Null)
            }
        }
        Yaml::String(s) => Json::String(s),
        Yaml::Sequence(items) => Json::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => Json::Object(
            mapping
                .into_iter()
                .map(|(k, v)| (yaml_key(k), yaml_to_json(v)))
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: Yaml) -> String {
    match key {
        Yaml::String(s) => s,
        Yaml::Null => "null".to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

pub fn mask_api_key(key: &str) -> String {
    let visible: String = key.chars().take(5).collect();
    let hidden = key.chars().count().saturating_sub(5);
    format!("{}{}", visible, "*".repeat(hidden))
}

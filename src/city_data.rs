use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value as Yaml};
use log::{info, debug, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::google_search;
use crate::openai::{self, ChatMessage};
use crate::utils;

pub const MAX_CITIES: usize = 10;

/// Search key and query template; `{city}` is substituted.
pub const SEARCH_QUERIES: [(&str, &str); 4] = [
    ("cost_of_living", "Average Monthly Cost of Living {city}"),
    ("average_home_price", "Average Home Price in {city}"),
    ("average_salary", "Average Yearly Salary in {city}"),
    ("average_rent", "Average Monthly Rent in {city}"),
];

const FORMAT_INSTRUCTIONS: &str = r#"
Based on the information provided, answer these 4 questions for each city:
    Average Salary (yearly):
    Average Rent (monthly):
    Average Cost of Living With Rent (monthly):
    Average Home Price:

Return only the numbers, no additional text or formatting.
Provide information in a clean YAML format with no additional symbols, such as asterisks, hyphens or parentheses. Each section should contain only the content without extra formatting or emphasis symbols.

This is just an example of the format:

New York:
  name: New York
  average_salary: ...
  average_rent: ...
  cost_of_living: ...
  home_price: ...
Chicago:
  name: Chicago
  average_salary: ...
  average_rent: ...
  cost_of_living: ...
  home_price: ...
"#;

#[derive(Debug, Deserialize)]
pub struct CityDataRequest {
    pub city: String,
    #[serde(default)]
    pub nearby_cities: Option<Vec<String>>,
}

impl CityDataRequest {
    pub fn expected_format() -> serde_json::Value {
        serde_json::json!({
            "city": "Durham",
            "nearby_cities": ["Raleigh", "Chapel Hill"]
        })
    }

    /// Target city first, then nearby cities; case-insensitive duplicates dropped.
    pub fn cities(&self) -> Result<Vec<String>, AppError> {
        let mut cities: Vec<String> = Vec::new();
        for raw in std::iter::once(&self.city).chain(self.nearby_cities.iter().flatten()) {
            let city = utils::validate_city_name(raw)?;
            if !cities.iter().any(|c| c.to_lowercase() == city.to_lowercase()) {
                cities.push(city);
            }
        }
        if cities.len() > MAX_CITIES {
            return Err(AppError::invalid(format!(
                "At most {} cities can be compared at once, got {}",
                MAX_CITIES,
                cities.len()
            )));
        }
        Ok(cities)
    }
}

/// A figure as the model wrote it: a number when it gave one, its text otherwise.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Figure {
    Number(serde_json::Number),
    Text(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CityRecord {
    pub name: String,
    pub average_salary: Option<Figure>,
    pub average_rent: Option<Figure>,
    pub cost_of_living: Option<Figure>,
    pub home_price: Option<Figure>,
}

#[derive(Debug, Serialize)]
pub struct CityDataResponse {
    pub cities: Vec<CityRecord>,
}

#[derive(Debug)]
pub struct CitySearchResults {
    pub city: String,
    pub results: Vec<(&'static str, String)>,
}

pub fn build_query(template: &str, city: &str) -> String {
    template.replace("{city}", city)
}

pub async fn gather_search_results(
    client: &Client,
    config: &Config,
    cities: &[String],
) -> Result<Vec<CitySearchResults>, AppError> {
    let mut gathered = Vec::with_capacity(cities.len());
    for city in cities {
        let [(k0, t0), (k1, t1), (k2, t2), (k3, t3)] = SEARCH_QUERIES;
        let (q0, q1, q2, q3) = (
            build_query(t0, city),
            build_query(t1, city),
            build_query(t2, city),
            build_query(t3, city),
        );
        let (r0, r1, r2, r3) = tokio::try_join!(
            google_search::search(client, config, &q0),
            google_search::search(client, config, &q1),
            google_search::search(client, config, &q2),
            google_search::search(client, config, &q3),
        )?;
        debug!("Collected search results for {}", city);
        gathered.push(CitySearchResults {
            city: city.clone(),
            results: vec![(k0, r0), (k1, r1), (k2, r2), (k3, r3)],
        });
    }
    Ok(gathered)
}

pub fn render_search_results(gathered: &[CitySearchResults]) -> String {
    let mut out = String::new();
    for entry in gathered {
        out.push_str(&entry.city);
        out.push_str(":\n");
        for (key, text) in &entry.results {
            out.push_str(&format!("  {}: {}\n", key, text));
        }
    }
    out
}

pub fn build_messages(gathered: &[CitySearchResults]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::user(format!(
            "Analyze the Google Results Below: \n{}",
            render_search_results(gathered)
        )),
        ChatMessage::user(FORMAT_INSTRUCTIONS),
    ]
}

/// Reads the model's YAML mapping of city name to figures, in the order written.
pub fn parse_city_records(content: &str) -> Result<Vec<CityRecord>, AppError> {
    let cleaned = utils::strip_code_fences(content);
    let document: Yaml = serde_yaml::from_str(&cleaned)?;
    let mapping = match document {
        Yaml::Mapping(mapping) => mapping,
        _ => return Err(AppError::upstream("OpenAI", "city data is not a YAML mapping")),
    };

    // A lone city sometimes comes back unnested
    if let Some(Yaml::String(name)) = mapping.get("name") {
        debug!("City data is a single flat record for {}", name);
        let name = name.clone();
        return Ok(vec![city_record(name, &mapping)]);
    }

    let mut records = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let key = match key {
            Yaml::String(s) => s,
            other => utils::yaml_to_json(other).to_string(),
        };
        match value {
            Yaml::Mapping(fields) => records.push(city_record(key, &fields)),
            _ => warn!("Skipping city entry '{}' without fields", key),
        }
    }

    if records.is_empty() {
        return Err(AppError::upstream("OpenAI", "city data contained no city entries"));
    }
    Ok(records)
}

fn city_record(key: String, fields: &Mapping) -> CityRecord {
    let name = match fields.get("name") {
        Some(Yaml::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => key,
    };
    CityRecord {
        name,
        average_salary: figure(fields.get("average_salary")),
        average_rent: figure(fields.get("average_rent")),
        cost_of_living: figure(fields.get("cost_of_living")),
        home_price: figure(fields.get("home_price")),
    }
}

fn figure(value: Option<&Yaml>) -> Option<Figure> {
    match utils::yaml_to_json(value?.clone()) {
        serde_json::Value::Null => None,
        serde_json::Value::Number(n) => Some(Figure::Number(n)),
        serde_json::Value::String(s) => Some(Figure::Text(s.trim().to_string())),
        other => Some(Figure::Text(other.to_string())),
    }
}

pub async fn generate_city_data(
    client: &Client,
    config: &Config,
    cities: &[String],
) -> Result<Vec<CityRecord>, AppError> {
    info!("Generating city data for {:?}", cities);
    let gathered = gather_search_results(client, config, cities).await?;
    let content = openai::chat(client, config, &build_messages(&gathered)).await?;
    debug!("Model city data: {}", content);
    let records = parse_city_records(&content)?;
    info!("Parsed {} city records", records.len());
    Ok(records)
}

use reqwest::Client;
use serde::{Deserialize, Serialize};
use log::{info, debug, warn};

use crate::config::Config;
use crate::error::AppError;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CityMatch {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub population: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct CitiesResponse {
    #[serde(default)]
    data: Vec<CityMatch>,
}

pub async fn find_city(client: &Client, config: &Config, name: &str) -> Result<Option<CityMatch>, AppError> {
    info!("Looking up GeoDB city id for {}", name);
    let params = [
        ("namePrefix", name),
        ("limit", "1"),
        ("types", "CITY"),
    ];

    let response = client.get(&config.geodb_url)
        .query(&params)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        warn!("Error fetching city details: {}", status);
        return Err(AppError::upstream("GeoDB", format!("status {}", status)));
    }

    let cities = response.json::<CitiesResponse>().await?;
    debug!("GeoDB returned {} matches", cities.data.len());
    Ok(cities.data.into_iter().next())
}

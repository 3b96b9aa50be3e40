use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use url::Url;
use log::{info, debug, warn};

use crate::config::Config;
use crate::error::AppError;

const ECONOMY_SECTION: &str = "Economy";
const LEAD_SECTION: &str = "Introduction";
const ABBREVIATIONS: [&str; 14] = [
    "mr", "mrs", "ms", "dr", "st", "jr", "sr", "inc", "co", "corp", "ltd", "vs", "etc", "mt",
];

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EconomicSummary {
    pub city: String,
    pub title: String,
    pub section: String,
    pub summary: String,
    pub source_url: String,
}

struct Page {
    title: String,
    extract: String,
}

pub async fn economic_summary(client: &Client, config: &Config, city: &str) -> Result<EconomicSummary, AppError> {
    info!("Building economic summary for {}", city);
    let page = fetch_extract(client, config, city).await?;

    let (section, text) = match economy_section(&page.extract) {
        Some(text) => (ECONOMY_SECTION.to_string(), text),
        None => {
            warn!("No economy section on '{}', falling back to the lead", page.title);
            (LEAD_SECTION.to_string(), lead_section(&page.extract))
        }
    };

    let summary = first_sentences(&text, config.summary_sentences);
    debug!("Summary for '{}' has {} characters", page.title, summary.len());

    Ok(EconomicSummary {
        city: city.to_string(),
        source_url: article_url(&config.wikipedia_api_url, &page.title)?,
        title: page.title,
        section,
        summary,
    })
}

async fn fetch_extract(client: &Client, config: &Config, city: &str) -> Result<Page, AppError> {
    let params = [
        ("action", "query"),
        ("prop", "extracts"),
        ("explaintext", "1"),
        ("redirects", "1"),
        ("format", "json"),
        ("formatversion", "2"),
        ("titles", city),
    ];

    let response = client.get(&config.wikipedia_api_url)
        .query(&params)
        .send()
        .await?
        .json::<Value>()
        .await?;

    if let Some(error) = response.get("error") {
        let message = error["info"].as_str().unwrap_or("Unknown error");
        return Err(AppError::upstream("Wikipedia", message));
    }

    let page = &response["query"]["pages"][0];
    if page.is_null() || page["missing"].as_bool().unwrap_or(false) || page.get("invalid").is_some() {
        return Err(AppError::NotFound(format!("No Wikipedia article found for '{}'", city)));
    }

    Ok(Page {
        title: page["title"].as_str().unwrap_or(city).to_string(),
        extract: page["extract"].as_str().unwrap_or_default().to_string(),
    })
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim();
    if !trimmed.starts_with("==") || !trimmed.ends_with("==") || trimmed.len() < 4 {
        return None;
    }
    let level = trimmed.chars().take_while(|c| *c == '=').count();
    let title = trimmed.trim_matches('=').trim();
    Some((level, title))
}

/// Body of the first level-2 section whose title starts with "Economy", without its subheadings.
pub fn economy_section(extract: &str) -> Option<String> {
    let mut lines = extract.lines();
    lines.find(|line| {
        matches!(heading(line), Some((2, title)) if title.to_lowercase().starts_with("economy"))
    })?;

    let body: Vec<&str> = lines
        .take_while(|line| !matches!(heading(line), Some((2, _))))
        .filter(|line| heading(line).is_none())
        .collect();
    let body = body.join("\n").trim().to_string();
    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}

pub fn lead_section(extract: &str) -> String {
    extract
        .lines()
        .take_while(|line| heading(line).is_none())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Extractive summary: the first `count` sentences with whitespace collapsed.
pub fn first_sentences(text: &str, count: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut taken = 0;
    let mut end = words.len();
    for (i, word) in words.iter().enumerate() {
        if ends_sentence(word) {
            taken += 1;
            if taken == count {
                end = i + 1;
                break;
            }
        }
    }
    words[..end].join(" ")
}

fn ends_sentence(word: &str) -> bool {
    let word = word.trim_end_matches(|c: char| c == '"' || c == '\'' || c == ')');
    if !(word.ends_with('.') || word.ends_with('!') || word.ends_with('?')) {
        return false;
    }
    if !word.ends_with('.') {
        return true;
    }
    let stem = word.trim_end_matches('.');
    let single_letter = stem.chars().count() == 1 && stem.chars().all(char::is_alphabetic);
    !(single_letter || stem.contains('.') || ABBREVIATIONS.contains(&stem.to_lowercase().as_str()))
}

fn article_url(api_url: &str, title: &str) -> Result<String, AppError> {
    let mut url = Url::parse(api_url)
        .map_err(|e| AppError::upstream("Wikipedia", format!("invalid API URL: {}", e)))?;
    url.set_path(&format!("/wiki/{}", title.replace(' ', "_")));
    url.set_query(None);
    Ok(url.to_string())
}

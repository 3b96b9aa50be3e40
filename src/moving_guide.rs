use reqwest::Client;
use serde_json::Value;
use log::{info, debug};

use crate::config::Config;
use crate::error::AppError;
use crate::openai::{self, ChatMessage};
use crate::utils;

const SYSTEM_PROMPT: &str = "You are an assistant that provides detailed relocation advice.";

pub const CATEGORIES: [&str; 4] = [
    "Opportunities",
    "Moving Cost Estimation",
    "Saving Goals And Timeline",
    "Relocation Guide",
];

pub fn build_prompt(city: &str) -> String {
    let categories: String = CATEGORIES
        .iter()
        .map(|c| format!("    - {}:\n", c))
        .collect();
    format!(
        r#"
I am creating a Money Cost Calculator for people looking to move to {city} for better opportunities. Please provide a detailed explanation for the following categories:

{categories}
Describe all aspects of these categories we should consider when relocating.
Structure the information to be informative, concise, and actionable.
Each of the 4 Categories should have one block of content with all the information in a single string.
This is supposed to help the user understand financially what they need to move, so include financial estimations with values.
The content of each category should answer questions such as: an estimated breakdown of typical moving expenses, a total savings goal for the move, a step-by-step checklist for moving including tasks before, during and after the move.

Format the content with clear and attractive text, using well-organized text and numbers, separated by new lines where possible.
Format the categories in Title Case.
Provide information in a clean YAML format with no additional symbols, such as asterisks, hyphens or parentheses. Each section should contain only the content without extra formatting or emphasis symbols.
Don't return anything other than the YAML content.
"#,
        city = city,
        categories = categories,
    )
}

pub async fn generate_moving_guide(client: &Client, config: &Config, city: &str) -> Result<Value, AppError> {
    info!("Generating moving guide for {}", city);
    let messages = [
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(build_prompt(city)),
    ];
    let content = openai::chat(client, config, &messages).await?;
    debug!("Model moving guide: {}", content);

    let guide = utils::parse_yaml_document(&content)?;
    if !guide.is_object() {
        return Err(AppError::upstream("OpenAI", "moving guide is not a YAML mapping"));
    }
    Ok(guide)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use actix_web::HttpResponse;
    use serde_json::json;

    #[test]
    fn prompt_names_city_and_categories() {
        let prompt = build_prompt("Durham");
        assert!(prompt.contains("move to Durham"));
        for category in CATEGORIES {
            assert!(prompt.contains(&format!("- {}:", category)));
        }
    }

    #[actix_web::test]
    async fn guide_is_parsed_from_fenced_yaml() {
        let upstream = test_support::spawn(|_| {
            HttpResponse::Ok().json(json!({"choices": [{"message": {"content":
                "```yaml\nOpportunities: Research Triangle jobs\nMoving Cost Estimation: |\n  Truck 1500\n  Deposit 1200\n```"
            }}]}))
        })
        .await;

        let guide = generate_moving_guide(&Client::new(), &upstream.config(), "Durham").await.unwrap();
        assert_eq!(guide["Opportunities"], "Research Triangle jobs");
        assert_eq!(guide["Moving Cost Estimation"], "Truck 1500\nDeposit 1200\n");

        let request = &upstream.requests()[0];
        assert_eq!(request.body["messages"][0]["content"], SYSTEM_PROMPT);
    }

    #[actix_web::test]
    async fn plain_text_reply_is_rejected() {
        let upstream = test_support::spawn(|_| {
            HttpResponse::Ok().json(json!({"choices": [{"message": {"content": "Sorry, I cannot help."}}]}))
        })
        .await;

        let err = generate_moving_guide(&Client::new(), &upstream.config(), "Durham").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream { .. }));
    }
}

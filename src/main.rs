use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use reqwest::Client;
use std::env;
use log::info;

mod city_data;
mod config;
mod error;
mod geodb;
mod google_search;
mod logging;
mod moving_guide;
mod openai;
mod perplexity;
mod routes;
mod utils;
mod wikipedia;
#[cfg(test)]
mod test_support;

use config::Config;

fn log_environment_variables() {
    let mut env_vars = std::collections::BTreeMap::new();
    for (key, value) in env::vars() {
        let upper = key.to_uppercase();
        if upper == "OPENAI_API_KEY" {
            env_vars.insert(key, utils::mask_api_key(&value));
        } else if upper.contains("KEY") || upper.contains("TOKEN") || upper.contains("SECRET") {
            env_vars.insert(key, "*".repeat(8));
        } else {
            env_vars.insert(key, value);
        }
    }
    match serde_json::to_string_pretty(&env_vars) {
        Ok(rendered) => info!("Environment variables: {}", rendered),
        Err(e) => info!("Environment variables could not be rendered: {}", e),
    }
}

fn init_logging(config: &Config) -> std::io::Result<()> {
    logging::setup_logging(&config.log_file, config.log_level).map_err(|e| {
        eprintln!("Failed to set up logging: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    // Bad numeric values abort startup, missing credentials do not
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };

    init_logging(&config)?;

    log_environment_variables();

    // One pooled client shared by every worker
    let client = Client::new();
    let bind_address = config.bind_address.clone();
    let config = web::Data::new(config);

    info!("Starting movewise server on {}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&config.allowed_origin)
            .allowed_methods(vec!["GET", "POST"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(client.clone()))
            .app_data(config.clone())
            .configure(routes::configure)
    })
    .bind(bind_address)?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unusable_log_path_is_a_startup_error() {
        let config = Config {
            log_file: "/dev/null/movewise/app.log".to_string(),
            ..Config::default()
        };
        let err = init_logging(&config).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Other);
    }
}

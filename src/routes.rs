use actix_web::{web, HttpResponse, Responder};
use reqwest::Client;
use log::{info, error, debug};

use crate::city_data::{self, CityDataRequest, CityDataResponse};
use crate::config::Config;
use crate::error::AppError;
use crate::{geodb, moving_guide, perplexity, utils, wikipedia};

fn request_id() -> String {
    chrono::Utc::now().format("%Y%m%d%H%M%S%f").to_string()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/city-data", web::post().to(city_data))
        .route("/city-details/{city}", web::get().to(city_details))
        .route("/cost-of-living/{city}", web::get().to(cost_of_living))
        .route("/economy/{city}", web::get().to(economy))
        .route("/city-id/{city}", web::get().to(city_id));
}

async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "message": "Server is running"
    }))
}

async fn city_data(
    body: web::Bytes,
    client: web::Data<Client>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let request_id = request_id();
    info!("Request {}: City data request received", request_id);
    debug!("Request {}: Raw request body: {}", request_id, String::from_utf8_lossy(&body));

    let req = serde_json::from_slice::<CityDataRequest>(&body).map_err(|e| {
        let message = format!("Invalid request format: {}", e);
        error!("Request {}: {}", request_id, message);
        AppError::invalid_with_format(message, CityDataRequest::expected_format())
    })?;

    let cities = req.cities().map_err(|e| {
        error!("Request {}: City validation failed: {}", request_id, e);
        e
    })?;
    info!("Request {}: Aggregating data for {:?}", request_id, cities);

    let records = city_data::generate_city_data(&client, &config, &cities).await.map_err(|e| {
        error!("Request {}: Error generating city data: {}", request_id, e);
        e
    })?;

    info!("Request {}: Returning {} city records", request_id, records.len());
    Ok(HttpResponse::Ok().json(CityDataResponse { cities: records }))
}

async fn city_details(
    path: web::Path<String>,
    client: web::Data<Client>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let request_id = request_id();
    let city = utils::validate_city_name(&path)?;
    info!("Request {}: Moving guide requested for {}", request_id, city);

    let guide = moving_guide::generate_moving_guide(&client, &config, &city).await.map_err(|e| {
        error!("Request {}: Error generating moving guide: {}", request_id, e);
        e
    })?;

    info!("Request {}: Moving guide ready", request_id);
    Ok(HttpResponse::Ok().json(guide))
}

async fn cost_of_living(
    path: web::Path<String>,
    client: web::Data<Client>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let request_id = request_id();
    let city = utils::validate_city_name(&path)?;
    info!("Request {}: Cost of living requested for {}", request_id, city);

    let breakdown = perplexity::cost_of_living(&client, &config, &city).await.map_err(|e| {
        error!("Request {}: Error fetching cost of living: {}", request_id, e);
        e
    })?;

    Ok(HttpResponse::Ok().json(breakdown))
}

async fn economy(
    path: web::Path<String>,
    client: web::Data<Client>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let request_id = request_id();
    let city = utils::validate_city_name(&path)?;
    info!("Request {}: Economic summary requested for {}", request_id, city);

    let summary = wikipedia::economic_summary(&client, &config, &city).await.map_err(|e| {
        error!("Request {}: Error building economic summary: {}", request_id, e);
        e
    })?;

    Ok(HttpResponse::Ok().json(summary))
}

async fn city_id(
    path: web::Path<String>,
    client: web::Data<Client>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let request_id = request_id();
    let city = utils::validate_city_name(&path)?;
    info!("Request {}: City id requested for {}", request_id, city);

    match geodb::find_city(&client, &config, &city).await? {
        Some(found) => {
            info!("Request {}: Found city id {}", request_id, found.id);
            Ok(HttpResponse::Ok().json(found))
        }
        None => Err(AppError::NotFound(format!("City '{}' not found", city))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    macro_rules! app {
        ($config:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(Client::new()))
                    .app_data(web::Data::new($config))
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn health() {
        test_support::init_logging();
        let app = app!(Config::default());
        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
    }

    #[actix_web::test]
    async fn malformed_body_returns_expected_format() {
        let app = app!(Config::default());
        let req = test::TestRequest::post()
            .uri("/city-data")
            .insert_header(("Content-Type", "application/json"))
            .set_payload(r#"{"town": "Durham"}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request format"));
        assert_eq!(body["expected_format"]["city"], "Durham");
    }

    #[actix_web::test]
    async fn blank_city_in_path_is_rejected() {
        let app = app!(Config::default());
        let req = test::TestRequest::get().uri("/economy/%20%20").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn missing_credentials_are_a_server_error() {
        let app = app!(Config::default());
        let req = test::TestRequest::get().uri("/city-details/Durham").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Missing configuration: OPENAI_API_KEY is not set");
    }

    #[actix_web::test]
    async fn city_data_end_to_end() {
        let upstream = test_support::spawn(|req| {
            if req.path == "/customsearch/v1" {
                actix_web::HttpResponse::Ok().json(json!({"items": [{"snippet": "numbers"}]}))
            } else {
                actix_web::HttpResponse::Ok().json(json!({"choices": [{"message": {"content":
                    "Durham:\n  name: Durham\n  average_salary: 65000\nRaleigh:\n  name: Raleigh\n  average_salary: 70000\n"
                }}]}))
            }
        })
        .await;
        let app = app!(upstream.config());

        let req = test::TestRequest::post()
            .uri("/city-data")
            .set_json(json!({"city": "Durham", "nearby_cities": ["Raleigh"]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["cities"][0]["name"], "Durham");
        assert_eq!(body["cities"][1]["average_salary"], 70000);
        assert!(body["cities"][1]["home_price"].is_null());
    }

    #[actix_web::test]
    async fn unparseable_model_output_is_bad_gateway() {
        let upstream = test_support::spawn(|_| {
            actix_web::HttpResponse::Ok().json(json!({"choices": [{"message": {"content": "Opportunities: [unclosed"}}]}))
        })
        .await;
        let app = app!(upstream.config());

        let req = test::TestRequest::get().uri("/city-details/Durham").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[actix_web::test]
    async fn unknown_city_id_is_not_found() {
        let upstream = test_support::spawn(|_| actix_web::HttpResponse::Ok().json(json!({"data": []}))).await;
        let app = app!(upstream.config());

        let req = test::TestRequest::get().uri("/city-id/Atlantis").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "City 'Atlantis' not found");
    }
}

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    pub body: Value,
}

pub struct FakeUpstream {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeUpstream {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn config(&self) -> Config {
        Config {
            openai_api_key: Some("sk-test".to_string()),
            openai_base_url: self.url.clone(),
            google_api_key: Some("google-key".to_string()),
            google_cse_id: Some("cse-id".to_string()),
            google_search_url: format!("{}/customsearch/v1", self.url),
            perplexity_api_token: Some("pplx-test".to_string()),
            perplexity_url: format!("{}/perplexity/chat/completions", self.url),
            wikipedia_api_url: format!("{}/w/api.php", self.url),
            geodb_url: format!("{}/v1/geo/cities", self.url),
            ..Config::default()
        }
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub async fn spawn<F>(handler: F) -> FakeUpstream
where
    F: Fn(&Recorded) -> HttpResponse + Send + Sync + Clone + 'static,
{
    init_logging();
    let requests: Arc<Mutex<Vec<Recorded>>> = Arc::default();
    let log = requests.clone();

    let server = HttpServer::new(move || {
        let handler = handler.clone();
        let log = log.clone();
        App::new().default_service(web::to(move |req: HttpRequest, body: web::Bytes| {
            let handler = handler.clone();
            let log = log.clone();
            async move {
                let recorded = Recorded {
                    path: req.path().to_string(),
                    query: url::form_urlencoded::parse(req.query_string().as_bytes())
                        .into_owned()
                        .collect(),
                    authorization: req
                        .headers()
                        .get("Authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(String::from),
                    body: serde_json::from_slice(&body).unwrap_or(Value::Null),
                };
                log.lock().unwrap().push(recorded.clone());
                handler(&recorded)
            }
        }))
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .unwrap();

    // Ephemeral port, read back after bind
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());

    FakeUpstream {
        url: format!("http://{}", addr),
        requests,
    }
}

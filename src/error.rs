use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{message}")]
    InvalidRequest {
        message: String,
        expected_format: Option<serde_json::Value>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("Missing configuration: {0} is not set")]
    Config(&'static str),

    #[error("{service} error: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model output is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_format: Option<serde_json::Value>,
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidRequest {
            message: message.into(),
            expected_format: None,
        }
    }

    pub fn invalid_with_format(message: impl Into<String>, expected_format: serde_json::Value) -> Self {
        AppError::InvalidRequest {
            message: message.into(),
            expected_format: Some(expected_format),
        }
    }

    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        AppError::Upstream {
            service,
            message: message.into(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Upstream { .. } | AppError::Http(_) | AppError::Yaml(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Responding {}: {}", status, self);
        }
        let expected_format = match self {
            AppError::InvalidRequest { expected_format, .. } => expected_format.clone(),
            _ => None,
        };
        HttpResponse::build(status).json(ErrorResponse {
            error: self.to_string(),
            expected_format,
        })
    }
}

//! Error taxonomy for everything the API returns.
//!
//! # Design Decisions
//! - Clients only ever see the fixed public message for a code
//! - Internal detail stays in logs and spans
//! - Every error carries the request ID once it leaves an endpoint

use std::error::Error as StdError;

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tonic::metadata::MetadataValue;

use crate::context::RequestId;
use crate::http::middleware::X_REQUEST_ID;

pub const X_ERROR_NAME: &str = "x-error-name";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthenticated,
    AccessDenied,
    Fault,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 3] = [
        ErrorCode::Unauthenticated,
        ErrorCode::AccessDenied,
        ErrorCode::Fault,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::Unauthenticated => "unauthenticated",
            ErrorCode::AccessDenied => "access_denied",
            ErrorCode::Fault => "fault",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::AccessDenied => StatusCode::FORBIDDEN,
            ErrorCode::Fault => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn grpc_code(&self) -> tonic::Code {
        match self {
            ErrorCode::Unauthenticated => tonic::Code::Unauthenticated,
            ErrorCode::AccessDenied => tonic::Code::PermissionDenied,
            ErrorCode::Fault => tonic::Code::Internal,
        }
    }

    /// The only message a client ever sees for this code.
    pub fn public_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthenticated => "invalid access credentials",
            ErrorCode::AccessDenied => "unauthorized, access denied",
            ErrorCode::Fault => "an unexpected error occurred",
        }
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, ErrorCode::Fault)
    }
}

#[derive(Debug, Error)]
#[error("{}: {}", .code.name(), .detail)]
pub struct ApiError {
    code: ErrorCode,
    detail: String,
    request_id: Option<RequestId>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

/// JSON body of an HTTP error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub name: String,
    pub id: String,
    pub message: String,
    pub fault: bool,
}

impl ApiError {
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
            request_id: None,
            source: None,
        }
    }

    pub fn unauthenticated(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthenticated, detail)
    }

    pub fn access_denied(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::AccessDenied, detail)
    }

    pub fn fault(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::Fault, detail)
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_request_id(mut self, id: RequestId) -> Self {
        self.request_id = Some(id);
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn request_id(&self) -> Option<RequestId> {
        self.request_id
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            name: self.code.name().to_string(),
            id: self.request_id.map(|id| id.to_string()).unwrap_or_default(),
            message: self.code.public_message().to_string(),
            fault: self.code.is_fault(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.code.http_status(), Json(self.body())).into_response();
        if let Some(id) = self.request_id {
            if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
                response.headers_mut().insert(X_REQUEST_ID, value);
            }
        }
        response
    }
}

impl From<ApiError> for tonic::Status {
    fn from(err: ApiError) -> Self {
        let mut status = tonic::Status::new(err.code.grpc_code(), err.code.public_message());
        let metadata = status.metadata_mut();
        metadata.insert(X_ERROR_NAME, MetadataValue::from_static(err.code.name()));
        if let Some(id) = err.request_id {
            if let Ok(value) = id.to_string().parse() {
                metadata.insert(X_REQUEST_ID, value);
            }
        }
        status
    }
}

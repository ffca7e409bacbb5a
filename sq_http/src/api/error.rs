use aide::OperationIo;
use axum::extract::rejection::*;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_jsonschema::JsonSchemaRejection;
use error_set::error_set;
use schemars::JsonSchema;
use serde::Serialize;
use sq_system::SystemError;
use crate::api::extractor::Json;

error_set! {
    #[derive(OperationIo)]
    ApiError = {
        #[display("{0}")]
        System(SystemError),
        #[display("Internal error, please submit a bug report: {0}")]
        Other(eyre::Error),
        #[display("JSON validation error {source:?}")]
        Json {
            source: JsonSchemaRejection
        },
        #[display("Path validation error {source:?}")]
        Path {
            source: PathRejection
        },
        #[display("Query validation error {source:?}")]
        Query {
            source: QueryRejection
        },
    };
}

#[derive(serde::Serialize, serde::Deserialize, JsonSchema, Clone, Debug, PartialEq, Eq)]
pub struct ApiResponseError<T> {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<T>,
}

impl ApiResponseError<()> {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
            details: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponseError<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            ApiError::System(e) => system_error_response(e),
            ApiError::Other(e) => {
                tracing::error!("Internal error occurred: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string(), None)
            }
            ApiError::Json { source } => json_rejection_response(source),
            ApiError::Path { source } => (source.status(), source.body_text(), None),
            ApiError::Query { source } => (source.status(), source.body_text(), None),
        };

        ApiResponseError {
            code: status.as_u16(),
            message,
            details,
        }
        .into_response()
    }
}

fn system_error_response(error: SystemError) -> (StatusCode, String, Option<String>) {
    let status = match &error {
        SystemError::NotFound { .. } => StatusCode::NOT_FOUND,
        SystemError::Forbidden { .. } => StatusCode::FORBIDDEN,
        SystemError::Conflict { .. } | SystemError::UserExists | SystemError::Invalid { .. } => StatusCode::BAD_REQUEST,
        SystemError::InvalidCredentials | SystemError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        SystemError::Llm(e) => {
            tracing::warn!(?e, "Language model request failed");
            return (StatusCode::BAD_GATEWAY, "Failed to generate DM response".to_string(), Some(e.to_string()));
        }
        SystemError::Database(_) | SystemError::Other(_) => {
            tracing::error!("Internal error occurred: {error:?}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string(), None);
        }
    };

    (status, error.to_string(), None)
}

/// Flatten a rejected JSON body into our uniform error shape.
///
/// For schema violations the first violation is the message, all of them are listed in the details.
fn json_rejection_response(rejection: JsonSchemaRejection) -> (StatusCode, String, Option<String>) {
    match rejection {
        JsonSchemaRejection::Json(e) => (StatusCode::BAD_REQUEST, e.body_text(), None),
        JsonSchemaRejection::Serde(e) => (StatusCode::BAD_REQUEST, e.to_string(), None),
        JsonSchemaRejection::Schema(errors) => {
            let messages: Vec<String> = errors.iter().map(|e| e.error_description().to_string()).collect();
            let message = messages
                .first()
                .cloned()
                .unwrap_or_else(|| "Request schema validation failed".to_string());
            let details = (messages.len() > 1).then(|| messages.join("; "));

            (StatusCode::BAD_REQUEST, message, details)
        }
    }
}

impl From<JsonSchemaRejection> for ApiError {
    fn from(value: JsonSchemaRejection) -> Self {
        ApiError::Json {
            source: value,
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(value: PathRejection) -> Self {
        ApiError::Path {
            source: value,
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        ApiError::Query {
            source: value,
        }
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("database query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("failed to decode row: {0}")]
    Scan(#[source] sqlx::Error),

    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to encode metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Row decoding problems are told apart from query/connection failures.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::TypeNotFound { .. } => AppError::Scan(err),
            other => AppError::Query(other),
        }
    }
}

impl AppError {
    /// Short plain-text message sent to the client.
    pub fn public_message(&self) -> &'static str {
        match self {
            AppError::Config(_) => "Invalid configuration",
            AppError::Query(_) => "Database query failed",
            AppError::Scan(_) => "Error scanning data",
            AppError::Encode(_) => "Error encoding data",
            AppError::Metrics(_) => "Error encoding metrics",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, self.public_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn decode_errors_are_scan_errors() {
        let err: AppError = sqlx::Error::ColumnNotFound("price".to_string()).into();
        assert!(matches!(err, AppError::Scan(_)));

        let err: AppError = sqlx::Error::ColumnDecode {
            index: "1".to_string(),
            source: "not a string".into(),
        }
        .into();
        assert!(matches!(err, AppError::Scan(_)));
    }

    #[test]
    fn connection_errors_are_query_errors() {
        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, AppError::Query(_)));
        assert_eq!(err.public_message(), "Database query failed");
    }

    async fn status_type_and_body(err: AppError) -> (StatusCode, String, String) {
        let response = err.into_response();
        let status = response.status();
        let content_type = response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .to_owned();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn each_failure_is_a_plain_text_500_with_its_message() {
        let encode_err = serde_json::from_str::<i32>("not json").unwrap_err();
        let cases = [
            (AppError::Query(sqlx::Error::PoolTimedOut), "Database query failed"),
            (AppError::Scan(sqlx::Error::RowNotFound), "Error scanning data"),
            (AppError::Encode(encode_err), "Error encoding data"),
        ];

        for (err, expected) in cases {
            let (status, content_type, body) = status_type_and_body(err).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(content_type.starts_with("text/plain"), "got {content_type}");
            assert_eq!(body, expected);
        }
    }
}

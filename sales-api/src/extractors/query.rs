//! Query-string extractor with API-shaped rejections.
//!
//! Axum's `Query` rejects malformed query strings with a plain-text 400.
//! `ReportQuery<T>` reports the same failure as a 422 `ApiError` body, the
//! shape every other validation failure uses.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Extractor for report query parameters.
///
/// # Example
///
/// ```rust,ignore
/// async fn monthly_sales(
///     ReportQuery(params): ReportQuery<MonthlySalesQuery>,
/// ) -> ApiResult<impl IntoResponse> {
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ReportQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                tracing::debug!(query = ?parts.uri.query(), error = %e, "Rejected query string");
                ApiError::invalid_input(format!("Invalid query string: {}", e.body_text()))
            })?;

        Ok(ReportQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use axum::http::Request;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Probe {
        count: Option<u32>,
    }

    async fn extract(uri: &str) -> Result<ReportQuery<Probe>, ApiError> {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        ReportQuery::<Probe>::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_valid_query() {
        let ReportQuery(probe) = extract("/x?count=3").await.unwrap();
        assert_eq!(probe.count, Some(3));
    }

    #[tokio::test]
    async fn test_malformed_query_is_validation_error() {
        let err = extract("/x?count=three").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert_eq!(err.status_code().as_u16(), 422);
    }
}

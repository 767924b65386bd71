//! Request extractors whose rejections render as [`ApiError`] JSON.
//!
//! Axum's own `Json`, `Path` and `Query` reject with plain-text bodies; these
//! wrappers keep the status axum chose and move the message into the
//! `{"error", "status"}` shape every other failure uses.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request,
    },
    http::request::Parts,
    Json,
};

use crate::error::ApiError;

/// JSON request body.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

/// Path parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiPath<T>(pub T);

/// Query string parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::StatusCode,
        response::IntoResponse,
        routing::{get, post},
        Router,
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize)]
    struct Paging {
        page: u32,
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/items/{id}",
                get(|ApiPath(id): ApiPath<u64>| async move { id.to_string() }),
            )
            .route(
                "/pages",
                get(|ApiQuery(p): ApiQuery<Paging>| async move { p.page.to_string() }),
            )
            .route(
                "/echo",
                post(|ApiJson(v): ApiJson<serde_json::Value>| async move {
                    axum::Json(v).into_response()
                }),
            )
    }

    async fn call(request: Request) -> (StatusCode, serde_json::Value) {
        let response = app().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json error body"))
    }

    #[tokio::test]
    async fn test_bad_path_is_json() {
        let request = Request::builder()
            .uri("/items/abc")
            .body(Body::empty())
            .expect("request");
        let (status, body) = call(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_bad_query_is_json() {
        let request = Request::builder()
            .uri("/pages?page=first")
            .body(Body::empty())
            .expect("request");
        let (status, body) = call(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_missing_content_type_keeps_status() {
        let request = Request::builder()
            .method("POST")
            .uri("/echo")
            .body(Body::from("{}"))
            .expect("request");
        let (status, body) = call(request).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["status"], 415);
    }

    #[tokio::test]
    async fn test_malformed_json_is_json() {
        let request = Request::builder()
            .method("POST")
            .uri("/echo")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .expect("request");
        let (status, body) = call(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }
}

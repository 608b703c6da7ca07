use axum::{routing::get, Router};

pub const BODY: &str = "OK";

/// Liveness routes for the hosting platform's port probe.
pub fn router() -> Router {
    Router::new()
        .route("/", get(alive))
        .route("/health", get(alive))
}

async fn alive() -> &'static str {
    BODY
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use super::*;

    async fn fetch(uri: &str) -> (StatusCode, String) {
        let response = router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn root_and_health_answer_ok() {
        for uri in ["/", "/health"] {
            assert_eq!(fetch(uri).await, (StatusCode::OK, BODY.to_owned()), "{uri}");
        }
    }

    #[tokio::test]
    async fn other_paths_are_not_found() {
        let (status, _) = fetch("/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

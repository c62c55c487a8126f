use std::net::SocketAddr;

use axum::{middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::expose_internal_errors;
use crate::state::AppState;
use crate::{auth, observations, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(users::router())
                .merge(observations::router())
                .route("/health", get(|| async { "ok" })),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            expose_internal_errors,
        ))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Environment;
    use crate::error::ApiError;
    use crate::test_support::{request, send};

    #[tokio::test]
    async fn health_responds_ok() {
        let state = AppState::fake();
        let res = send(&state, request("GET", "/api/health", None, None)).await;
        assert_eq!(res.status, StatusCode::OK);
        assert_eq!(res.body, json!("ok"));
    }

    async fn failing() -> Result<(), ApiError> {
        Err(anyhow::anyhow!("relation \"observations\" does not exist").into())
    }

    async fn internal_error_body(state: AppState) -> serde_json::Value {
        let app = Router::new()
            .route("/boom", get(failing))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                expose_internal_errors,
            ))
            .with_state(state);
        let res = app.oneshot(request("GET", "/boom", None, None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn production_hides_internal_errors() {
        let state = AppState::fake_with(|c| c.environment = Environment::Production);
        assert_eq!(
            internal_error_body(state).await,
            json!({ "error": { "message": "server error" } })
        );
    }

    #[tokio::test]
    async fn development_exposes_internal_errors() {
        let body = internal_error_body(AppState::fake()).await;
        assert_eq!(body["error"]["message"], "server error");
        assert_eq!(body["message"], "relation \"observations\" does not exist");
    }
}

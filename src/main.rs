mod classifier;
mod config;
mod crypto;
mod error;
mod handle;
mod handlers;
mod input;
mod models;
mod network;
mod service;
mod state;
mod stats;
mod templates;

use anyhow::Context;
use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower::buffer::BufferLayer;
use tower::limit::RateLimitLayer;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info};

use crate::config::Config;
use crate::handle::ModelHandle;
use crate::service::ClassificationService;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    info!("[spamcheck] Starting spamcheck server");
    info!("[spamcheck] Model directory: {:?}", config.model_dir);
    info!("[spamcheck] Inference timeout: {:?}", config.inference_timeout);

    let handle = Arc::new(ModelHandle::from_dir(config.model_dir.clone()));

    // No classification can be served without the model, so load it before binding.
    let load_handle = Arc::clone(&handle);
    tokio::task::spawn_blocking(move || load_handle.get().map(|_| ()))
        .await
        .context("model loading task failed")?
        .map_err(|e| {
            error!("[spamcheck] Refusing to start: {}", e);
            e
        })
        .context("failed to load model artifact")?;

    let state = AppState::new(config.clone(), ClassificationService::new(handle));
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("[spamcheck] Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    let cors = if let Some(ref origins) = config.cors_origins {
        let origins: Vec<_> = origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let per_minute = config.rate_limit_per_minute;
    let rate_limit = |buffer: usize, limit: u64| {
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(|_: tower::BoxError| async {
                StatusCode::TOO_MANY_REQUESTS
            }))
            .layer(BufferLayer::new(buffer))
            .layer(RateLimitLayer::new(limit, Duration::from_secs(60)))
    };

    Router::new()
        .route(
            "/",
            get(handlers::page::form)
                .merge(post(handlers::page::submit).layer(rate_limit(32, per_minute))),
        )
        .route(
            "/classify",
            post(handlers::classify::classify).layer(rate_limit(32, per_minute)),
        )
        .route(
            "/classify/batch",
            post(handlers::batch::batch_classify)
                .layer(rate_limit(8, (per_minute / 4).max(1))),
        )
        .route("/model", get(handlers::models::model_info))
        .route("/health", get(handlers::health::health))
        .route("/metrics", get(handlers::metrics::metrics))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::testing::write_sample_model;
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app_with_sample_model(dir: &std::path::Path) -> (Router, AppState) {
        write_sample_model(dir);
        let config = Config {
            model_dir: dir.to_path_buf(),
            max_batch_size: 3,
            ..Config::default()
        };
        let handle = Arc::new(ModelHandle::from_dir(config.model_dir.clone()));
        let state = AppState::new(config, ClassificationService::new(handle));
        (build_router(state.clone()), state)
    }

    fn json_post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn classify_returns_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let (app, state) = app_with_sample_model(dir.path());

        let response = app
            .oneshot(json_post("/classify", serde_json::json!({"message": "WIN a FREE prize now"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["label"], "spam");
        let score = body["raw_score"].as_f64().unwrap();
        let confidence = body["confidence"].as_f64().unwrap();
        assert!(score >= 0.5);
        assert!((confidence - score * 100.0).abs() < 1e-9);
        assert_eq!(body["stats"]["words"], 5);
        assert_eq!(state.stats.snapshot().spam, 1);
    }

    #[tokio::test]
    async fn blank_message_is_bad_request_without_loading() {
        let dir = tempfile::tempdir().unwrap();
        let (app, state) = app_with_sample_model(dir.path());

        let response = app
            .oneshot(json_post("/classify", serde_json::json!({"message": " \t\n"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "message is empty");
        assert!(!state.service.handle().is_loaded());
        assert_eq!(state.stats.snapshot().rejected_empty, 1);
    }

    #[tokio::test]
    async fn missing_model_is_service_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            model_dir: dir.path().join("absent"),
            ..Config::default()
        };
        let handle = Arc::new(ModelHandle::from_dir(config.model_dir.clone()));
        let app = build_router(AppState::new(config, ClassificationService::new(handle)));

        let response = app
            .oneshot(json_post("/classify", serde_json::json!({"message": "hello"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn batch_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app_with_sample_model(dir.path());

        let response = app
            .oneshot(json_post(
                "/classify/batch",
                serde_json::json!({"messages": ["see you", "free win", "see you later"]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let labels: Vec<&str> = body["verdicts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["label"].as_str().unwrap())
            .collect();
        assert_eq!(labels, vec!["ham", "spam", "ham"]);
    }

    #[tokio::test]
    async fn batch_limits_and_blank_members() {
        let dir = tempfile::tempdir().unwrap();
        let (app, state) = app_with_sample_model(dir.path());

        let too_many = app
            .clone()
            .oneshot(json_post("/classify/batch", serde_json::json!({"messages": ["a", "b", "c", "d"]})))
            .await
            .unwrap();
        assert_eq!(too_many.status(), StatusCode::BAD_REQUEST);

        let none = app
            .clone()
            .oneshot(json_post("/classify/batch", serde_json::json!({"messages": []})))
            .await
            .unwrap();
        assert_eq!(none.status(), StatusCode::BAD_REQUEST);

        let blank = app
            .oneshot(json_post("/classify/batch", serde_json::json!({"messages": ["free", ""]})))
            .await
            .unwrap();
        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
        assert!(!state.service.handle().is_loaded());
    }

    #[tokio::test]
    async fn health_and_model_reflect_load_state() {
        let dir = tempfile::tempdir().unwrap();
        let (app, state) = app_with_sample_model(dir.path());

        let before = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(before).await["ready"], false);

        let unloaded = app
            .clone()
            .oneshot(Request::get("/model").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(unloaded.status(), StatusCode::SERVICE_UNAVAILABLE);

        state.service.handle().get().unwrap();

        let after = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let health = body_json(after).await;
        assert_eq!(health["ready"], true);
        assert_eq!(health["model_id"], "sample");

        let model = app
            .oneshot(Request::get("/model").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let model = body_json(model).await;
        assert_eq!(model["id"], "sample");
        assert_eq!(model["input_dim"], 4);
    }

    #[tokio::test]
    async fn form_submission_renders_result_and_warning() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app_with_sample_model(dir.path());

        let form = |body: &'static str| {
            Request::builder()
                .method("POST")
                .uri("/")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap()
        };

        let spam = app.clone().oneshot(form("message=free+win+now")).await.unwrap();
        assert_eq!(spam.status(), StatusCode::OK);
        let html = body_text(spam).await;
        assert!(html.contains("SPAM DETECTED"));
        assert!(html.contains("Spam Score: "));

        let blank = app.clone().oneshot(form("message=+++")).await.unwrap();
        let html = body_text(blank).await;
        assert!(html.contains("Please enter a message."));
        assert!(!html.contains("Confidence:"));

        let page = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(body_text(page).await.contains("Analyze Message"));
    }

    #[tokio::test]
    async fn slow_inference_is_gateway_timeout() {
        use crate::handle::testing::{handle_of, Stalls};

        let config = Config {
            inference_timeout: Duration::from_millis(50),
            ..Config::default()
        };
        let handle = handle_of(Stalls {
            delay: Duration::from_millis(300),
        });
        let state = AppState::new(config, ClassificationService::new(Arc::new(handle)));
        let app = build_router(state.clone());

        let response = app
            .oneshot(json_post("/classify", serde_json::json!({"message": "hello"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let body = body_json(response).await;
        assert_eq!(body["error"], "inference did not finish within 50 ms");
        assert_eq!(state.stats.snapshot().inference_failures, 1);
    }

    #[tokio::test]
    async fn page_loads_do_not_spend_the_submit_budget() {
        let dir = tempfile::tempdir().unwrap();
        write_sample_model(dir.path());
        let config = Config {
            model_dir: dir.path().to_path_buf(),
            rate_limit_per_minute: 1,
            ..Config::default()
        };
        let handle = Arc::new(ModelHandle::from_dir(config.model_dir.clone()));
        let app = build_router(AppState::new(config, ClassificationService::new(handle)));

        let submit = || {
            Request::builder()
                .method("POST")
                .uri("/")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("message=see+you"))
                .unwrap()
        };

        let first = app.clone().oneshot(submit()).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        for _ in 0..3 {
            let page = tokio::time::timeout(
                Duration::from_secs(2),
                app.clone().oneshot(Request::get("/").body(Body::empty()).unwrap()),
            )
            .await
            .expect("GET / waited on the submit rate limit")
            .unwrap();
            assert_eq!(page.status(), StatusCode::OK);
        }

        // The submit budget for this minute is spent, so the next POST is held.
        let held = tokio::time::timeout(Duration::from_millis(200), app.oneshot(submit())).await;
        assert!(held.is_err());
    }

    #[tokio::test]
    async fn metrics_reports_counts() {
        let dir = tempfile::tempdir().unwrap();
        let (app, _) = app_with_sample_model(dir.path());

        app.clone()
            .oneshot(json_post("/classify", serde_json::json!({"message": "see you"})))
            .await
            .unwrap();
        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let metrics = body_json(response).await;
        assert_eq!(metrics["classified"], 1);
        assert_eq!(metrics["ham"], 1);
    }
}

//! Integration tests for the microexpression HTTP server

#[cfg(feature = "server")]
mod server_tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use std::sync::Arc;
    use std::time::Duration;
    use synheart_microexpression::core::ManualClock;
    use synheart_microexpression::server::{router, run, ServerConfig, ServerState};
    use synheart_microexpression::transparency::create_shared_log;
    use synheart_microexpression::{Config, MicroexpressionEngine};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let config = Config::default();
        let engine = MicroexpressionEngine::with_parts(
            &config,
            Arc::new(ManualClock::new(0)),
            create_shared_log(),
        );
        router(Arc::new(ServerState::with_engine(engine, config.display_limit)))
    }

    async fn post_json(
        app: &Router,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        send(app, request).await
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    fn sample(timestamp: i64, label: &str, confidence: f64) -> serde_json::Value {
        serde_json::json!({
            "timestamp": timestamp,
            "distribution": { label: confidence }
        })
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (status, body) = get_json(&test_app(), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["version"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_sample_reports_live_emotion() {
        let app = test_app();
        let (status, body) = post_json(&app, "/samples", sample(0, "sad", 0.8)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"][0]["event"], "live_emotion");
        assert_eq!(body["events"][0]["emotion"], "SADNESS");
        assert_eq!(body["events"][0]["color"], "#0000ff");
    }

    #[tokio::test]
    async fn test_invalid_sample_rejected() {
        let app = test_app();
        let (status, body) = post_json(
            &app,
            "/samples",
            serde_json::json!({ "timestamp": 0, "distribution": {} }),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INVALID_SAMPLE");

        let (_, status_body) = get_json(&app, "/status").await;
        assert_eq!(status_body["window_len"], 0);
        assert_eq!(status_body["classifier"], "idle");
    }

    #[tokio::test]
    async fn test_microexpression_becomes_pair() {
        let app = test_app();

        let (status, _) = post_json(
            &app,
            "/transcripts",
            serde_json::json!({ "timestamp": 0, "text": "what a surprise" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        for (t, label) in [
            (0, "neutral"),
            (20, "neutral"),
            (70, "surprised"),
            (120, "neutral"),
            (140, "neutral"),
        ] {
            let (status, _) = post_json(&app, "/samples", sample(t, label, 0.9)).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, pairs) = get_json(&app, "/pairs?limit=5").await;
        assert_eq!(status, StatusCode::OK);
        let pairs = pairs.as_array().unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0]["emotion"], "SURPRISE");
        assert_eq!(pairs[0]["word"], "surprise");

        let (_, status_body) = get_json(&app, "/status").await;
        assert_eq!(status_body["pair_count"], 1);
        assert_eq!(status_body["classifier"], "active");
    }

    #[tokio::test]
    async fn test_gated_microexpression_reported() {
        let app = test_app();
        let mut last = serde_json::Value::Null;
        for (t, label, confidence) in [
            (0, "neutral", 0.9),
            (20, "neutral", 0.9),
            (80, "surprised", 0.8),
            (140, "neutral", 0.9),
            (160, "neutral", 0.9),
        ] {
            let (status, body) = post_json(&app, "/samples", sample(t, label, confidence)).await;
            assert_eq!(status, StatusCode::OK);
            last = body;
        }

        let gated = &last["events"][1];
        assert_eq!(gated["event"], "microexpression_gated");
        assert_eq!(gated["microexpression"]["label"], "surprised");
        assert_eq!(gated["microexpression"]["duration_ms"], 120);
    }

    #[tokio::test]
    async fn test_feedback_moves_threshold() {
        let app = test_app();
        let (status, body) = post_json(
            &app,
            "/feedback",
            serde_json::json!({ "type": "missed_detection" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"][0]["event"], "threshold_changed");

        let (_, status_body) = get_json(&app, "/status").await;
        let threshold = status_body["threshold"].as_f64().unwrap();
        assert!((threshold - 0.60).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_low_light_reported() {
        let app = test_app();
        let (status, body) = post_json(
            &app,
            "/light",
            serde_json::json!({ "timestamp": 0, "brightness": 15.0 }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["events"][0]["low_light"], true);

        let (_, status_body) = get_json(&app, "/status").await;
        assert_eq!(status_body["low_light"], true);
    }

    #[tokio::test]
    async fn test_malformed_body_rejected() {
        let app = test_app();
        let (status, _) = post_json(
            &app,
            "/feedback",
            serde_json::json!({ "type": "not_a_kind" }),
        )
        .await;

        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_run_serves_on_random_port() {
        let config = ServerConfig::new(0, Config::default());
        let (addr, shutdown_tx) = run(config).await.expect("Failed to start server");

        // Give server time to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("\"status\":\"ok\""));

        // Shutdown server
        let _ = shutdown_tx.send(());
    }
}

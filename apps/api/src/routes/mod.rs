pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::screening::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/screenings", post(handlers::handle_screen))
        .route(
            "/api/v1/screenings/email",
            post(handlers::handle_email_results),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::embedding::test_support::WordCountEmbedder;
    use crate::report::csv_export::{decode_data_uri, parse_csv_export};
    use crate::report::email::test_support::RecordingMailer;
    use crate::scoring::SemanticScorer;

    const BOUNDARY: &str = "screener-test-boundary";
    const JD: &str = "Senior backend engineer with Go and distributed systems experience";
    const GO_RESUME: &str = "10 years Go, distributed systems, Kubernetes";
    const REACT_RESUME: &str = "Frontend React developer, no backend experience";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a str),
    }

    fn multipart_body(parts: &[Part<'_>]) -> String {
        let mut body = String::new();
        for part in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match part {
                Part::Text(name, value) => {
                    body.push_str(&format!(
                        "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                    ));
                }
                Part::File(name, filename, content) => {
                    body.push_str(&format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: text/plain\r\n\r\n{content}\r\n"
                    ));
                }
            }
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    fn app(mailer: Arc<RecordingMailer>) -> Router {
        let config = Config::from_lookup(|_| None).unwrap();
        let semantic = SemanticScorer::new(Arc::new(WordCountEmbedder::default()));
        build_router(AppState::new(config, Some(semantic), mailer))
    }

    async fn post_form(app: Router, parts: &[Part<'_>]) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/screenings")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(Arc::default())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_lexical_screening_end_to_end() {
        let (status, body) = post_form(
            app(Arc::default()),
            &[
                Part::Text("job_description", JD),
                Part::File("resumes", "react.txt", REACT_RESUME),
                Part::File("resumes", "go.txt", GO_RESUME),
                Part::Text("threshold", "0"),
                Part::Text("top_n", "1"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["status"], "completed");
        assert_eq!(body["strategy"], "lexical");
        assert_eq!(body["all_results"].as_array().unwrap().len(), 2);
        assert_eq!(body["all_results"][0]["name"], "go.txt");
        assert_eq!(body["top_results"].as_array().unwrap().len(), 1);
        assert_eq!(body["export"]["filename"], "results.csv");

        // The CSV export matches the "view all" table row for row
        let csv = decode_data_uri(body["export"]["data_uri"].as_str().unwrap()).unwrap();
        let exported = parse_csv_export(&csv).unwrap();
        let shown: Vec<(String, f64)> = body["all_results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| {
                (
                    r["name"].as_str().unwrap().to_string(),
                    r["score"].as_f64().unwrap(),
                )
            })
            .collect();
        assert_eq!(exported.len(), shown.len());
        for (record, (name, score)) in exported.iter().zip(&shown) {
            assert_eq!(&record.name, name);
            assert!((f64::from(record.score) - score).abs() < 1e-6);
        }
    }

    #[tokio::test]
    async fn test_semantic_screening_returns_evidence() {
        let (status, body) = post_form(
            app(Arc::default()),
            &[
                Part::Text("job_description", JD),
                Part::File("resumes", "go.txt", GO_RESUME),
                Part::Text("strategy", "semantic"),
                Part::Text("threshold", "0"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["strategy"], "semantic");
        assert_eq!(
            body["sentence_highlights"][0]["sentences"]
                .as_array()
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_missing_resumes_returns_notice() {
        let (status, body) =
            post_form(app(Arc::default()), &[Part::Text("job_description", JD)]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "awaiting_input");
        assert!(body["notice"].as_str().unwrap().contains("job description"));
    }

    #[tokio::test]
    async fn test_input_method_selects_file_over_text() {
        let (status, body) = post_form(
            app(Arc::default()),
            &[
                Part::Text("input_method", "upload"),
                Part::Text("job_description", JD),
                Part::File("resumes", "go.txt", GO_RESUME),
            ],
        )
        .await;
        // Upload was selected but no file was sent, so ranking is not entered
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "awaiting_input");
    }

    #[tokio::test]
    async fn test_invalid_top_n_is_bad_request() {
        let (status, body) = post_form(
            app(Arc::default()),
            &[
                Part::Text("job_description", JD),
                Part::File("resumes", "go.txt", GO_RESUME),
                Part::Text("top_n", "0"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_unknown_strategy_is_bad_request() {
        let (status, _) = post_form(
            app(Arc::default()),
            &[
                Part::Text("job_description", JD),
                Part::File("resumes", "go.txt", GO_RESUME),
                Part::Text("strategy", "bm25"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_screening_with_email_reports_delivery() {
        let mailer = Arc::new(RecordingMailer::default());
        let (status, body) = post_form(
            app(mailer.clone()),
            &[
                Part::Text("job_description", JD),
                Part::File("resumes", "go.txt", GO_RESUME),
                Part::Text("email_to", "recruiter@example.com"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["email"]["delivered"], true);
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    async fn post_email(app: Router, payload: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/screenings/email")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_email_endpoint_sends_csv() {
        let mailer = Arc::new(RecordingMailer::default());
        let (status, body) = post_email(
            app(mailer.clone()),
            json!({
                "recipient": "recruiter@example.com",
                "results": [
                    {"name": "go.pdf", "score": 0.8},
                    {"name": "react.pdf", "score": 0.1}
                ]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["delivered"], true);
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent[0].1, "Resume,Score\ngo.pdf,0.8\nreact.pdf,0.1\n");
    }

    #[tokio::test]
    async fn test_email_endpoint_reports_delivery_failure() {
        let mailer = Arc::new(RecordingMailer {
            fail_with: Some("connection refused"),
            ..Default::default()
        });
        let (status, body) = post_email(
            app(mailer),
            json!({"recipient": "recruiter@example.com", "results": []}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "EMAIL_ERROR");
    }
}

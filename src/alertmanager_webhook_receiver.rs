use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::Serialize;

use crate::{
    alert,
    metrics,
    pushbullet::Notifier,
    settings::Settings,
    severity::{self, Action},
};

/// shared state of the webhook receiver
struct State {
    notifier: Notifier,
}

/// acknowledgment returned to the webhook caller
#[derive(Debug, Serialize)]
struct ResponseJson {
    #[serde(rename = "Status")]
    status: u16,
    #[serde(rename = "Message")]
    message: String,
}

impl ResponseJson {
    fn new(status: StatusCode, message: String) -> Self {
        Self {
            status: status.as_u16(),
            message,
        }
    }
}

async fn webhook(
    Extension(state): Extension<Arc<State>>,
    payload: Result<Json<alert::Data>, JsonRejection>,
) -> (StatusCode, Json<ResponseJson>) {
    let data = match payload {
        Ok(Json(data)) => data,
        Err(err) => {
            tracing::debug!("failed to deserialize alert group: {:?}", err);
            return (
                StatusCode::BAD_REQUEST,
                Json(ResponseJson::new(StatusCode::BAD_REQUEST, err.to_string())),
            );
        }
    };

    tracing::info!(
        "alerts: group_labels={:?}, common_labels={:?}",
        data.group_labels,
        data.common_labels
    );

    for alert in &data.alerts {
        tracing::info!(
            "alert: status={}, labels={:?}, annotations={:?}",
            alert.status,
            alert.labels,
            alert.annotations
        );

        let severity = alert.severity();
        metrics::RECEIVED_ALERTS
            .with_label_values(&[severity.as_str()])
            .inc();

        match severity::action(&severity) {
            Action::Notify => {
                tracing::info!("sending notification on severity: {}", severity);

                // a failed delivery only loses this alert, the batch and the
                // server keep going
                if let Err(err) = state.notifier.notify(alert).await {
                    tracing::error!("failed to deliver notification: {}", err);
                }
            }
            Action::Ignore => {
                tracing::info!("no action on severity: {}", severity);
            }
        }
    }

    (
        StatusCode::OK,
        Json(ResponseJson::new(StatusCode::OK, "success".to_string())),
    )
}

async fn healthz() -> &'static str {
    "Ok!"
}

fn app(notifier: Notifier) -> Router {
    let state = Arc::new(State { notifier });

    Router::new()
        .route("/webhook", post(webhook))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(Extension(state))
}

pub async fn run(settings: &Settings, notifier: Notifier) -> Result<()> {
    let addr = settings.listen_addr();

    axum::Server::try_bind(&addr)
        .with_context(|| format!("failed to bind {}", addr))?
        .serve(app(notifier).into_make_service())
        .await
        .context("alertmanager webhook receiver crashed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;
    use wiremock::{
        matchers::{header, method},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;
    use crate::log::LogSettings;

    async fn mock_notifier(server: &MockServer) -> Notifier {
        let settings = Settings {
            api_addr: format!("{}/v2/pushes", server.uri()),
            channel_tag: "oncall".to_string(),
            api_token: "secret".to_string(),
            ca_cert_file: None,
            insecure_skip_verify: false,
            port: 8080,
            log: LogSettings::default(),
        };

        Notifier::new(reqwest::Client::new(), &settings)
    }

    fn post_webhook(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn healthz_answers_ok() {
        let server = MockServer::start().await;
        let app = app(mock_notifier(&server).await);

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&bytes[..], b"Ok!");
    }

    #[tokio::test]
    async fn malformed_body_yields_400_and_no_notification() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let app = app(mock_notifier(&server).await);

        let response = app.oneshot(post_webhook("{ not json")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let ack = body_json(response).await;
        assert_eq!(ack["Status"], 400);
        assert!(ack["Message"].as_str().unwrap().contains("JSON"));
    }

    #[tokio::test]
    async fn empty_alert_group_yields_success() {
        let server = MockServer::start().await;
        let app = app(mock_notifier(&server).await);

        let response = app.oneshot(post_webhook(r#"{"alerts":[]}"#)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "Status": 200, "Message": "success" })
        );
    }

    #[tokio::test]
    async fn critical_and_warning_alerts_are_forwarded_once_each() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(header("Access-Token", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(2)
            .mount(&server)
            .await;

        let app = app(mock_notifier(&server).await);

        let payload = r#"{
            "groupLabels": { "alertname": "DiskFull" },
            "alerts": [
                { "status": "firing", "startsAt": "2024-01-01T00:00:00Z",
                  "labels": { "severity": "critical" },
                  "annotations": { "summary": "disk full" } },
                { "status": "firing", "startsAt": "2024-01-01T00:00:00Z",
                  "labels": { "severity": "Warning" },
                  "annotations": { "summary": "disk filling up" } },
                { "status": "firing", "startsAt": "2024-01-01T00:00:00Z",
                  "labels": { "severity": "info" } },
                { "status": "resolved", "startsAt": "2024-01-01T00:00:00Z",
                  "labels": {} }
            ]
        }"#;

        let response = app.oneshot(post_webhook(payload)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "Status": 200, "Message": "success" })
        );
    }

    #[tokio::test]
    async fn delivery_failure_does_not_change_the_ack() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let app = app(mock_notifier(&server).await);

        let payload = r#"{
            "alerts": [
                { "status": "firing", "startsAt": "2024-01-01T00:00:00Z",
                  "labels": { "severity": "critical" },
                  "annotations": { "summary": "disk full" } }
            ]
        }"#;

        let response = app.oneshot(post_webhook(payload)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({ "Status": 200, "Message": "success" })
        );
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_text_format() {
        let server = MockServer::start().await;
        let app = app(mock_notifier(&server).await);

        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}

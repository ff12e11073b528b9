use axum::{
    body::Body,
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use http::Request;
use rest_tracing::{ClientLoggingConfig, ClientLoggingLayer};
use serde_json::json;
use tower::{ServiceBuilder, ServiceExt};
use tracing::info;
use tracing_subscriber::EnvFilter;

async fn users() -> impl IntoResponse {
    Json(json!([{ "id": 1, "name": "Ada" }, { "id": 2, "name": "Grace" }]))
}

async fn create_user(body: Bytes) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        format!(r#"{{"created":{}}}"#, String::from_utf8_lossy(&body)),
    )
}

async fn avatar() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], vec![0x89, b'P', b'N', b'G'])
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Try `RUST_LOG=rest_tracing::received=debug` to only see responses
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,rest_tracing::sent=debug")),
        )
        .init();

    // The "network" is an in-process axum app; any tower service with an HTTP body works
    let upstream = Router::new()
        .route("/users", get(users).post(create_user))
        .route("/users/{id}/avatar", get(avatar))
        .route("/health", post(|| async { "ok" }));

    let config = ClientLoggingConfig {
        exclude_headers: vec!["Authorization".to_string()],
        ..Default::default()
    };
    let client = ServiceBuilder::new()
        .layer(ClientLoggingLayer::buffered(config))
        .map_request(|request: Request<Bytes>| request.map(Body::from))
        .service(upstream);

    let requests = vec![
        // Logged at DEBUG on the sent channel only
        Request::get("http://users.local/users")
            .header("Authorization", "Bearer not-in-the-logs")
            .body(Bytes::new())?,
        // Response forced at INFO
        Request::post("http://users.local/users")
            .header("content-type", "application/json")
            .header("X-Log-Response", "true")
            .body(Bytes::from_static(br#"{"name":"Linus"}"#))?,
        // Binary body, summarized by length and type
        Request::get("http://users.local/users/1/avatar")
            .header("X-Log-Response", "true")
            .body(Bytes::new())?,
        // Request logging suppressed
        Request::post("http://users.local/health")
            .header("X-Log-Request", "false")
            .body(Bytes::new())?,
    ];

    for request in requests {
        let response = client.clone().oneshot(request).await?;
        info!(
            status = %response.status(),
            bytes = response.body().len(),
            "Caller received response"
        );
    }

    Ok(())
}

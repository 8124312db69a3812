//! Service info and health handlers.

use axum::Json;
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub endpoints: Value,
}

/// `GET /`
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "AI Proxy Core",
        endpoints: json!({
            "health": "/health",
            "gemini_live": "/api/gemini/ws",
        }),
    })
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_root_lists_live_endpoint() {
        let Json(info) = root().await;
        assert_eq!(info.message, "AI Proxy Core");
        assert_eq!(info.endpoints["gemini_live"], "/api/gemini/ws");
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health().await;
        assert_eq!(body, json!({"status": "healthy"}));
    }
}

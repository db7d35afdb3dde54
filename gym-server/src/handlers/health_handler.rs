use axum::{extract::Extension, Json};
use chrono::Utc;
use tracing::warn;
use crate::{db::{Db, Repository}, dto::HealthResponse};

pub async fn health(Extension(repo): Extension<Db>) -> Json<HealthResponse> {
    let database = match repo.ping().await {
        Ok(()) => "UP",
        Err(e) => {
            warn!(error = %e, "数据库健康检查失败");
            "DOWN"
        }
    };

    Json(HealthResponse {
        status: if database == "UP" { "UP" } else { "DEGRADED" },
        timestamp: Utc::now().to_rfc3339(),
        service: "gym-management",
        database,
    })
}

pub async fn ping() -> &'static str {
    "pong"
}

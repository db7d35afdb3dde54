use tower_http::{cors::{CorsLayer, Any}, trace::TraceLayer, limit::RequestBodyLimitLayer};
use tokio::net::TcpListener;
use std::net::SocketAddr;
use axum::{extract::DefaultBodyLimit, http::{header, Method}};
use dotenvy::dotenv;
mod error;
mod model;
mod service;
mod middleware;
mod db;
mod handlers;
mod routes;
mod dto;
mod config;
#[cfg(test)]
mod test_support;

use crate::{
    config::AppConfig,
    db::{Db, MySqlRepository},
};
use gym_share::RedisClient;
use std::sync::Arc;


#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let cfg = AppConfig::load()?;

    // 创建数据库连接池并初始化表结构
    let pool = crate::db::create_pool(&cfg.database).await?;
    crate::db::init_schema(&pool).await?;
    let repo: Db = Arc::new(MySqlRepository::new(pool));

    // 创建 Redis 客户端（可选，连接失败时退化为直接查库）
    let redis_client = if cfg.redis.enabled {
        match RedisClient::new(&cfg.redis).await {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!(error = %e, "Redis 连接失败，租户缓存已禁用");
                None
            }
        }
    } else {
        None
    };

    let body_limit = cfg.server.body_limit_mb * 1024 * 1024;
    let app = crate::routes::create_app(repo, cfg.jwt.clone(), cfg.security.clone(), redis_client)
        .layer(TraceLayer::new_for_http())
        // 上传上限统一由 RequestBodyLimitLayer 控制
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(vec![Method::GET, Method::POST, Method::DELETE, Method::PUT])
                .allow_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
                .expose_headers(vec![header::CONTENT_DISPOSITION]),
        );

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.server.port));
    let listener = TcpListener::bind(&addr).await?;

    // 打印所有注册的路由
    crate::routes::print_routes();

    tracing::info!("API 运行在 http://{}", addr);

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

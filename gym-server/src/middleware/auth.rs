use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{error, warn};
use crate::{
    db::Db,
    error::{AppError, ErrorCode},
    service::TenantService,
};
use gym_share::{verify_token, JwtSettings, RedisClient};

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// 校验 Bearer token，并把解析出的 `TenantContext` 放入请求扩展
pub async fn auth_middleware(
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)
        .map(str::to_string)
        .ok_or_else(|| AppError::unauthorized("Missing or invalid Authorization header"))?;

    // 从扩展中获取 JWT 配置和仓储
    let jwt_cfg = request
        .extensions()
        .get::<JwtSettings>()
        .cloned()
        .ok_or_else(|| {
            error!("请求扩展中缺少 JWT 配置");
            AppError::internal("Authentication is not configured")
        })?;

    let repo = request
        .extensions()
        .get::<Db>()
        .cloned()
        .ok_or_else(|| {
            error!("请求扩展中缺少数据库仓储");
            AppError::internal("Authentication is not configured")
        })?;

    let redis_client = request
        .extensions()
        .get::<Arc<RedisClient>>()
        .cloned();

    let claims = verify_token(&token, &jwt_cfg).map_err(|e| {
        warn!(error = %e, "token 校验失败");
        AppError::unauthorized("Invalid or expired token")
    })?;

    // 解析租户不涉及密码，cost 取默认值即可
    let tenant_service = TenantService::new(repo, bcrypt::DEFAULT_COST).with_redis(redis_client);
    let ctx = match tenant_service.resolve(&claims.sub).await {
        Ok(ctx) => ctx,
        Err(e) if e.code == ErrorCode::Unauthorized => {
            warn!(email = %claims.sub, "token 对应的租户不存在");
            return Err(e);
        }
        Err(e) => {
            error!(email = %claims.sub, error = %e, "查询租户失败");
            return Err(e);
        }
    };

    request.extensions_mut().insert(ctx);

    Ok(next.run(request).await)
}

use axum::{
    body::Bytes,
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use tracing::warn;
use crate::{
    db::Db,
    dto::{ExpiringQuery, MemberReq, MessageResponse, RenewReq},
    error::{AppError, Result},
    model::{MemberView, TenantContext},
    service::MemberService,
};
use gym_share::today;

pub async fn list_members(
    Extension(repo): Extension<Db>,
    Extension(ctx): Extension<TenantContext>,
) -> Result<Json<Vec<MemberView>>> {
    Ok(Json(MemberService::new(repo).list(&ctx, today()).await?))
}

pub async fn list_expiring(
    Query(query): Query<ExpiringQuery>,
    Extension(repo): Extension<Db>,
    Extension(ctx): Extension<TenantContext>,
) -> Result<Json<Vec<MemberView>>> {
    let members = MemberService::new(repo)
        .list_expiring(&ctx, query.days, today())
        .await?;
    Ok(Json(members))
}

pub async fn create_member(
    Extension(repo): Extension<Db>,
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<MemberReq>,
) -> Result<(StatusCode, Json<MemberView>)> {
    let member = MemberService::new(repo).create(&ctx, payload, today()).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn update_member(
    Path(id): Path<u64>,
    Extension(repo): Extension<Db>,
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<MemberReq>,
) -> Result<Json<MemberView>> {
    Ok(Json(MemberService::new(repo).edit(&ctx, id, payload, today()).await?))
}

/// 续费请求体可省略
pub async fn renew_member(
    Path(id): Path<u64>,
    Extension(repo): Extension<Db>,
    Extension(ctx): Extension<TenantContext>,
    body: Bytes,
) -> Result<Json<MemberView>> {
    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        RenewReq::default()
    } else {
        serde_json::from_slice::<RenewReq>(&body).map_err(|e| {
            warn!(member_id = id, error = %e, "续费请求体解析失败");
            AppError::invalid(format!("Invalid request body: {}", e))
        })?
    };

    Ok(Json(MemberService::new(repo).renew(&ctx, id, payload, today()).await?))
}

pub async fn delete_member(
    Path(id): Path<u64>,
    Extension(repo): Extension<Db>,
    Extension(ctx): Extension<TenantContext>,
) -> Result<Json<MessageResponse>> {
    MemberService::new(repo).delete(&ctx, id).await?;
    Ok(Json(MessageResponse::new("Member deleted")))
}

use axum::{extract::{Extension, Path}, http::StatusCode, Json};
use crate::{
    db::Db,
    dto::{CreatePlanReq, MessageResponse, UpdatePlanReq},
    error::Result,
    model::{Plan, TenantContext},
    service::PlanService,
};

pub async fn create_plan(
    Extension(repo): Extension<Db>,
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<CreatePlanReq>,
) -> Result<(StatusCode, Json<Plan>)> {
    let plan = PlanService::new(repo).create(&ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

pub async fn list_plans(
    Extension(repo): Extension<Db>,
    Extension(ctx): Extension<TenantContext>,
) -> Result<Json<Vec<Plan>>> {
    Ok(Json(PlanService::new(repo).list(&ctx).await?))
}

pub async fn get_plan(
    Path(id): Path<u64>,
    Extension(repo): Extension<Db>,
    Extension(ctx): Extension<TenantContext>,
) -> Result<Json<Plan>> {
    Ok(Json(PlanService::new(repo).get(&ctx, id).await?))
}

pub async fn update_plan(
    Path(id): Path<u64>,
    Extension(repo): Extension<Db>,
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<UpdatePlanReq>,
) -> Result<Json<Plan>> {
    Ok(Json(PlanService::new(repo).update(&ctx, id, payload).await?))
}

pub async fn delete_plan(
    Path(id): Path<u64>,
    Extension(repo): Extension<Db>,
    Extension(ctx): Extension<TenantContext>,
) -> Result<Json<MessageResponse>> {
    PlanService::new(repo).delete(&ctx, id).await?;
    Ok(Json(MessageResponse::new("Plan deleted successfully")))
}

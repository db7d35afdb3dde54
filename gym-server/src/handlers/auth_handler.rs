use axum::{extract::Extension, http::StatusCode, Json};
use tracing::{error, info};
use crate::{
    config::SecuritySettings,
    db::Db,
    dto::{ChangePasswordReq, LoginReq, LoginResponse, MessageResponse, ProfileResponse, SignupReq, UpdateProfileReq},
    error::{AppError, Result},
    model::TenantContext,
    service::TenantService,
};
use gym_share::{generate_token, JwtSettings};

pub async fn signup(
    Extension(repo): Extension<Db>,
    Extension(security): Extension<SecuritySettings>,
    Json(payload): Json<SignupReq>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let tenant_service = TenantService::new(repo, security.bcrypt_cost);
    tenant_service.signup(payload).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::new("User registered successfully"))))
}

pub async fn login(
    Extension(repo): Extension<Db>,
    Extension(security): Extension<SecuritySettings>,
    Extension(jwt_cfg): Extension<JwtSettings>,
    Json(payload): Json<LoginReq>,
) -> Result<Json<LoginResponse>> {
    let tenant_service = TenantService::new(repo, security.bcrypt_cost);
    let tenant = tenant_service.login(&payload).await?;

    let token = generate_token(&tenant.email, &jwt_cfg).map_err(|e| {
        error!(tenant_id = tenant.id, error = %e, "生成 token 失败");
        AppError::internal("Failed to generate token")
    })?;

    info!(tenant_id = tenant.id, "登录成功");
    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        admin_name: tenant.admin_name,
        token,
    }))
}

pub async fn get_profile(
    Extension(repo): Extension<Db>,
    Extension(security): Extension<SecuritySettings>,
    Extension(ctx): Extension<TenantContext>,
) -> Result<Json<ProfileResponse>> {
    let tenant = TenantService::new(repo, security.bcrypt_cost).profile(&ctx).await?;
    Ok(Json(tenant.into()))
}

pub async fn update_profile(
    Extension(repo): Extension<Db>,
    Extension(security): Extension<SecuritySettings>,
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<UpdateProfileReq>,
) -> Result<Json<ProfileResponse>> {
    let tenant = TenantService::new(repo, security.bcrypt_cost)
        .update_profile(&ctx, payload)
        .await?;
    Ok(Json(tenant.into()))
}

pub async fn change_password(
    Extension(repo): Extension<Db>,
    Extension(security): Extension<SecuritySettings>,
    Extension(ctx): Extension<TenantContext>,
    Json(payload): Json<ChangePasswordReq>,
) -> Result<Json<MessageResponse>> {
    TenantService::new(repo, security.bcrypt_cost)
        .change_password(&ctx, payload)
        .await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

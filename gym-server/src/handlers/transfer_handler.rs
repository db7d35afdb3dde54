use axum::{
    extract::{Extension, Multipart},
    http::header,
    response::IntoResponse,
    Json,
};
use tracing::{info, warn};
use crate::{
    db::Db,
    dto::ImportSummary,
    error::{AppError, Result},
    model::TenantContext,
    service::TransferService,
};

pub async fn export_members(
    Extension(repo): Extension<Db>,
    Extension(ctx): Extension<TenantContext>,
) -> Result<impl IntoResponse> {
    let body = TransferService::new(repo).export_csv(&ctx).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=members.csv"),
        ],
        body,
    ))
}

/// 从 multipart 的 `file` 字段读取 CSV 并导入
pub async fn import_members(
    Extension(repo): Extension<Db>,
    Extension(ctx): Extension<TenantContext>,
    mut multipart: Multipart,
) -> Result<Json<ImportSummary>> {
    let mut data = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(error = %e, "读取上传内容失败");
        AppError::invalid(format!("Invalid multipart body: {}", e))
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let bytes = field.bytes().await.map_err(|e| {
            warn!(error = %e, "读取上传文件失败");
            AppError::invalid(format!("Invalid multipart body: {}", e))
        })?;
        data = Some(bytes);
        break;
    }

    let data = data
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::invalid("Please upload a CSV file"))?;

    info!(tenant_id = ctx.tenant_id, size = data.len(), "开始导入会员");
    let summary = TransferService::new(repo).import_csv(&ctx, &data).await?;
    Ok(Json(summary))
}

// src/service/plan_service.rs
use crate::db::{Db, MemberRepository, PlanRepository};
use crate::dto::{CreatePlanReq, UpdatePlanReq};
use crate::error::{AppError, Result};
use crate::model::{NewPlan, Plan, TenantContext};
use tracing::{info, warn};

pub struct PlanService {
    repo: Db,
}

/// 套餐时长必须为正数且能放进 u32
fn positive_months(value: i64) -> Option<u32> {
    if value > 0 { u32::try_from(value).ok() } else { None }
}

impl PlanService {
    pub fn new(repo: Db) -> Self {
        Self { repo }
    }

    pub async fn create(&self, ctx: &TenantContext, req: CreatePlanReq) -> Result<Plan> {
        let plan_name = req
            .plan_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::invalid("Plan name is required"))?;
        let duration_in_months = req
            .duration_in_months
            .and_then(positive_months)
            .ok_or_else(|| AppError::invalid("Duration must be greater than 0"))?;
        let price = req
            .price
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| AppError::invalid("Price must be greater than 0"))?;

        let plan = self
            .repo
            .insert_plan(NewPlan {
                plan_name,
                duration_in_months,
                price,
                tenant_id: ctx.tenant_id,
            })
            .await?;

        info!(tenant_id = ctx.tenant_id, plan_id = plan.id, "套餐已创建");
        Ok(plan)
    }

    pub async fn list(&self, ctx: &TenantContext) -> Result<Vec<Plan>> {
        self.repo.list_plans(ctx.tenant_id).await
    }

    pub async fn get(&self, ctx: &TenantContext, id: u64) -> Result<Plan> {
        self.repo
            .find_plan(ctx.tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Plan", id))
    }

    /// Non-empty names and positive numbers overwrite; anything else keeps
    /// the stored value.
    pub async fn update(&self, ctx: &TenantContext, id: u64, req: UpdatePlanReq) -> Result<Plan> {
        let mut plan = self.get(ctx, id).await?;

        if let Some(name) = req.plan_name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
            plan.plan_name = name;
        }
        if let Some(months) = req.duration_in_months.and_then(positive_months) {
            plan.duration_in_months = months;
        }
        if let Some(price) = req.price.filter(|p| p.is_finite() && *p > 0.0) {
            plan.price = price;
        }

        self.repo.update_plan(&plan).await?;
        info!(tenant_id = ctx.tenant_id, plan_id = plan.id, "套餐已更新");
        Ok(plan)
    }

    /// 仍有会员引用的套餐不允许删除
    pub async fn delete(&self, ctx: &TenantContext, id: u64) -> Result<()> {
        self.get(ctx, id).await?;

        let assigned = self.repo.count_members_on_plan(ctx.tenant_id, id).await?;
        if assigned > 0 {
            warn!(tenant_id = ctx.tenant_id, plan_id = id, assigned, "套餐仍被会员使用");
            return Err(AppError::conflict(format!(
                "Plan is assigned to {} member(s)",
                assigned
            )));
        }

        if !self.repo.delete_plan(ctx.tenant_id, id).await? {
            return Err(AppError::not_found("Plan", id));
        }
        info!(tenant_id = ctx.tenant_id, plan_id = id, "套餐已删除");
        Ok(())
    }
}

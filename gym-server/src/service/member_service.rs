// src/service/member_service.rs
use std::collections::HashMap;

use chrono::NaiveDate;
use gym_share::add_months;
use tracing::{info, warn};

use crate::db::{Db, MemberRepository, PlanRepository};
use crate::dto::{MemberReq, RenewReq};
use crate::error::{AppError, Result};
use crate::model::{Member, MemberView, NewMember, Plan, TenantContext};

const DEFAULT_EXPIRING_DAYS: i64 = 7;

/// Membership lifecycle. Every operation is scoped to the caller's tenant
/// and takes the request's `today` so date-dependent rules stay testable.
pub struct MemberService {
    repo: Db,
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::invalid(format!("{} is required", field))),
    }
}

fn plus_months(date: NaiveDate, months: u32) -> Result<NaiveDate> {
    add_months(date, months).ok_or_else(|| AppError::invalid("Date out of range"))
}

impl MemberService {
    pub fn new(repo: Db) -> Self {
        Self { repo }
    }

    async fn plan(&self, ctx: &TenantContext, plan_id: u64) -> Result<Plan> {
        self.repo
            .find_plan(ctx.tenant_id, plan_id)
            .await?
            .ok_or_else(|| AppError::not_found("Plan", plan_id))
    }

    async fn member(&self, ctx: &TenantContext, id: u64) -> Result<Member> {
        self.repo
            .find_member(ctx.tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Member", id))
    }

    /// 乐观锁写入，版本不一致说明被并发修改
    async fn save(&self, mut member: Member) -> Result<Member> {
        if !self.repo.update_member(&member).await? {
            warn!(tenant_id = member.tenant_id, member_id = member.id, "会员已被并发修改");
            return Err(AppError::conflict(format!(
                "Member {} was modified concurrently, please retry",
                member.id
            )));
        }
        member.version += 1;
        Ok(member)
    }

    /// 批量关联套餐，避免逐条查询
    async fn views(&self, ctx: &TenantContext, members: Vec<Member>, today: NaiveDate) -> Result<Vec<MemberView>> {
        let mut plan_ids: Vec<u64> = members.iter().map(|m| m.plan_id).collect();
        plan_ids.sort_unstable();
        plan_ids.dedup();

        let plans: HashMap<u64, Plan> = self
            .repo
            .find_plans(ctx.tenant_id, &plan_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        Ok(members
            .into_iter()
            .map(|m| {
                let plan = plans.get(&m.plan_id);
                MemberView::new(m, plan, today)
            })
            .collect())
    }

    pub async fn create(&self, ctx: &TenantContext, req: MemberReq, today: NaiveDate) -> Result<MemberView> {
        let plan_id = req.plan_id.ok_or_else(|| AppError::invalid("planId is required"))?;
        let name = required(req.name, "Name")?;
        let phone = required(req.phone, "Phone")?;
        let start_date = req
            .start_date
            .ok_or_else(|| AppError::invalid("startDate is required"))?;

        let plan = self.plan(ctx, plan_id).await?;
        let end_date = match req.end_date {
            Some(end) => end,
            None => plus_months(start_date, plan.duration_in_months)?,
        };

        let member = self
            .repo
            .insert_member(NewMember {
                tenant_id: ctx.tenant_id,
                plan_id: plan.id,
                name,
                email: req.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()),
                phone,
                start_date,
                end_date,
            })
            .await?;

        info!(tenant_id = ctx.tenant_id, member_id = member.id, plan_id = plan.id, "会员已创建");
        Ok(MemberView::new(member, Some(&plan), today))
    }

    /// Full update. A plan swap with a start date but no end date derives the
    /// end from the new plan; explicit dates are applied last and always win.
    pub async fn edit(&self, ctx: &TenantContext, id: u64, req: MemberReq, today: NaiveDate) -> Result<MemberView> {
        let mut member = self.member(ctx, id).await?;

        member.name = required(req.name, "Name")?;
        member.phone = required(req.phone, "Phone")?;
        member.email = req.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());

        let plan = match req.plan_id {
            Some(plan_id) => {
                let plan = self.plan(ctx, plan_id).await?;
                member.plan_id = plan.id;
                if let (Some(start), None) = (req.start_date, req.end_date) {
                    member.end_date = plus_months(start, plan.duration_in_months)?;
                }
                Some(plan)
            }
            None => None,
        };

        if let Some(start) = req.start_date {
            member.start_date = start;
        }
        if let Some(end) = req.end_date {
            member.end_date = end;
        }

        let member = self.save(member).await?;
        info!(tenant_id = ctx.tenant_id, member_id = member.id, "会员已更新");

        let plan = match plan {
            Some(plan) => Some(plan),
            None => self.repo.find_plan(ctx.tenant_id, member.plan_id).await?,
        };
        Ok(MemberView::new(member, plan.as_ref(), today))
    }

    /// 续费：已过期则从今天开始，否则从原到期日次日开始
    pub async fn renew(&self, ctx: &TenantContext, id: u64, req: RenewReq, today: NaiveDate) -> Result<MemberView> {
        let mut member = self.member(ctx, id).await?;

        let plan = self.plan(ctx, req.plan_id.unwrap_or(member.plan_id)).await?;
        member.plan_id = plan.id;

        let start = if today > member.end_date {
            today
        } else {
            member
                .end_date
                .succ_opt()
                .ok_or_else(|| AppError::invalid("Date out of range"))?
        };
        let end = match req.new_end_date {
            Some(end) => end,
            None => plus_months(start, plan.duration_in_months)?,
        };
        member.start_date = start;
        member.end_date = end;

        let member = self.save(member).await?;
        info!(
            tenant_id = ctx.tenant_id,
            member_id = member.id,
            start = %member.start_date,
            end = %member.end_date,
            "会员已续费"
        );
        Ok(MemberView::new(member, Some(&plan), today))
    }

    pub async fn delete(&self, ctx: &TenantContext, id: u64) -> Result<()> {
        self.member(ctx, id).await?;
        if !self.repo.delete_member(ctx.tenant_id, id).await? {
            return Err(AppError::not_found("Member", id));
        }
        info!(tenant_id = ctx.tenant_id, member_id = id, "会员已删除");
        Ok(())
    }

    pub async fn list(&self, ctx: &TenantContext, today: NaiveDate) -> Result<Vec<MemberView>> {
        let members = self.repo.list_members(ctx.tenant_id).await?;
        self.views(ctx, members, today).await
    }

    /// Members whose end date falls in `[today, today + days]`.
    pub async fn list_expiring(&self, ctx: &TenantContext, days: Option<i64>, today: NaiveDate) -> Result<Vec<MemberView>> {
        let days = days.unwrap_or(DEFAULT_EXPIRING_DAYS);
        if days < 0 {
            return Err(AppError::invalid("days must not be negative"));
        }
        let until = u64::try_from(days)
            .ok()
            .and_then(|d| today.checked_add_days(chrono::Days::new(d)))
            .ok_or_else(|| AppError::invalid("Date out of range"))?;

        let members = self
            .repo
            .list_members_ending_between(ctx.tenant_id, today, until)
            .await?;
        self.views(ctx, members, today).await
    }
}

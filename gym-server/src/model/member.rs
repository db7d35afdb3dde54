use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

use super::Plan;

/// A gym customer attached to one tenant and one plan.
///
/// `version` increases on every successful update and guards edits and
/// renewals against lost updates.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Member {
    pub id: u64,
    pub tenant_id: u64,
    pub plan_id: u64,
    pub name: String,
    #[sqlx(default)]
    pub email: Option<String>,
    pub phone: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub version: u32,
}

#[derive(Debug, Clone)]
pub struct NewMember {
    pub tenant_id: u64,
    pub plan_id: u64,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// 会员状态，读取时根据当天日期计算，不落库
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipStatus {
    Active,
    Expired,
    Future,
}

impl MembershipStatus {
    pub fn on(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Self {
        if today > end {
            Self::Expired
        } else if today < start {
            Self::Future
        } else {
            Self::Active
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub id: u64,
    pub plan_name: String,
    pub duration_in_months: u32,
    pub price: f64,
}

impl From<&Plan> for PlanSummary {
    fn from(plan: &Plan) -> Self {
        Self {
            id: plan.id,
            plan_name: plan.plan_name.clone(),
            duration_in_months: plan.duration_in_months,
            price: plan.price,
        }
    }
}

/// Member as returned to callers: the plan is joined in and the status
/// derived against the request's date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub id: u64,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub plan_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanSummary>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: MembershipStatus,
}

impl MemberView {
    pub fn new(member: Member, plan: Option<&Plan>, today: NaiveDate) -> Self {
        Self {
            status: MembershipStatus::on(member.start_date, member.end_date, today),
            id: member.id,
            name: member.name,
            email: member.email,
            phone: member.phone,
            plan_id: member.plan_id,
            plan: plan.map(PlanSummary::from),
            start_date: member.start_date,
            end_date: member.end_date,
        }
    }
}

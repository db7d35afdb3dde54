use serde::Serialize;
use sqlx::FromRow;

/// A membership tier owned by exactly one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: u64,
    pub plan_name: String,
    pub duration_in_months: u32,
    pub price: f64,
    #[serde(skip_serializing)]
    pub tenant_id: u64,
}

#[derive(Debug, Clone)]
pub struct NewPlan {
    pub plan_name: String,
    pub duration_in_months: u32,
    pub price: f64,
    pub tenant_id: u64,
}

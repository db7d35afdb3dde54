use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use crate::model::Tenant;

// ---- auth ----

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupReq {
    pub admin_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub gym_name: Option<String>,
    pub gym_address: Option<String>,
    pub gym_contact_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginReq {
    /// 包含 @ 视为邮箱，否则视为手机号
    pub email_or_phone: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub admin_name: Option<String>,
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: u64,
    pub admin_name: Option<String>,
    pub email: String,
    pub phone: String,
    pub gym_name: Option<String>,
    pub gym_address: Option<String>,
    pub gym_contact_number: Option<String>,
    pub role: String,
}

impl From<Tenant> for ProfileResponse {
    fn from(t: Tenant) -> Self {
        Self {
            id: t.id,
            admin_name: t.admin_name,
            email: t.email,
            phone: t.phone,
            gym_name: t.gym_name,
            gym_address: t.gym_address,
            gym_contact_number: t.gym_contact_number,
            role: t.role,
        }
    }
}

/// Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProfileReq {
    pub admin_name: Option<String>,
    pub phone: Option<String>,
    pub gym_name: Option<String>,
    pub gym_address: Option<String>,
    pub gym_contact_number: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangePasswordReq {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

// ---- plans ----

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatePlanReq {
    pub plan_name: Option<String>,
    pub duration_in_months: Option<i64>,
    pub price: Option<f64>,
}

/// Only non-empty names and positive numbers overwrite; zero, negative or
/// absent values leave the stored field as it is.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePlanReq {
    pub plan_name: Option<String>,
    pub duration_in_months: Option<i64>,
    pub price: Option<f64>,
}

// ---- members ----

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemberReq {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub plan_id: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenewReq {
    pub plan_id: Option<u64>,
    pub new_end_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpiringQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<String>,
}

// ---- health ----

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// UP | DEGRADED
    pub status: &'static str,
    pub timestamp: String,
    pub service: &'static str,
    /// UP | DOWN
    pub database: &'static str,
}

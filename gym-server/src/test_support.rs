//! Fixtures shared by service and router tests.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::db::{memory::MemoryRepository, Db, PlanRepository, TenantRepository};
use crate::dto::SignupReq;
use crate::model::{NewPlan, NewTenant, Plan, TenantContext};

pub const TEST_BCRYPT_COST: u32 = 4;

pub fn memory_db() -> Db {
    Arc::new(MemoryRepository::new())
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn signup_req(email: &str, phone: &str) -> SignupReq {
    SignupReq {
        admin_name: Some("Owner".to_string()),
        email: Some(email.to_string()),
        phone: Some(phone.to_string()),
        password: Some("password123".to_string()),
        gym_name: Some("Main Street Gym".to_string()),
        ..Default::default()
    }
}

/// Inserts a tenant directly, skipping password hashing.
pub async fn seed_tenant(db: &Db, email: &str, phone: &str) -> TenantContext {
    let tenant = db
        .insert_tenant(NewTenant {
            admin_name: Some("Owner".to_string()),
            email: email.to_string(),
            phone: phone.to_string(),
            password_hash: "not-a-hash".to_string(),
            gym_name: None,
            gym_address: None,
            gym_contact_number: None,
            role: "ADMIN".to_string(),
        })
        .await
        .unwrap();
    TenantContext {
        tenant_id: tenant.id,
        email: tenant.email,
    }
}

pub async fn seed_plan(db: &Db, ctx: &TenantContext, name: &str, months: u32) -> Plan {
    db.insert_plan(NewPlan {
        tenant_id: ctx.tenant_id,
        plan_name: name.to_string(),
        duration_in_months: months,
        price: 50.0,
    })
    .await
    .unwrap()
}

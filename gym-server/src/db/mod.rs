use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{mysql::MySqlPoolOptions, MySqlPool};
use std::sync::Arc;
use tracing::info;

use crate::config::DatabaseSettings;
use crate::error::Result;
use crate::model::{Member, NewMember, NewPlan, NewTenant, Plan, Tenant};

mod mysql;
pub use mysql::MySqlRepository;

#[cfg(test)]
pub mod memory;

/// Shared handle to the persistence layer, injected into handlers as an
/// `Extension`.
pub type Db = Arc<dyn Repository>;

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn find_tenant_by_id(&self, id: u64) -> Result<Option<Tenant>>;
    async fn find_tenant_by_email(&self, email: &str) -> Result<Option<Tenant>>;
    async fn find_tenant_by_phone(&self, phone: &str) -> Result<Option<Tenant>>;
    /// Fails with `Conflict` when email or phone is already registered.
    async fn insert_tenant(&self, tenant: NewTenant) -> Result<Tenant>;
    async fn update_tenant(&self, tenant: &Tenant) -> Result<()>;
}

/// Every lookup takes the owning tenant; a plan of another tenant is
/// indistinguishable from a missing one.
#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn list_plans(&self, tenant_id: u64) -> Result<Vec<Plan>>;
    async fn find_plan(&self, tenant_id: u64, id: u64) -> Result<Option<Plan>>;
    /// 批量查询，用于会员列表一次性关联套餐
    async fn find_plans(&self, tenant_id: u64, ids: &[u64]) -> Result<Vec<Plan>>;
    async fn insert_plan(&self, plan: NewPlan) -> Result<Plan>;
    async fn update_plan(&self, plan: &Plan) -> Result<()>;
    async fn delete_plan(&self, tenant_id: u64, id: u64) -> Result<bool>;
}

#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Ordered by id.
    async fn list_members(&self, tenant_id: u64) -> Result<Vec<Member>>;
    /// Members whose end date lies in `[from, to]`, both inclusive.
    async fn list_members_ending_between(
        &self,
        tenant_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Member>>;
    async fn find_member(&self, tenant_id: u64, id: u64) -> Result<Option<Member>>;
    async fn count_members_on_plan(&self, tenant_id: u64, plan_id: u64) -> Result<u64>;
    async fn insert_member(&self, member: NewMember) -> Result<Member>;
    /// Writes `member` only if the stored version still equals
    /// `member.version`, bumping it by one. Returns `false` when another
    /// write got there first.
    async fn update_member(&self, member: &Member) -> Result<bool>;
    async fn delete_member(&self, tenant_id: u64, id: u64) -> Result<bool>;
}

#[async_trait]
pub trait Repository: TenantRepository + PlanRepository + MemberRepository {
    /// 健康检查
    async fn ping(&self) -> Result<()>;
}

pub async fn create_pool(db_cfg: &DatabaseSettings) -> anyhow::Result<MySqlPool> {
    info!("连接数据库: {}@{}:{}/{}", db_cfg.user, db_cfg.host, db_cfg.port, db_cfg.database);

    let pool = MySqlPoolOptions::new()
        .max_connections(db_cfg.max_connections)
        .connect(&db_cfg.url())
        .await?;

    info!("数据库连接池创建成功");

    Ok(pool)
}

const SCHEMA: [&str; 3] = [
    r#"CREATE TABLE IF NOT EXISTS tenants (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        admin_name VARCHAR(255) NULL,
        email VARCHAR(255) NOT NULL,
        phone VARCHAR(32) NOT NULL,
        password_hash VARCHAR(255) NOT NULL,
        gym_name VARCHAR(255) NULL,
        gym_address VARCHAR(512) NULL,
        gym_contact_number VARCHAR(32) NULL,
        role VARCHAR(32) NOT NULL DEFAULT 'ADMIN',
        UNIQUE KEY uk_tenants_email (email),
        UNIQUE KEY uk_tenants_phone (phone)
    ) AUTO_INCREMENT = 10001"#,
    r#"CREATE TABLE IF NOT EXISTS plans (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        tenant_id BIGINT UNSIGNED NOT NULL,
        plan_name VARCHAR(255) NOT NULL,
        duration_in_months INT UNSIGNED NOT NULL,
        price DOUBLE NOT NULL,
        KEY idx_plans_tenant (tenant_id),
        CONSTRAINT fk_plans_tenant FOREIGN KEY (tenant_id) REFERENCES tenants (id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS members (
        id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
        tenant_id BIGINT UNSIGNED NOT NULL,
        plan_id BIGINT UNSIGNED NOT NULL,
        name VARCHAR(255) NOT NULL,
        email VARCHAR(255) NULL,
        phone VARCHAR(32) NOT NULL,
        start_date DATE NOT NULL,
        end_date DATE NOT NULL,
        version INT UNSIGNED NOT NULL DEFAULT 0,
        KEY idx_members_tenant_end (tenant_id, end_date),
        KEY idx_members_plan (plan_id),
        CONSTRAINT fk_members_tenant FOREIGN KEY (tenant_id) REFERENCES tenants (id),
        CONSTRAINT fk_members_plan FOREIGN KEY (plan_id) REFERENCES plans (id)
    )"#,
];

/// 初始化表结构（幂等）
pub async fn init_schema(pool: &MySqlPool) -> anyhow::Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("数据库表结构已就绪");
    Ok(())
}

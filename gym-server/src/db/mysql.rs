use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{MySql, MySqlPool, QueryBuilder};

use super::{MemberRepository, PlanRepository, Repository, TenantRepository};
use crate::error::{AppError, Result};
use crate::model::{Member, NewMember, NewPlan, NewTenant, Plan, Tenant};

const TENANT_COLUMNS: &str = "id, admin_name, email, phone, password_hash, gym_name, gym_address, gym_contact_number, role";
const PLAN_COLUMNS: &str = "id, plan_name, duration_in_months, price, tenant_id";
const MEMBER_COLUMNS: &str = "id, tenant_id, plan_id, name, email, phone, start_date, end_date, version";

/// sqlx 实现，生产环境使用
#[derive(Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn unique_violation(e: sqlx::Error) -> AppError {
    let duplicate = e
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);
    if duplicate {
        tracing::warn!(error = %e, "唯一约束冲突");
        AppError::conflict("Email or phone already exists")
    } else {
        AppError::from(e)
    }
}

/// 并发插入的会员仍引用该套餐时，外键拒绝删除
fn plan_in_use(e: sqlx::Error) -> AppError {
    let referenced = e
        .as_database_error()
        .map(|db| db.is_foreign_key_violation())
        .unwrap_or(false);
    if referenced {
        tracing::warn!(error = %e, "套餐仍被会员引用");
        AppError::conflict("Plan is assigned to members")
    } else {
        AppError::from(e)
    }
}

#[async_trait]
impl TenantRepository for MySqlRepository {
    async fn find_tenant_by_id(&self, id: u64) -> Result<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {} FROM tenants WHERE id = ?",
            TENANT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant)
    }

    async fn find_tenant_by_email(&self, email: &str) -> Result<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {} FROM tenants WHERE email = ?",
            TENANT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant)
    }

    async fn find_tenant_by_phone(&self, phone: &str) -> Result<Option<Tenant>> {
        let tenant = sqlx::query_as::<_, Tenant>(&format!(
            "SELECT {} FROM tenants WHERE phone = ?",
            TENANT_COLUMNS
        ))
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;
        Ok(tenant)
    }

    async fn insert_tenant(&self, tenant: NewTenant) -> Result<Tenant> {
        let result = sqlx::query(
            "INSERT INTO tenants (admin_name, email, phone, password_hash, gym_name, gym_address, gym_contact_number, role)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&tenant.admin_name)
        .bind(&tenant.email)
        .bind(&tenant.phone)
        .bind(&tenant.password_hash)
        .bind(&tenant.gym_name)
        .bind(&tenant.gym_address)
        .bind(&tenant.gym_contact_number)
        .bind(&tenant.role)
        .execute(&self.pool)
        .await
        .map_err(unique_violation)?;

        Ok(Tenant {
            id: result.last_insert_id(),
            admin_name: tenant.admin_name,
            email: tenant.email,
            phone: tenant.phone,
            password_hash: tenant.password_hash,
            gym_name: tenant.gym_name,
            gym_address: tenant.gym_address,
            gym_contact_number: tenant.gym_contact_number,
            role: tenant.role,
        })
    }

    async fn update_tenant(&self, tenant: &Tenant) -> Result<()> {
        sqlx::query(
            "UPDATE tenants SET admin_name = ?, phone = ?, password_hash = ?, gym_name = ?, gym_address = ?, gym_contact_number = ?
             WHERE id = ?",
        )
        .bind(&tenant.admin_name)
        .bind(&tenant.phone)
        .bind(&tenant.password_hash)
        .bind(&tenant.gym_name)
        .bind(&tenant.gym_address)
        .bind(&tenant.gym_contact_number)
        .bind(tenant.id)
        .execute(&self.pool)
        .await
        .map_err(unique_violation)?;
        Ok(())
    }
}

#[async_trait]
impl PlanRepository for MySqlRepository {
    async fn list_plans(&self, tenant_id: u64) -> Result<Vec<Plan>> {
        let plans = sqlx::query_as::<_, Plan>(&format!(
            "SELECT {} FROM plans WHERE tenant_id = ? ORDER BY id",
            PLAN_COLUMNS
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(plans)
    }

    async fn find_plan(&self, tenant_id: u64, id: u64) -> Result<Option<Plan>> {
        let plan = sqlx::query_as::<_, Plan>(&format!(
            "SELECT {} FROM plans WHERE id = ? AND tenant_id = ?",
            PLAN_COLUMNS
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(plan)
    }

    async fn find_plans(&self, tenant_id: u64, ids: &[u64]) -> Result<Vec<Plan>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<MySql>::new(format!("SELECT {} FROM plans WHERE tenant_id = ", PLAN_COLUMNS));
        builder.push_bind(tenant_id);
        builder.push(" AND id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let plans = builder
            .build_query_as::<Plan>()
            .fetch_all(&self.pool)
            .await?;
        Ok(plans)
    }

    async fn insert_plan(&self, plan: NewPlan) -> Result<Plan> {
        let result = sqlx::query(
            "INSERT INTO plans (tenant_id, plan_name, duration_in_months, price) VALUES (?, ?, ?, ?)",
        )
        .bind(plan.tenant_id)
        .bind(&plan.plan_name)
        .bind(plan.duration_in_months)
        .bind(plan.price)
        .execute(&self.pool)
        .await?;

        Ok(Plan {
            id: result.last_insert_id(),
            plan_name: plan.plan_name,
            duration_in_months: plan.duration_in_months,
            price: plan.price,
            tenant_id: plan.tenant_id,
        })
    }

    async fn update_plan(&self, plan: &Plan) -> Result<()> {
        sqlx::query(
            "UPDATE plans SET plan_name = ?, duration_in_months = ?, price = ? WHERE id = ? AND tenant_id = ?",
        )
        .bind(&plan.plan_name)
        .bind(plan.duration_in_months)
        .bind(plan.price)
        .bind(plan.id)
        .bind(plan.tenant_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_plan(&self, tenant_id: u64, id: u64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM plans WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await
            .map_err(plan_in_use)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MemberRepository for MySqlRepository {
    async fn list_members(&self, tenant_id: u64) -> Result<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(&format!(
            "SELECT {} FROM members WHERE tenant_id = ? ORDER BY id",
            MEMBER_COLUMNS
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn list_members_ending_between(
        &self,
        tenant_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(&format!(
            "SELECT {} FROM members WHERE tenant_id = ? AND end_date BETWEEN ? AND ? ORDER BY end_date, id",
            MEMBER_COLUMNS
        ))
        .bind(tenant_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn find_member(&self, tenant_id: u64, id: u64) -> Result<Option<Member>> {
        let member = sqlx::query_as::<_, Member>(&format!(
            "SELECT {} FROM members WHERE id = ? AND tenant_id = ?",
            MEMBER_COLUMNS
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(member)
    }

    async fn count_members_on_plan(&self, tenant_id: u64, plan_id: u64) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM members WHERE tenant_id = ? AND plan_id = ?",
        )
        .bind(tenant_id)
        .bind(plan_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    async fn insert_member(&self, member: NewMember) -> Result<Member> {
        let result = sqlx::query(
            "INSERT INTO members (tenant_id, plan_id, name, email, phone, start_date, end_date, version)
             VALUES (?, ?, ?, ?, ?, ?, ?, 0)",
        )
        .bind(member.tenant_id)
        .bind(member.plan_id)
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.phone)
        .bind(member.start_date)
        .bind(member.end_date)
        .execute(&self.pool)
        .await?;

        Ok(Member {
            id: result.last_insert_id(),
            tenant_id: member.tenant_id,
            plan_id: member.plan_id,
            name: member.name,
            email: member.email,
            phone: member.phone,
            start_date: member.start_date,
            end_date: member.end_date,
            version: 0,
        })
    }

    async fn update_member(&self, member: &Member) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE members
             SET plan_id = ?, name = ?, email = ?, phone = ?, start_date = ?, end_date = ?, version = version + 1
             WHERE id = ? AND tenant_id = ? AND version = ?",
        )
        .bind(member.plan_id)
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.phone)
        .bind(member.start_date)
        .bind(member.end_date)
        .bind(member.id)
        .bind(member.tenant_id)
        .bind(member.version)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_member(&self, tenant_id: u64, id: u64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM members WHERE id = ? AND tenant_id = ?")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn ping(&self) -> Result<()> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

use sqlx::FromRow;

pub const ROLE_ADMIN: &str = "ADMIN";

/// A gym admin account; the unit of data isolation.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Tenant {
    pub id: u64,
    #[sqlx(default)]
    pub admin_name: Option<String>,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    #[sqlx(default)]
    pub gym_name: Option<String>,
    #[sqlx(default)]
    pub gym_address: Option<String>,
    #[sqlx(default)]
    pub gym_contact_number: Option<String>,
    pub role: String,
}

/// 注册时写入的租户数据（id 由数据库分配）
#[derive(Debug, Clone)]
pub struct NewTenant {
    pub admin_name: Option<String>,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub gym_name: Option<String>,
    pub gym_address: Option<String>,
    pub gym_contact_number: Option<String>,
    pub role: String,
}

/// 认证中间件解析出的租户上下文，显式传递给每个业务操作
///
/// Only ever built from a verified bearer token, never from request bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub tenant_id: u64,
    pub email: String,
}

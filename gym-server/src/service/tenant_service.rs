// src/service/tenant_service.rs
use crate::db::{Db, TenantRepository};
use crate::dto::{ChangePasswordReq, LoginReq, SignupReq, UpdateProfileReq};
use crate::error::{AppError, Result};
use crate::model::{tenant::ROLE_ADMIN, NewTenant, Tenant, TenantContext};
use bcrypt::{hash, verify};
use gym_share::RedisClient;
use std::sync::Arc;
use tracing::{debug, info, warn};

const MIN_PASSWORD_LEN: usize = 8;

/// Tenant directory: signup, login, profile and bearer identity resolution.
pub struct TenantService {
    repo: Db,
    redis: Option<Arc<RedisClient>>,
    bcrypt_cost: u32,
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::invalid(format!("{} is required", field))),
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl TenantService {
    pub fn new(repo: Db, bcrypt_cost: u32) -> Self {
        Self {
            repo,
            redis: None,
            bcrypt_cost,
        }
    }

    pub fn with_redis(mut self, redis: Option<Arc<RedisClient>>) -> Self {
        self.redis = redis;
        self
    }

    fn cache_key_email(&self, email: &str) -> String {
        format!("tenant:email:{}", email)
    }

    fn hash_password(&self, password: &str) -> Result<String> {
        hash(password, self.bcrypt_cost).map_err(|e| {
            tracing::error!(error = %e, "密码加密失败");
            AppError::internal("Failed to hash password")
        })
    }

    fn password_matches(password: &str, password_hash: &str) -> Result<bool> {
        verify(password, password_hash).map_err(|e| {
            tracing::error!(error = %e, "密码校验失败");
            AppError::internal("Failed to verify password")
        })
    }

    /// 注册：邮箱、手机号全局唯一，角色固定为 ADMIN
    pub async fn signup(&self, req: SignupReq) -> Result<Tenant> {
        let email = required(req.email, "Email")?;
        let phone = required(req.phone, "Phone")?;
        let password = required(req.password, "Password")?;

        if !email.contains('@') {
            return Err(AppError::invalid("Email must contain '@'"));
        }
        if phone.contains('@') {
            return Err(AppError::invalid("Phone must not contain '@'"));
        }

        if self.repo.find_tenant_by_email(&email).await?.is_some() {
            warn!(email = %email, "邮箱已被注册");
            return Err(AppError::conflict("Email already exists"));
        }
        if self.repo.find_tenant_by_phone(&phone).await?.is_some() {
            warn!(phone = %phone, "手机号已被注册");
            return Err(AppError::conflict("Phone already exists"));
        }

        let password_hash = self.hash_password(&password)?;
        let tenant = self
            .repo
            .insert_tenant(NewTenant {
                admin_name: blank_to_none(req.admin_name),
                email,
                phone,
                password_hash,
                gym_name: blank_to_none(req.gym_name),
                gym_address: blank_to_none(req.gym_address),
                gym_contact_number: blank_to_none(req.gym_contact_number),
                role: ROLE_ADMIN.to_string(),
            })
            .await?;

        info!(tenant_id = tenant.id, email = %tenant.email, "租户注册成功");
        Ok(tenant)
    }

    /// 登录：标识中含 @ 按邮箱查询，否则按手机号查询
    pub async fn login(&self, req: &LoginReq) -> Result<Tenant> {
        let identifier = req.email_or_phone.trim();
        let tenant = if identifier.contains('@') {
            self.repo.find_tenant_by_email(identifier).await?
        } else {
            self.repo.find_tenant_by_phone(identifier).await?
        };

        let tenant = tenant.ok_or_else(|| AppError::unauthorized("Invalid email/phone"))?;

        if !Self::password_matches(&req.password, &tenant.password_hash)? {
            warn!(tenant_id = tenant.id, "密码错误");
            return Err(AppError::unauthorized("Invalid password"));
        }

        Ok(tenant)
    }

    /// Resolves the subject of a verified token to the tenant it names.
    pub async fn resolve(&self, email: &str) -> Result<TenantContext> {
        let key = self.cache_key_email(email);

        if let Some(ref redis) = self.redis {
            match redis.get(&key).await {
                Ok(Some(cached)) => match cached.parse::<u64>() {
                    Ok(tenant_id) => {
                        debug!(email = %email, "从缓存获取租户");
                        return Ok(TenantContext {
                            tenant_id,
                            email: email.to_string(),
                        });
                    }
                    Err(_) => {
                        warn!(key = %key, "缓存数据损坏，删除");
                        let _ = redis.del(&key).await;
                    }
                },
                Ok(None) => {}
                Err(e) => warn!(error = ?e, "从缓存获取租户失败"),
            }
        }

        let tenant = self
            .repo
            .find_tenant_by_email(email)
            .await?
            .ok_or_else(|| AppError::unauthorized("User not authenticated"))?;

        if let Some(ref redis) = self.redis {
            if let Err(e) = redis
                .set_with_ttl(&key, &tenant.id.to_string(), redis.ttl_secs())
                .await
            {
                warn!(error = ?e, "缓存租户信息失败");
            }
        }

        Ok(TenantContext {
            tenant_id: tenant.id,
            email: tenant.email,
        })
    }

    pub async fn profile(&self, ctx: &TenantContext) -> Result<Tenant> {
        self.repo
            .find_tenant_by_id(ctx.tenant_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("User not authenticated"))
    }

    /// Applies every present field; phone uniqueness is re-checked against
    /// other tenants only.
    pub async fn update_profile(&self, ctx: &TenantContext, req: UpdateProfileReq) -> Result<Tenant> {
        let mut tenant = self.profile(ctx).await?;

        if let Some(name) = req.admin_name {
            tenant.admin_name = Some(name);
        }
        if let Some(phone) = req.phone {
            let phone = phone.trim().to_string();
            if phone.is_empty() {
                return Err(AppError::invalid("Phone is required"));
            }
            if phone.contains('@') {
                return Err(AppError::invalid("Phone must not contain '@'"));
            }
            match self.repo.find_tenant_by_phone(&phone).await? {
                Some(existing) if existing.id != tenant.id => {
                    warn!(tenant_id = tenant.id, phone = %phone, "手机号已被其他租户占用");
                    return Err(AppError::conflict("Phone already exists"));
                }
                _ => {}
            }
            tenant.phone = phone;
        }
        if let Some(gym_name) = req.gym_name {
            tenant.gym_name = Some(gym_name);
        }
        if let Some(gym_address) = req.gym_address {
            tenant.gym_address = Some(gym_address);
        }
        if let Some(contact) = req.gym_contact_number {
            tenant.gym_contact_number = Some(contact);
        }
        if let Some(password) = req.password.filter(|p| !p.is_empty()) {
            tenant.password_hash = self.hash_password(&password)?;
        }

        self.repo.update_tenant(&tenant).await?;
        info!(tenant_id = tenant.id, "租户资料已更新");
        Ok(tenant)
    }

    pub async fn change_password(&self, ctx: &TenantContext, req: ChangePasswordReq) -> Result<()> {
        let mut tenant = self.profile(ctx).await?;

        if !Self::password_matches(&req.current_password, &tenant.password_hash)? {
            return Err(AppError::invalid("Current password is incorrect"));
        }
        if req.new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::invalid(format!(
                "New password must be at least {} characters long",
                MIN_PASSWORD_LEN
            )));
        }
        if Self::password_matches(&req.new_password, &tenant.password_hash)? {
            return Err(AppError::invalid("New password must be different from the current password"));
        }

        tenant.password_hash = self.hash_password(&req.new_password)?;
        self.repo.update_tenant(&tenant).await?;
        info!(tenant_id = tenant.id, "租户密码已修改");
        Ok(())
    }
}

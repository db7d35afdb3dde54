//! In-memory repository used by unit and router tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{MemberRepository, PlanRepository, Repository, TenantRepository};
use crate::error::{AppError, Result};
use crate::model::{Member, NewMember, NewPlan, NewTenant, Plan, Tenant};

#[derive(Default)]
struct State {
    next_id: u64,
    tenants: BTreeMap<u64, Tenant>,
    plans: BTreeMap<u64, Plan>,
    members: BTreeMap<u64, Member>,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TenantRepository for MemoryRepository {
    async fn find_tenant_by_id(&self, id: u64) -> Result<Option<Tenant>> {
        Ok(self.lock().tenants.get(&id).cloned())
    }

    async fn find_tenant_by_email(&self, email: &str) -> Result<Option<Tenant>> {
        Ok(self.lock().tenants.values().find(|t| t.email == email).cloned())
    }

    async fn find_tenant_by_phone(&self, phone: &str) -> Result<Option<Tenant>> {
        Ok(self.lock().tenants.values().find(|t| t.phone == phone).cloned())
    }

    async fn insert_tenant(&self, tenant: NewTenant) -> Result<Tenant> {
        let mut state = self.lock();
        if state
            .tenants
            .values()
            .any(|t| t.email == tenant.email || t.phone == tenant.phone)
        {
            return Err(AppError::conflict("Email or phone already exists"));
        }
        let id = state.next_id();
        let tenant = Tenant {
            id,
            admin_name: tenant.admin_name,
            email: tenant.email,
            phone: tenant.phone,
            password_hash: tenant.password_hash,
            gym_name: tenant.gym_name,
            gym_address: tenant.gym_address,
            gym_contact_number: tenant.gym_contact_number,
            role: tenant.role,
        };
        state.tenants.insert(id, tenant.clone());
        Ok(tenant)
    }

    async fn update_tenant(&self, tenant: &Tenant) -> Result<()> {
        let mut state = self.lock();
        if state
            .tenants
            .values()
            .any(|t| t.id != tenant.id && t.phone == tenant.phone)
        {
            return Err(AppError::conflict("Email or phone already exists"));
        }
        state.tenants.insert(tenant.id, tenant.clone());
        Ok(())
    }
}

#[async_trait]
impl PlanRepository for MemoryRepository {
    async fn list_plans(&self, tenant_id: u64) -> Result<Vec<Plan>> {
        Ok(self
            .lock()
            .plans
            .values()
            .filter(|p| p.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn find_plan(&self, tenant_id: u64, id: u64) -> Result<Option<Plan>> {
        Ok(self
            .lock()
            .plans
            .get(&id)
            .filter(|p| p.tenant_id == tenant_id)
            .cloned())
    }

    async fn find_plans(&self, tenant_id: u64, ids: &[u64]) -> Result<Vec<Plan>> {
        Ok(self
            .lock()
            .plans
            .values()
            .filter(|p| p.tenant_id == tenant_id && ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn insert_plan(&self, plan: NewPlan) -> Result<Plan> {
        let mut state = self.lock();
        let id = state.next_id();
        let plan = Plan {
            id,
            plan_name: plan.plan_name,
            duration_in_months: plan.duration_in_months,
            price: plan.price,
            tenant_id: plan.tenant_id,
        };
        state.plans.insert(id, plan.clone());
        Ok(plan)
    }

    async fn update_plan(&self, plan: &Plan) -> Result<()> {
        let mut state = self.lock();
        if let Some(stored) = state.plans.get_mut(&plan.id) {
            if stored.tenant_id == plan.tenant_id {
                *stored = plan.clone();
            }
        }
        Ok(())
    }

    async fn delete_plan(&self, tenant_id: u64, id: u64) -> Result<bool> {
        let mut state = self.lock();
        if state.members.values().any(|m| m.plan_id == id) {
            return Err(AppError::conflict("Plan is assigned to members"));
        }
        match state.plans.get(&id) {
            Some(p) if p.tenant_id == tenant_id => {
                state.plans.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl MemberRepository for MemoryRepository {
    async fn list_members(&self, tenant_id: u64) -> Result<Vec<Member>> {
        Ok(self
            .lock()
            .members
            .values()
            .filter(|m| m.tenant_id == tenant_id)
            .cloned()
            .collect())
    }

    async fn list_members_ending_between(
        &self,
        tenant_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Member>> {
        let mut members: Vec<Member> = self
            .lock()
            .members
            .values()
            .filter(|m| m.tenant_id == tenant_id && m.end_date >= from && m.end_date <= to)
            .cloned()
            .collect();
        members.sort_by_key(|m| (m.end_date, m.id));
        Ok(members)
    }

    async fn find_member(&self, tenant_id: u64, id: u64) -> Result<Option<Member>> {
        Ok(self
            .lock()
            .members
            .get(&id)
            .filter(|m| m.tenant_id == tenant_id)
            .cloned())
    }

    async fn count_members_on_plan(&self, tenant_id: u64, plan_id: u64) -> Result<u64> {
        Ok(self
            .lock()
            .members
            .values()
            .filter(|m| m.tenant_id == tenant_id && m.plan_id == plan_id)
            .count() as u64)
    }

    async fn insert_member(&self, member: NewMember) -> Result<Member> {
        let mut state = self.lock();
        let id = state.next_id();
        let member = Member {
            id,
            tenant_id: member.tenant_id,
            plan_id: member.plan_id,
            name: member.name,
            email: member.email,
            phone: member.phone,
            start_date: member.start_date,
            end_date: member.end_date,
            version: 0,
        };
        state.members.insert(id, member.clone());
        Ok(member)
    }

    async fn update_member(&self, member: &Member) -> Result<bool> {
        let mut state = self.lock();
        match state.members.get_mut(&member.id) {
            Some(stored) if stored.tenant_id == member.tenant_id && stored.version == member.version => {
                *stored = Member {
                    version: member.version + 1,
                    ..member.clone()
                };
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_member(&self, tenant_id: u64, id: u64) -> Result<bool> {
        let mut state = self.lock();
        match state.members.get(&id) {
            Some(m) if m.tenant_id == tenant_id => {
                state.members.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

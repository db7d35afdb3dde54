pub mod tenant;
pub use tenant::{NewTenant, Tenant, TenantContext};

pub mod plan;
pub use plan::{NewPlan, Plan};

pub mod member;
pub use member::{Member, MemberView, MembershipStatus, NewMember, PlanSummary};

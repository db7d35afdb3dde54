pub mod tenant_service;
pub mod plan_service;
pub mod member_service;
pub mod transfer_service;

pub use tenant_service::TenantService;
pub use plan_service::PlanService;
pub use member_service::MemberService;
pub use transfer_service::TransferService;

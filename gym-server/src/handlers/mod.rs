pub mod auth_handler;
pub mod plan_handler;
pub mod member_handler;
pub mod transfer_handler;
pub mod health_handler;

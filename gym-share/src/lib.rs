pub mod auth;
pub mod calendar;
pub mod redis;

// Re-exports for convenience
pub use auth::{JwtSettings, Claims, generate_token, verify_token};
pub use calendar::{DateParseError, add_months, parse_flexible_date, today};
pub use self::redis::{RedisClient, RedisConfig};

use jsonwebtoken::{encode, decode, Header, Algorithm, Validation, EncodingKey, DecodingKey};
use serde::{Deserialize, Serialize};
use chrono::{Utc, Duration};

/// JWT 配置
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    pub secret: String,
    #[serde(default = "default_expiration_hours")]
    pub expiration_hours: u64,
}

fn default_expiration_hours() -> u64 {
    6
}

/// JWT Claims
///
/// `sub` carries the tenant's email. Email is immutable after signup, so a
/// token stays bound to the same tenant for its whole lifetime.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(email: &str, expiration_hours: u64) -> Self {
        let now = Utc::now();
        let exp = now + Duration::hours(expiration_hours as i64);

        Claims {
            sub: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// 生成 token
pub fn generate_token(email: &str, jwt_cfg: &JwtSettings) -> anyhow::Result<String> {
    let claims = Claims::new(email, jwt_cfg.expiration_hours);
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_cfg.secret.as_ref()),
    )?;

    Ok(token)
}

/// 验证 token（签名 + 过期时间）
pub fn verify_token(token: &str, jwt_cfg: &JwtSettings) -> anyhow::Result<Claims> {
    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_cfg.secret.as_ref()),
        &validation,
    )?;

    Ok(token_data.claims)
}

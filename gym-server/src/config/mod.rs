use serde::Deserialize;
use std::{fs, path::Path};
use gym_share::{JwtSettings, RedisConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub port: u16,
    /// 请求体上限（MB），同时限制导入文件大小
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,
}

fn default_body_limit_mb() -> usize {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

impl DatabaseSettings {
    pub fn url(&self) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecuritySettings {
    /// bcrypt 加密强度
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub security: SecuritySettings,
    #[serde(default)]
    pub redis: RedisConfig,
}

const DEFAULT_CONFIG: &str = r#"
[server]
port = 8080
body_limit_mb = 5

[database]
host = "127.0.0.1"
port = 3306
user = "root"
password = "123456"
database = "gym_management"
max_connections = 10

[jwt]
secret = "change-me-in-production"
expiration_hours = 6

[security]
bcrypt_cost = 12

[redis]
enabled = false
"#;

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("GYM_SERVER_CONFIG")
            .unwrap_or_else(|_| "gym-server/config.toml".to_string());

        let content = match fs::read_to_string(Path::new(&path)) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "配置文件不可读，使用内置默认配置");
                DEFAULT_CONFIG.to_string()
            }
        };

        let mut config: AppConfig = toml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// 支持环境变量覆盖配置
    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(host) = std::env::var("DB_HOST") {
            self.database.host = host;
        }
        if let Ok(port) = std::env::var("DB_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.database.port = port;
            }
        }
        if let Ok(user) = std::env::var("DB_USER") {
            self.database.user = user;
        }
        if let Ok(password) = std::env::var("DB_PASSWORD") {
            self.database.password = password;
        }
        if let Ok(name) = std::env::var("DB_NAME") {
            self.database.database = name;
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.jwt.secret = secret;
        }
        if let Ok(hours) = std::env::var("JWT_EXPIRATION_HOURS") {
            if let Ok(hours) = hours.parse::<u64>() {
                self.jwt.expiration_hours = hours;
            }
        }
        if let Ok(enabled) = std::env::var("REDIS_ENABLED") {
            self.redis.enabled = matches!(enabled.as_str(), "1" | "true" | "TRUE");
        }
        if let Ok(host) = std::env::var("REDIS_HOST") {
            self.redis.host = host;
        }
    }
}

use redis::Client;
use redis::aio::ConnectionManager;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Redis 配置
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub db: u8,
    #[serde(default)]
    pub password: Option<String>,
    /// 缓存过期时间（秒）
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    6379
}

fn default_ttl_secs() -> u64 {
    3600
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_port(),
            db: 0,
            password: None,
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl RedisConfig {
    fn url(&self) -> String {
        if let Some(ref password) = self.password {
            format!("redis://:{}@{}:{}/{}", password, self.host, self.port, self.db)
        } else {
            format!("redis://{}:{}/{}", self.host, self.port, self.db)
        }
    }
}

/// Redis 客户端封装
pub struct RedisClient {
    manager: Arc<Mutex<ConnectionManager>>,
    ttl_secs: u64,
}

impl RedisClient {
    pub async fn new(config: &RedisConfig) -> anyhow::Result<Self> {
        info!("连接 Redis: {}:{}/{}", config.host, config.port, config.db);

        let client = Client::open(config.url())?;
        let manager = ConnectionManager::new(client).await?;

        // 测试连接
        let mut conn = manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        info!("Redis 连接成功");

        Ok(Self {
            manager: Arc::new(Mutex::new(manager)),
            ttl_secs: config.ttl_secs,
        })
    }

    /// 缓存默认过期时间（秒）
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    async fn get_connection(&self) -> ConnectionManager {
        self.manager.lock().await.clone()
    }

    /// 设置键值对（带过期时间，单位：秒）
    pub async fn set_with_ttl(&self, key: &str, value: &str, ttl: u64) -> Result<(), redis::RedisError> {
        let mut conn = self.get_connection().await;
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl)
            .query_async(&mut conn)
            .await
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, redis::RedisError> {
        let mut conn = self.get_connection().await;
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
    }

    pub async fn del(&self, key: &str) -> Result<(), redis::RedisError> {
        let mut conn = self.get_connection().await;
        redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
    }
}

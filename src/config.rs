use std::env;

pub const DEFAULT_CHANGE_CHANNEL: &str = "orders_changes";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub change_channel: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("PLATFORM_JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("PLATFORM_JWT_SECRET is not set"))?;
        let change_channel = env::var("ORDER_CHANGE_CHANNEL")
            .ok()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CHANGE_CHANNEL.to_string());
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        Ok(Self {
            port,
            database_url,
            jwt_secret,
            change_channel,
            host,
        })
    }
}

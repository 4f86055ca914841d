use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub session_secret: String,
    pub reset_secret: String,
    pub issuer: String,
    pub audience: String,
    pub session_ttl_hours: i64,
    pub reset_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub token: TokenConfig,
    /// Base the reset token gets appended to when building the emailed link.
    pub reset_password_url: String,
    pub secure_cookies: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let token = TokenConfig {
            session_secret: std::env::var("SESSION_SECRET")?,
            reset_secret: std::env::var("RESET_SECRET")?,
            issuer: std::env::var("TOKEN_ISSUER").unwrap_or_else(|_| "gatehouse".into()),
            audience: std::env::var("TOKEN_AUDIENCE")
                .unwrap_or_else(|_| "gatehouse-users".into()),
            session_ttl_hours: std::env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24 * 7),
            reset_ttl_minutes: std::env::var("RESET_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        let reset_password_url = std::env::var("RESET_PASSWORD_URL")
            .unwrap_or_else(|_| "http://localhost:8080/reset-password?token=".into());
        let secure_cookies = std::env::var("APP_ENV")
            .map(|v| v == "production")
            .unwrap_or(false);
        Ok(Self {
            database_url,
            token,
            reset_password_url,
            secure_cookies,
        })
    }
}

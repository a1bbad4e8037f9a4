use std::net::IpAddr;

/// Upper bound for `CAREERPATH_RESET_TTL_SECS` (7 days).
pub const MAX_RESET_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub reset_token_ttl_secs: i64,
    pub reset_sweep_secs: u64,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("CAREERPATH_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid CAREERPATH_HOST: {e}"))?;

        let port: u16 = env_or("CAREERPATH_PORT", "8000")
            .parse()
            .map_err(|e| format!("Invalid CAREERPATH_PORT: {e}"))?;

        let base_url = env_or("CAREERPATH_BASE_URL", &format!("http://{host}:{port}"));

        let reset_token_ttl_secs = parse_reset_ttl(&env_or("CAREERPATH_RESET_TTL_SECS", "3600"))?;

        let reset_sweep_secs: u64 = env_or("CAREERPATH_RESET_SWEEP_SECS", "900")
            .parse()
            .map_err(|e| format!("Invalid CAREERPATH_RESET_SWEEP_SECS: {e}"))?;

        let cors_origins: Vec<String> = env_or("CAREERPATH_CORS_ORIGINS", "")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let log_level = env_or("CAREERPATH_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("CAREERPATH_SMTP_HOST").ok(),
            std::env::var("CAREERPATH_SMTP_PORT").ok(),
            std::env::var("CAREERPATH_SMTP_USER").ok(),
            std::env::var("CAREERPATH_SMTP_PASS").ok(),
            std::env::var("CAREERPATH_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid CAREERPATH_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            base_url,
            reset_token_ttl_secs,
            reset_sweep_secs,
            cors_origins,
            log_level,
            smtp,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_reset_ttl(raw: &str) -> Result<i64, String> {
    let secs: i64 = raw
        .parse()
        .map_err(|e| format!("Invalid CAREERPATH_RESET_TTL_SECS: {e}"))?;
    if secs <= 0 || secs > MAX_RESET_TTL_SECS {
        return Err(format!(
            "CAREERPATH_RESET_TTL_SECS must be between 1 and {MAX_RESET_TTL_SECS}"
        ));
    }
    Ok(secs)
}

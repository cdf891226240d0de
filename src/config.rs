use std::{env, path::PathBuf, str::FromStr};

use anyhow::anyhow;

/// When inventory is taken out of stock for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationMode {
    /// Reserve inside the checkout transaction.
    Checkout,
    /// Validate at checkout, reserve when the payment proof is accepted.
    Proof,
}

impl FromStr for ReservationMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "checkout" => Ok(Self::Checkout),
            "proof" | "payment_proof" => Ok(Self::Proof),
            other => Err(anyhow!("unknown STOCK_RESERVATION value: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotifyConfig {
    pub token: Option<String>,
    pub endpoint: String,
    pub admin_whatsapp: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub public_url: String,
    pub storage_dir: PathBuf,
    pub proof_max_bytes: usize,
    pub notify: NotifyConfig,
    pub reservation: ReservationMode,
    pub lock_timeout_ms: u64,
    pub session_ttl_hours: i64,
    pub order_code_prefix: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000);
        let public_url = env::var("APP_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| format!("http://{host}:{port}"));
        let reservation = match env::var("STOCK_RESERVATION") {
            Ok(value) => value.parse()?,
            Err(_) => ReservationMode::Checkout,
        };

        Ok(Self {
            database_url,
            port,
            public_url: public_url.trim_end_matches('/').to_string(),
            host,
            storage_dir: env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("storage")),
            proof_max_bytes: parse_or("PROOF_MAX_BYTES", 10 * 1024 * 1024),
            notify: NotifyConfig {
                token: non_empty("FONNTE_TOKEN"),
                endpoint: env::var("FONNTE_URL")
                    .unwrap_or_else(|_| "https://api.fonnte.com/send".to_string()),
                admin_whatsapp: non_empty("FONNTE_ADMIN_WA"),
                timeout_secs: parse_or("NOTIFY_TIMEOUT_SECS", 10),
            },
            reservation,
            lock_timeout_ms: parse_or("LOCK_TIMEOUT_MS", 5000),
            session_ttl_hours: parse_or("ADMIN_SESSION_TTL_HOURS", 24 * 7),
            order_code_prefix: env::var("ORDER_CODE_PREFIX").unwrap_or_else(|_| "APP-".into()),
        })
    }

    /// Config for tests and tools that only need a database.
    pub fn for_database(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".into(),
            port: 3000,
            public_url: "http://127.0.0.1:3000".into(),
            storage_dir: PathBuf::from("storage"),
            proof_max_bytes: 10 * 1024 * 1024,
            notify: NotifyConfig {
                token: None,
                endpoint: "https://api.fonnte.com/send".into(),
                admin_whatsapp: None,
                timeout_secs: 10,
            },
            reservation: ReservationMode::Checkout,
            lock_timeout_ms: 5000,
            session_ttl_hours: 24 * 7,
            order_code_prefix: "APP-".into(),
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

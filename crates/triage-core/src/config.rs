use std::path::PathBuf;

use crate::error::{Result, TriageError};

/// Reads `dotenv()` if a `.env` file is present, following the teacher's
/// load-once-at-startup convention. Safe to call from every stage binary.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

pub fn env_required(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| TriageError::Config(format!("missing required env var {key}")))
}

pub fn env_u16(key: &str, default: u16) -> Result<u16> {
    match std::env::var(key) {
        Ok(v) => v
            .parse()
            .map_err(|_| TriageError::Config(format!("{key} must be a u16, got {v:?}"))),
        Err(_) => Ok(default),
    }
}

pub fn env_u64(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(v) => v
            .parse()
            .map_err(|_| TriageError::Config(format!("{key} must be a u64, got {v:?}"))),
        Err(_) => Ok(default),
    }
}

/// Broker connection mode — `direct` talks to a single host/port/db;
/// `sentinel` discovers the current master through a sentinel quorum.
#[derive(Debug, Clone)]
pub enum BrokerConfig {
    Direct {
        host: String,
        port: u16,
        db: u16,
        password: Option<String>,
    },
    Sentinel {
        hosts: Vec<String>,
        master_set: String,
        password: Option<String>,
    },
}

impl BrokerConfig {
    pub fn from_env() -> Result<Self> {
        match env_or("BROKER_MODE", "direct").as_str() {
            "sentinel" => {
                let hosts_raw = env_required("SENTINEL_HOSTS")?;
                let hosts = hosts_raw
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                Ok(BrokerConfig::Sentinel {
                    hosts,
                    master_set: env_required("SENTINEL_MASTER_SET")?,
                    password: env_opt("SENTINEL_PASSWORD"),
                })
            }
            "direct" => Ok(BrokerConfig::Direct {
                host: env_or("BROKER_HOST", "127.0.0.1"),
                port: env_u16("BROKER_PORT", 6379)?,
                db: env_u16("BROKER_DB", 0)?,
                password: env_opt("BROKER_PASSWORD"),
            }),
            other => Err(TriageError::Config(format!(
                "BROKER_MODE must be direct or sentinel, got {other:?}"
            ))),
        }
    }
}

/// Common config every stage reads: which broker to talk to, how long to
/// wait for outbound HTTP, and how chatty to be.
#[derive(Debug, Clone)]
pub struct CommonConfig {
    pub broker: BrokerConfigHandle,
    pub http_timeout_secs: u64,
    pub log_level: String,
}

/// Broker config is cheap to clone (small enum); kept behind a type alias
/// so call sites read naturally without `Arc` noise for something this
/// small.
pub type BrokerConfigHandle = BrokerConfig;

impl CommonConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            broker: BrokerConfig::from_env()?,
            http_timeout_secs: env_u64("HTTP_TIMEOUT_SECS", 10)?,
            log_level: env_or("LOGLEVEL", "info"),
        })
    }
}

#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub base_url: String,
    pub token: String,
}

impl PlatformConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: env_required("PLATFORM_URL")?,
            token: env_required("PLATFORM_TOKEN")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub base_url: String,
}

impl ModelConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: env_required("MODEL_URL")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub webhook_url: String,
}

impl ChatConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            webhook_url: env_required("CHAT_WEBHOOK_URL")?,
        })
    }
}

/// Not an enumerated key in the external-interfaces table (that table
/// only names the four egress collaborators), but retrieval's snippet
/// pathway calls verification's `/verify_email` over HTTP — the design
/// notes permit a direct in-process call as an alternative, but since
/// each stage is its own process here, retrieval needs to know where to
/// reach it.
#[derive(Debug, Clone)]
pub struct VerificationConfig {
    pub base_url: String,
}

impl VerificationConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: env_or("VERIFICATION_URL", "http://127.0.0.1:8001"),
        })
    }
}

#[derive(Debug, Clone)]
pub struct TrustFilesConfig {
    pub domains_file: PathBuf,
    pub users_file: PathBuf,
}

impl TrustFilesConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            domains_file: PathBuf::from(env_required("VERIFIED_DOMAINS_FILE")?),
            users_file: PathBuf::from(env_required("VERIFIED_USERS_FILE")?),
        })
    }
}

//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// ERP API configuration
    pub erp: ErpConfig,
    /// Inbound queue configuration
    pub queue: QueueConfig,
}

/// ERP API configuration
#[derive(Debug, Clone)]
pub struct ErpConfig {
    /// Base URL of the ERP API gateway
    pub base_url: String,
    /// API key sent with every read call, if the gateway requires one
    pub api_key: Option<String>,
}

/// Inbound queue configuration
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Capacity of the in-process inbound channel
    pub capacity: usize,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            erp: ErpConfig {
                base_url: env::var("ERP_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:8080".to_string()),
                api_key: env::var("ERP_API_KEY").ok().filter(|k| !k.is_empty()),
            },
            queue: QueueConfig {
                capacity: env::var("QUEUE_CAPACITY")
                    .ok()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(64),
            },
        }
    }
}

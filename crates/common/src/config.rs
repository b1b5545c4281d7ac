//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

use crate::storage::StorageConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Postgres connection URL
    pub database_url: String,
    pub max_db_connections: u32,

    /// JWT verification
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,
    /// Accounts provisioned with the admin role
    pub admin_emails: Vec<String>,

    /// Object storage holding payment screenshots
    pub storage_bucket: String,
    pub aws_region: String,

    /// Runtime configuration
    pub rust_log: String,
    pub port: u16,
    pub cors_allowed_origins: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let config = Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL is required"))?,
            max_db_connections: env::var("MAX_DB_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),

            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET is required"))?,
            jwt_issuer: env::var("JWT_ISSUER").ok(),
            jwt_audience: env::var("JWT_AUDIENCE").ok(),
            admin_emails: env::var("ADMIN_EMAILS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),

            storage_bucket: env::var("STORAGE_BUCKET")
                .map_err(|_| anyhow::anyhow!("STORAGE_BUCKET is required"))?,
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),

            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "regdesk=debug".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS").ok(),
        };

        Ok(config)
    }

    /// Storage settings used to build payment proof URLs
    pub fn storage(&self) -> StorageConfig {
        StorageConfig::new(self.storage_bucket.clone(), self.aws_region.clone())
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

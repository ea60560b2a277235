//! Server configuration
//!
//! Everything is settable from the CLI or environment; defaults suit local
//! development. `validate` refuses obviously unsafe production settings.

use std::net::SocketAddr;
use std::time::Duration;

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Shared secret for webhook HMAC verification
    pub webhook_secret: String,
    /// Base URL of the public verification frontend
    pub frontend_base: String,
    /// Hex-encoded 32-byte Ed25519 seed file; a fresh key is generated
    /// when absent
    pub signing_key_file: Option<String>,
    /// Optional JSON fixtures with meetings and participants
    pub fixtures_file: Option<String>,
    pub sweep_interval_secs: u64,
    pub log_level: String,
    pub log_format: String,
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid bind address: {e}"))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Refuse configurations that cannot be meant for production
    pub fn validate(&self, dev_mode: bool) -> anyhow::Result<()> {
        if !dev_mode && self.webhook_secret == "change-me-in-production" {
            anyhow::bail!(
                "webhook secret must be changed in production; set PROOFMEET_WEBHOOK_SECRET"
            );
        }
        if self.sweep_interval_secs == 0 {
            anyhow::bail!("sweep interval must be at least 1 second");
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            webhook_secret: "change-me-in-production".to_string(),
            frontend_base: "http://localhost:3000".to_string(),
            signing_key_file: None,
            fixtures_file: None,
            sweep_interval_secs: 5 * 60,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            shutdown_timeout_secs: 5,
        }
    }
}

//! Admin-plane process configuration.
//!
//! # Purpose
//! Reads listener addresses, change-feed limits, restart timing and the
//! installed certificate list from `LUMEN_*` environment variables, with an
//! optional YAML override file.
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "0.0.0.0:9089";
pub const DEFAULT_METRICS_BIND: &str = "0.0.0.0:9090";
pub const DEFAULT_SERVER_NAME: &str = "lumen";
pub const DEFAULT_CHANGES_LIMIT: u64 = 100;
pub const DEFAULT_CHANGE_RETENTION: usize = 1000;
pub const DEFAULT_RESTART_DELAY_MS: u64 = 2000;

// Admin plane configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct AdminPlaneConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub server_name: String,
    pub changes_limit: u64,
    pub change_retention: usize,
    pub restart_delay: Duration,
    pub certificates: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AdminPlaneConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    server_name: Option<String>,
    changes_limit: Option<u64>,
    change_retention: Option<usize>,
    restart_delay_ms: Option<u64>,
    certificates: Option<Vec<String>>,
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

impl AdminPlaneConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("LUMEN_ADMIN_BIND")
            .unwrap_or_else(|_| DEFAULT_BIND.to_string())
            .parse()
            .with_context(|| "parse LUMEN_ADMIN_BIND")?;
        let metrics_bind = std::env::var("LUMEN_METRICS_BIND")
            .unwrap_or_else(|_| DEFAULT_METRICS_BIND.to_string())
            .parse()
            .with_context(|| "parse LUMEN_METRICS_BIND")?;
        let server_name = std::env::var("LUMEN_SERVER_NAME")
            .or_else(|_| std::env::var("HOSTNAME"))
            .unwrap_or_else(|_| DEFAULT_SERVER_NAME.to_string());
        let changes_limit = std::env::var("LUMEN_CHANGES_LIMIT")
            .unwrap_or_else(|_| DEFAULT_CHANGES_LIMIT.to_string())
            .parse()
            .with_context(|| "parse LUMEN_CHANGES_LIMIT")?;
        let change_retention = std::env::var("LUMEN_CHANGE_RETENTION")
            .unwrap_or_else(|_| DEFAULT_CHANGE_RETENTION.to_string())
            .parse()
            .with_context(|| "parse LUMEN_CHANGE_RETENTION")?;
        let restart_delay_ms: u64 = std::env::var("LUMEN_RESTART_DELAY_MS")
            .unwrap_or_else(|_| DEFAULT_RESTART_DELAY_MS.to_string())
            .parse()
            .with_context(|| "parse LUMEN_RESTART_DELAY_MS")?;
        let certificates = std::env::var("LUMEN_CERTIFICATES")
            .map(|raw| split_list(&raw))
            .unwrap_or_default();
        Ok(Self {
            bind_addr,
            metrics_bind,
            server_name,
            changes_limit,
            change_retention,
            restart_delay: Duration::from_millis(restart_delay_ms),
            certificates,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("LUMEN_ADMIN_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read LUMEN_ADMIN_CONFIG: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        Ok(config)
    }

    fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: AdminPlaneConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse admin plane config yaml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.server_name {
            self.server_name = value;
        }
        if let Some(value) = override_cfg.changes_limit {
            self.changes_limit = value;
        }
        if let Some(value) = override_cfg.change_retention {
            self.change_retention = value;
        }
        if let Some(value) = override_cfg.restart_delay_ms {
            self.restart_delay = Duration::from_millis(value);
        }
        if let Some(value) = override_cfg.certificates {
            self.certificates = value;
        }
        Ok(())
    }
}

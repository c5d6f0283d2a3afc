use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use qrdrop_gate::{GateConfig, DEFAULT_MAX_UPLOAD_BYTES};
use qrdrop_render::RenderOptions;
use qrdrop_store::{ReaperConfig, StoreConfig};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Room left above `max_upload_bytes` for multipart boundaries and headers.
pub const MULTIPART_SLACK_BYTES: u64 = 64 * 1024;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Largest accepted image, inclusive.
    pub max_upload_bytes: u64,
    /// How long an upload stays retrievable.
    pub expiration_hours: i64,
    pub reap_interval_secs: u64,
    /// Store payloads on disk here instead of in memory.
    pub upload_dir: Option<PathBuf>,
    /// Origin used in retrieval URLs. Derived from the request when unset.
    pub public_base_url: Option<String>,
    pub render: RenderOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            expiration_hours: 24,
            reap_interval_secs: 300,
            upload_dir: None,
            public_base_url: None,
            render: RenderOptions::default(),
        }
    }
}

impl ServerConfig {
    pub fn gate_config(&self) -> GateConfig {
        GateConfig::with_max_upload_bytes(self.max_upload_bytes)
    }

    /// Fails when `expiration_hours` is not a usable window.
    pub fn store_config(&self) -> ServerResult<StoreConfig> {
        StoreConfig::with_ttl_hours(self.expiration_hours).map_err(|e| {
            ServerError::Config(format!(
                "expiration of {}h is not allowed: {e}",
                self.expiration_hours
            ))
        })
    }

    pub fn reaper_config(&self) -> ReaperConfig {
        ReaperConfig::with_interval(StdDuration::from_secs(self.reap_interval_secs))
    }

    /// Request body ceiling handed to axum.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_upload_bytes.saturating_add(MULTIPART_SLACK_BYTES))
            .unwrap_or(usize::MAX)
    }

    /// Check every setting before anything is started.
    pub fn validate(&self) -> ServerResult<()> {
        if self.max_upload_bytes == 0 {
            return Err(ServerError::Config("max upload size must be non-zero".into()));
        }
        self.store_config()?;
        self.reaper_config().validate()?;
        self.render.validate()?;
        if let Some(base) = &self.public_base_url {
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                return Err(ServerError::Config(format!(
                    "public base URL must start with http:// or https://, got '{base}'"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use qrdrop_store::MAX_TTL_HOURS;

    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "0.0.0.0:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(c.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(c.expiration_hours, 24);
        assert_eq!(c.reap_interval_secs, 300);
        assert!(c.upload_dir.is_none());
        assert!(c.public_base_url.is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn derived_configs() {
        let c = ServerConfig {
            max_upload_bytes: 1024,
            expiration_hours: 2,
            reap_interval_secs: 30,
            ..ServerConfig::default()
        };
        assert_eq!(c.gate_config().max_upload_bytes, 1024);
        assert_eq!(c.store_config().unwrap().ttl, Duration::hours(2));
        assert_eq!(c.reaper_config().interval, StdDuration::from_secs(30));
        assert_eq!(c.body_limit(), 1024 + 64 * 1024);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let zero_ttl = ServerConfig {
            expiration_hours: 0,
            ..ServerConfig::default()
        };
        assert!(zero_ttl.validate().is_err());

        for hours in [MAX_TTL_HOURS + 1, 3_000_000_000, i64::MAX / 2, i64::MAX] {
            let huge_ttl = ServerConfig {
                expiration_hours: hours,
                ..ServerConfig::default()
            };
            assert!(matches!(huge_ttl.validate(), Err(ServerError::Config(_))));
            assert!(huge_ttl.store_config().is_err());
        }

        let slow_reaper = ServerConfig {
            reap_interval_secs: 2 * 60 * 60,
            ..ServerConfig::default()
        };
        assert!(slow_reaper.validate().is_err());

        let bad_base = ServerConfig {
            public_base_url: Some("example.com".into()),
            ..ServerConfig::default()
        };
        assert!(matches!(bad_base.validate(), Err(ServerError::Config(_))));
    }
}

//! Client configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the master client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MasterClientConfig {
    /// `host:port` of the master's HTTP endpoint.
    pub master_address: String,

    /// Deadline for a single assign or lookup call.
    #[serde(with = "humantime_compat")]
    pub rpc_timeout: Duration,
}

impl Default for MasterClientConfig {
    fn default() -> Self {
        Self {
            master_address: "localhost:9333".into(),
            rpc_timeout: Duration::from_secs(5),
        }
    }
}

/// Configuration for the volume locator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeLocatorConfig {
    /// How long a looked-up volume location stays cached.
    #[serde(with = "humantime_compat")]
    pub volume_cache_ttl: Duration,

    pub volume_cache_capacity: usize,

    /// Deadline for one chunk deletion against a volume server.
    #[serde(with = "humantime_compat")]
    pub delete_timeout: Duration,
}

impl Default for VolumeLocatorConfig {
    fn default() -> Self {
        Self {
            volume_cache_ttl: Duration::from_secs(600),
            volume_cache_capacity: 4096,
            delete_timeout: Duration::from_secs(10),
        }
    }
}

/// Shared-secret settings for delete tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HS256 signing key shared with the volume servers. Empty disables
    /// token generation.
    pub signing_key: String,

    /// Lifetime of a generated token.
    #[serde(with = "humantime_compat")]
    pub expires_after: Duration,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            signing_key: String::new(),
            expires_after: Duration::from_secs(10),
        }
    }
}

/// Configuration for the remote filer client used by the mount.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilerClientConfig {
    /// `host:port` of the filer's HTTP endpoint.
    pub filer_address: String,

    #[serde(with = "humantime_compat")]
    pub rpc_timeout: Duration,
}

impl Default for FilerClientConfig {
    fn default() -> Self {
        Self {
            filer_address: "localhost:8888".into(),
            rpc_timeout: Duration::from_secs(10),
        }
    }
}

/// Top-level configuration for the filer's outbound clients.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub master: MasterClientConfig,
    pub locator: VolumeLocatorConfig,
    pub security: SecurityConfig,
}

/// Serialize `Duration` as fractional seconds.
pub mod humantime_compat {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_client_config() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.master.master_address, "localhost:9333");
        assert_eq!(cfg.master.rpc_timeout, Duration::from_secs(5));
        assert_eq!(cfg.locator.volume_cache_ttl, Duration::from_secs(600));
        assert!(cfg.security.signing_key.is_empty());
        assert_eq!(cfg.security.expires_after, Duration::from_secs(10));
    }

    #[test]
    fn test_config_from_toml() {
        let cfg: ClientConfig = toml::from_str(
            r#"
            [master]
            master_address = "master:9333"
            rpc_timeout = 1.5

            [security]
            signing_key = "s3cret"
            expires_after = 30
            "#,
        )
        .unwrap();
        assert_eq!(cfg.master.master_address, "master:9333");
        assert_eq!(cfg.master.rpc_timeout, Duration::from_millis(1500));
        assert_eq!(cfg.security.expires_after, Duration::from_secs(30));
        assert_eq!(cfg.locator.volume_cache_capacity, 4096);
    }

    #[test]
    fn test_negative_duration_rejected() {
        let res: Result<MasterClientConfig, _> = toml::from_str("rpc_timeout = -1.0");
        assert!(res.is_err());
    }
}

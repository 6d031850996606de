//! Mount configuration.

use std::time::Duration;

use filer_client::FilerClientConfig;
use filer_client::config::humantime_compat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MountConfig {
    /// Remote filer address and per-call deadline.
    pub filer: FilerClientConfig,

    /// How long a fetched entry stays in the attribute cache.
    #[serde(with = "humantime_compat")]
    pub attr_cache_ttl: Duration,

    pub attr_cache_capacity: usize,

    /// Page size used when reading a directory.
    pub dir_list_limit: u32,

    /// Permission bits reported for the mount root.
    pub root_mode: u32,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            filer: FilerClientConfig::default(),
            attr_cache_ttl: Duration::from_secs(3),
            attr_cache_capacity: 10_000,
            dir_list_limit: 1000,
            root_mode: 0o755,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml() {
        let config: MountConfig = toml::from_str(
            r#"
            attr_cache_ttl = 0.5

            [filer]
            filer_address = "filer:8888"
            "#,
        )
        .unwrap();
        assert_eq!(config.attr_cache_ttl, Duration::from_millis(500));
        assert_eq!(config.filer.filer_address, "filer:8888");
        assert_eq!(config.filer.rpc_timeout, Duration::from_secs(10));
        assert_eq!(config.attr_cache_capacity, 10_000);
    }
}

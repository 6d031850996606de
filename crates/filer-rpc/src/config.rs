//! Configuration of the filer server process.

use filer_client::ClientConfig;
use filer_logging::LogConfig;
use filer_meta::FilerConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Address the RPC and directory listing endpoints listen on.
    pub listen: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8888".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http: HttpConfig,
    pub filer: FilerConfig,
    pub client: ClientConfig,
    pub log: LogConfig,
}

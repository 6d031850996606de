//! Service lifecycle and TOML configuration shared by filer binaries.

use std::future::Future;
use std::path::Path;

use async_trait::async_trait;
use filer_types::status_code::StatusCode;
use filer_types::{Result, Status};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A configuration section that can be read from and dumped to TOML.
/// Missing keys take their `Default` values.
pub trait AppConfig: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static {}

impl<T> AppConfig for T where T: Serialize + DeserializeOwned + Default + Clone + Send + Sync + 'static
{}

/// A long-running service: `init` builds state from config, `start` begins
/// serving and returns, `stop` drains.
#[async_trait]
pub trait Application: Send + Sync + 'static {
    type Config: AppConfig;

    fn name(&self) -> &str;
    async fn init(&mut self, config: &Self::Config) -> Result<()>;
    async fn start(&mut self) -> Result<()>;
    async fn stop(&mut self) -> Result<()>;
}

pub fn parse_config<C: AppConfig>(text: &str) -> Result<C> {
    toml::from_str(text).map_err(|e| Status::with_message(StatusCode::SERDE_INVALID_TOML, e.message()))
}

/// Read `path`, or fall back to the defaults when there is none.
pub fn load_config<C: AppConfig>(path: Option<&Path>) -> Result<C> {
    match path {
        None => Ok(C::default()),
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| {
                Status::with_message(StatusCode::INVALID_CONFIG, format!("{}: {e}", path.display()))
            })
            .and_then(|text| parse_config(&text)),
    }
}

pub fn dump_default_config<C: AppConfig>() -> Result<String> {
    toml::to_string_pretty(&C::default())
        .map_err(|e| Status::with_message(StatusCode::SERDE_INVALID_TOML, e.to_string()))
}

/// Resolves on CTRL+C or SIGTERM.
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            tracing::warn!(error = %e, "cannot listen for SIGTERM");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
        _ = term.recv() => tracing::info!("terminated"),
    }
}

/// Init and start `app`, serve until `shutdown` resolves, then stop it.
pub async fn run_until<A, F>(mut app: A, config: A::Config, shutdown: F) -> Result<()>
where
    A: Application,
    F: Future<Output = ()>,
{
    app.init(&config).await?;
    app.start().await?;
    tracing::info!(app = app.name(), "running");
    shutdown.await;
    tracing::info!(app = app.name(), "stopping");
    app.stop().await
}

pub async fn run_application<A: Application>(app: A, config: A::Config) -> Result<()> {
    run_until(app, config, shutdown_signal()).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct DemoConfig {
        listen: String,
        limit: u32,
    }

    impl Default for DemoConfig {
        fn default() -> Self {
            Self {
                listen: "0.0.0.0:8888".into(),
                limit: 100,
            }
        }
    }

    struct Recorder {
        calls: Arc<Mutex<Vec<String>>>,
        fail_start: bool,
    }

    #[async_trait]
    impl Application for Recorder {
        type Config = DemoConfig;

        fn name(&self) -> &str {
            "recorder"
        }

        async fn init(&mut self, config: &DemoConfig) -> Result<()> {
            self.calls.lock().push(format!("init {}", config.limit));
            Ok(())
        }

        async fn start(&mut self) -> Result<()> {
            self.calls.lock().push("start".into());
            if self.fail_start {
                return Err(Status::new(StatusCode::IO_ERROR));
            }
            Ok(())
        }

        async fn stop(&mut self) -> Result<()> {
            self.calls.lock().push("stop".into());
            Ok(())
        }
    }

    #[test]
    fn test_parse_config() {
        let config: DemoConfig = parse_config("limit = 7").unwrap();
        assert_eq!(config.limit, 7);
        assert_eq!(config.listen, "0.0.0.0:8888");

        let err = parse_config::<DemoConfig>("limit = \"many\"").unwrap_err();
        assert_eq!(err.code(), StatusCode::SERDE_INVALID_TOML);
    }

    #[test]
    fn test_load_config() {
        assert_eq!(load_config::<DemoConfig>(None).unwrap(), DemoConfig::default());
        let err = load_config::<DemoConfig>(Some(Path::new("/nonexistent/filer.toml"))).unwrap_err();
        assert_eq!(err.code(), StatusCode::INVALID_CONFIG);
    }

    #[test]
    fn test_dumped_defaults_parse_back() {
        let text = dump_default_config::<DemoConfig>().unwrap();
        assert!(text.contains("limit = 100"));
        assert_eq!(parse_config::<DemoConfig>(&text).unwrap(), DemoConfig::default());
    }

    #[tokio::test]
    async fn test_run_until_lifecycle() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let app = Recorder {
            calls: calls.clone(),
            fail_start: false,
        };
        run_until(app, DemoConfig::default(), async {}).await.unwrap();
        assert_eq!(*calls.lock(), vec!["init 100", "start", "stop"]);
    }

    #[tokio::test]
    async fn test_failed_start_skips_stop() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let app = Recorder {
            calls: calls.clone(),
            fail_start: true,
        };
        let err = run_until(app, DemoConfig::default(), std::future::pending())
            .await
            .unwrap_err();
        assert_eq!(err.code(), StatusCode::IO_ERROR);
        assert_eq!(*calls.lock(), vec!["init 100", "start"]);
    }
}

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use filer_app::Application;
use filer_client::VolumeLocator;
use filer_kv_backends::MemDbEngine;
use filer_meta::FilerImpl;
use filer_types::{Result, Status, StatusCode};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::http::router;
use crate::rpc::FilerRpc;

/// The filer process: namespace store, chunk GC and the HTTP surface.
#[derive(Default)]
pub struct FilerServer {
    listen: String,
    filer: Option<Arc<FilerImpl<MemDbEngine>>>,
    rpc: Option<Arc<FilerRpc>>,
    local_addr: Option<SocketAddr>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    serve_handle: Option<JoinHandle<std::io::Result<()>>>,
}

impl FilerServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address actually bound, available once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}

#[async_trait]
impl Application for FilerServer {
    type Config = ServerConfig;

    fn name(&self) -> &str {
        "filer-server"
    }

    async fn init(&mut self, config: &ServerConfig) -> Result<()> {
        let engine = Arc::new(MemDbEngine::new());
        let locator = Arc::new(VolumeLocator::connect(&config.client).map_err(Status::from)?);
        let filer = Arc::new(FilerImpl::new(
            config.filer.clone(),
            engine,
            locator.clone(),
        ));
        self.rpc = Some(Arc::new(FilerRpc::new(
            filer.clone(),
            locator,
            config.filer.clone(),
        )));
        self.filer = Some(filer);
        self.listen = config.http.listen.clone();
        tracing::info!(
            listen = %self.listen,
            master = %config.client.master.master_address,
            "filer initialized"
        );
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        let Some(rpc) = self.rpc.clone() else {
            return Err(Status::with_message(
                StatusCode::INVALID_ARG,
                "start called before init",
            ));
        };
        let listener = tokio::net::TcpListener::bind(&self.listen)
            .await
            .map_err(|e| Status::with_message(StatusCode::IO_ERROR, format!("bind {}: {e}", self.listen)))?;
        let addr = listener
            .local_addr()
            .map_err(|e| Status::with_message(StatusCode::IO_ERROR, e.to_string()))?;
        self.local_addr = Some(addr);

        let (tx, rx) = oneshot::channel();
        self.shutdown_tx = Some(tx);
        self.serve_handle = Some(tokio::spawn(async move {
            axum::serve(listener, router(rpc))
                .with_graceful_shutdown(async {
                    let _ = rx.await;
                })
                .await
        }));
        tracing::info!(%addr, "filer listening");
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.serve_handle.take() {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "http server exited with error"),
                Err(e) => tracing::warn!(error = %e, "http server task failed"),
            }
        }
        if let Some(filer) = self.filer.take() {
            filer.shutdown().await;
        }
        self.rpc = None;
        Ok(())
    }
}

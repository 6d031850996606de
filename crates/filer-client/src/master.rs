//! Master client: volume assignment and volume location lookup.

use async_trait::async_trait;
use filer_proto::master::{AssignResult, LookupResult};
use filer_types::VolumeId;

use crate::config::MasterClientConfig;
use crate::deadline::with_deadline;
use crate::error::{ClientError, ClientResult};

/// Parameters of a write assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignRequest {
    pub count: u32,
    pub replication: String,
    pub collection: String,
}

/// Trait for interacting with the master.
///
/// Both calls return the master's answer verbatim, including its `error`
/// field; interpreting that field is up to the caller.
#[async_trait]
pub trait MasterClient: Send + Sync {
    async fn assign(&self, req: &AssignRequest) -> ClientResult<AssignResult>;

    async fn lookup(&self, volume_id: VolumeId) -> ClientResult<LookupResult>;
}

/// `MasterClient` over the master's HTTP directory API.
pub struct HttpMasterClient {
    config: MasterClientConfig,
    http: reqwest::Client,
}

impl HttpMasterClient {
    pub fn new(config: MasterClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.rpc_timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(Self { config, http })
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.config.master_address, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let rsp = self
            .http
            .get(self.url(path))
            .query(query)
            .send()
            .await?;
        // The master reports refusals in the body with a non-2xx status, so
        // the body is decoded regardless of the status code.
        let status = rsp.status();
        let body = rsp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            ClientError::InvalidResponse(format!("{path} returned {status}: {e}"))
        })
    }
}

#[async_trait]
impl MasterClient for HttpMasterClient {
    async fn assign(&self, req: &AssignRequest) -> ClientResult<AssignResult> {
        let mut query = vec![("count", req.count.max(1).to_string())];
        if !req.replication.is_empty() {
            query.push(("replication", req.replication.clone()));
        }
        if !req.collection.is_empty() {
            query.push(("collection", req.collection.clone()));
        }
        with_deadline(
            "master assign",
            self.config.rpc_timeout,
            self.get_json("/dir/assign", &query),
        )
        .await
    }

    async fn lookup(&self, volume_id: VolumeId) -> ClientResult<LookupResult> {
        let query = [("volumeId", volume_id.to_string())];
        with_deadline(
            "master lookup",
            self.config.rpc_timeout,
            self.get_json("/dir/lookup", &query),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filer_types::{ErrorKind, Status};
    use std::time::Duration;

    #[test]
    fn test_url() {
        let client = HttpMasterClient::new(MasterClientConfig {
            master_address: "master:9333".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.url("/dir/assign"), "http://master:9333/dir/assign");
    }

    #[tokio::test]
    async fn test_unreachable_master_is_remote_error() {
        // Port 9 (discard) on localhost is not expected to run an HTTP server.
        let client = HttpMasterClient::new(MasterClientConfig {
            master_address: "127.0.0.1:9".into(),
            rpc_timeout: Duration::from_secs(2),
        })
        .unwrap();
        let err = client.lookup(VolumeId(1)).await.unwrap_err();
        let status: Status = err.into();
        assert_eq!(status.kind(), ErrorKind::RemoteUnavailable, "{status}");
    }
}

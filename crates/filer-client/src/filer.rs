//! Remote access to the filer RPC surface.

use async_trait::async_trait;
use filer_proto::filer::*;
use filer_types::Status;
use filer_types::status_code::RPCCode;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::FilerClientConfig;
use crate::deadline::with_deadline;
use crate::error::{ClientError, ClientResult};

/// The filer operations a remote caller (such as the mount) can invoke.
#[async_trait]
pub trait FilerClient: Send + Sync {
    async fn lookup_directory_entry(
        &self,
        req: LookupDirectoryEntryReq,
    ) -> ClientResult<LookupDirectoryEntryRsp>;

    async fn list_entries(&self, req: ListEntriesReq) -> ClientResult<ListEntriesRsp>;

    async fn get_entry_attributes(
        &self,
        req: GetEntryAttributesReq,
    ) -> ClientResult<GetEntryAttributesRsp>;

    async fn create_entry(&self, req: CreateEntryReq) -> ClientResult<CreateEntryRsp>;

    async fn update_entry(&self, req: UpdateEntryReq) -> ClientResult<UpdateEntryRsp>;

    async fn delete_entry(&self, req: DeleteEntryReq) -> ClientResult<DeleteEntryRsp>;

    async fn assign_volume(&self, req: AssignVolumeReq) -> ClientResult<AssignVolumeRsp>;

    async fn lookup_volume(&self, req: LookupVolumeReq) -> ClientResult<LookupVolumeRsp>;
}

/// `FilerClient` over the filer's `POST /rpc/<Operation>` JSON endpoints.
pub struct HttpFilerClient {
    config: FilerClientConfig,
    http: reqwest::Client,
}

impl HttpFilerClient {
    pub fn new(config: FilerClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.rpc_timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(Self { config, http })
    }

    fn base_url(&self) -> String {
        let addr = self.config.filer_address.trim_end_matches('/');
        if addr.starts_with("http://") || addr.starts_with("https://") {
            addr.to_string()
        } else {
            format!("http://{addr}")
        }
    }

    async fn call<Req, Rsp>(&self, op: &'static str, req: &Req) -> ClientResult<Rsp>
    where
        Req: Serialize + Sync,
        Rsp: DeserializeOwned,
    {
        with_deadline(op, self.config.rpc_timeout, self.post(op, req)).await
    }

    async fn post<Req, Rsp>(&self, op: &'static str, req: &Req) -> ClientResult<Rsp>
    where
        Req: Serialize + Sync,
        Rsp: DeserializeOwned,
    {
        let url = format!("{}/rpc/{op}", self.base_url());
        let rsp = self.http.post(&url).json(req).send().await?;
        let status = rsp.status();
        let body = rsp.bytes().await?;
        if status.is_success() {
            return serde_json::from_slice(&body)
                .map_err(|e| ClientError::InvalidResponse(format!("{op}: {e}")));
        }
        // Errors carry the filer's status code so callers can tell
        // NotFound from AlreadyExists from an unreachable backend.
        match serde_json::from_slice::<RpcError>(&body) {
            Ok(err) => Err(Status::with_message(err.code, err.message).into()),
            Err(_) => Err(Status::with_message(
                RPCCode::REQUEST_REFUSED,
                format!("{op} returned {status}"),
            )
            .into()),
        }
    }
}

#[async_trait]
impl FilerClient for HttpFilerClient {
    async fn lookup_directory_entry(
        &self,
        req: LookupDirectoryEntryReq,
    ) -> ClientResult<LookupDirectoryEntryRsp> {
        self.call("LookupDirectoryEntry", &req).await
    }

    async fn list_entries(&self, req: ListEntriesReq) -> ClientResult<ListEntriesRsp> {
        self.call("ListEntries", &req).await
    }

    async fn get_entry_attributes(
        &self,
        req: GetEntryAttributesReq,
    ) -> ClientResult<GetEntryAttributesRsp> {
        self.call("GetEntryAttributes", &req).await
    }

    async fn create_entry(&self, req: CreateEntryReq) -> ClientResult<CreateEntryRsp> {
        self.call("CreateEntry", &req).await
    }

    async fn update_entry(&self, req: UpdateEntryReq) -> ClientResult<UpdateEntryRsp> {
        self.call("UpdateEntry", &req).await
    }

    async fn delete_entry(&self, req: DeleteEntryReq) -> ClientResult<DeleteEntryRsp> {
        self.call("DeleteEntry", &req).await
    }

    async fn assign_volume(&self, req: AssignVolumeReq) -> ClientResult<AssignVolumeRsp> {
        self.call("AssignVolume", &req).await
    }

    async fn lookup_volume(&self, req: LookupVolumeReq) -> ClientResult<LookupVolumeRsp> {
        self.call("LookupVolume", &req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        let client = HttpFilerClient::new(FilerClientConfig {
            filer_address: "filer:8888/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://filer:8888");
    }
}

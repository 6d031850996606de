//! Volume server client: chunk deletion.

use std::time::Duration;

use async_trait::async_trait;
use filer_types::Status;
use filer_types::status_code::StorageClientCode;
use reqwest::StatusCode;

use crate::error::{ClientError, ClientResult};

#[async_trait]
pub trait VolumeServerClient: Send + Sync {
    /// Delete `file_id` from the volume server at `url`. Deleting an id the
    /// server no longer has succeeds.
    async fn delete(&self, url: &str, file_id: &str, auth_token: &str) -> ClientResult<()>;
}

pub struct HttpVolumeServerClient {
    http: reqwest::Client,
}

impl HttpVolumeServerClient {
    pub fn new(timeout: Duration) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(Self { http })
    }
}

pub(crate) fn chunk_url(url: &str, file_id: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        format!("{}/{file_id}", url.trim_end_matches('/'))
    } else {
        format!("http://{}/{file_id}", url.trim_end_matches('/'))
    }
}

#[async_trait]
impl VolumeServerClient for HttpVolumeServerClient {
    async fn delete(&self, url: &str, file_id: &str, auth_token: &str) -> ClientResult<()> {
        let mut req = self.http.delete(chunk_url(url, file_id));
        if !auth_token.is_empty() {
            req = req.header(reqwest::header::AUTHORIZATION, format!("BEARER {auth_token}"));
        }
        let rsp = req.send().await?;
        match rsp.status() {
            s if s.is_success() || s == StatusCode::NOT_FOUND => Ok(()),
            s => {
                let body = rsp.text().await.unwrap_or_default();
                Err(Status::with_message(
                    StorageClientCode::DELETE_FAILED,
                    format!("delete {file_id} on {url}: {s} {body}"),
                )
                .into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_url() {
        assert_eq!(
            chunk_url("127.0.0.1:8080", "3,01637037d6"),
            "http://127.0.0.1:8080/3,01637037d6"
        );
        assert_eq!(
            chunk_url("https://vol1:8080/", "3,01637037d6"),
            "https://vol1:8080/3,01637037d6"
        );
    }
}

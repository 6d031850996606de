//! Volume location, write assignment and chunk deletion.
//!
//! `VolumeLocator` is the single entry point the filer uses to reach the
//! master and volume servers. Volume locations are cached per volume id for a
//! bounded time; every remote call runs under a deadline and is never
//! retried.

use std::collections::BTreeMap;
use std::sync::Arc;

use filer_proto::FileId;
use filer_proto::filer::{Location, Locations};
use filer_proto::master::AssignResult;
use filer_types::status_code::{MasterCode, StatusCode};
use filer_types::{Status, VolumeId};
use filer_utils::TtlCache;

use crate::config::{ClientConfig, MasterClientConfig, SecurityConfig, VolumeLocatorConfig};
use crate::deadline::with_deadline;
use crate::error::ClientResult;
use crate::master::{AssignRequest, HttpMasterClient, MasterClient};
use crate::security::gen_delete_token;
use crate::volume_server::{HttpVolumeServerClient, VolumeServerClient};

pub struct VolumeLocator {
    master: Arc<dyn MasterClient>,
    volume_server: Arc<dyn VolumeServerClient>,
    master_config: MasterClientConfig,
    config: VolumeLocatorConfig,
    security: SecurityConfig,
    cache: TtlCache<VolumeId, Vec<Location>>,
}

impl VolumeLocator {
    pub fn new(
        master: Arc<dyn MasterClient>,
        volume_server: Arc<dyn VolumeServerClient>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            master,
            volume_server,
            master_config: config.master.clone(),
            cache: TtlCache::new(
                config.locator.volume_cache_ttl,
                config.locator.volume_cache_capacity,
            ),
            config: config.locator.clone(),
            security: config.security.clone(),
        }
    }

    /// Build a locator backed by the HTTP master and volume-server clients.
    pub fn connect(config: &ClientConfig) -> ClientResult<Self> {
        let master = HttpMasterClient::new(config.master.clone())?;
        let volume_server = HttpVolumeServerClient::new(config.locator.delete_timeout)?;
        Ok(Self::new(Arc::new(master), Arc::new(volume_server), config))
    }

    /// Resolve volume ids to their storage locations.
    ///
    /// Ids the master does not know map to an empty location list; an
    /// unreachable master fails the whole call.
    pub async fn lookup_volume(&self, volume_ids: &[String]) -> ClientResult<BTreeMap<String, Locations>> {
        let mut out = BTreeMap::new();
        for raw in volume_ids {
            let vid: VolumeId = raw.trim().parse().map_err(|_| {
                Status::with_message(StatusCode::INVALID_ARG, format!("invalid volume id {raw:?}"))
            })?;
            let locations = self.locations(vid).await?;
            out.insert(raw.clone(), Locations { locations });
        }
        Ok(out)
    }

    /// Locations of one volume, from cache or the master.
    pub async fn locations(&self, vid: VolumeId) -> ClientResult<Vec<Location>> {
        if let Some(locations) = self.cache.get(&vid) {
            return Ok(locations);
        }
        let result = with_deadline(
            "lookup volume",
            self.master_config.rpc_timeout,
            self.master.lookup(vid),
        )
        .await?;
        if !result.error.is_empty() {
            tracing::debug!(%vid, error = %result.error, "master lookup returned no locations");
            return Ok(Vec::new());
        }
        if !result.locations.is_empty() {
            self.cache.insert(vid, result.locations.clone());
        }
        Ok(result.locations)
    }

    /// Ask the master to reserve `count` file ids.
    pub async fn assign_volume(&self, req: &AssignRequest) -> ClientResult<AssignResult> {
        let result = with_deadline(
            "assign volume",
            self.master_config.rpc_timeout,
            self.master.assign(req),
        )
        .await?;
        if !result.error.is_empty() {
            return Err(Status::with_message(
                MasterCode::ASSIGN_FAILED,
                format!("assign volume result: {}", result.error),
            )
            .into());
        }
        if result.fid.is_empty() || result.url.is_empty() {
            return Err(Status::with_message(MasterCode::BAD_RESPONSE, "assign returned no fid").into());
        }
        Ok(result)
    }

    /// Token authorizing the deletion of `file_id`.
    pub fn delete_token(&self, file_id: &str) -> ClientResult<String> {
        gen_delete_token(&self.security, file_id)
    }

    /// Delete `file_id` from the volume server that holds it.
    pub async fn delete_chunk(&self, file_id: &str, auth_token: &str) -> ClientResult<()> {
        let fid = FileId::parse(file_id)?;
        let locations = self.locations(fid.volume_id).await?;
        let Some(location) = locations.first() else {
            return Err(Status::with_message(
                MasterCode::VOLUME_NOT_FOUND,
                format!("volume {} of {file_id} has no locations", fid.volume_id),
            )
            .into());
        };
        with_deadline(
            "delete chunk",
            self.config.delete_timeout,
            self.volume_server.delete(&location.url, file_id, auth_token),
        )
        .await
    }

    /// Drop the cached location of a volume, e.g. after a failed delete.
    pub fn invalidate(&self, vid: VolumeId) {
        self.cache.invalidate(&vid);
    }
}

//! The filer's remote procedures.
//!
//! `FilerRpc` validates each request, converts it to the metadata model and
//! delegates to the [`Filer`] or the [`VolumeLocator`]. It carries no state
//! of its own. The same methods back the HTTP endpoints and the in-process
//! [`FilerClient`] implementation used by a co-located mount.

use std::sync::Arc;

use async_trait::async_trait;
use filer_client::{AssignRequest, ClientResult, FilerClient, VolumeLocator};
use filer_meta::{AttrUpdate, DeleteOptions, Entry, Filer, FilerConfig};
use filer_proto::filer::*;
use filer_types::{FullPath, MetaCode, Result, Status};

pub struct FilerRpc {
    filer: Arc<dyn Filer>,
    locator: Arc<VolumeLocator>,
    config: FilerConfig,
}

fn entry_path(directory: &str, name: &str) -> Result<FullPath> {
    FullPath::from_dir_and_name(directory, name)
}

fn not_found_under(status: Status, directory: &str, name: &str) -> Status {
    if status.code() == MetaCode::NOT_FOUND {
        Status::with_message(MetaCode::NOT_FOUND, format!("{name} not found under {directory}"))
    } else {
        status
    }
}

impl FilerRpc {
    pub fn new(filer: Arc<dyn Filer>, locator: Arc<VolumeLocator>, config: FilerConfig) -> Self {
        Self {
            filer,
            locator,
            config,
        }
    }

    pub fn filer(&self) -> &dyn Filer {
        self.filer.as_ref()
    }

    pub fn config(&self) -> &FilerConfig {
        &self.config
    }

    pub async fn lookup_directory_entry(
        &self,
        req: LookupDirectoryEntryReq,
    ) -> Result<LookupDirectoryEntryRsp> {
        let path = entry_path(&req.directory, &req.name)?;
        let entry = self
            .filer
            .find_entry(&path)
            .await
            .map_err(|s| not_found_under(s, &req.directory, &req.name))?;
        Ok(LookupDirectoryEntryRsp {
            entry: entry.to_proto(),
        })
    }

    pub async fn list_entries(&self, req: ListEntriesReq) -> Result<ListEntriesRsp> {
        let dir = FullPath::new(&req.directory)?;
        let limit = self.config.list_limit(req.limit);
        let entries = self
            .filer
            .list_directory_entries(&dir, &req.start_from_file_name, req.inclusive_start_from, limit)
            .await?;
        Ok(ListEntriesRsp {
            entries: entries.iter().map(Entry::to_proto).collect(),
        })
    }

    pub async fn get_entry_attributes(
        &self,
        req: GetEntryAttributesReq,
    ) -> Result<GetEntryAttributesRsp> {
        let path = entry_path(&req.parent_dir, &req.name)?;
        let entry = self
            .filer
            .find_entry(&path)
            .await
            .map_err(|s| not_found_under(s, &req.parent_dir, &req.name))?;
        tracing::trace!(
            %path,
            size = entry.size(),
            chunks = entry.chunks.len(),
            "get entry attributes"
        );
        Ok(GetEntryAttributesRsp {
            attributes: entry.attributes(),
            chunks: entry.chunks,
        })
    }

    pub async fn create_entry(&self, req: CreateEntryReq) -> Result<CreateEntryRsp> {
        let dir = FullPath::new(&req.directory)?;
        let entry = Entry::from_proto(&dir, &req.entry)?;
        self.filer.create_entry(entry).await?;
        Ok(CreateEntryRsp {})
    }

    pub async fn update_entry(&self, req: UpdateEntryReq) -> Result<UpdateEntryRsp> {
        let path = entry_path(&req.directory, &req.entry.name)?;
        let attr = req
            .entry
            .attributes
            .as_ref()
            .map(AttrUpdate::from_wire)
            .unwrap_or_default();
        self.filer
            .update_entry(&path, attr, req.entry.chunks)
            .await?;
        Ok(UpdateEntryRsp {})
    }

    pub async fn delete_entry(&self, req: DeleteEntryReq) -> Result<DeleteEntryRsp> {
        let path = entry_path(&req.directory, &req.name)?;
        let options = DeleteOptions {
            recursive: req.is_recursive,
            delete_data: req.is_delete_data,
        };
        self.filer.delete_entry(&path, options).await?;
        Ok(DeleteEntryRsp {})
    }

    pub async fn assign_volume(&self, req: AssignVolumeReq) -> Result<AssignVolumeRsp> {
        let assign = AssignRequest {
            count: req.count.max(1),
            replication: req.replication,
            collection: req.collection,
        };
        let result = self.locator.assign_volume(&assign).await?;
        Ok(AssignVolumeRsp {
            file_id: result.fid,
            url: result.url,
            public_url: result.public_url,
            count: result.count,
        })
    }

    pub async fn lookup_volume(&self, req: LookupVolumeReq) -> Result<LookupVolumeRsp> {
        let locations_map = self.locator.lookup_volume(&req.volume_ids).await?;
        Ok(LookupVolumeRsp { locations_map })
    }
}

#[async_trait]
impl FilerClient for FilerRpc {
    async fn lookup_directory_entry(
        &self,
        req: LookupDirectoryEntryReq,
    ) -> ClientResult<LookupDirectoryEntryRsp> {
        Ok(FilerRpc::lookup_directory_entry(self, req).await?)
    }

    async fn list_entries(&self, req: ListEntriesReq) -> ClientResult<ListEntriesRsp> {
        Ok(FilerRpc::list_entries(self, req).await?)
    }

    async fn get_entry_attributes(
        &self,
        req: GetEntryAttributesReq,
    ) -> ClientResult<GetEntryAttributesRsp> {
        Ok(FilerRpc::get_entry_attributes(self, req).await?)
    }

    async fn create_entry(&self, req: CreateEntryReq) -> ClientResult<CreateEntryRsp> {
        Ok(FilerRpc::create_entry(self, req).await?)
    }

    async fn update_entry(&self, req: UpdateEntryReq) -> ClientResult<UpdateEntryRsp> {
        Ok(FilerRpc::update_entry(self, req).await?)
    }

    async fn delete_entry(&self, req: DeleteEntryReq) -> ClientResult<DeleteEntryRsp> {
        Ok(FilerRpc::delete_entry(self, req).await?)
    }

    async fn assign_volume(&self, req: AssignVolumeReq) -> ClientResult<AssignVolumeRsp> {
        Ok(FilerRpc::assign_volume(self, req).await?)
    }

    async fn lookup_volume(&self, req: LookupVolumeReq) -> ClientResult<LookupVolumeRsp> {
        Ok(FilerRpc::lookup_volume(self, req).await?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use filer_client::{ClientConfig, MasterClient, VolumeServerClient};
    use filer_kv_backends::MemDbEngine;
    use filer_meta::{ChunkDeleter, FilerImpl};
    use filer_proto::filer::Entry;
    use filer_proto::master::{AssignResult, LookupResult};
    use filer_types::{ErrorKind, Gid, StorageClientCode, Uid, VolumeId};
    use parking_lot::Mutex;

    #[derive(Default)]
    pub struct RecordingDeleter {
        pub deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChunkDeleter for RecordingDeleter {
        async fn delete_chunk(&self, file_id: &str) -> Result<()> {
            self.deleted.lock().push(file_id.to_string());
            Ok(())
        }
    }

    /// Master that assigns `7,01...` ids and knows volume 7 only.
    pub struct FakeMaster {
        pub assign_error: String,
    }

    #[async_trait]
    impl MasterClient for FakeMaster {
        async fn assign(&self, req: &AssignRequest) -> ClientResult<AssignResult> {
            Ok(AssignResult {
                fid: "7,01637037d6".into(),
                url: "10.0.0.7:8080".into(),
                public_url: "vol7.example:8080".into(),
                count: req.count,
                error: self.assign_error.clone(),
            })
        }

        async fn lookup(&self, volume_id: VolumeId) -> ClientResult<LookupResult> {
            if volume_id == VolumeId(7) {
                Ok(LookupResult {
                    volume_id: "7".into(),
                    locations: vec![Location {
                        url: "10.0.0.7:8080".into(),
                        public_url: "vol7.example:8080".into(),
                    }],
                    error: String::new(),
                })
            } else {
                Ok(LookupResult {
                    volume_id: volume_id.to_string(),
                    locations: vec![],
                    error: format!("volume id {volume_id} not found"),
                })
            }
        }
    }

    pub struct RefusingVolumeServer;

    #[async_trait]
    impl VolumeServerClient for RefusingVolumeServer {
        async fn delete(&self, _url: &str, _file_id: &str, _token: &str) -> ClientResult<()> {
            Err(Status::new(StorageClientCode::DELETE_FAILED).into())
        }
    }

    pub struct Fixture {
        pub rpc: Arc<FilerRpc>,
        pub filer: Arc<FilerImpl<MemDbEngine>>,
        pub deleter: Arc<RecordingDeleter>,
    }

    pub fn fixture_with_master(master: FakeMaster) -> Fixture {
        let deleter = Arc::new(RecordingDeleter::default());
        let engine = Arc::new(MemDbEngine::new());
        let filer = Arc::new(FilerImpl::new(
            FilerConfig::default(),
            engine,
            deleter.clone() as Arc<dyn ChunkDeleter>,
        ));
        let locator = Arc::new(VolumeLocator::new(
            Arc::new(master),
            Arc::new(RefusingVolumeServer),
            &ClientConfig::default(),
        ));
        let rpc = Arc::new(FilerRpc::new(filer.clone(), locator, FilerConfig::default()));
        Fixture {
            rpc,
            filer,
            deleter,
        }
    }

    pub fn fixture() -> Fixture {
        fixture_with_master(FakeMaster {
            assign_error: String::new(),
        })
    }

    pub fn wire_file(name: &str, chunks: Vec<FileChunk>) -> Entry {
        Entry {
            name: name.into(),
            is_directory: false,
            chunks,
            attributes: Some(FuseAttributes {
                mtime: 1_600_000_000,
                file_mode: MODE_REGULAR | 0o644,
                uid: Uid(1000),
                gid: Gid(2000),
                mime: "text/plain".into(),
                ..Default::default()
            }),
        }
    }

    #[tokio::test]
    async fn test_create_then_lookup_and_attributes() {
        let fx = fixture();
        fx.rpc
            .create_entry(CreateEntryReq {
                directory: "/a".into(),
                entry: wire_file("b.txt", vec![FileChunk::new("7,01", 0, 100)]),
            })
            .await
            .unwrap();

        let rsp = fx
            .rpc
            .lookup_directory_entry(LookupDirectoryEntryReq {
                directory: "/a".into(),
                name: "b.txt".into(),
            })
            .await
            .unwrap();
        assert_eq!(rsp.entry.name, "b.txt");
        assert!(!rsp.entry.is_directory);
        assert_eq!(rsp.entry.chunks.len(), 1);

        let attrs = fx
            .rpc
            .get_entry_attributes(GetEntryAttributesReq {
                name: "b.txt".into(),
                parent_dir: "/a".into(),
            })
            .await
            .unwrap();
        assert_eq!(attrs.attributes.file_size, 100);
        assert_eq!(attrs.attributes.crtime, 1_600_000_000);
        assert_eq!(attrs.attributes.mime, "text/plain");
        assert_eq!(attrs.chunks[0].file_id, "7,01");

        let dir = fx
            .rpc
            .lookup_directory_entry(LookupDirectoryEntryReq {
                directory: "/".into(),
                name: "a".into(),
            })
            .await
            .unwrap();
        assert!(dir.entry.is_directory);
    }

    #[tokio::test]
    async fn test_lookup_missing_mentions_directory() {
        let fx = fixture();
        let err = fx
            .rpc
            .lookup_directory_entry(LookupDirectoryEntryReq {
                directory: "/x".into(),
                name: "y".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), Some("y not found under /x"));
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let fx = fixture();
        let err = fx
            .rpc
            .create_entry(CreateEntryReq {
                directory: "relative".into(),
                entry: wire_file("f", vec![]),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let err = fx
            .rpc
            .create_entry(CreateEntryReq {
                directory: "/".into(),
                entry: wire_file("", vec![]),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn test_update_merges_and_collects() {
        let fx = fixture();
        fx.rpc
            .create_entry(CreateEntryReq {
                directory: "/".into(),
                entry: wire_file("f", vec![FileChunk::new("7,aa", 0, 10)]),
            })
            .await
            .unwrap();

        let update = Entry {
            name: "f".into(),
            chunks: vec![FileChunk::new("7,bb", 0, 20)],
            attributes: Some(FuseAttributes {
                uid: Uid(42),
                ..Default::default()
            }),
            ..Default::default()
        };
        fx.rpc
            .update_entry(UpdateEntryReq {
                directory: "/".into(),
                entry: update,
            })
            .await
            .unwrap();

        let attrs = fx
            .rpc
            .get_entry_attributes(GetEntryAttributesReq {
                name: "f".into(),
                parent_dir: "/".into(),
            })
            .await
            .unwrap()
            .attributes;
        assert_eq!(attrs.file_size, 20);
        assert_eq!(attrs.mtime, 1_600_000_000);
        assert_eq!(attrs.file_mode, MODE_REGULAR | 0o644);
        assert_eq!(attrs.mime, "text/plain");
        assert_eq!(attrs.uid, Uid(42));

        fx.filer.shutdown().await;
        assert_eq!(*fx.deleter.deleted.lock(), vec!["7,aa".to_string()]);
    }

    #[tokio::test]
    async fn test_chunk_only_update_keeps_owner() {
        let fx = fixture();
        fx.rpc
            .create_entry(CreateEntryReq {
                directory: "/".into(),
                entry: wire_file("f", vec![FileChunk::new("7,aa", 0, 10)]),
            })
            .await
            .unwrap();

        let update: UpdateEntryReq = serde_json::from_str(
            r#"{"directory":"/","entry":{"name":"f","chunks":[{"fileId":"7,bb","offset":0,"size":15}]}}"#,
        )
        .unwrap();
        assert!(update.entry.attributes.is_none());
        fx.rpc.update_entry(update).await.unwrap();

        let attrs = fx
            .rpc
            .get_entry_attributes(GetEntryAttributesReq {
                name: "f".into(),
                parent_dir: "/".into(),
            })
            .await
            .unwrap()
            .attributes;
        assert_eq!(attrs.file_size, 15);
        assert_eq!((attrs.uid, attrs.gid), (Uid(1000), Gid(2000)));
        assert_eq!(attrs.file_mode, MODE_REGULAR | 0o644);
        assert_eq!(attrs.mime, "text/plain");
    }

    #[tokio::test]
    async fn test_overflowing_chunk_is_invalid() {
        let fx = fixture();
        let huge = FileChunk::new("7,aa", u64::MAX - 5, 100);
        let err = fx
            .rpc
            .create_entry(CreateEntryReq {
                directory: "/".into(),
                entry: wire_file("big", vec![huge.clone()]),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        let err = fx
            .rpc
            .get_entry_attributes(GetEntryAttributesReq {
                name: "big".into(),
                parent_dir: "/".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        fx.rpc
            .create_entry(CreateEntryReq {
                directory: "/".into(),
                entry: wire_file("f", vec![FileChunk::new("7,aa", 0, 10)]),
            })
            .await
            .unwrap();
        for chunks in [vec![huge], vec![FileChunk::new("", 0, 10)]] {
            let err = fx
                .rpc
                .update_entry(UpdateEntryReq {
                    directory: "/".into(),
                    entry: wire_file("f", chunks),
                })
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        }
        let attrs = fx
            .rpc
            .get_entry_attributes(GetEntryAttributesReq {
                name: "f".into(),
                parent_dir: "/".into(),
            })
            .await
            .unwrap()
            .attributes;
        assert_eq!(attrs.file_size, 10);
    }

    #[tokio::test]
    async fn test_update_missing_not_found() {
        let fx = fixture();
        let err = fx
            .rpc
            .update_entry(UpdateEntryReq {
                directory: "/".into(),
                entry: wire_file("ghost", vec![]),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_entry_flags() {
        let fx = fixture();
        for name in ["keep", "drop"] {
            fx.rpc
                .create_entry(CreateEntryReq {
                    directory: "/d".into(),
                    entry: wire_file(name, vec![FileChunk::new(format!("7,{name}"), 0, 1)]),
                })
                .await
                .unwrap();
        }
        fx.rpc
            .delete_entry(DeleteEntryReq {
                directory: "/d".into(),
                name: "keep".into(),
                is_delete_data: false,
                ..Default::default()
            })
            .await
            .unwrap();
        let err = fx
            .rpc
            .delete_entry(DeleteEntryReq {
                directory: "/".into(),
                name: "d".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), MetaCode::NOT_EMPTY);
        fx.rpc
            .delete_entry(DeleteEntryReq {
                directory: "/".into(),
                name: "d".into(),
                is_recursive: true,
                ..Default::default()
            })
            .await
            .unwrap();

        fx.filer.shutdown().await;
        assert_eq!(*fx.deleter.deleted.lock(), vec!["7,drop".to_string()]);
    }

    #[tokio::test]
    async fn test_list_entries_default_limit_and_cursor() {
        let fx = fixture();
        for name in ["c", "a", "b"] {
            fx.rpc
                .create_entry(CreateEntryReq {
                    directory: "/l".into(),
                    entry: wire_file(name, vec![]),
                })
                .await
                .unwrap();
        }
        let all = fx
            .rpc
            .list_entries(ListEntriesReq {
                directory: "/l".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let names: Vec<_> = all.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let page = fx
            .rpc
            .list_entries(ListEntriesReq {
                directory: "/l".into(),
                start_from_file_name: "a".into(),
                inclusive_start_from: false,
                limit: 1,
            })
            .await
            .unwrap();
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].name, "b");
    }

    #[tokio::test]
    async fn test_assign_volume() {
        let fx = fixture();
        let rsp = fx
            .rpc
            .assign_volume(AssignVolumeReq {
                count: 0,
                collection: "pics".into(),
                replication: "001".into(),
            })
            .await
            .unwrap();
        assert_eq!(rsp.file_id, "7,01637037d6");
        assert_eq!(rsp.url, "10.0.0.7:8080");
        assert_eq!(rsp.public_url, "vol7.example:8080");
        assert_eq!(rsp.count, 1);
    }

    #[tokio::test]
    async fn test_assign_volume_master_error() {
        let fx = fixture_with_master(FakeMaster {
            assign_error: "no writable volumes".into(),
        });
        let err = fx.rpc.assign_volume(AssignVolumeReq::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteUnavailable);
        assert!(err.to_string().contains("no writable volumes"));
    }

    #[tokio::test]
    async fn test_lookup_volume() {
        let fx = fixture();
        let rsp = fx
            .rpc
            .lookup_volume(LookupVolumeReq {
                volume_ids: vec!["7".into(), "8".into()],
            })
            .await
            .unwrap();
        assert_eq!(rsp.locations_map["7"].locations[0].url, "10.0.0.7:8080");
        assert!(rsp.locations_map["8"].locations.is_empty());

        let err = fx
            .rpc
            .lookup_volume(LookupVolumeReq {
                volume_ids: vec!["x".into()],
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn test_in_process_filer_client() {
        let fx = fixture();
        let client: Arc<dyn FilerClient> = fx.rpc.clone();
        client
            .create_entry(CreateEntryReq {
                directory: "/m".into(),
                entry: wire_file("f", vec![]),
            })
            .await
            .unwrap();
        let rsp = client
            .list_entries(ListEntriesReq {
                directory: "/m".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(rsp.entries.len(), 1);
        let err = client
            .get_entry_attributes(GetEntryAttributesReq {
                name: "nope".into(),
                parent_dir: "/m".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(Status::from(err).kind(), ErrorKind::NotFound);
    }
}

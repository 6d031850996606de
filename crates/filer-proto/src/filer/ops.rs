//! Filer operation request/response types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::*;

/// Page size used by `ListEntries` when the request leaves `limit` at zero.
pub const DEFAULT_LIST_ENTRIES_LIMIT: u32 = 1000;

// ---- LookupDirectoryEntry ----

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupDirectoryEntryReq {
    pub directory: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LookupDirectoryEntryRsp {
    pub entry: Entry,
}

// ---- ListEntries ----

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListEntriesReq {
    pub directory: String,
    pub start_from_file_name: String,
    pub inclusive_start_from: bool,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListEntriesRsp {
    pub entries: Vec<Entry>,
}

// ---- GetEntryAttributes ----

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetEntryAttributesReq {
    pub name: String,
    pub parent_dir: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GetEntryAttributesRsp {
    pub attributes: FuseAttributes,
    pub chunks: Vec<FileChunk>,
}

// ---- CreateEntry ----

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreateEntryReq {
    pub directory: String,
    pub entry: Entry,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CreateEntryRsp {}

// ---- UpdateEntry ----

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateEntryReq {
    pub directory: String,
    pub entry: Entry,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateEntryRsp {}

// ---- DeleteEntry ----

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEntryReq {
    pub directory: String,
    pub name: String,
    #[serde(default)]
    pub is_recursive: bool,
    /// When false only the metadata goes; chunks are left to the caller.
    #[serde(default = "default_true")]
    pub is_delete_data: bool,
}

impl Default for DeleteEntryReq {
    fn default() -> Self {
        Self {
            directory: String::new(),
            name: String::new(),
            is_recursive: false,
            is_delete_data: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeleteEntryRsp {}

// ---- AssignVolume ----

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssignVolumeReq {
    pub count: u32,
    pub collection: String,
    pub replication: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignVolumeRsp {
    pub file_id: String,
    pub url: String,
    pub public_url: String,
    pub count: u32,
}

// ---- LookupVolume ----

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupVolumeReq {
    pub volume_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupVolumeRsp {
    pub locations_map: BTreeMap<String, Locations>,
}

// ---- Errors ----

/// Body returned with a non-2xx HTTP status by every filer endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RpcError {
    pub code: u16,
    pub message: String,
}

//! Messages exchanged with the master's HTTP directory API
//! (`/dir/assign` and `/dir/lookup`).

use serde::{Deserialize, Serialize};

use crate::filer::Location;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssignResult {
    pub fid: String,
    pub url: String,
    pub public_url: String,
    pub count: u32,
    /// Non-empty when the master refused the assignment.
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LookupResult {
    pub volume_id: String,
    pub locations: Vec<Location>,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_result_from_master_json() {
        let r: AssignResult = serde_json::from_str(
            r#"{"fid":"3,01637037d6","url":"127.0.0.1:8080","publicUrl":"localhost:8080","count":1}"#,
        )
        .unwrap();
        assert_eq!(r.fid, "3,01637037d6");
        assert_eq!(r.public_url, "localhost:8080");
        assert!(r.error.is_empty());
    }

    #[test]
    fn test_lookup_result_with_error() {
        let r: LookupResult =
            serde_json::from_str(r#"{"volumeId":"9","error":"volume id 9 not found"}"#).unwrap();
        assert!(r.locations.is_empty());
        assert!(!r.error.is_empty());
    }
}

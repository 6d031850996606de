//! File id parsing: `"<volumeId>,<key hex><cookie hex>"`, where the cookie is
//! always the trailing 8 hex digits.

use std::fmt;
use std::str::FromStr;

use filer_types::status_code::StorageClientCode;
use filer_types::{Result, Status, VolumeId, make_error_msg};

const COOKIE_HEX_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId {
    pub volume_id: VolumeId,
    pub key: u64,
    pub cookie: u32,
}

impl FileId {
    pub fn parse(fid: &str) -> Result<Self> {
        let invalid = || make_error_msg(StorageClientCode::INVALID_FILE_ID, fid.to_string());

        let Some((vid, rest)) = fid.split_once(',') else {
            return invalid();
        };
        let Ok(volume_id) = vid.parse::<VolumeId>() else {
            return invalid();
        };
        if rest.len() <= COOKIE_HEX_LEN || rest.len() > COOKIE_HEX_LEN + 16 {
            return invalid();
        }
        let (key_hex, cookie_hex) = rest.split_at(rest.len() - COOKIE_HEX_LEN);
        let (Ok(key), Ok(cookie)) = (
            u64::from_str_radix(key_hex, 16),
            u32::from_str_radix(cookie_hex, 16),
        ) else {
            return invalid();
        };
        Ok(Self {
            volume_id,
            key,
            cookie,
        })
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key bytes are printed without leading zero bytes.
        let mut key_hex = format!("{:x}", self.key);
        if key_hex.len() % 2 == 1 {
            key_hex.insert(0, '0');
        }
        write!(f, "{},{}{:08x}", self.volume_id, key_hex, self.cookie)
    }
}

impl FromStr for FileId {
    type Err = Status;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let fid = FileId::parse("3,01637037d6").unwrap();
        assert_eq!(fid.volume_id, VolumeId(3));
        assert_eq!(fid.key, 1);
        assert_eq!(fid.cookie, 0x637037d6);
        assert_eq!(fid.to_string(), "3,01637037d6");
    }

    #[test]
    fn test_parse_long_key() {
        let fid: FileId = "12,1a2b3c0000abcd".parse().unwrap();
        assert_eq!(fid.volume_id, VolumeId(12));
        assert_eq!(fid.key, 0x1a2b3c);
        assert_eq!(fid.to_string(), "12,1a2b3c0000abcd");
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["", "3", "x,01637037d6", "3,637037d6", "3,zz637037d6"] {
            let err = FileId::parse(bad).unwrap_err();
            assert_eq!(err.code(), StorageClientCode::INVALID_FILE_ID, "{bad}");
        }
    }
}

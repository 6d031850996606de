//! Kernel-facing attribute and error types.

use std::fmt;
use std::time::SystemTime;

use filer_client::ClientError;
use filer_meta::filechunks::total_size;
use filer_proto::filer::{FileChunk, FuseAttributes};
use filer_types::{ErrorKind, MetaCode, RPCCode, Status, UtcTime};

/// Attributes reported for a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttr {
    pub size: u64,
    pub mtime: SystemTime,
    /// File type and permission bits.
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
}

impl FileAttr {
    /// Size comes from the chunk list, not from the stored `file_size`.
    pub fn from_wire(attributes: &FuseAttributes, chunks: &[FileChunk]) -> Self {
        Self {
            size: total_size(chunks),
            mtime: UtcTime::from_unix_secs(attributes.mtime).to_system_time(),
            mode: attributes.file_mode,
            uid: *attributes.uid,
            gid: *attributes.gid,
        }
    }
}

/// Values to set in a setattr call. Each field is `Some` if that attribute
/// should change.
#[derive(Debug, Clone, Default)]
pub struct SetAttrValues {
    pub mode: Option<u32>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    /// New file size (truncate).
    pub size: Option<u64>,
    pub mtime: Option<SystemTime>,
}

/// Error returned to the kernel: an errno plus a message for the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuseError {
    pub errno: i32,
    pub message: String,
}

impl FuseError {
    pub fn new(errno: i32, message: impl Into<String>) -> Self {
        Self {
            errno,
            message: message.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(libc::ENOENT, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(libc::EIO, msg)
    }
}

impl fmt::Display for FuseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FuseError(errno={}, {})", self.errno, self.message)
    }
}

impl std::error::Error for FuseError {}

impl From<Status> for FuseError {
    fn from(status: Status) -> Self {
        let errno = match status.code() {
            MetaCode::NOT_DIRECTORY => libc::ENOTDIR,
            MetaCode::IS_DIRECTORY => libc::EISDIR,
            MetaCode::NOT_EMPTY => libc::ENOTEMPTY,
            MetaCode::NAME_TOO_LONG => libc::ENAMETOOLONG,
            RPCCode::TIMEOUT => libc::ETIMEDOUT,
            _ => match status.kind() {
                ErrorKind::NotFound => libc::ENOENT,
                ErrorKind::AlreadyExists => libc::EEXIST,
                ErrorKind::InvalidRequest => libc::EINVAL,
                ErrorKind::RemoteUnavailable | ErrorKind::Internal => libc::EIO,
            },
        };
        Self::new(errno, status.describe())
    }
}

impl From<ClientError> for FuseError {
    fn from(err: ClientError) -> Self {
        Status::from(err).into()
    }
}

pub type FuseResult<T> = std::result::Result<T, FuseError>;

use crate::status_code::{
    self, status_code_t, MasterCode, MetaCode, StatusCode, StorageClientCode,
};

/// How a caller should react to a failed [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    /// A collaborator (master, volume server, peer filer) failed or was
    /// unreachable.
    RemoteUnavailable,
    InvalidRequest,
    Internal,
}

/// Error value shared by every filer crate: a numeric code plus an optional
/// human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.describe())]
#[must_use]
pub struct Status {
    code: status_code_t,
    message: Option<String>,
}

impl Status {
    pub fn new(code: status_code_t) -> Self {
        Self {
            code,
            message: None,
        }
    }

    pub fn with_message(code: status_code_t, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(msg.into()),
        }
    }

    pub fn code(&self) -> status_code_t {
        self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::OK
    }

    pub fn kind(&self) -> ErrorKind {
        match self.code {
            MetaCode::NOT_FOUND | MasterCode::VOLUME_NOT_FOUND => ErrorKind::NotFound,
            MetaCode::EXISTS => ErrorKind::AlreadyExists,
            MasterCode::ASSIGN_FAILED
            | MasterCode::LOOKUP_FAILED
            | MasterCode::BAD_RESPONSE
            | StorageClientCode::DELETE_FAILED => ErrorKind::RemoteUnavailable,
            StatusCode::INVALID_ARG
            | StatusCode::SERDE_INVALID_JSON
            | MetaCode::NOT_EMPTY
            | MetaCode::NOT_DIRECTORY
            | MetaCode::IS_DIRECTORY
            | MetaCode::NAME_TOO_LONG
            | MetaCode::INVALID_PATH
            | StorageClientCode::INVALID_FILE_ID => ErrorKind::InvalidRequest,
            code if status_code::is_rpc(code) => ErrorKind::RemoteUnavailable,
            _ => ErrorKind::Internal,
        }
    }

    /// `Name(code)` followed by the message, if any.
    pub fn describe(&self) -> String {
        let name = status_code::to_string(self.code);
        match &self.message {
            Some(msg) => format!("{name}({}) {msg}", self.code),
            None => format!("{name}({})", self.code),
        }
    }
}

impl From<status_code_t> for Status {
    fn from(code: status_code_t) -> Self {
        Self::new(code)
    }
}

//! Numeric status codes, grouped by the subsystem that raises them.
//!
//! Each group owns a block of a thousand values, so the group of any code
//! can be recovered from the code alone.

#[allow(non_camel_case_types)]
pub type status_code_t = u16;

macro_rules! code_group {
    (
        $(#[$meta:meta])*
        $group:ident ($prefix:literal) {
            $($name:ident = $value:literal => $label:literal,)*
        }
    ) => {
        $(#[$meta])*
        pub mod $group {
            use super::status_code_t;

            $(pub const $name: status_code_t = $value;)*

            pub(super) fn label(code: status_code_t) -> Option<&'static str> {
                match code {
                    $($value => Some(concat!($prefix, $label)),)*
                    _ => None,
                }
            }
        }
    };
}

code_group! {
    /// Codes any component may raise (0-999).
    StatusCode("") {
        OK = 0 => "OK",
        NOT_IMPLEMENTED = 1 => "NotImplemented",
        DATA_CORRUPTION = 2 => "DataCorruption",
        INVALID_ARG = 3 => "InvalidArg",
        INVALID_CONFIG = 4 => "InvalidConfig",
        AUTHENTICATION_FAIL = 25 => "AuthenticationFail",
        SERDE_INVALID_JSON = 50 => "SerdeInvalidJson",
        SERDE_INVALID_TOML = 51 => "SerdeInvalidToml",
        IO_ERROR = 69 => "IOError",
    }
}

code_group! {
    /// KV transaction outcomes (1xxx).
    TransactionCode("Transaction::") {
        CONFLICT = 1001 => "Conflict",
    }
}

code_group! {
    /// The remote side could not be reached or did not answer (2xxx).
    RPCCode("RPC::") {
        INVALID_MESSAGE_TYPE = 2000 => "InvalidMessageType",
        TIMEOUT = 2005 => "Timeout",
        SEND_FAILED = 2007 => "SendFailed",
        REQUEST_REFUSED = 2012 => "RequestRefused",
        CONNECT_FAILED = 2014 => "ConnectFailed",
    }
}

code_group! {
    /// Namespace errors (3xxx).
    MetaCode("Meta::") {
        NOT_FOUND = 3000 => "NotFound",
        NOT_EMPTY = 3001 => "NotEmpty",
        NOT_DIRECTORY = 3002 => "NotDirectory",
        IS_DIRECTORY = 3004 => "IsDirectory",
        EXISTS = 3005 => "Exists",
        NAME_TOO_LONG = 3014 => "NameTooLong",
        INVALID_PATH = 3016 => "InvalidPath",
    }
}

code_group! {
    /// Volume assignment and lookup on the master (5xxx).
    MasterCode("Master::") {
        ASSIGN_FAILED = 5000 => "AssignFailed",
        LOOKUP_FAILED = 5001 => "LookupFailed",
        VOLUME_NOT_FOUND = 5002 => "VolumeNotFound",
        BAD_RESPONSE = 5003 => "BadResponse",
    }
}

code_group! {
    /// Direct calls to volume servers (7xxx).
    StorageClientCode("StorageClient::") {
        INVALID_FILE_ID = 7001 => "InvalidFileId",
        DELETE_FAILED = 7002 => "DeleteFailed",
        TOKEN_SIGN_FAILED = 7003 => "TokenSignFailed",
    }
}

/// Whether `code` belongs to the transport group.
pub fn is_rpc(code: status_code_t) -> bool {
    code / 1000 == 2
}

/// Name of a code, such as `"Meta::NotFound"`.
pub fn to_string(code: status_code_t) -> &'static str {
    let label = match code / 1000 {
        0 => StatusCode::label(code),
        1 => TransactionCode::label(code),
        2 => RPCCode::label(code),
        3 => MetaCode::label(code),
        5 => MasterCode::label(code),
        7 => StorageClientCode::label(code),
        _ => None,
    };
    label.unwrap_or("UnknownStatusCode")
}

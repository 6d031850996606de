//! Vocabulary types shared by every filer crate: status codes and the
//! [`Status`] error, namespace paths, timestamps and numeric ids.

#[allow(non_snake_case)]
pub mod status_code;

mod result;
mod status;

#[macro_use]
mod strong_type;

mod ids;
mod path;
mod time;

pub use ids::{Gid, Uid, VolumeId};
pub use path::FullPath;
pub use result::{make_error, make_error_msg, Result};
pub use status::{ErrorKind, Status};
pub use status_code::{
    status_code_t, MasterCode, MetaCode, RPCCode, StatusCode, StorageClientCode, TransactionCode,
};
pub use time::UtcTime;

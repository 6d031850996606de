//! Client-side access to the filer's collaborators.
//!
//! `MasterClient` talks to the master's directory API, `VolumeServerClient`
//! issues chunk deletions against volume servers, and `VolumeLocator`
//! composes both with a volume-location cache and delete tokens.
//! `FilerClient` is the remote view of the filer RPC surface used by the
//! mount. Each client is a trait paired with a concrete HTTP
//! implementation.

pub mod config;
pub mod deadline;
pub mod error;
pub mod filer;
pub mod locator;
pub mod master;
pub mod security;
pub mod volume_server;

pub use config::{ClientConfig, FilerClientConfig, MasterClientConfig, SecurityConfig, VolumeLocatorConfig};
pub use error::{ClientError, ClientResult};
pub use filer::{FilerClient, HttpFilerClient};
pub use locator::VolumeLocator;
pub use master::{AssignRequest, HttpMasterClient, MasterClient};
pub use volume_server::{HttpVolumeServerClient, VolumeServerClient};

//! The filer's serving side: RPC facade over the namespace, HTTP routing
//! with browsable directory listings, and the process lifecycle.

pub mod app;
pub mod config;
pub mod http;
pub mod listing;
pub mod rpc;

pub use app::FilerServer;
pub use config::{HttpConfig, ServerConfig};
pub use http::router;
pub use listing::{DirectoryListing, ListingQuery};
pub use rpc::FilerRpc;

pub mod background_runner;
pub mod ttl_cache;

pub use background_runner::BackgroundRunner;
pub use ttl_cache::TtlCache;

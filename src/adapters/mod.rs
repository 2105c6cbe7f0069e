// Adapters layer: concrete implementations for external systems (feed over http, local storage).

pub mod http;
pub mod storage;

pub use http::HttpFeed;
pub use storage::LocalStorage;

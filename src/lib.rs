pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{HttpFeed, LocalStorage};
pub use core::{
    aggregate::AggregateSettings, etl::EtlEngine, pipeline::SalesPipeline,
    session::DashboardSession,
};
pub use utils::error::{EtlError, Result};

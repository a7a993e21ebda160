pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{JobConfig, RunConfig};

pub use adapters::{LocalStorage, MemoryStorage};
pub use core::etl::{EtlEngine, RunReport};
pub use utils::error::{EtlError, Result};

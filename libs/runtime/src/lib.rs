//! Process-level plumbing shared by the server binary and modules:
//! layered configuration loading and logging bootstrap.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{
    AppConfig, AppConfigProvider, CliArgs, ConfigProvider, DatabaseConfig, LoggingConfig,
    Section, ServerConfig,
};

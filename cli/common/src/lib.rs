//! Shared utilities for the inventory loader CLI.

pub mod args;
pub mod config;
pub mod format;
pub mod logging;

pub use args::LogLevel;
pub use config::{load_config, render_config};
pub use format::format_number;
pub use logging::{LevelSource, init_logging, resolve_log_level};

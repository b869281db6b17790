//! miq-bootstrap CLI - configuration, logging, and command execution
//!
//! The binary in `main.rs` wires these together; they live in a library so the
//! command flow can be exercised from tests.

pub mod app;
pub mod config;
pub mod logging;

pub use app::{Execution, execute, open_store, render};
pub use config::{Cli, Command, Configuration};
pub use logging::{LoggingConfig, init_logging};

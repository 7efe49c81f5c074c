//! `freebie-worker` library crate.
//!
//! Re-exports the CLI, configuration and run pipeline for integration
//! testing. The binary entrypoint lives in `main.rs`.

pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;

pub use config::WorkerConfig;
pub use error::RunError;
pub use pipeline::{exit_code, Pipeline, RunReport};

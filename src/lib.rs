#![forbid(unsafe_code)]
#![warn(clippy::cargo, clippy::suspicious, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions)]

mod errors;
pub mod model;
pub mod resolution;
mod server;
pub mod services;
mod settings;
pub mod telemetry;
pub mod tracing;

pub use errors::{ProviderError, ResolutionError};
pub use server::{ApiError, ErrorEnvelope, Server};
pub use settings::{CliOptions, Settings, SettingsError, Stage};

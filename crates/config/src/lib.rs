//! Configuration loading for the copilot agent.
//!
//! Uses figment to layer built-in defaults, an optional YAML file and the
//! process environment into one immutable [`Config`].

pub mod schema;

pub use schema::{Config, LogConfig, LogFormat, TimeoutConfig};

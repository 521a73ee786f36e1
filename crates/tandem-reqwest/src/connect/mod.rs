//! Reqwest client module.
//!
//! This module provides the client every collaborator integration sends its
//! requests through, together with its configuration.

mod client;
mod config;

pub use client::{ReqwestClient, TRACING_TARGET};
pub use config::{DEFAULT_TIMEOUT_SECS, ReqwestConfig};

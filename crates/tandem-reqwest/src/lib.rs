//! Reqwest-based HTTP plumbing for tandem collaborators.
//!
//! # Example
//!
//! ```rust,ignore
//! use tandem_reqwest::{ReqwestClient, ReqwestConfig};
//!
//! let client = ReqwestClient::new(ReqwestConfig::default().with_timeout(10))?;
//! let request = client.post(url).bearer_auth(token).json(&payload);
//! let response: MyResponse = client.send_json(request).await?;
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cloudflare;

mod connect;
mod error;

pub use crate::connect::{DEFAULT_TIMEOUT_SECS, ReqwestClient, ReqwestConfig, TRACING_TARGET};
pub use crate::error::{Error, Result};
pub use reqwest::StatusCode;

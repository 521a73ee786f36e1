//! Vapi outbound phone calls.

mod client;
mod config;
mod tool;

pub use client::{Call, VapiClient};
pub use config::{DEFAULT_VAPI_API_URL, VapiConfig};
pub use tool::{CALL_VAPI, CallVapiInput, CallVapiTool};

//! Tool definitions, inputs, outputs and the registry.

mod definition;
mod registry;
mod types;

pub use definition::ToolDefinition;
pub use registry::{ToolHandler, ToolRegistry};
pub use types::{ToolInput, ToolOutput};

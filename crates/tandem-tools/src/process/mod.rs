//! Background processes started by tools.

mod manager;
mod types;

pub use manager::{
    DEFAULT_MAX_RETAINED_PROCESSES, ProcessHandle, ProcessManager, ProcessReporter,
};
pub use types::{
    ProcessEvent, ProcessId, ProcessProgress, ProcessResult, ProcessSnapshot, ProcessState,
    ProcessUpdate,
};

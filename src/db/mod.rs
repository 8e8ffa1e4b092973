//! Persistence for agent sessions, messages and execution records.
//!
//! Backed by a local libSQL database (a file path or `:memory:`).

pub mod sessions;

pub use sessions::{
    ExecutionRecord, ExecutionStatus, MessageRecord, MessageType, NewExecution, NewMessage,
    SessionRecord, SessionStore,
};

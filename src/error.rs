//! Crate-wide error type.
//!
//! One variant per error kind that can actually surface as a public `Err` —
//! not every conceptual error kind in the call lifecycle gets one. Tool
//! failures convert to a `ToolResult` error block before ever reaching the
//! `call`/`stream` boundary, so `ToolError` stays a separate, internal type.
//! Persistence failures are logged and swallowed at the hook boundary that
//! triggers them, never propagated. An interrupted call ends normally, with
//! a synthetic `AGENT_RESULT`, not an `Err` — so there is no `Interrupted`
//! variant either. `ModelError` and `HookError` carry their underlying cause
//! so callers get a normal `std::error::Error` chain.

use thiserror::Error;

/// The terminal error type for agent construction and for the event stream.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A second `call`/`stream` was attempted on an agent built with
    /// `check_running = true` while a prior call is still in flight.
    #[error("agent is already running a call")]
    AgentBusy,

    /// The model provider failed while streaming a response. Terminates the
    /// event stream; the core never retries.
    #[error("model error: {0}")]
    ModelError(String),

    /// A hook body returned an error. Propagates and terminates the stream;
    /// unlike tool errors, hook errors are never swallowed.
    #[error("hook error: {0}")]
    HookError(String),

    /// Agent construction was given invalid input (blank name, blank
    /// session key, etc). Raised synchronously, never on the stream.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The event stream subscriber's channel closed before delivery
    /// completed.
    #[error("event channel closed")]
    ChannelClosed,
}

/// Tool execution failures never cross the `call`/`stream` boundary as
/// errors — per the toolkit contract, they are captured as a `ToolResult`
/// error text block instead. This type exists so toolkit internals have a
/// normal `Result` to work with before that conversion happens.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool {name:?} not found")]
    NotFound { name: String },

    #[error("tool {name:?} received invalid input: {message}")]
    InvalidInput { name: String, message: String },

    #[error("tool {name:?} transport error: {source}")]
    Transport { name: String, source: std::io::Error },

    #[error("tool {name:?} returned an error: {message}")]
    Provider { name: String, message: String },
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::InvalidInput {
            name: "<json>".to_string(),
            message: err.to_string(),
        }
    }
}

impl ToolError {
    /// The human-readable message to place inside the error text block
    /// emitted as this tool's `ToolResult` (§4.5 — surfaced verbatim for
    /// external-tool errors, descriptive for native ones).
    pub fn as_result_text(&self) -> String {
        self.to_string()
    }
}

/// A session store operation failed. Always logged and swallowed when it
/// originates from a `Post*` hook — never propagated as an `AgentError`.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("session store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session store serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

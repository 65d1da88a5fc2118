//! # reagent-core
//!
//! Core runtime for LLM-driven ReAct agents: an agent consumes input
//! messages, reasons by calling a language model, optionally invokes tools
//! (including external MCP-style servers), records and retrieves
//! conversational memory, and emits a real-time event stream.
//!
//! ## Design principles
//!
//! - **Tagged content blocks, not a class hierarchy**: [`message::ContentBlock`]
//!   is a single `serde`-tagged enum covering text, thinking, tool calls and
//!   results, and media — no trait-object message variants.
//! - **Accumulate, then emit**: streamed model output is fed chunk-by-chunk
//!   through [`accumulator`]/[`reasoning::ReasoningContext`], which reassembles
//!   parallel, interleaved tool-call fragments before the final message is
//!   built.
//! - **One state machine, not a compiled graph**: [`react::Agent`] inlines the
//!   reason → maybe-act → observe → loop cycle directly rather than through a
//!   general graph compiler, since its topology never varies per agent.
//! - **Hooks, not callbacks**: [`hooks::HookChain`] gives lifecycle
//!   interception a single prioritized, composable seam with `stopAgent`
//!   short-circuit, used by both user-supplied hooks and the long-term-memory
//!   static-control mode.
//!
//! ## Main modules
//!
//! - [`react`]: [`react::Agent`], [`react::AgentOptions`] — the ReAct loop.
//! - [`message`]: [`message::Message`], [`message::ContentBlock`], [`message::ChatUsage`].
//! - [`accumulator`]: [`accumulator::StringAccumulator`], [`accumulator::ToolCallsAccumulator`].
//! - [`reasoning`]: [`reasoning::ReasoningContext`] — per-turn accumulator + usage + journal.
//! - [`hooks`]: [`hooks::Hook`], [`hooks::HookChain`], [`hooks::HookEvent`].
//! - [`memory`]: [`memory::Memory`] — the in-process message log.
//! - [`toolkit`]: [`toolkit::Tool`], [`toolkit::Toolkit`], external MCP-style servers.
//! - [`model`]: [`model::ModelProvider`], [`model::Formatter`] — the consumed model boundary.
//! - [`event`]: [`event::Event`], [`event::EventFilter`], [`event::StreamMode`].
//! - [`session`]: [`session::Session`], [`session::InMemorySessionStore`], [`session::AppendOnlySessionStore`].
//! - [`longterm`]: [`longterm::LongTermMemory`], [`longterm::StaticControlHook`].
//! - [`user_input`]: [`user_input::UserInputProvider`] — mid-turn human input.
//! - [`config`]: [`config::AgentConfig`] — layered configuration loading.
//! - [`error`]: [`error::AgentError`] — the crate-wide error type.
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use reagent_core::message::Message;
//! use reagent_core::model::MockModelProvider;
//! use reagent_core::react::{Agent, AgentOptions};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let model = Arc::new(MockModelProvider::single_text_reply("m1", "hello there"));
//! let agent = Agent::new(AgentOptions::new("greeter").model(model)).unwrap();
//!
//! let events = agent.call(Some(vec![Message::user("hi")])).await.unwrap();
//! let last = events.last().unwrap();
//! assert_eq!(last.message.text(), "hello there");
//! # }
//! ```

pub mod accumulator;
pub mod config;
pub mod error;
pub mod event;
pub mod hooks;
pub mod longterm;
pub mod memory;
pub mod message;
pub mod model;
pub mod react;
pub mod reasoning;
pub mod session;
pub mod toolkit;
pub mod user_input;

pub use error::AgentError;
pub use event::{Event, EventFilter, EventType, StreamMode};
pub use message::{ChatUsage, ContentBlock, Message, Role};
pub use react::{Agent, AgentOptions};

//! Streaming content accumulators (§4.1): reassemble fragmented text,
//! thinking, and parallel tool-call chunks into coherent blocks.

mod text;
mod tool_calls;

pub use text::StringAccumulator;
pub use tool_calls::{ToolCallFragment, ToolCallsAccumulator};

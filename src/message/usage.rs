use serde::{Deserialize, Serialize};

/// Token/time usage for one turn. Providers report cumulative counts across
/// streamed chunks, so accumulation takes the element-wise maximum rather
/// than summing (see [`ChatUsage::accumulate`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub time: f64,
}

impl ChatUsage {
    pub fn new(input_tokens: u64, output_tokens: u64, time: f64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            time,
        }
    }

    /// True if any field is non-zero — used to decide whether a `ChatUsage`
    /// metadata entry should be attached to a final message at all.
    pub fn is_positive(&self) -> bool {
        self.input_tokens > 0 || self.output_tokens > 0 || self.time > 0.0
    }

    /// Element-wise maximum, in place. Called once per chunk that carries a
    /// usage report.
    pub fn accumulate(&mut self, incoming: &ChatUsage) {
        self.input_tokens = self.input_tokens.max(incoming.input_tokens);
        self.output_tokens = self.output_tokens.max(incoming.output_tokens);
        self.time = self.time.max(incoming.time);
    }
}

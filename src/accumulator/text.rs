use crate::message::ContentBlock;

/// Concatenates chunk strings in arrival order. Shared implementation for
/// both the text and thinking accumulators — they differ only in which
/// `ContentBlock` variant `build_aggregated` wraps the result in.
#[derive(Debug, Default, Clone)]
pub struct StringAccumulator {
    buf: String,
}

impl StringAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, chunk: &str) {
        self.buf.push_str(chunk);
    }

    pub fn has_content(&self) -> bool {
        !self.buf.is_empty()
    }

    pub fn text(&self) -> &str {
        &self.buf
    }

    pub fn reset(&mut self) {
        self.buf.clear();
    }

    pub fn build_text_block(&self) -> Option<ContentBlock> {
        self.has_content().then(|| ContentBlock::text(self.buf.clone()))
    }

    pub fn build_thinking_block(&self) -> Option<ContentBlock> {
        self.has_content().then(|| ContentBlock::thinking(self.buf.clone()))
    }
}

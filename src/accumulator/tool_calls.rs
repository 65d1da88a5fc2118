use std::collections::HashMap;

use serde_json::Value;
use uuid::Uuid;

use crate::message::ContentBlock;

/// Any tool-call name beginning with this prefix is a placeholder — a
/// continuation fragment rather than the opening of a new call.
fn is_placeholder_name(name: &str) -> bool {
    name.starts_with("__")
}

fn is_non_placeholder_name(name: &Option<String>) -> Option<&str> {
    name.as_deref().filter(|n| !n.is_empty() && !is_placeholder_name(n))
}

/// One incoming tool-call chunk, as handed to [`ToolCallsAccumulator::add`].
#[derive(Debug, Clone, Default)]
pub struct ToolCallFragment {
    pub id: Option<String>,
    pub name: Option<String>,
    pub input: HashMap<String, Value>,
    pub raw_content: String,
    pub metadata: HashMap<String, Value>,
}

/// In-progress state for one tool call being assembled from fragments.
///
/// `synthesized_id` caches the id generated the first time `build` is
/// called for a builder that never observed a real id, so repeated builds
/// (e.g. `build_aggregated` followed by `build_all`) agree on one value.
#[derive(Debug, Clone, Default)]
struct ToolCallBuilder {
    id: Option<String>,
    name: Option<String>,
    input: HashMap<String, Value>,
    raw_content: String,
    metadata: HashMap<String, Value>,
    synthesized_id: std::cell::RefCell<Option<String>>,
}

impl ToolCallBuilder {
    fn merge(&mut self, fragment: &ToolCallFragment) {
        if self.id.is_none() {
            if let Some(ref id) = fragment.id {
                if !id.is_empty() {
                    self.id = Some(id.clone());
                }
            }
        }
        if let Some(name) = is_non_placeholder_name(&fragment.name) {
            self.name = Some(name.to_string());
        }
        for (k, v) in &fragment.input {
            self.input.insert(k.clone(), v.clone());
        }
        self.raw_content.push_str(&fragment.raw_content);
        for (k, v) in &fragment.metadata {
            self.metadata.insert(k.clone(), v.clone());
        }
    }

    fn build(&self) -> ContentBlock {
        let mut input = self.input.clone();
        if input.is_empty() && !self.raw_content.is_empty() {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&self.raw_content) {
                input = map.into_iter().collect();
            }
        }
        let content = if self.raw_content.is_empty() {
            "{}".to_string()
        } else {
            self.raw_content.clone()
        };
        let id = match &self.id {
            Some(id) => id.clone(),
            None => self
                .synthesized_id
                .borrow_mut()
                .get_or_insert_with(|| Uuid::new_v4().to_string())
                .clone(),
        };
        ContentBlock::ToolUse {
            id,
            name: self.name.clone().unwrap_or_default(),
            input,
            content,
            metadata: self.metadata.clone(),
        }
    }
}

/// Reconstructs parallel tool calls from interleaved fragments (§4.1).
///
/// Fragments are placed into builders by a priority-ordered keying policy:
/// a non-empty id always wins the key; otherwise a non-placeholder name;
/// otherwise the most recently opened builder (`last_key`); otherwise a
/// fresh index-keyed builder.
#[derive(Debug, Default)]
pub struct ToolCallsAccumulator {
    builders: HashMap<String, ToolCallBuilder>,
    order: Vec<String>,
    last_key: Option<String>,
    index_counter: u64,
}

impl ToolCallsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_for(&mut self, fragment: &ToolCallFragment) -> String {
        if let Some(ref id) = fragment.id {
            if !id.is_empty() {
                if is_non_placeholder_name(&fragment.name).is_some() {
                    self.last_key = Some(id.clone());
                }
                return id.clone();
            }
        }
        if let Some(name) = is_non_placeholder_name(&fragment.name) {
            let key = format!("name:{name}");
            self.last_key = Some(key.clone());
            return key;
        }
        let placeholder = fragment
            .name
            .as_deref()
            .map(is_placeholder_name)
            .unwrap_or(false);
        if placeholder {
            if let Some(ref key) = self.last_key {
                return key.clone();
            }
        }
        let key = format!("index:{}", self.index_counter);
        self.index_counter += 1;
        self.last_key = Some(key.clone());
        key
    }

    /// Feed one fragment into the accumulator, creating a new builder or
    /// merging into an existing one per the keying policy above.
    pub fn add(&mut self, fragment: ToolCallFragment) -> String {
        let key = self.key_for(&fragment);
        if !self.builders.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.builders.entry(key.clone()).or_default().merge(&fragment);
        key
    }

    pub fn has_content(&self) -> bool {
        !self.builders.is_empty()
    }

    /// Every builder's output, in first-seen (insertion) order.
    pub fn build_all(&self) -> Vec<ContentBlock> {
        self.order
            .iter()
            .filter_map(|key| self.builders.get(key))
            .map(ToolCallBuilder::build)
            .collect()
    }

    /// The most recently opened builder's output, or `None` if empty.
    pub fn build_aggregated(&self) -> Option<ContentBlock> {
        self.order.last().and_then(|key| self.builders.get(key)).map(ToolCallBuilder::build)
    }

    /// Look up an in-progress tool call by id, falling back to the
    /// last-opened builder when `id` is `None`/empty/unknown.
    pub fn get_accumulated_tool_call(&self, id: Option<&str>) -> Option<ContentBlock> {
        if let Some(id) = id.filter(|s| !s.is_empty()) {
            if let Some(builder) = self.builders.get(id) {
                return Some(builder.build());
            }
        }
        self.last_key.as_ref().and_then(|key| self.builders.get(key)).map(ToolCallBuilder::build)
    }

    pub fn reset(&mut self) {
        self.builders.clear();
        self.order.clear();
        self.last_key = None;
        self.index_counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frag(id: Option<&str>, name: Option<&str>, raw: &str) -> ToolCallFragment {
        ToolCallFragment {
            id: id.map(String::from),
            name: name.map(String::from),
            input: HashMap::new(),
            raw_content: raw.to_string(),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn s2_fragment_with_placeholder_name_binds_to_last_opened_call() {
        let mut acc = ToolCallsAccumulator::new();
        acc.add(frag(Some("c1"), Some("weather"), "{\"city\":"));
        acc.add(frag(Some("c1"), Some("__fragment__"), "\"Beijing\"}"));

        let all = acc.build_all();
        assert_eq!(all.len(), 1);
        match &all[0] {
            ContentBlock::ToolUse { id, name, input, content, .. } => {
                assert_eq!(id, "c1");
                assert_eq!(name, "weather");
                assert_eq!(input.get("city"), Some(&json!("Beijing")));
                assert_eq!(content, "{\"city\":\"Beijing\"}");
            }
            other => panic!("expected ToolUse, got {other:?}"),
        }
    }

    #[test]
    fn s3_interleaved_parallel_calls_preserve_first_seen_order() {
        let mut acc = ToolCallsAccumulator::new();
        acc.add(frag(Some("c1"), Some("a"), "{\"x\":1"));
        acc.add(frag(Some("c2"), Some("b"), "{\"y\":2"));
        acc.add(frag(Some("c1"), None, "}"));
        acc.add(frag(Some("c2"), None, "}"));

        let all = acc.build_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].as_tool_use().unwrap().0, "c1");
        assert_eq!(all[1].as_tool_use().unwrap().0, "c2");
    }

    #[test]
    fn empty_id_placeholder_name_with_no_prior_call_opens_index_keyed_builder() {
        let mut acc = ToolCallsAccumulator::new();
        let key = acc.add(frag(None, Some("__pending__"), "{}"));
        assert_eq!(key, "index:0");
        assert_eq!(acc.build_all().len(), 1);
    }

    #[test]
    fn build_aggregated_equals_last_of_build_all() {
        let mut acc = ToolCallsAccumulator::new();
        assert_eq!(acc.build_aggregated(), None);
        acc.add(frag(Some("c1"), Some("a"), "{}"));
        acc.add(frag(Some("c2"), Some("b"), "{}"));
        assert_eq!(acc.build_aggregated(), acc.build_all().last().cloned());
    }

    #[test]
    fn get_accumulated_tool_call_falls_back_to_last_key_for_missing_id() {
        let mut acc = ToolCallsAccumulator::new();
        acc.add(frag(Some("c1"), Some("a"), "{}"));
        acc.add(frag(Some("c2"), Some("b"), "{}"));
        let by_none = acc.get_accumulated_tool_call(None);
        let by_empty = acc.get_accumulated_tool_call(Some(""));
        assert_eq!(by_none.as_ref().and_then(|b| b.as_tool_use()).map(|t| t.0), Some("c2"));
        assert_eq!(by_empty.as_ref().and_then(|b| b.as_tool_use()).map(|t| t.0), Some("c2"));
    }

    #[test]
    fn malformed_raw_content_keeps_empty_input_rather_than_erroring() {
        let mut acc = ToolCallsAccumulator::new();
        acc.add(frag(Some("c1"), Some("weather"), "not json"));
        let block = acc.build_aggregated().unwrap();
        match block {
            ContentBlock::ToolUse { input, content, .. } => {
                assert!(input.is_empty());
                assert_eq!(content, "not json");
            }
            other => panic!("expected ToolUse, got {other:?}"),
        }
    }

    #[test]
    fn missing_id_synthesizes_a_unique_one() {
        let mut acc = ToolCallsAccumulator::new();
        acc.add(frag(None, Some("weather"), "{}"));
        let block = acc.build_aggregated().unwrap();
        let (id, _) = block.as_tool_use().unwrap();
        assert!(!id.is_empty());
        assert!(Uuid::parse_str(id).is_ok());
    }
}

//! A native tool built from a plain async closure, so simple tools don't
//! need a hand-written `Tool` impl.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::Tool;
use crate::error::ToolError;
use crate::message::ContentBlock;

pub type NativeFn = Arc<
    dyn Fn(&HashMap<String, Value>) -> Pin<Box<dyn Future<Output = Result<Vec<ContentBlock>, ToolError>> + Send>>
        + Send
        + Sync,
>;

/// Wraps a closure as a `Tool`.
///
/// ```
/// use std::sync::Arc;
/// use reagent_core::toolkit::{Tool, native::ClosureTool};
/// use reagent_core::message::ContentBlock;
///
/// let tool = ClosureTool::new(
///     "double",
///     "doubles the `n` input",
///     serde_json::json!({"type": "object", "properties": {"n": {"type": "number"}}}),
///     |input| {
///         let n = input.get("n").and_then(|v| v.as_f64()).unwrap_or(0.0);
///         Box::pin(async move { Ok(vec![ContentBlock::text((n * 2.0).to_string())]) })
///     },
/// );
/// assert_eq!(tool.name(), "double");
/// ```
pub struct ClosureTool {
    name: String,
    description: String,
    input_schema: Value,
    func: NativeFn,
}

impl ClosureTool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        func: impl Fn(&HashMap<String, Value>) -> Pin<Box<dyn Future<Output = Result<Vec<ContentBlock>, ToolError>> + Send>>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            func: Arc::new(func),
        }
    }
}

#[async_trait]
impl Tool for ClosureTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.input_schema.clone()
    }

    async fn call(&self, input: &HashMap<String, Value>) -> Result<Vec<ContentBlock>, ToolError> {
        (self.func)(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolkit::Toolkit;
    use std::sync::Arc;

    #[tokio::test]
    async fn closure_tool_executes_through_the_toolkit() {
        let tool = ClosureTool::new("double", "doubles n", Value::Null, |input| {
            let n = input.get("n").and_then(|v| v.as_f64()).unwrap_or(0.0);
            Box::pin(async move { Ok(vec![ContentBlock::text((n * 2.0).to_string())]) })
        });
        let toolkit = Toolkit::new();
        toolkit.register_native(Arc::new(tool));

        let mut input = HashMap::new();
        input.insert("n".to_string(), Value::from(21));
        let blocks = toolkit.execute("c1", "double", &input).await;
        assert_eq!(blocks, vec![ContentBlock::text("42")]);
    }
}

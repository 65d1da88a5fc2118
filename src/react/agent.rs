//! The ReAct loop state machine (§4.6, C6) — the central orchestrator every
//! other component in this crate exists to be driven by.
//!
//! Grounded in the teacher's `ReactRunner`/`run_agent` shape
//! (`loom/src/agent/react/runner/runner.rs`): a long-lived struct built once
//! from resolved options, driving a loop of reasoning and tool-execution
//! steps. The teacher compiles that loop as a `StateGraph` of nodes
//! (`ThinkNode`/`ActNode`/`ObserveNode`) wired through a graph compiler;
//! this core inlines the same `think → act → observe → loop` shape as a
//! plain Rust state machine (§9 design note — the compiler is out of scope
//! for a fixed, non-configurable topology).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::Instrument;

use crate::error::AgentError;
use crate::event::{Event, EventFilter, EventType, StreamMode};
use crate::hooks::{HookChain, HookEvent};
use crate::memory::Memory;
use crate::message::{ContentBlock, Message, Role};
use crate::model::{ChatOptions, ModelProvider};
use crate::reasoning::ReasoningContext;
use crate::toolkit::Toolkit;

use super::options::{AgentOptions, resolve_agent_options};

type EventSender = mpsc::Sender<Result<Event, AgentError>>;

enum ReasoningOutcome {
    Produced(Message),
    Stopped(Message),
    Interrupted,
}

/// A single conversational agent: one model, one toolkit, one memory, one
/// hook chain, driving the IDLE→PRE_CALL→REASONING→(TOOL_EXEC|FINALIZE)→
/// POST_CALL→IDLE cycle described in §4.6.
pub struct Agent {
    name: String,
    model: Arc<dyn ModelProvider>,
    toolkit: Toolkit,
    memory: Arc<Memory>,
    hooks: HookChain,
    check_running: bool,
    stream_mode: StreamMode,
    running: AtomicBool,
    interrupt_flag: AtomicBool,
}

impl Agent {
    pub fn new(options: AgentOptions) -> Result<Arc<Self>, AgentError> {
        let resolved = resolve_agent_options(options)?;
        Ok(Arc::new(Self {
            name: resolved.name,
            model: resolved.model,
            toolkit: resolved.toolkit,
            memory: resolved.memory,
            hooks: resolved.hooks,
            check_running: resolved.check_running,
            stream_mode: resolved.stream_mode,
            running: AtomicBool::new(false),
            interrupt_flag: AtomicBool::new(false),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn memory(&self) -> &Arc<Memory> {
        &self.memory
    }

    /// Sets the cooperative interrupt flag. Observed at the suspension
    /// points named in §4.6/§4.7 (before a chunk is consumed, between tool
    /// executions, between reasoning steps). Idempotent and thread-safe —
    /// a second call before the first is observed has no extra effect.
    pub fn interrupt(&self) {
        self.interrupt_flag.store(true, Ordering::SeqCst);
    }

    /// Runs one full call and collects its events. A convenience wrapper
    /// around [`Self::stream`] for callers that don't need incremental
    /// delivery.
    pub async fn call(self: &Arc<Self>, input: Option<Vec<Message>>) -> Result<Vec<Event>, AgentError> {
        let mut stream = Box::pin(self.stream(input, EventFilter::all()));
        let mut events = Vec::new();
        while let Some(event) = stream.next().await {
            events.push(event?);
        }
        Ok(events)
    }

    /// Streams events for one call. `input = None` is a continuation:
    /// if the last assistant message in memory has unresolved `ToolUse`
    /// blocks, the loop resumes at TOOL_EXEC rather than REASONING (§4.6.6).
    pub fn stream(
        self: &Arc<Self>,
        input: Option<Vec<Message>>,
        filter: EventFilter,
    ) -> impl Stream<Item = Result<Event, AgentError>> + Send + 'static {
        let agent = Arc::clone(self);
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            if let Err(err) = agent.run(input, filter, tx.clone()).await {
                let _ = tx.send(Err(err)).await;
            }
        });
        ReceiverStream::new(rx)
    }

    async fn run(self: Arc<Self>, input: Option<Vec<Message>>, filter: EventFilter, tx: EventSender) -> Result<(), AgentError> {
        // Entry guard (§4.6.1).
        if self.check_running {
            if self.running.swap(true, Ordering::SeqCst) {
                return Err(AgentError::AgentBusy);
            }
        } else {
            self.running.store(true, Ordering::SeqCst);
        }

        let span = tracing::info_span!("agent_call", agent_name = %self.name);
        let result = self.run_inner(input, &filter, &tx).instrument(span).await;

        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn run_inner(&self, input: Option<Vec<Message>>, filter: &EventFilter, tx: &EventSender) -> Result<(), AgentError> {
        // PRE_CALL (§4.6.2).
        tracing::info!(state = "PRE_CALL", agent_name = %self.name, "entering state");
        let is_continuation = input.is_none();
        let pre_call = self
            .hooks
            .dispatch(HookEvent::PreCall {
                input_messages: input.unwrap_or_default(),
            })
            .await
            .map_err(hook_error)?;
        let input_messages = match pre_call {
            HookEvent::PreCall { input_messages } => input_messages,
            _ => unreachable!("dispatch preserves the event variant"),
        };
        for message in &input_messages {
            self.memory.add_message(message.clone()).await;
        }

        // Pending-tool resumption (§4.6.6): a bare continuation whose last
        // assistant message still carries unresolved ToolUse blocks skips
        // straight to TOOL_EXEC.
        let mut pending_tool_message = None;
        if is_continuation {
            let snapshot = self.memory.get_messages().await;
            if let Some(last) = snapshot.last() {
                if last.role == Role::Assistant && last.has_tool_uses() {
                    pending_tool_message = Some(last.clone());
                }
            }
        }

        loop {
            let reasoning_message = if let Some(pending) = pending_tool_message.take() {
                pending
            } else {
                match self.reasoning_step(filter, tx).await? {
                    ReasoningOutcome::Interrupted => return Ok(()),
                    ReasoningOutcome::Stopped(message) => return self.finalize(message, tx).await,
                    ReasoningOutcome::Produced(message) => message,
                }
            };

            // Decision (§4.6.4).
            if reasoning_message.has_tool_uses() {
                if self.check_interrupt(tx).await? {
                    return Ok(());
                }
                tracing::info!(state = "TOOL_EXEC", agent_name = %self.name, "entering state");
                self.tool_exec(&reasoning_message, filter, tx).await?;
                if self.check_interrupt(tx).await? {
                    return Ok(());
                }
            } else {
                return self.finalize(reasoning_message, tx).await;
            }
        }
    }

    /// REASONING step (§4.6.3): build the model request from memory's
    /// current view (augmented by `PreReasoning` hooks, e.g. long-term
    /// memory retrieval injection), stream the response through a fresh
    /// [`ReasoningContext`], emit a `REASONING` event per produced chunk
    /// plus the final reassembled message, then dispatch `PostReasoning`.
    async fn reasoning_step(&self, filter: &EventFilter, tx: &EventSender) -> Result<ReasoningOutcome, AgentError> {
        if self.check_interrupt(tx).await? {
            return Ok(ReasoningOutcome::Interrupted);
        }

        tracing::info!(state = "REASONING", agent_name = %self.name, "entering state");

        let snapshot = self.memory.get_messages().await;
        let pre_reasoning = self
            .hooks
            .dispatch(HookEvent::PreReasoning { input_messages: snapshot })
            .await
            .map_err(hook_error)?;
        let input_messages = match pre_reasoning {
            HookEvent::PreReasoning { input_messages } => input_messages,
            _ => unreachable!("dispatch preserves the event variant"),
        };

        let mut ctx = ReasoningContext::new(self.name.clone());
        let tool_schemas = self.toolkit.tool_schemas();
        let mut chat_stream = self
            .model
            .chat(&input_messages, &ChatOptions::default(), &tool_schemas)
            .await?;

        while let Some(chunk) = chat_stream.next().await {
            if self.check_interrupt(tx).await? {
                return Ok(ReasoningOutcome::Interrupted);
            }
            let chunk = chunk?;
            for message in ctx.process_chunk(&chunk) {
                if filter.allows(EventType::Reasoning) {
                    let to_send = adjust_for_stream_mode(&ctx, message, self.stream_mode);
                    send(tx, Ok(Event::reasoning(to_send, false))).await?;
                }
            }
        }

        let final_message = ctx
            .build_final_message()
            .unwrap_or_else(|| Message::with_new_id(Role::Assistant, vec![]));
        if filter.allows(EventType::Reasoning) {
            send(tx, Ok(Event::reasoning(final_message.clone(), true))).await?;
        }

        let post_reasoning = self
            .hooks
            .dispatch(HookEvent::PostReasoning {
                reasoning_message: final_message.clone(),
                stop: false,
            })
            .await
            .map_err(hook_error)?;

        if post_reasoning.should_stop() {
            Ok(ReasoningOutcome::Stopped(final_message))
        } else {
            Ok(ReasoningOutcome::Produced(final_message))
        }
    }

    /// TOOL_EXEC (§4.6.5): executes every `ToolUse` block concurrently,
    /// preserving the insertion order of the blocks (not completion order)
    /// for both memory and the event stream — one `TOOL_RESULT` event per
    /// block (§8.9), each a single-block TOOL message appended to memory.
    async fn tool_exec(&self, reasoning_message: &Message, filter: &EventFilter, tx: &EventSender) -> Result<(), AgentError> {
        let tool_uses: Vec<ContentBlock> = reasoning_message.tool_uses().cloned().collect();
        let turn_id = reasoning_message.id.clone();

        let futures = tool_uses.into_iter().map(|block| {
            let toolkit = self.toolkit.clone();
            async move {
                let (id, name, input) = match &block {
                    ContentBlock::ToolUse { id, name, input, .. } => (id.clone(), name.clone(), input.clone()),
                    _ => unreachable!("tool_uses() only yields ToolUse blocks"),
                };
                let output = toolkit.execute(&id, &name, &input).await;
                ContentBlock::ToolResult { id, name, output }
            }
        });
        let results = futures::future::join_all(futures).await;

        for result in results {
            let tool_message = Message::tool_results(turn_id.clone(), vec![result]);
            self.memory.add_message(tool_message.clone()).await;
            if filter.allows(EventType::ToolResult) {
                send(tx, Ok(Event::tool_result(tool_message))).await?;
            }
        }
        Ok(())
    }

    /// FINALIZE (§4.6.7) followed by POST_CALL (§4.6.8).
    async fn finalize(&self, reasoning_message: Message, tx: &EventSender) -> Result<(), AgentError> {
        tracing::info!(state = "FINALIZE", agent_name = %self.name, "entering state");
        self.memory.add_message(reasoning_message.clone()).await;
        send(tx, Ok(Event::agent_result(reasoning_message.clone()))).await?;
        self.post_call(reasoning_message, tx).await
    }

    async fn post_call(&self, output_message: Message, tx: &EventSender) -> Result<(), AgentError> {
        tracing::info!(state = "POST_CALL", agent_name = %self.name, "entering state");
        let all_messages = self.memory.get_messages().await;
        self.hooks
            .dispatch(HookEvent::PostCall { output_message, all_messages })
            .await
            .map_err(hook_error)?;
        let _ = tx;
        Ok(())
    }

    /// Checks and clears the interrupt flag (idempotent per §4.6). On a
    /// set flag, synthesizes the `"Interrupted by user"` assistant message,
    /// appends it to memory, emits it as the terminal `AGENT_RESULT`, and
    /// runs `POST_CALL` so the call still ends normally rather than as an
    /// error (§7 `Interrupted`).
    async fn check_interrupt(&self, tx: &EventSender) -> Result<bool, AgentError> {
        if !self.interrupt_flag.swap(false, Ordering::SeqCst) {
            return Ok(false);
        }
        let message = Message::with_new_id(Role::Assistant, vec![ContentBlock::text("Interrupted by user")]);
        self.memory.add_message(message.clone()).await;
        send(tx, Ok(Event::agent_result(message.clone()))).await?;
        self.post_call(message, tx).await?;
        Ok(true)
    }
}

fn hook_error(err: AgentError) -> AgentError {
    match err {
        AgentError::HookError(_) => err,
        other => AgentError::HookError(other.to_string()),
    }
}

async fn send(tx: &EventSender, event: Result<Event, AgentError>) -> Result<(), AgentError> {
    tx.send(event).await.map_err(|_| AgentError::ChannelClosed)
}

/// In incremental mode a chunk message already carries exactly the new
/// delta. In cumulative mode, Text/Thinking blocks are rewritten to the
/// accumulator's running total so far (§4.7); ToolUse chunks are left as
/// produced since tool-call argument accumulation is already described by
/// the accumulator's own merge semantics, not a flat string total.
fn adjust_for_stream_mode(ctx: &ReasoningContext, mut message: Message, mode: StreamMode) -> Message {
    if mode == StreamMode::Incremental {
        return message;
    }
    for block in &mut message.content {
        match block {
            ContentBlock::Text { text } => *text = ctx.current_text().to_string(),
            ContentBlock::Thinking { thinking } => *thinking = ctx.current_thinking().to_string(),
            _ => {}
        }
    }
    message
}

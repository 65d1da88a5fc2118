//! Optional configuration for [`super::Agent::new`] and its resolved form.
//!
//! Grounded in the teacher's `AgentOptions`/`resolve_run_agent_options` split
//! (`loom/src/agent/react/runner/options.rs`): an all-`Option` builder struct
//! that resolves unset collaborators to safe defaults — here a scripted
//! [`MockModelProvider`] stands in for the teacher's `MockLlm`, since this
//! core has no concrete provider adapter of its own (§1).

use std::sync::Arc;

use crate::error::AgentError;
use crate::event::StreamMode;
use crate::hooks::HookChain;
use crate::longterm::{agent_control_tools, LongTermMemory, LongTermMemoryMode, StaticControlHook};
use crate::memory::Memory;
use crate::model::{MockModelProvider, ModelProvider};
use crate::toolkit::Toolkit;

/// Construction-time configuration for an [`super::Agent`]. Every field but
/// `name` is optional; unset fields resolve to the defaults documented on
/// each one.
#[derive(Default)]
pub struct AgentOptions {
    pub name: Option<String>,
    /// Defaults to a [`MockModelProvider`] that streams nothing — a real
    /// agent must supply its own provider, but tests and demos can omit it.
    pub model: Option<Arc<dyn ModelProvider>>,
    /// Defaults to an empty [`Toolkit`].
    pub toolkit: Option<Toolkit>,
    /// Defaults to a fresh, empty [`Memory`].
    pub memory: Option<Arc<Memory>>,
    /// Defaults to an empty [`HookChain`].
    pub hooks: Option<HookChain>,
    /// Defaults to `true` — a second concurrent call fails with `AgentBusy`.
    pub check_running: Option<bool>,
    /// Defaults to [`StreamMode::Incremental`].
    pub stream_mode: Option<StreamMode>,
    /// Registers a long-term memory backend under the given mode (§6). The
    /// query is the fixed retrieval query `StaticControl`/`Both` passes to
    /// `retrieve` before each reasoning step; `AgentControl`/`Both` instead
    /// let the model supply its own query through the `ltm_retrieve` tool.
    /// Unset, no long-term memory participates in the call.
    pub long_term_memory: Option<(Arc<dyn LongTermMemory>, LongTermMemoryMode, String)>,
}

impl AgentOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn model(mut self, model: Arc<dyn ModelProvider>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn toolkit(mut self, toolkit: Toolkit) -> Self {
        self.toolkit = Some(toolkit);
        self
    }

    pub fn memory(mut self, memory: Arc<Memory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn hooks(mut self, hooks: HookChain) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn check_running(mut self, check_running: bool) -> Self {
        self.check_running = Some(check_running);
        self
    }

    pub fn stream_mode(mut self, stream_mode: StreamMode) -> Self {
        self.stream_mode = Some(stream_mode);
        self
    }

    pub fn long_term_memory(
        mut self,
        memory: Arc<dyn LongTermMemory>,
        mode: LongTermMemoryMode,
        query: impl Into<String>,
    ) -> Self {
        self.long_term_memory = Some((memory, mode, query.into()));
        self
    }
}

/// Resolved form of [`AgentOptions`]: every collaborator is concrete. Only
/// built by [`resolve_agent_options`].
pub(super) struct ResolvedAgentOptions {
    pub name: String,
    pub model: Arc<dyn ModelProvider>,
    pub toolkit: Toolkit,
    pub memory: Arc<Memory>,
    pub hooks: HookChain,
    pub check_running: bool,
    pub stream_mode: StreamMode,
}

/// Rejects a blank name (§7 `InvalidArgument`); otherwise fills in every
/// unset collaborator with its default.
pub(super) fn resolve_agent_options(opts: AgentOptions) -> Result<ResolvedAgentOptions, AgentError> {
    let name = opts
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| AgentError::InvalidArgument("agent name must not be blank".into()))?;

    let model = opts
        .model
        .unwrap_or_else(|| Arc::new(MockModelProvider::new(Vec::new())));

    let toolkit = opts.toolkit.unwrap_or_default();
    let mut hooks = opts.hooks.unwrap_or_default();

    if let Some((memory, mode, query)) = opts.long_term_memory {
        if matches!(mode, LongTermMemoryMode::AgentControl | LongTermMemoryMode::Both) {
            for tool in agent_control_tools(memory.clone()) {
                toolkit.register_native(tool);
            }
        }
        if matches!(mode, LongTermMemoryMode::StaticControl | LongTermMemoryMode::Both) {
            hooks.register(Box::new(StaticControlHook::new(memory, query)));
        }
    }

    Ok(ResolvedAgentOptions {
        name,
        model,
        toolkit,
        memory: opts.memory.unwrap_or_else(|| Arc::new(Memory::new())),
        hooks,
        check_running: opts.check_running.unwrap_or(true),
        stream_mode: opts.stream_mode.unwrap_or_default(),
    })
}

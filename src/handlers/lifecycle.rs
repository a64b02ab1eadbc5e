//! Lifecycle notifications and process termination

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use super::{elapsed_ms, failed_result, MessageProcessor};
use crate::error::Result;
use crate::implementation::Invocation;
use crate::protocol::{Message, ProtoExecutionResult};
use crate::registry::{HookKind, ImplementationRegistry};

/// Runs every hook of one category and reports the outcome
pub struct HookProcessor {
    registry: Arc<ImplementationRegistry>,
    kind: HookKind,
}

impl std::fmt::Debug for HookProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookProcessor")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl HookProcessor {
    pub fn new(registry: Arc<ImplementationRegistry>, kind: HookKind) -> Self {
        Self { registry, kind }
    }

    /// Run hooks in registration order, stopping at the first failure
    async fn run_hooks(&self, invocation: &Invocation) -> ProtoExecutionResult {
        let started = Instant::now();
        for hook in self.registry.hooks_for(self.kind) {
            if let Err(failure) = hook.invoke(invocation).await {
                tracing::warn!(kind = ?self.kind, error = %failure, "Hook failed");
                return failed_result(failure, elapsed_ms(started));
            }
        }
        ProtoExecutionResult::success(elapsed_ms(started))
    }
}

#[async_trait]
impl MessageProcessor for HookProcessor {
    async fn process(&self, message: &Message) -> Result<Message> {
        let invocation = Invocation::hook(message.execution_info().cloned());
        let result = self.run_hooks(&invocation).await;
        Ok(Message::execution_status(message.message_id, result))
    }
}

/// Acknowledges a kill request; the dispatcher ends the session afterwards
#[derive(Debug, Default, Clone, Copy)]
pub struct KillProcessProcessor;

#[async_trait]
impl MessageProcessor for KillProcessProcessor {
    async fn process(&self, message: &Message) -> Result<Message> {
        tracing::info!(message_id = message.message_id, "Kill requested by host");
        Ok(Message::execution_status(
            message.message_id,
            ProtoExecutionResult::success(0),
        ))
    }
}

//! Handler table with one message processor per request type
//!
//! Each processor turns a request [`Message`] into exactly one response
//! message of the paired type. Processors consult the shared
//! [`ImplementationRegistry`] and never catch their own failures: an `Err`
//! goes straight back to the dispatcher.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::error::{Result, RunnerError};
use crate::implementation::ImplementationFailure;
use crate::protocol::{Message, MessageType, ProtoExecutionResult};
use crate::registry::{HookKind, ImplementationRegistry};

mod execute;
mod lifecycle;
mod refactor;
mod validate;

pub use execute::ExecuteStepProcessor;
pub use lifecycle::{HookProcessor, KillProcessProcessor};
pub use refactor::{PositionMove, RefactorPlan, RefactorProcessor, StepRefactorer};
pub use validate::{StepNamesProcessor, StepValidateProcessor};

/// Turns one request into its response
#[async_trait]
pub trait MessageProcessor: Send + Sync {
    async fn process(&self, message: &Message) -> Result<Message>;
}

/// Lifecycle notifications and the hook category each one runs
const LIFECYCLE_HOOKS: [(MessageType, HookKind); 8] = [
    (MessageType::ExecutionStarting, HookKind::BeforeSuite),
    (MessageType::ExecutionEnding, HookKind::AfterSuite),
    (MessageType::SpecExecutionStarting, HookKind::BeforeSpec),
    (MessageType::SpecExecutionEnding, HookKind::AfterSpec),
    (MessageType::ScenarioExecutionStarting, HookKind::BeforeScenario),
    (MessageType::ScenarioExecutionEnding, HookKind::AfterScenario),
    (MessageType::StepExecutionStarting, HookKind::BeforeStep),
    (MessageType::StepExecutionEnding, HookKind::AfterStep),
];

/// Fixed mapping from request type to processor
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<MessageType, Arc<dyn MessageProcessor>>,
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.handlers.keys().collect();
        types.sort();
        f.debug_struct("HandlerTable").field("types", &types).finish()
    }
}

impl HandlerTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table answering all thirteen request types from `registry`
    pub fn standard(
        registry: Arc<ImplementationRegistry>,
        refactorer: Option<Arc<dyn StepRefactorer>>,
    ) -> Self {
        let mut table = Self::new();
        for (message_type, kind) in LIFECYCLE_HOOKS {
            table.insert(
                message_type,
                Arc::new(HookProcessor::new(registry.clone(), kind)),
            );
        }
        table.insert(
            MessageType::ExecuteStep,
            Arc::new(ExecuteStepProcessor::new(registry.clone())),
        );
        table.insert(
            MessageType::StepValidateRequest,
            Arc::new(StepValidateProcessor::new(registry.clone())),
        );
        table.insert(
            MessageType::StepNamesRequest,
            Arc::new(StepNamesProcessor::new(registry.clone())),
        );
        table.insert(MessageType::KillProcessRequest, Arc::new(KillProcessProcessor));
        table.insert(
            MessageType::RefactorRequest,
            Arc::new(RefactorProcessor::new(registry, refactorer)),
        );
        table
    }

    /// Install a processor, returning the one it replaces
    pub fn insert(
        &mut self,
        message_type: MessageType,
        processor: Arc<dyn MessageProcessor>,
    ) -> Option<Arc<dyn MessageProcessor>> {
        self.handlers.insert(message_type, processor)
    }

    /// Processor for a type
    pub fn get(&self, message_type: MessageType) -> Option<&Arc<dyn MessageProcessor>> {
        self.handlers.get(&message_type)
    }

    /// Number of installed processors
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Error for a request that arrived without its payload
pub(crate) fn missing_payload(message: &Message, field: &'static str) -> RunnerError {
    RunnerError::MissingPayload {
        message_type: message
            .kind()
            .map(|kind| format!("{kind:?}"))
            .unwrap_or_else(|_| message.message_type.to_string()),
        field,
    }
}

/// Milliseconds since `started`, saturating
pub(crate) fn elapsed_ms(started: Instant) -> i64 {
    i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX)
}

/// Failed execution result for an implementation failure
pub(crate) fn failed_result(
    failure: ImplementationFailure,
    execution_time: i64,
) -> ProtoExecutionResult {
    ProtoExecutionResult::failure(
        failure.message,
        failure.stack_trace,
        failure.recoverable,
        execution_time,
    )
}

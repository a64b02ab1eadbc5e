//! Step execution

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use super::{elapsed_ms, failed_result, missing_payload, MessageProcessor};
use crate::error::Result;
use crate::implementation::{Invocation, StepArgument};
use crate::protocol::{ExecuteStepRequest, Message, ProtoExecutionResult};
use crate::registry::ImplementationRegistry;

/// Resolves a step and invokes its implementation with bound arguments
pub struct ExecuteStepProcessor {
    registry: Arc<ImplementationRegistry>,
}

impl std::fmt::Debug for ExecuteStepProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecuteStepProcessor").finish_non_exhaustive()
    }
}

impl ExecuteStepProcessor {
    pub fn new(registry: Arc<ImplementationRegistry>) -> Self {
        Self { registry }
    }

    async fn execute(&self, request: &ExecuteStepRequest) -> ProtoExecutionResult {
        let started = Instant::now();
        let text = if request.parsed_step_text.is_empty() {
            &request.actual_step_text
        } else {
            &request.parsed_step_text
        };

        let entry = match self.registry.lookup_step(text) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(step = %text, error = %e, "Cannot execute step");
                return ProtoExecutionResult::failure(e.to_string(), "", false, elapsed_ms(started));
            }
        };

        let expected = entry.value.parameter_count();
        if request.parameters.len() != expected {
            return ProtoExecutionResult::failure(
                format!(
                    "Parameter count mismatch for '{}': step declares {}, request carries {}",
                    entry.value.key,
                    expected,
                    request.parameters.len()
                ),
                "",
                false,
                elapsed_ms(started),
            );
        }

        let invocation = Invocation {
            arguments: request.parameters.iter().map(StepArgument::from).collect(),
            execution_info: None,
        };

        match entry.implementation.invoke(&invocation).await {
            Ok(()) => ProtoExecutionResult::success(elapsed_ms(started)),
            Err(failure) => {
                tracing::debug!(step = %entry.value.key, error = %failure, "Step failed");
                failed_result(failure, elapsed_ms(started))
            }
        }
    }
}

#[async_trait]
impl MessageProcessor for ExecuteStepProcessor {
    async fn process(&self, message: &Message) -> Result<Message> {
        let request = message
            .execute_step_request
            .as_ref()
            .ok_or_else(|| missing_payload(message, "execute_step_request"))?;
        let result = self.execute(request).await;
        Ok(Message::execution_status(message.message_id, result))
    }
}

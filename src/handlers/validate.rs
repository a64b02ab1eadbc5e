//! Step validation and step name queries

use std::sync::Arc;

use async_trait::async_trait;

use super::{missing_payload, MessageProcessor};
use crate::error::Result;
use crate::protocol::Message;
use crate::registry::ImplementationRegistry;

/// Answers whether a step text resolves to an implementation
pub struct StepValidateProcessor {
    registry: Arc<ImplementationRegistry>,
}

impl std::fmt::Debug for StepValidateProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepValidateProcessor").finish_non_exhaustive()
    }
}

impl StepValidateProcessor {
    pub fn new(registry: Arc<ImplementationRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl MessageProcessor for StepValidateProcessor {
    async fn process(&self, message: &Message) -> Result<Message> {
        let request = message
            .step_validate_request
            .as_ref()
            .ok_or_else(|| missing_payload(message, "step_validate_request"))?;

        let response = match self.registry.lookup_step(&request.step_text) {
            Ok(_) => Message::step_validate(message.message_id, true, ""),
            Err(e) => Message::step_validate(message.message_id, false, e.to_string()),
        };
        Ok(response)
    }
}

/// Lists every registered step as declared
pub struct StepNamesProcessor {
    registry: Arc<ImplementationRegistry>,
}

impl std::fmt::Debug for StepNamesProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepNamesProcessor").finish_non_exhaustive()
    }
}

impl StepNamesProcessor {
    pub fn new(registry: Arc<ImplementationRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl MessageProcessor for StepNamesProcessor {
    async fn process(&self, message: &Message) -> Result<Message> {
        Ok(Message::step_names(
            message.message_id,
            self.registry.step_templates(),
        ))
    }
}

//! Step refactoring
//!
//! The runner only validates a rename and works out how parameters move;
//! rewriting source files is left to a [`StepRefactorer`] supplied by the
//! discovery provider.

use std::sync::Arc;

use async_trait::async_trait;

use super::{missing_payload, MessageProcessor};
use crate::error::{Result, RunnerError};
use crate::implementation::ImplementationRef;
use crate::protocol::{
    Message, ParameterPosition, ProtoStepValue, RefactorRequest, RefactorResponse,
};
use crate::registry::ImplementationRegistry;
use crate::step::StepValue;

/// Rewrites the declaration of a step implementation
#[async_trait]
pub trait StepRefactorer: Send + Sync {
    /// Apply `plan` to `implementation`, returning the files that changed
    async fn refactor(
        &self,
        implementation: &ImplementationRef,
        plan: &RefactorPlan,
    ) -> Result<Vec<String>>;

    /// Refactorer name
    fn name(&self) -> &str;
}

/// Where one parameter of the new step comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionMove {
    /// Index in the old step, `None` for a newly introduced parameter
    pub old: Option<usize>,

    /// Index in the new step
    pub new: usize,
}

/// A validated rename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefactorPlan {
    pub old_value: StepValue,
    pub new_value: StepValue,
    pub positions: Vec<PositionMove>,
}

/// Validates refactor requests and hands them to the refactorer
pub struct RefactorProcessor {
    registry: Arc<ImplementationRegistry>,
    refactorer: Option<Arc<dyn StepRefactorer>>,
}

impl std::fmt::Debug for RefactorProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefactorProcessor")
            .field("refactorer", &self.refactorer.as_ref().map(|r| r.name().to_string()))
            .finish_non_exhaustive()
    }
}

impl RefactorProcessor {
    pub fn new(
        registry: Arc<ImplementationRegistry>,
        refactorer: Option<Arc<dyn StepRefactorer>>,
    ) -> Self {
        Self { registry, refactorer }
    }

    async fn refactor(&self, request: &RefactorRequest) -> Result<Vec<String>> {
        let old = request
            .old_step_value
            .as_ref()
            .ok_or_else(|| RunnerError::Refactor("old step value is missing".into()))?;
        let new = request
            .new_step_value
            .as_ref()
            .ok_or_else(|| RunnerError::Refactor("new step value is missing".into()))?;

        let old_value = step_value(old)?;
        let new_value = step_value(new)?;
        let entry = self.registry.lookup_step(&old_value.key)?;

        if let Ok(existing) = self.registry.lookup_step(&new_value.key) {
            if !Arc::ptr_eq(&existing.implementation, &entry.implementation) {
                return Err(RunnerError::DuplicateStep { key: new_value.key });
            }
        }

        let positions = request
            .param_positions
            .iter()
            .map(|p| position_move(p, &old_value, &new_value))
            .collect::<Result<Vec<_>>>()?;

        let refactorer = self.refactorer.as_ref().ok_or_else(|| {
            RunnerError::Refactor("no refactorer is available for this runner".into())
        })?;

        let plan = RefactorPlan {
            old_value,
            new_value,
            positions,
        };
        tracing::info!(
            refactorer = refactorer.name(),
            from = %plan.old_value.key,
            to = %plan.new_value.key,
            "Refactoring step"
        );
        refactorer.refactor(&entry.implementation, &plan).await
    }
}

#[async_trait]
impl MessageProcessor for RefactorProcessor {
    async fn process(&self, message: &Message) -> Result<Message> {
        let request = message
            .refactor_request
            .as_ref()
            .ok_or_else(|| missing_payload(message, "refactor_request"))?;

        let response = match self.refactor(request).await {
            Ok(files_changed) => RefactorResponse {
                success: true,
                error: String::new(),
                files_changed,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Refactor rejected");
                RefactorResponse {
                    success: false,
                    error: e.to_string(),
                    files_changed: Vec::new(),
                }
            }
        };
        Ok(Message::refactor(message.message_id, response))
    }
}

/// Parse the parameterized form when present so parameter names survive
fn step_value(value: &ProtoStepValue) -> Result<StepValue> {
    if value.parameterized_step_value.is_empty() {
        StepValue::parse(&value.step_value)
    } else {
        StepValue::parse(&value.parameterized_step_value)
    }
}

fn position_move(
    position: &ParameterPosition,
    old: &StepValue,
    new: &StepValue,
) -> Result<PositionMove> {
    let new_index = usize::try_from(position.new_position)
        .ok()
        .filter(|i| *i < new.parameter_count())
        .ok_or_else(|| {
            RunnerError::Refactor(format!(
                "new position {} is outside the {} parameters of '{}'",
                position.new_position,
                new.parameter_count(),
                new.key
            ))
        })?;

    let old_index = match position.old_position {
        -1 => None,
        p => Some(
            usize::try_from(p)
                .ok()
                .filter(|i| *i < old.parameter_count())
                .ok_or_else(|| {
                    RunnerError::Refactor(format!(
                        "old position {} is outside the {} parameters of '{}'",
                        p,
                        old.parameter_count(),
                        old.key
                    ))
                })?,
        ),
    };

    Ok(PositionMove {
        old: old_index,
        new: new_index,
    })
}

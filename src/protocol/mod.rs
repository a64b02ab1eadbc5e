//! Wire messages and the helpers the handlers use to build responses.
//!
//! Every frame payload is one protobuf-encoded [`Message`] envelope. The
//! `message_type` field decides which optional payload is populated and which
//! response type the host expects back.

mod messages;

pub use messages::*;

use crate::error::{Result, RunnerError};

impl MessageType {
    /// The thirteen request types the runner answers
    pub const REQUESTS: [MessageType; 13] = [
        MessageType::ExecutionStarting,
        MessageType::ExecutionEnding,
        MessageType::SpecExecutionStarting,
        MessageType::SpecExecutionEnding,
        MessageType::ScenarioExecutionStarting,
        MessageType::ScenarioExecutionEnding,
        MessageType::StepExecutionStarting,
        MessageType::StepExecutionEnding,
        MessageType::ExecuteStep,
        MessageType::StepValidateRequest,
        MessageType::StepNamesRequest,
        MessageType::KillProcessRequest,
        MessageType::RefactorRequest,
    ];

    /// Response type paired with a request type, `None` for response types
    pub fn response_type(self) -> Option<MessageType> {
        match self {
            MessageType::ExecutionStarting
            | MessageType::ExecutionEnding
            | MessageType::SpecExecutionStarting
            | MessageType::SpecExecutionEnding
            | MessageType::ScenarioExecutionStarting
            | MessageType::ScenarioExecutionEnding
            | MessageType::StepExecutionStarting
            | MessageType::StepExecutionEnding
            | MessageType::ExecuteStep
            | MessageType::KillProcessRequest => Some(MessageType::ExecutionStatusResponse),
            MessageType::StepValidateRequest => Some(MessageType::StepValidateResponse),
            MessageType::StepNamesRequest => Some(MessageType::StepNamesResponse),
            MessageType::RefactorRequest => Some(MessageType::RefactorResponse),
            MessageType::StepValidateResponse
            | MessageType::ExecutionStatusResponse
            | MessageType::StepNamesResponse
            | MessageType::RefactorResponse => None,
        }
    }

    /// Whether answering this request ends the session
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            MessageType::ExecutionEnding | MessageType::KillProcessRequest
        )
    }
}

impl Message {
    /// Create an envelope with no payload
    pub fn new(message_type: MessageType, message_id: i64) -> Self {
        Self {
            message_type: message_type as i32,
            message_id,
            ..Default::default()
        }
    }

    /// Resolve the type tag, rejecting values this runner does not know
    pub fn kind(&self) -> Result<MessageType> {
        MessageType::try_from(self.message_type)
            .map_err(|_| RunnerError::UnknownMessageType(self.message_type))
    }

    /// Execution context carried by a lifecycle notification
    pub fn execution_info(&self) -> Option<&ExecutionInfo> {
        let request = match self.kind().ok()? {
            MessageType::ExecutionStarting => self.execution_starting_request.as_ref(),
            MessageType::ExecutionEnding => self.execution_ending_request.as_ref(),
            MessageType::SpecExecutionStarting => self.spec_execution_starting_request.as_ref(),
            MessageType::SpecExecutionEnding => self.spec_execution_ending_request.as_ref(),
            MessageType::ScenarioExecutionStarting => {
                self.scenario_execution_starting_request.as_ref()
            }
            MessageType::ScenarioExecutionEnding => self.scenario_execution_ending_request.as_ref(),
            MessageType::StepExecutionStarting => self.step_execution_starting_request.as_ref(),
            MessageType::StepExecutionEnding => self.step_execution_ending_request.as_ref(),
            _ => None,
        };
        request.and_then(|r| r.current_execution_info.as_ref())
    }

    /// `ExecutionStatusResponse` answering `request_id`
    pub fn execution_status(request_id: i64, result: ProtoExecutionResult) -> Self {
        Self {
            execution_status_response: Some(ExecutionStatusResponse {
                execution_result: Some(result),
            }),
            ..Self::new(MessageType::ExecutionStatusResponse, request_id)
        }
    }

    /// `StepValidateResponse` answering `request_id`
    pub fn step_validate(
        request_id: i64,
        is_valid: bool,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            step_validate_response: Some(StepValidateResponse {
                is_valid,
                error_message: error_message.into(),
            }),
            ..Self::new(MessageType::StepValidateResponse, request_id)
        }
    }

    /// `StepNamesResponse` answering `request_id`
    pub fn step_names(request_id: i64, steps: Vec<String>) -> Self {
        Self {
            step_names_response: Some(StepNamesResponse { steps }),
            ..Self::new(MessageType::StepNamesResponse, request_id)
        }
    }

    /// `RefactorResponse` answering `request_id`
    pub fn refactor(request_id: i64, response: RefactorResponse) -> Self {
        Self {
            refactor_response: Some(response),
            ..Self::new(MessageType::RefactorResponse, request_id)
        }
    }

    /// Best-effort response for a request whose handler failed.
    ///
    /// Keeps the host's one-response-per-request pairing intact. Returns
    /// `None` when `request` is not a request type.
    pub fn failure_response(request: MessageType, request_id: i64, error: &str) -> Option<Self> {
        let response = match request.response_type()? {
            MessageType::ExecutionStatusResponse => Self::execution_status(
                request_id,
                ProtoExecutionResult::failure(error, "", false, 0),
            ),
            MessageType::StepValidateResponse => Self::step_validate(request_id, false, error),
            MessageType::StepNamesResponse => Self::step_names(request_id, Vec::new()),
            MessageType::RefactorResponse => Self::refactor(
                request_id,
                RefactorResponse {
                    success: false,
                    error: error.to_string(),
                    files_changed: Vec::new(),
                },
            ),
            _ => return None,
        };
        Some(response)
    }
}

impl ProtoExecutionResult {
    /// Successful result
    pub fn success(execution_time: i64) -> Self {
        Self {
            execution_time,
            ..Default::default()
        }
    }

    /// Failed result
    pub fn failure(
        error_message: impl Into<String>,
        stack_trace: impl Into<String>,
        recoverable_error: bool,
        execution_time: i64,
    ) -> Self {
        Self {
            failed: true,
            recoverable_error,
            error_message: error_message.into(),
            stack_trace: stack_trace.into(),
            execution_time,
            ..Default::default()
        }
    }
}

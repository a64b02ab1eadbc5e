//! Protobuf message definitions exchanged with the orchestration host.
//!
//! Field tags and enumeration values are part of the wire contract; never
//! renumber them.

/// Discriminates the payload carried by a [`Message`] envelope
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum MessageType {
    ExecutionStarting = 0,
    SpecExecutionStarting = 1,
    SpecExecutionEnding = 2,
    ScenarioExecutionStarting = 3,
    ScenarioExecutionEnding = 4,
    StepExecutionStarting = 5,
    StepExecutionEnding = 6,
    ExecuteStep = 7,
    ExecutionEnding = 8,
    StepValidateRequest = 9,
    StepValidateResponse = 10,
    ExecutionStatusResponse = 11,
    StepNamesRequest = 12,
    StepNamesResponse = 13,
    KillProcessRequest = 14,
    RefactorRequest = 15,
    RefactorResponse = 16,
}

/// Kind of a step argument
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ParameterType {
    Static = 0,
    Dynamic = 1,
    SpecialString = 2,
    SpecialTable = 3,
    Table = 4,
}

/// Envelope for every frame on the wire
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Message {
    #[prost(enumeration = "MessageType", tag = "1")]
    pub message_type: i32,
    /// Echoed back in the response to a request
    #[prost(int64, tag = "2")]
    pub message_id: i64,
    #[prost(message, optional, tag = "3")]
    pub execution_starting_request: Option<LifecycleRequest>,
    #[prost(message, optional, tag = "4")]
    pub spec_execution_starting_request: Option<LifecycleRequest>,
    #[prost(message, optional, tag = "5")]
    pub spec_execution_ending_request: Option<LifecycleRequest>,
    #[prost(message, optional, tag = "6")]
    pub scenario_execution_starting_request: Option<LifecycleRequest>,
    #[prost(message, optional, tag = "7")]
    pub scenario_execution_ending_request: Option<LifecycleRequest>,
    #[prost(message, optional, tag = "8")]
    pub step_execution_starting_request: Option<LifecycleRequest>,
    #[prost(message, optional, tag = "9")]
    pub step_execution_ending_request: Option<LifecycleRequest>,
    #[prost(message, optional, tag = "10")]
    pub execute_step_request: Option<ExecuteStepRequest>,
    #[prost(message, optional, tag = "11")]
    pub execution_ending_request: Option<LifecycleRequest>,
    #[prost(message, optional, tag = "12")]
    pub step_validate_request: Option<StepValidateRequest>,
    #[prost(message, optional, tag = "13")]
    pub step_validate_response: Option<StepValidateResponse>,
    #[prost(message, optional, tag = "14")]
    pub execution_status_response: Option<ExecutionStatusResponse>,
    #[prost(message, optional, tag = "15")]
    pub step_names_request: Option<StepNamesRequest>,
    #[prost(message, optional, tag = "16")]
    pub step_names_response: Option<StepNamesResponse>,
    #[prost(message, optional, tag = "17")]
    pub kill_process_request: Option<KillProcessRequest>,
    #[prost(message, optional, tag = "18")]
    pub refactor_request: Option<RefactorRequest>,
    #[prost(message, optional, tag = "19")]
    pub refactor_response: Option<RefactorResponse>,
}

/// Payload shared by the suite/spec/scenario/step lifecycle notifications
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LifecycleRequest {
    #[prost(message, optional, tag = "1")]
    pub current_execution_info: Option<ExecutionInfo>,
}

/// Where the host currently is in the run
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ExecutionInfo {
    #[prost(message, optional, tag = "1")]
    pub current_spec: Option<SpecInfo>,
    #[prost(message, optional, tag = "2")]
    pub current_scenario: Option<ScenarioInfo>,
    #[prost(message, optional, tag = "3")]
    pub current_step: Option<StepInfo>,
    #[prost(string, tag = "4")]
    pub stacktrace: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SpecInfo {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(string, tag = "2")]
    pub file_name: String,
    #[prost(bool, tag = "3")]
    pub is_failed: bool,
    #[prost(string, repeated, tag = "4")]
    pub tags: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ScenarioInfo {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(bool, tag = "2")]
    pub is_failed: bool,
    #[prost(string, repeated, tag = "3")]
    pub tags: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StepInfo {
    #[prost(message, optional, tag = "1")]
    pub step: Option<ExecuteStepRequest>,
    #[prost(bool, tag = "2")]
    pub is_failed: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ExecuteStepRequest {
    /// Step text exactly as written in the spec
    #[prost(string, tag = "1")]
    pub actual_step_text: String,
    /// Step text with parameters already replaced by `{}`
    #[prost(string, tag = "2")]
    pub parsed_step_text: String,
    #[prost(bool, tag = "3")]
    pub scenario_failing: bool,
    #[prost(message, repeated, tag = "4")]
    pub parameters: Vec<Parameter>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Parameter {
    #[prost(enumeration = "ParameterType", tag = "1")]
    pub parameter_type: i32,
    #[prost(string, tag = "2")]
    pub value: String,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(message, optional, tag = "4")]
    pub table: Option<ProtoTable>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoTable {
    #[prost(message, optional, tag = "1")]
    pub headers: Option<ProtoTableRow>,
    #[prost(message, repeated, tag = "2")]
    pub rows: Vec<ProtoTableRow>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoTableRow {
    #[prost(string, repeated, tag = "1")]
    pub cells: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StepValidateRequest {
    #[prost(string, tag = "1")]
    pub step_text: String,
    #[prost(int32, tag = "2")]
    pub number_of_parameters: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StepValidateResponse {
    #[prost(bool, tag = "1")]
    pub is_valid: bool,
    #[prost(string, tag = "2")]
    pub error_message: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ExecutionStatusResponse {
    #[prost(message, optional, tag = "1")]
    pub execution_result: Option<ProtoExecutionResult>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoExecutionResult {
    #[prost(bool, tag = "1")]
    pub failed: bool,
    #[prost(bool, tag = "2")]
    pub recoverable_error: bool,
    #[prost(string, tag = "3")]
    pub error_message: String,
    #[prost(string, tag = "4")]
    pub stack_trace: String,
    #[prost(bytes = "vec", tag = "5")]
    pub screenshot: Vec<u8>,
    /// Milliseconds
    #[prost(int64, tag = "6")]
    pub execution_time: i64,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct StepNamesRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StepNamesResponse {
    #[prost(string, repeated, tag = "1")]
    pub steps: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct KillProcessRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProtoStepValue {
    #[prost(string, tag = "1")]
    pub step_value: String,
    #[prost(string, tag = "2")]
    pub parameterized_step_value: String,
    #[prost(string, repeated, tag = "3")]
    pub parameters: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct ParameterPosition {
    /// `-1` marks a parameter that only exists in the new step
    #[prost(int32, tag = "1")]
    pub old_position: i32,
    #[prost(int32, tag = "2")]
    pub new_position: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RefactorRequest {
    #[prost(message, optional, tag = "1")]
    pub old_step_value: Option<ProtoStepValue>,
    #[prost(message, optional, tag = "2")]
    pub new_step_value: Option<ProtoStepValue>,
    #[prost(message, repeated, tag = "3")]
    pub param_positions: Vec<ParameterPosition>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RefactorResponse {
    #[prost(bool, tag = "1")]
    pub success: bool,
    #[prost(string, tag = "2")]
    pub error: String,
    #[prost(string, repeated, tag = "3")]
    pub files_changed: Vec<String>,
}

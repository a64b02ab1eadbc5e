//! Implementation references, the handles to host-side step and hook logic
//!
//! The registry stores [`ImplementationRef`]s but never calls them; only the
//! handlers do, with an [`Invocation`] describing the bound arguments and
//! where the host is in the run.

use std::sync::Arc;

use async_trait::async_trait;

use crate::protocol::{ExecutionInfo, Parameter, ParameterType, ProtoTable};

/// Shared, opaque handle to an implementation owned by the discovery provider
pub type ImplementationRef = Arc<dyn Implementation>;

/// Host-side logic behind a step or lifecycle hook
#[async_trait]
pub trait Implementation: Send + Sync {
    /// Run the implementation
    async fn invoke(&self, invocation: &Invocation) -> Result<(), ImplementationFailure>;
}

#[async_trait]
impl<F> Implementation for F
where
    F: Fn(&Invocation) -> Result<(), ImplementationFailure> + Send + Sync,
{
    async fn invoke(&self, invocation: &Invocation) -> Result<(), ImplementationFailure> {
        self(invocation)
    }
}

/// Wrap a closure as an implementation reference
pub fn from_fn<F>(f: F) -> ImplementationRef
where
    F: Fn(&Invocation) -> Result<(), ImplementationFailure> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Why an implementation did not complete
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ImplementationFailure {
    /// Human-readable failure message
    pub message: String,

    /// Optional trace captured by the implementation
    pub stack_trace: String,

    /// The host may continue the scenario after this failure
    pub recoverable: bool,
}

impl ImplementationFailure {
    /// Create a non-recoverable failure
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack_trace: String::new(),
            recoverable: false,
        }
    }

    /// Attach a stack trace
    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = stack_trace.into();
        self
    }

    /// Mark the failure as recoverable
    pub fn recoverable(mut self) -> Self {
        self.recoverable = true;
        self
    }
}

impl From<String> for ImplementationFailure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ImplementationFailure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// A table argument
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl From<&ProtoTable> for Table {
    fn from(table: &ProtoTable) -> Self {
        Self {
            headers: table
                .headers
                .as_ref()
                .map(|row| row.cells.clone())
                .unwrap_or_default(),
            rows: table.rows.iter().map(|row| row.cells.clone()).collect(),
        }
    }
}

/// A value bound to one step parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepArgument {
    Text(String),
    Table(Table),
}

impl From<&Parameter> for StepArgument {
    fn from(parameter: &Parameter) -> Self {
        let is_table = matches!(
            ParameterType::try_from(parameter.parameter_type),
            Ok(ParameterType::Table | ParameterType::SpecialTable)
        );
        match (&parameter.table, is_table) {
            (Some(table), true) => StepArgument::Table(Table::from(table)),
            _ => StepArgument::Text(parameter.value.clone()),
        }
    }
}

/// Arguments and context for one call into an implementation
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// Bound step arguments in parameter order; empty for hooks
    pub arguments: Vec<StepArgument>,

    /// Current spec/scenario/step as reported by the host
    pub execution_info: Option<ExecutionInfo>,
}

impl Invocation {
    /// Invocation for a lifecycle hook
    pub fn hook(execution_info: Option<ExecutionInfo>) -> Self {
        Self {
            arguments: Vec::new(),
            execution_info,
        }
    }

    /// Text argument at `index`
    pub fn text(&self, index: usize) -> Option<&str> {
        match self.arguments.get(index)? {
            StepArgument::Text(text) => Some(text),
            StepArgument::Table(_) => None,
        }
    }

    /// Table argument at `index`
    pub fn table(&self, index: usize) -> Option<&Table> {
        match self.arguments.get(index)? {
            StepArgument::Table(table) => Some(table),
            StepArgument::Text(_) => None,
        }
    }
}

//! # a3s-runner
//!
//! Step runner for test-orchestration hosts. The host launches the runner,
//! passes a port in `GAUGE_INTERNAL_PORT`, and drives the whole run over a
//! single TCP connection of varint-length-prefixed protobuf messages.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use a3s_runner::{HookKind, Invocation, StaticDiscovery};
//!
//! # async fn example() -> a3s_runner::Result<()> {
//! let provider = StaticDiscovery::new()
//!     .step(["Say <greeting> to <name>"], |inv: &Invocation| {
//!         println!("{} {}", inv.text(0).unwrap_or(""), inv.text(1).unwrap_or(""));
//!         Ok(())
//!     })
//!     .hook(HookKind::BeforeSuite, |_: &Invocation| Ok(()));
//!
//! a3s_runner::run(&provider).await
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **DiscoveryProvider** trait: reports step and hook implementations once at startup
//! - **ImplementationRegistry**: normalized step keys and ordered hook lists
//! - **HandlerTable**: one processor per request type
//! - **Dispatcher**: sequential read/handle/respond loop over a [`FrameCodec`]

pub mod config;
pub mod connection;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod implementation;
pub mod protocol;
pub mod registry;
pub mod retry;
pub mod runtime;
pub mod step;
pub mod telemetry;
pub mod transport;

// Re-export core types
pub use config::RunnerConfig;
pub use discovery::{Artifact, ArtifactKind, DiscoveryProvider, StaticDiscovery};
pub use dispatcher::{DispatchState, Dispatcher};
pub use error::{Result, RunnerError};
pub use handlers::{HandlerTable, MessageProcessor, PositionMove, RefactorPlan, StepRefactorer};
pub use implementation::{
    from_fn, Implementation, ImplementationFailure, ImplementationRef, Invocation, StepArgument,
    Table,
};
pub use protocol::{Message, MessageType};
pub use registry::{HookKind, ImplementationRegistry, StepEntry};
pub use retry::RetryConfig;
pub use runtime::{run, run_with_config};
pub use step::{normalize, StepValue};
pub use transport::{FrameCodec, TcpFrameCodec, TransportError};

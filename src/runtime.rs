//! Runner entry point
//!
//! Startup order: configuration, registry, connection, dispatch. Any startup
//! failure aborts before the host sees a connection.

use std::sync::Arc;

use tracing::Instrument;

use crate::config::RunnerConfig;
use crate::connection;
use crate::discovery::DiscoveryProvider;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::handlers::HandlerTable;
use crate::registry::ImplementationRegistry;
use crate::telemetry;
use crate::transport::TcpFrameCodec;

/// Run one session configured from the environment.
///
/// Returns once the host has sent `ExecutionEnding` or `KillProcessRequest`;
/// the caller decides how the process exits.
pub async fn run(provider: &dyn DiscoveryProvider) -> Result<()> {
    let config = RunnerConfig::from_env()?;
    telemetry::init_tracing(&config.log_level);
    run_with_config(&config, provider).await
}

/// Run one session with an explicit configuration
pub async fn run_with_config(
    config: &RunnerConfig,
    provider: &dyn DiscoveryProvider,
) -> Result<()> {
    let session_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("session", id = %session_id, port = config.port);

    async {
        let registry = Arc::new(ImplementationRegistry::from_discovery(provider).await?);
        let handlers = HandlerTable::standard(registry, provider.refactorer());

        let stream = connection::connect(config).await?;
        let mut dispatcher = Dispatcher::new(TcpFrameCodec::from_stream(stream), handlers);
        dispatcher.run().await
    }
    .instrument(span)
    .await
}

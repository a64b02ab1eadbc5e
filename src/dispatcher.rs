//! Message dispatch loop
//!
//! Reads one frame at a time, routes the decoded request to its handler and
//! writes exactly one response before reading the next frame. The loop ends
//! after answering `ExecutionEnding` or `KillProcessRequest`, or when the
//! connection fails.

use prost::Message as _;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{Result, RunnerError};
use crate::handlers::HandlerTable;
use crate::protocol::Message;
use crate::transport::FrameCodec;

/// Lifecycle of one dispatch session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Connected,
    Dispatching,
    Closing,
    Closed,
}

/// What to do after one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Terminate,
}

/// Owns the connection and the handler table for one session
pub struct Dispatcher<R, W> {
    codec: FrameCodec<R, W>,
    handlers: HandlerTable,
    state: DispatchState,
    responses: u64,
}

impl<R, W> std::fmt::Debug for Dispatcher<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &self.state)
            .field("handlers", &self.handlers)
            .field("responses", &self.responses)
            .finish_non_exhaustive()
    }
}

impl<R, W> Dispatcher<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(codec: FrameCodec<R, W>, handlers: HandlerTable) -> Self {
        Self {
            codec,
            handlers,
            state: DispatchState::Connected,
            responses: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Responses written so far
    pub fn responses(&self) -> u64 {
        self.responses
    }

    /// Dispatch until a terminal request has been answered.
    ///
    /// Returns `Ok` after a terminal request; connection-fatal errors close
    /// the session and are returned. Per-message failures are logged and
    /// the loop keeps going.
    pub async fn run(&mut self) -> Result<()> {
        if self.state != DispatchState::Connected {
            return Err(RunnerError::Connection(format!(
                "dispatcher cannot start from state {:?}",
                self.state
            )));
        }
        self.state = DispatchState::Dispatching;

        loop {
            match self.dispatch_next().await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Terminate) => return self.close().await,
                Err(e) => {
                    self.state = DispatchState::Closed;
                    tracing::error!(
                        error = %e,
                        responses = self.responses,
                        "Dispatch loop stopped"
                    );
                    return Err(e);
                }
            }
        }
    }

    /// Handle one frame
    async fn dispatch_next(&mut self) -> Result<Flow> {
        let payload = self
            .codec
            .read_frame()
            .await?
            .ok_or(RunnerError::ConnectionClosed)?;

        let message = match Message::decode(payload) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %RunnerError::from(e), "Skipping undecodable frame");
                return Ok(Flow::Continue);
            }
        };

        let kind = match message.kind() {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!(message_id = message.message_id, error = %e, "Skipping message");
                return Ok(Flow::Continue);
            }
        };

        let Some(handler) = self.handlers.get(kind).cloned() else {
            tracing::warn!(
                message_type = ?kind,
                message_id = message.message_id,
                "No handler for message type"
            );
            return Ok(Flow::Continue);
        };

        tracing::debug!(message_type = ?kind, message_id = message.message_id, "Dispatching");

        let response = match handler.process(&message).await {
            Ok(response) => Some(response),
            Err(e) if e.is_connection_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(
                    message_type = ?kind,
                    message_id = message.message_id,
                    error = %e,
                    "Handler failed"
                );
                Message::failure_response(kind, message.message_id, &e.to_string())
            }
        };

        if let Some(response) = response {
            self.codec.write_frame(&response.encode_to_vec()).await?;
            self.responses += 1;
        }

        Ok(if kind.is_terminal() {
            Flow::Terminate
        } else {
            Flow::Continue
        })
    }

    /// Shut the write half down once and finish
    async fn close(&mut self) -> Result<()> {
        self.state = DispatchState::Closing;
        let shutdown = self.codec.shutdown().await;
        self.state = DispatchState::Closed;
        shutdown?;
        tracing::info!(responses = self.responses, "Session closed");
        Ok(())
    }

    /// Consume the dispatcher and return the connection
    pub fn into_codec(self) -> FrameCodec<R, W> {
        self.codec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio::io::{AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};

    use crate::handlers::MessageProcessor;
    use crate::implementation::{from_fn, Invocation};
    use crate::protocol::{MessageType, ProtoExecutionResult};
    use crate::registry::ImplementationRegistry;

    type Half = FrameCodec<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

    type Session = Dispatcher<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

    fn session(handlers: HandlerTable) -> (Session, Half) {
        let (runner, host) = tokio::io::duplex(64 * 1024);
        let (rr, rw) = tokio::io::split(runner);
        let (hr, hw) = tokio::io::split(host);
        (
            Dispatcher::new(FrameCodec::new(rr, rw), handlers),
            FrameCodec::new(hr, hw),
        )
    }

    async fn send(host: &mut Half, message: Message) {
        host.write_frame(&message.encode_to_vec()).await.unwrap();
    }

    async fn drain(host: &mut Half) -> Vec<Message> {
        let mut responses = Vec::new();
        while let Some(frame) = host.read_frame().await.unwrap() {
            responses.push(Message::decode(frame).unwrap());
        }
        responses
    }

    fn standard() -> HandlerTable {
        let mut registry = ImplementationRegistry::new();
        registry
            .register_template("a step", from_fn(|_: &Invocation| Ok(())))
            .unwrap();
        HandlerTable::standard(Arc::new(registry), None)
    }

    /// Answers with an empty response of the paired type and records the request
    struct Recording {
        seen: Arc<Mutex<Vec<(MessageType, i64)>>>,
    }

    #[async_trait]
    impl MessageProcessor for Recording {
        async fn process(&self, message: &Message) -> Result<Message> {
            let kind = message.kind()?;
            self.seen.lock().unwrap().push((kind, message.message_id));
            let response_type = kind
                .response_type()
                .ok_or(RunnerError::UnknownMessageType(message.message_type))?;
            Ok(Message::new(response_type, message.message_id))
        }
    }

    struct Failing;

    #[async_trait]
    impl MessageProcessor for Failing {
        async fn process(&self, message: &Message) -> Result<Message> {
            Err(RunnerError::Handler {
                message_type: format!("{:?}", message.kind()?),
                reason: "boom".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_responses_in_request_order_then_close() {
        let (mut dispatcher, mut host) = session(standard());

        for id in 1..=5 {
            send(&mut host, Message::new(MessageType::StepNamesRequest, id)).await;
        }
        send(&mut host, Message::new(MessageType::ExecutionEnding, 6)).await;

        dispatcher.run().await.unwrap();
        assert_eq!(dispatcher.state(), DispatchState::Closed);
        assert_eq!(dispatcher.responses(), 6);

        let responses = drain(&mut host).await;
        let ids: Vec<i64> = responses.iter().map(|m| m.message_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        assert!(responses[..5]
            .iter()
            .all(|m| m.kind().unwrap() == MessageType::StepNamesResponse));
        assert_eq!(responses[5].kind().unwrap(), MessageType::ExecutionStatusResponse);
    }

    #[tokio::test]
    async fn test_every_request_routes_to_its_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut handlers = HandlerTable::new();
        for request in MessageType::REQUESTS {
            handlers.insert(request, Arc::new(Recording { seen: seen.clone() }));
        }
        let (mut dispatcher, mut host) = session(handlers);

        let non_terminal: Vec<MessageType> = MessageType::REQUESTS
            .into_iter()
            .filter(|t| !t.is_terminal())
            .collect();
        for (id, request) in non_terminal.iter().enumerate() {
            send(&mut host, Message::new(*request, id as i64)).await;
        }
        send(&mut host, Message::new(MessageType::KillProcessRequest, 100)).await;

        dispatcher.run().await.unwrap();

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), non_terminal.len() + 1);
        for (id, request) in non_terminal.iter().enumerate() {
            assert_eq!(seen[id], (*request, id as i64));
        }
        assert_eq!(seen.last(), Some(&(MessageType::KillProcessRequest, 100)));

        let responses = drain(&mut host).await;
        assert_eq!(responses.len(), seen.len());
        for ((request, id), response) in seen.iter().zip(&responses) {
            assert_eq!(response.message_id, *id);
            assert_eq!(Some(response.kind().unwrap()), request.response_type());
        }
    }

    #[tokio::test]
    async fn test_unknown_type_skipped() {
        let (mut dispatcher, mut host) = session(standard());

        send(
            &mut host,
            Message {
                message_type: 99,
                message_id: 1,
                ..Default::default()
            },
        )
        .await;
        send(&mut host, Message::new(MessageType::StepNamesRequest, 2)).await;
        send(&mut host, Message::new(MessageType::KillProcessRequest, 3)).await;

        dispatcher.run().await.unwrap();

        let responses = drain(&mut host).await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].message_id, 2);
        assert_eq!(
            responses[0].step_names_response.as_ref().unwrap().steps,
            vec!["a step"]
        );
        assert_eq!(responses[1].message_id, 3);
    }

    #[tokio::test]
    async fn test_response_type_from_host_has_no_handler() {
        let (mut dispatcher, mut host) = session(standard());

        send(&mut host, Message::new(MessageType::StepNamesResponse, 1)).await;
        send(&mut host, Message::new(MessageType::ExecutionEnding, 2)).await;

        dispatcher.run().await.unwrap();
        let responses = drain(&mut host).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].message_id, 2);
    }

    #[tokio::test]
    async fn test_undecodable_frame_skipped() {
        let (mut dispatcher, mut host) = session(standard());

        host.write_frame(&[0x0a, 0x05]).await.unwrap();
        send(&mut host, Message::new(MessageType::KillProcessRequest, 4)).await;

        dispatcher.run().await.unwrap();
        let responses = drain(&mut host).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].message_id, 4);
    }

    #[tokio::test]
    async fn test_handler_error_gets_failure_response() {
        let (mut dispatcher, mut host) = session(standard());

        // ExecuteStep without its payload
        send(&mut host, Message::new(MessageType::ExecuteStep, 7)).await;
        send(&mut host, Message::new(MessageType::ExecutionEnding, 8)).await;

        dispatcher.run().await.unwrap();
        let responses = drain(&mut host).await;
        assert_eq!(responses.len(), 2);

        let result: &ProtoExecutionResult = responses[0]
            .execution_status_response
            .as_ref()
            .and_then(|r| r.execution_result.as_ref())
            .unwrap();
        assert_eq!(responses[0].message_id, 7);
        assert!(result.failed);
        assert!(result.error_message.contains("execute_step_request"));
    }

    #[tokio::test]
    async fn test_failing_terminal_handler_still_closes() {
        let mut handlers = standard();
        handlers.insert(MessageType::KillProcessRequest, Arc::new(Failing));
        let (mut dispatcher, mut host) = session(handlers);

        send(&mut host, Message::new(MessageType::KillProcessRequest, 1)).await;

        dispatcher.run().await.unwrap();
        assert_eq!(dispatcher.state(), DispatchState::Closed);

        let responses = drain(&mut host).await;
        assert_eq!(responses.len(), 1);
        let result = responses[0]
            .execution_status_response
            .as_ref()
            .and_then(|r| r.execution_result.as_ref())
            .unwrap();
        assert!(result.failed);
        assert!(result.error_message.contains("boom"));
    }

    #[tokio::test]
    async fn test_peer_close_is_fatal() {
        let (mut dispatcher, mut host) = session(standard());

        send(&mut host, Message::new(MessageType::StepNamesRequest, 1)).await;
        host.shutdown().await.unwrap();

        let err = dispatcher.run().await.unwrap_err();
        assert!(matches!(err, RunnerError::ConnectionClosed));
        assert!(err.is_connection_fatal());
        assert_eq!(dispatcher.state(), DispatchState::Closed);
        assert_eq!(dispatcher.responses(), 1);
    }

    #[tokio::test]
    async fn test_truncated_frame_is_fatal() {
        let (mut dispatcher, host) = session(standard());

        // Length prefix promising 10 bytes, then only 2 and EOF
        let FrameCodec { writer, .. } = host;
        let mut raw = writer.into_inner();
        raw.write_all(&[0x0a, 0x01, 0x02]).await.unwrap();
        raw.shutdown().await.unwrap();

        let err = dispatcher.run().await.unwrap_err();
        assert!(matches!(err, RunnerError::Transport(_)));
        assert_eq!(dispatcher.state(), DispatchState::Closed);
    }

    #[tokio::test]
    async fn test_cannot_run_twice() {
        let (mut dispatcher, mut host) = session(standard());
        send(&mut host, Message::new(MessageType::ExecutionEnding, 1)).await;
        dispatcher.run().await.unwrap();
        assert!(dispatcher.run().await.is_err());
    }
}

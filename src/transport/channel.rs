//! Connection task of the persistent channel.
//!
//! The task is the sole owner of the WebSocket session and of the
//! single-slot resend buffer. It cycles `Connecting → Connected →
//! Disconnected` until the transport is closed, publishing each transition
//! on the [`watch`] channel and the [`EventBus`].

use std::collections::VecDeque;
use std::future::Future;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::messages::{ChannelMessage, Inbound, classify};
use crate::config::ChannelConfig;
use crate::domain::{
    Action, Command, ConnectionState, EventBus, TransportEvent, TransportWarning,
};
use crate::error::RemoteError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// How many sent envelope ids are remembered for ack/nack matching.
const IN_FLIGHT_LIMIT: usize = 32;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// Channel dropped; reconnect.
    Dropped,
    /// Transport closed; stop.
    Closed,
}

/// State owned by the spawned connection task.
#[derive(Debug)]
pub(crate) struct ChannelTask {
    config: ChannelConfig,
    commands: mpsc::UnboundedReceiver<Command>,
    state: watch::Sender<ConnectionState>,
    shutdown: watch::Receiver<bool>,
    bus: EventBus,
    /// Latest command attempted while disconnected.
    pending: Option<Command>,
    in_flight: InFlight,
}

/// Ids of recently sent commands, oldest first.
#[derive(Debug, Default)]
struct InFlight {
    sent: VecDeque<(String, Action)>,
}

impl InFlight {
    fn record(&mut self, id: String, action: Action) {
        if self.sent.len() == IN_FLIGHT_LIMIT {
            self.sent.pop_front();
        }
        self.sent.push_back((id, action));
    }

    /// Removes and returns the action sent under `id`.
    fn take(&mut self, id: &str) -> Option<Action> {
        let index = self.sent.iter().position(|(sent, _)| sent == id)?;
        self.sent.remove(index).map(|(_, action)| action)
    }
}

impl ChannelTask {
    pub(crate) fn new(
        config: ChannelConfig,
        commands: mpsc::UnboundedReceiver<Command>,
        state: watch::Sender<ConnectionState>,
        shutdown: watch::Receiver<bool>,
        bus: EventBus,
    ) -> Self {
        Self {
            config,
            commands,
            state,
            shutdown,
            bus,
            pending: None,
            in_flight: InFlight::default(),
        }
    }

    /// Runs until the transport is closed or dropped.
    pub(crate) async fn run(mut self) {
        loop {
            self.set_state(ConnectionState::Connecting);
            let Some(opened) = self.idle_until(open(self.config.clone())).await else {
                break;
            };
            match opened {
                Ok(stream) => {
                    self.set_state(ConnectionState::Connected);
                    let end = self.session(stream).await;
                    self.set_state(ConnectionState::Disconnected);
                    if end == SessionEnd::Closed {
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!(url = %self.config.url, error = %err, "handshake failed");
                    self.set_state(ConnectionState::Disconnected);
                }
            }
            let delay = self.config.reconnect_delay;
            if self.idle_until(tokio::time::sleep(delay)).await.is_none() {
                break;
            }
        }
        self.set_state(ConnectionState::Disconnected);
        tracing::debug!("channel task stopped");
    }

    /// Drives `fut` while buffering commands that arrive in the meantime.
    ///
    /// Returns `None` if the transport was closed first.
    async fn idle_until<F: Future>(&mut self, fut: F) -> Option<F::Output> {
        tokio::pin!(fut);
        loop {
            tokio::select! {
                out = &mut fut => return Some(out),
                cmd = self.commands.recv() => match cmd {
                    Some(command) => self.buffer(command),
                    None => return None,
                },
                _ = self.shutdown.changed() => return None,
            }
        }
    }

    /// Live session: forwards commands out and events in.
    async fn session(&mut self, stream: WsStream) -> SessionEnd {
        let (mut ws_tx, mut ws_rx) = stream.split();

        if let Some(command) = self.pending.take() {
            tracing::info!(action = %command.action, "retransmitting buffered command");
            if let Err(err) = self.transmit(&mut ws_tx, &command).await {
                self.report(Some(command.action), &err);
                self.pending = Some(command);
                return SessionEnd::Dropped;
            }
        }

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(command) => {
                        if let Err(err) = self.transmit(&mut ws_tx, &command).await {
                            self.report(Some(command.action), &err);
                            self.pending = Some(command);
                            return SessionEnd::Dropped;
                        }
                    }
                    None => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        return SessionEnd::Closed;
                    }
                },
                msg = ws_rx.next() => match msg {
                    Some(Ok(Message::Text(text))) => self.handle_inbound(&text),
                    Some(Ok(Message::Close(_))) | None => return SessionEnd::Dropped,
                    Some(Err(err)) => {
                        tracing::warn!(error = %err, "channel read failed");
                        return SessionEnd::Dropped;
                    }
                    Some(Ok(_)) => {}
                },
                _ = self.shutdown.changed() => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    return SessionEnd::Closed;
                }
            }
        }
    }

    async fn transmit(
        &mut self,
        ws_tx: &mut WsSink,
        command: &Command,
    ) -> Result<(), RemoteError> {
        let message = ChannelMessage::command(&self.config, command);
        let json = message.to_json()?;
        ws_tx
            .send(Message::text(json))
            .await
            .map_err(|e| RemoteError::TransportSend(format!("{}: {e}", command.action)))?;
        tracing::debug!(id = %message.id, action = %command.action, "command transmitted");
        self.in_flight.record(message.id, command.action);
        Ok(())
    }

    fn handle_inbound(&mut self, text: &str) {
        match classify(text, &self.config.namespace) {
            Ok(Inbound::Telemetry(event)) => {
                self.bus.publish(TransportEvent::Telemetry(event));
            }
            Ok(Inbound::Ack { id }) => {
                let action = self.in_flight.take(&id);
                tracing::debug!(%id, action = ?action, "command acknowledged");
            }
            Ok(Inbound::Nack { id, message }) => {
                let action = self.in_flight.take(&id);
                let err = RemoteError::TransportSend(format!("controller rejected {id}: {message}"));
                self.report(action, &err);
            }
            Ok(Inbound::Ignored) => tracing::trace!("inbound frame ignored"),
            Err(err) => self.report(None, &err),
        }
    }

    /// Single-slot buffer: a newer command supersedes the held one.
    fn buffer(&mut self, command: Command) {
        tracing::debug!(action = %command.action, "buffering command while disconnected");
        if let Some(old) = self.pending.replace(command) {
            tracing::debug!(superseded = %old.action, "buffered command superseded");
        }
    }

    fn report(&self, action: Option<Action>, err: &RemoteError) {
        tracing::warn!(action = ?action, error = %err, "channel warning");
        self.bus.publish(TransportEvent::Warning(TransportWarning::new(action, err)));
    }

    fn set_state(&self, next: ConnectionState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        if changed {
            tracing::info!(state = %next, "channel state changed");
            self.bus.publish(TransportEvent::StateChanged { state: next });
        }
    }
}

/// Opens the socket and joins the namespace within the handshake timeout.
async fn open(config: ChannelConfig) -> Result<WsStream, RemoteError> {
    let handshake = async {
        let (mut stream, _) = connect_async(config.url.as_str())
            .await
            .map_err(|e| RemoteError::TransportSend(format!("connect {}: {e}", config.url)))?;
        let join = ChannelMessage::join(&config.namespace).to_json()?;
        stream
            .send(Message::text(join))
            .await
            .map_err(|e| RemoteError::TransportSend(format!("join {}: {e}", config.namespace)))?;
        Ok::<_, RemoteError>(stream)
    };
    tokio::time::timeout(config.handshake_timeout, handshake)
        .await
        .map_err(|_| RemoteError::TransportSend(format!("handshake with {} timed out", config.url)))?
}

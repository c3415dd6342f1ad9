//! In-process fake controller: `/motor/{akce}` endpoints and a `/ws` channel.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU8, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};

use malina_remote::config::ChannelConfig;
use malina_remote::transport::messages::ChannelMessage;

pub const NAMESPACE: &str = "/malina";

/// Frame that makes every server-side socket hang up.
const KICK: &str = "\u{0}kick";

/// Something the fake controller received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    /// `http` for stateless requests, otherwise the channel event name.
    pub event: String,
    /// Wire action, if any.
    pub akce: Option<String>,
}

/// Body the `/motor` speed endpoints answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SpeedReply {
    /// `{"rychlost": n}` after applying the step.
    Reading = 0,
    /// JSON object without a reading.
    NoReading = 1,
    /// Plain text.
    Text = 2,
    /// Empty body.
    Empty = 3,
}

#[derive(Debug, Clone)]
struct FakeState {
    received: mpsc::UnboundedSender<Received>,
    push: broadcast::Sender<String>,
    speed: Arc<AtomicI64>,
    failing: Arc<AtomicBool>,
    rejecting: Arc<AtomicBool>,
    speed_reply: Arc<AtomicU8>,
}

impl FakeState {
    fn record(&self, event: &str, akce: Option<&str>) {
        let _ = self.received.send(Received {
            event: event.to_string(),
            akce: akce.map(str::to_string),
        });
    }

    /// Applies a speed step the way the robot does: ±10, clamped to 0..=100.
    fn step_speed(&self, akce: &str) -> i64 {
        let delta = match akce {
            "zrychli" => 10,
            "zpomal" => -10,
            _ => 0,
        };
        let _ = self
            .speed
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |s| {
                Some((s + delta).clamp(0, 100))
            });
        self.speed.load(Ordering::SeqCst)
    }

    fn broadcast(&self, event: &str, data: serde_json::Value) {
        if let Ok(json) = ChannelMessage::new(NAMESPACE, event, data).to_json() {
            let _ = self.push.send(json);
        }
    }
}

/// Handle to a running fake controller.
#[derive(Debug)]
pub struct FakeController {
    pub addr: SocketAddr,
    received: mpsc::UnboundedReceiver<Received>,
    state: FakeState,
}

impl FakeController {
    /// Starts on an ephemeral port.
    pub async fn spawn() -> Self {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("cannot bind fake controller");
        };
        Self::spawn_on(listener)
    }

    /// Starts on an already bound listener.
    pub fn spawn_on(listener: TcpListener) -> Self {
        let Ok(addr) = listener.local_addr() else {
            panic!("listener has no address");
        };
        let (received_tx, received) = mpsc::unbounded_channel();
        let (push, _) = broadcast::channel(64);
        let state = FakeState {
            received: received_tx,
            push,
            speed: Arc::new(AtomicI64::new(30)),
            failing: Arc::new(AtomicBool::new(false)),
            rejecting: Arc::new(AtomicBool::new(false)),
            speed_reply: Arc::new(AtomicU8::new(SpeedReply::Reading as u8)),
        };
        let app = Router::new()
            .route("/motor/{akce}", get(motor_handler))
            .route("/ws", get(ws_handler))
            .with_state(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            addr,
            received,
            state,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Pushes an unsolicited event to every connected channel.
    pub fn push(&self, event: &str, data: serde_json::Value) {
        self.state.broadcast(event, data);
    }

    /// Makes every `/motor` request answer 503.
    pub fn set_failing(&self, failing: bool) {
        self.state.failing.store(failing, Ordering::SeqCst);
    }

    /// Chooses what the speed endpoints answer with.
    pub fn set_speed_reply(&self, reply: SpeedReply) {
        self.state.speed_reply.store(reply as u8, Ordering::SeqCst);
    }

    /// Answers every channel command with an `error` envelope echoing its id.
    pub fn set_rejecting(&self, rejecting: bool) {
        self.state.rejecting.store(rejecting, Ordering::SeqCst);
    }

    /// Drops every open channel from the server side.
    pub fn kick(&self) {
        let _ = self.state.push.send(KICK.to_string());
    }

    /// Pushes a raw text frame to every connected channel.
    pub fn push_raw(&self, text: &str) {
        let _ = self.state.push.send(text.to_string());
    }

    /// Waits for the next received command or join.
    pub async fn next(&mut self) -> Option<Received> {
        tokio::time::timeout(Duration::from_secs(5), self.received.recv())
            .await
            .ok()
            .flatten()
    }

    /// Waits for the channel handshake.
    pub async fn wait_for_join(&mut self) {
        let Some(first) = self.next().await else {
            panic!("client never joined");
        };
        assert_eq!(first.event, "connect");
    }

    /// Returns whatever arrives within `window`.
    pub async fn collect_for(&mut self, window: Duration) -> Vec<Received> {
        let mut out = Vec::new();
        let deadline = tokio::time::Instant::now() + window;
        while let Ok(Some(r)) = tokio::time::timeout_at(deadline, self.received.recv()).await {
            out.push(r);
        }
        out
    }
}

/// Channel settings pointing at `addr`, with quick retry timings.
pub fn channel_config(addr: SocketAddr) -> ChannelConfig {
    ChannelConfig {
        url: format!("ws://{addr}/ws"),
        namespace: NAMESPACE.to_string(),
        steering_event: "steering".to_string(),
        speed_event: "rychlost".to_string(),
        handshake_timeout: Duration::from_secs(2),
        reconnect_delay: Duration::from_millis(50),
    }
}

async fn motor_handler(State(state): State<FakeState>, Path(akce): Path<String>) -> Response {
    state.record("http", Some(&akce));
    if state.failing.load(Ordering::SeqCst) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    match akce.as_str() {
        "zrychli" | "zpomal" => {
            let speed = state.step_speed(&akce);
            let reply = state.speed_reply.load(Ordering::SeqCst);
            if reply == SpeedReply::NoReading as u8 {
                axum::Json(serde_json::json!({ "ok": true })).into_response()
            } else if reply == SpeedReply::Text as u8 {
                "rychlost zmenena".into_response()
            } else if reply == SpeedReply::Empty as u8 {
                StatusCode::OK.into_response()
            } else {
                axum::Json(serde_json::json!({ "rychlost": speed })).into_response()
            }
        }
        _ => StatusCode::OK.into_response(),
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<FakeState>) -> impl IntoResponse {
    let push_rx = state.push.subscribe();
    ws.on_upgrade(move |socket| run_socket(socket, state, push_rx))
}

async fn run_socket(
    mut socket: WebSocket,
    state: FakeState,
    mut push_rx: broadcast::Receiver<String>,
) {
    loop {
        tokio::select! {
            msg = socket.recv() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let Ok(msg) = serde_json::from_str::<ChannelMessage>(&text) else {
                        continue;
                    };
                    let akce = msg.data.get("akce").and_then(|v| v.as_str());
                    state.record(&msg.event, akce);
                    if msg.event != "connect" && state.rejecting.load(Ordering::SeqCst) {
                        let mut nack = ChannelMessage::new(
                            NAMESPACE,
                            "error",
                            serde_json::json!({ "message": "Akce neni definovana" }),
                        );
                        nack.id.clone_from(&msg.id);
                        if let Ok(json) = nack.to_json()
                            && socket.send(Message::text(json)).await.is_err()
                        {
                            break;
                        }
                        continue;
                    }
                    if msg.event == "rychlost"
                        && let Some(akce) = akce
                    {
                        let speed = state.step_speed(akce);
                        state.broadcast("rychlost", serde_json::json!({ "rychlost": speed }));
                    }
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
            pushed = push_rx.recv() => match pushed {
                Ok(text) if text == KICK => break,
                Ok(text) => {
                    if socket.send(Message::text(text)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}

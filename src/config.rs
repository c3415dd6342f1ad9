//! Remote configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Missing or unparsable numeric values
//! fall back to defaults; a bad transport kind, base URL or control layout
//! is a startup error.

use std::time::Duration;

use crate::domain::ControlBinding;
use crate::error::RemoteError;

/// Which transport binding talks to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// One HTTP request per command.
    Polling,
    /// Long-lived WebSocket channel with pushed telemetry.
    Push,
}

impl std::str::FromStr for TransportKind {
    type Err = RemoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "polling" | "http" => Ok(Self::Polling),
            "push" | "ws" | "websocket" => Ok(Self::Push),
            other => Err(RemoteError::Config(format!("unknown transport: {other}"))),
        }
    }
}

/// Settings of the persistent channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// WebSocket URL (e.g. `ws://127.0.0.1:5000/ws`).
    pub url: String,
    /// Logical namespace every envelope is scoped to.
    pub namespace: String,
    /// Outbound event name for steering-class commands.
    pub steering_event: String,
    /// Outbound event name for speed-class commands.
    pub speed_event: String,
    /// Upper bound for opening the socket and joining the namespace.
    pub handshake_timeout: Duration,
    /// Pause between a failed or dropped session and the next attempt.
    pub reconnect_delay: Duration,
}

/// Static UI layout: control ids and the slots telemetry renders into.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// One binding per physical control.
    pub controls: Vec<ControlBinding>,
    /// Slot id of the speed readout.
    pub speed_slot: String,
    /// Sensor names with a readout slot.
    pub sensor_slots: Vec<String>,
}

impl Layout {
    /// Controls of the Malina web page.
    const DEFAULT_CONTROLS: [(&'static str, &'static str); 11] = [
        ("bdopredu", "move-forward"),
        ("bdozadu", "move-backward"),
        ("bstop", "stop"),
        ("brotujdoleva", "rotate-left"),
        ("brotujdoprava", "rotate-right"),
        ("bvpredvlevo", "turn-forward-left"),
        ("bvpredvpravo", "turn-forward-right"),
        ("bvzadvlevo", "turn-backward-left"),
        ("bvzadvpravo", "turn-backward-right"),
        ("bzrychli", "speed-increase"),
        ("bzpomal", "speed-decrease"),
    ];

    /// Parses a `id=action,id=action` control list.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::UnknownAction`] for an action outside the
    /// vocabulary, or [`RemoteError::Config`] for an entry without `=`.
    pub fn parse_controls(list: &str) -> Result<Vec<ControlBinding>, RemoteError> {
        list.split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let Some((id, action)) = entry.split_once('=') else {
                    return Err(RemoteError::Config(format!(
                        "control entry {entry:?} is not id=action"
                    )));
                };
                ControlBinding::parse(id, action)
            })
            .collect()
    }

    /// Parses a `name,name` sensor list.
    #[must_use]
    pub fn parse_sensors(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for Layout {
    fn default() -> Self {
        let controls = Self::DEFAULT_CONTROLS
            .iter()
            .filter_map(|(id, action)| ControlBinding::parse(id, action).ok())
            .collect();
        Self {
            controls,
            speed_slot: "srychlost".to_string(),
            sensor_slots: Self::parse_sensors("distance,obs_lf,obs_rg"),
        }
    }
}

/// Top-level remote configuration.
///
/// Loaded once at startup via [`RemoteConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Active transport binding.
    pub transport: TransportKind,

    /// Controller base URL for the stateless binding.
    pub base_url: String,

    /// Timeout for a single stateless request.
    pub request_timeout: Duration,

    /// Persistent channel settings.
    pub channel: ChannelConfig,

    /// Window in which repeated identical intents collapse (zero disables).
    pub debounce_window: Duration,

    /// Capacity of each transport's event bus.
    pub event_bus_capacity: usize,

    /// Emit JSON log lines instead of human-readable ones.
    pub log_json: bool,

    /// Controls and slots.
    pub layout: Layout,
}

impl RemoteConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Config`] or [`RemoteError::UnknownAction`] if a
    /// variable is set to an unusable value.
    pub fn from_env() -> Result<Self, RemoteError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`RemoteConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RemoteError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let transport = lookup("MALINA_TRANSPORT")
            .map_or(Ok(TransportKind::Push), |v| v.parse())?;

        let base_url = lookup("MALINA_BASE_URL")
            .unwrap_or_else(|| "http://127.0.0.1:5000".to_string())
            .trim_end_matches('/')
            .to_string();
        let channel_path =
            lookup("MALINA_CHANNEL_PATH").unwrap_or_else(|| "/ws".to_string());

        let channel = ChannelConfig {
            url: channel_url(&base_url, &channel_path)?,
            namespace: lookup("MALINA_NAMESPACE").unwrap_or_else(|| "/malina".to_string()),
            steering_event: lookup("MALINA_STEERING_EVENT")
                .unwrap_or_else(|| "steering".to_string()),
            speed_event: lookup("MALINA_SPEED_EVENT").unwrap_or_else(|| "rychlost".to_string()),
            handshake_timeout: parse_millis(&lookup, "MALINA_HANDSHAKE_TIMEOUT_MS", 3_000),
            reconnect_delay: parse_millis(&lookup, "MALINA_RECONNECT_DELAY_MS", 1_000),
        };

        let mut layout = Layout::default();
        if let Some(controls) = lookup("MALINA_CONTROLS") {
            layout.controls = Layout::parse_controls(&controls)?;
        }
        if let Some(sensors) = lookup("MALINA_SENSORS") {
            layout.sensor_slots = Layout::parse_sensors(&sensors);
        }

        Ok(Self {
            transport,
            base_url,
            request_timeout: parse_millis(&lookup, "MALINA_REQUEST_TIMEOUT_MS", 2_000),
            channel,
            debounce_window: parse_millis(&lookup, "MALINA_DEBOUNCE_MS", 150),
            event_bus_capacity: parse_var(&lookup, "MALINA_EVENT_BUS_CAPACITY", 256),
            log_json: lookup("MALINA_LOG_FORMAT")
                .is_some_and(|v| v.eq_ignore_ascii_case("json")),
            layout,
        })
    }
}

/// Derives the WebSocket URL from the HTTP base URL.
fn channel_url(base_url: &str, path: &str) -> Result<String, RemoteError> {
    let ws_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        return Err(RemoteError::Config(format!(
            "base url must start with http:// or https://: {base_url}"
        )));
    };
    let path = path.trim();
    if path.starts_with('/') {
        Ok(format!("{ws_base}{path}"))
    } else {
        Ok(format!("{ws_base}/{path}"))
    }
}

/// Parses a variable as `T`, returning `default` on missing or invalid values.
fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_millis<F>(lookup: &F, key: &str, default_ms: u64) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    Duration::from_millis(parse_var(lookup, key, default_ms))
}

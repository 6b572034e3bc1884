use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Engine lifecycle state.
///
/// STOPPED is both the initial and the terminal-per-session state. The
/// engine never leaves ERROR on its own; a manual `stop()` acknowledges the
/// error, after which `start()` is legal again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BotState {
    Stopped,
    Running,
    Paused,
    Error,
}

impl BotState {
    /// Whether a normal (non-emergency) transition to `next` is legal.
    pub fn can_transition_to(self, next: BotState) -> bool {
        use BotState::*;
        matches!(
            (self, next),
            (Stopped, Running)
                | (Running, Paused)
                | (Running, Stopped)
                | (Running, Error)
                | (Paused, Running)
                | (Paused, Stopped)
                | (Error, Stopped)
        )
    }
}

impl fmt::Display for BotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotState::Stopped => write!(f, "STOPPED"),
            BotState::Running => write!(f, "RUNNING"),
            BotState::Paused => write!(f, "PAUSED"),
            BotState::Error => write!(f, "ERROR"),
        }
    }
}

/// Wholesale status snapshot owned by the engine. Readers always receive a
/// clone; nothing outside the engine mutates it.
#[derive(Debug, Clone, Serialize)]
pub struct BotStatus {
    pub state: BotState,
    pub monitoring: bool,
    pub uptime_secs: i64,
    pub last_scan: Option<DateTime<Utc>>,
    pub next_scan: Option<DateTime<Utc>>,
    pub trades_today: u32,
    pub amount_traded_today: f64,
    pub pending_trades: usize,
    pub error_message: Option<String>,
}

impl BotStatus {
    pub fn stopped() -> Self {
        Self {
            state: BotState::Stopped,
            monitoring: false,
            uptime_secs: 0,
            last_scan: None,
            next_scan: None,
            trades_today: 0,
            amount_traded_today: 0.0,
            pending_trades: 0,
            error_message: None,
        }
    }
}

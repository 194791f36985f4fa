use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every state change of a timer session produces an Event.
/// Front ends render from snapshots; history and logging consume events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        session_id: Uuid,
        total_duration_secs: u64,
        phase_name: Option<String>,
        at: DateTime<Utc>,
    },
    Ticked {
        elapsed_secs: u64,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    PhaseAdvanced {
        phase_index: usize,
        phase_name: String,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// Explicit stop. `elapsed_secs` is the progress discarded by the reset.
    SessionStopped {
        session_id: Uuid,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        session_id: Uuid,
        total_duration_secs: u64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::SessionStarted { at, .. }
            | Event::Ticked { at, .. }
            | Event::PhaseAdvanced { at, .. }
            | Event::SessionPaused { at, .. }
            | Event::SessionResumed { at, .. }
            | Event::SessionStopped { at, .. }
            | Event::SessionCompleted { at, .. } => *at,
        }
    }

    /// True for events that end a run (stop or completion).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::SessionStopped { .. } | Event::SessionCompleted { .. }
        )
    }
}

//! Timer session state machine.
//!
//! A session is driven entirely by its caller: it owns no threads and no
//! clock. One call to `tick()` is one second of elapsed time; one call to
//! `advance_phase()` is one phase boundary. [`super::TimerDriver`] arms the
//! real cadences, [`super::SimulatedClock`] replays them deterministically.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!            |
//!            v
//!        Completed
//!
//! any --stop--> Idle        any --start--> Running (fresh run)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};
use uuid::Uuid;

use super::phase::{Phase, SessionConfig};
use crate::error::TimerError;
use crate::events::Event;
use crate::format;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Completed,
}

/// Read model handed to the render layer on every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: TimerStatus,
    pub total_duration_secs: u64,
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
    pub progress_ratio: f64,
    pub current_phase_index: usize,
    pub current_phase_name: Option<String>,
}

/// One countdown with an optional repeating phase cycle.
#[derive(Debug, Clone, Default)]
pub struct TimerSession {
    /// Retained across `stop()` so the same protocol can be restarted.
    config: Option<SessionConfig>,
    status: TimerStatus,
    elapsed_secs: u64,
    phase_index: usize,
    session_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
}

impl TimerSession {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    /// 0 until a configuration has been accepted.
    pub fn total_duration_secs(&self) -> u64 {
        self.config
            .as_ref()
            .map(SessionConfig::total_duration_secs)
            .unwrap_or(0)
    }

    pub fn remaining_secs(&self) -> u64 {
        self.total_duration_secs().saturating_sub(self.elapsed_secs)
    }

    /// 0.0 ..= 1.0
    pub fn progress_ratio(&self) -> f64 {
        format::ratio(self.elapsed_secs, self.total_duration_secs())
    }

    pub fn current_phase_index(&self) -> usize {
        self.phase_index
    }

    pub fn current_phase(&self) -> Option<&Phase> {
        self.config
            .as_ref()
            .and_then(SessionConfig::phase_cycle)
            .and_then(|cycle| cycle.get(self.phase_index))
    }

    pub fn current_phase_name(&self) -> Option<&str> {
        self.current_phase().map(|p| p.name.as_str())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            total_duration_secs: self.total_duration_secs(),
            elapsed_secs: self.elapsed_secs,
            remaining_secs: self.remaining_secs(),
            progress_ratio: self.progress_ratio(),
            current_phase_index: self.phase_index,
            current_phase_name: self.current_phase_name().map(str::to_owned),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Validate the configuration and begin a fresh run.
    ///
    /// Calling this while a run is in progress silently replaces it.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidConfiguration`] and leaves the session
    /// untouched when the duration is zero or the phase list is invalid.
    pub fn start(
        &mut self,
        total_duration_secs: u64,
        phases: Option<Vec<Phase>>,
    ) -> Result<Event, TimerError> {
        let config = SessionConfig::new(total_duration_secs, phases)?;
        Ok(self.start_with(config))
    }

    pub fn start_with(&mut self, config: SessionConfig) -> Event {
        if matches!(self.status, TimerStatus::Running | TimerStatus::Paused) {
            debug!(
                elapsed_secs = self.elapsed_secs,
                "start while a run is active; replacing it"
            );
        }
        let id = Uuid::new_v4();
        let total = config.total_duration_secs();
        self.config = Some(config);
        self.status = TimerStatus::Running;
        self.elapsed_secs = 0;
        self.phase_index = 0;
        self.session_id = Some(id);
        self.started_at = Some(Utc::now());
        info!(session_id = %id, total_duration_secs = total, "timer session started");
        Event::SessionStarted {
            session_id: id,
            total_duration_secs: total,
            phase_name: self.current_phase_name().map(str::to_owned),
            at: Utc::now(),
        }
    }

    /// Start again with the retained configuration.
    pub fn restart(&mut self) -> Option<Event> {
        let config = self.config.clone()?;
        Some(self.start_with(config))
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.status != TimerStatus::Running {
            return None;
        }
        self.status = TimerStatus::Paused;
        debug!(elapsed_secs = self.elapsed_secs, "timer paused");
        Some(Event::SessionPaused {
            elapsed_secs: self.elapsed_secs,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        if self.status != TimerStatus::Paused {
            return None;
        }
        self.status = TimerStatus::Running;
        debug!(elapsed_secs = self.elapsed_secs, "timer resumed");
        Some(Event::SessionResumed {
            elapsed_secs: self.elapsed_secs,
            at: Utc::now(),
        })
    }

    /// Return to Idle from any state. The configuration is kept.
    ///
    /// Returns `None` when there was no run to stop.
    pub fn stop(&mut self) -> Option<Event> {
        let discarded = self.elapsed_secs;
        let id = self.session_id.take();
        let had_run = self.status != TimerStatus::Idle;
        self.status = TimerStatus::Idle;
        self.elapsed_secs = 0;
        self.phase_index = 0;
        self.started_at = None;
        if !had_run {
            return None;
        }
        debug!(elapsed_secs = discarded, "timer stopped");
        Some(Event::SessionStopped {
            session_id: id.unwrap_or_else(Uuid::nil),
            elapsed_secs: discarded,
            at: Utc::now(),
        })
    }

    /// One second of elapsed time. Only applies while Running.
    ///
    /// Returns `SessionCompleted` on the tick that reaches the target; the
    /// session never overshoots.
    pub fn tick(&mut self) -> Option<Event> {
        if self.status != TimerStatus::Running {
            return None;
        }
        let total = self.total_duration_secs();
        self.elapsed_secs = (self.elapsed_secs + 1).min(total);
        trace!(elapsed_secs = self.elapsed_secs, "tick");
        if self.elapsed_secs == total {
            self.status = TimerStatus::Completed;
            info!(total_duration_secs = total, "timer session completed");
            return Some(Event::SessionCompleted {
                session_id: self.session_id.unwrap_or_else(Uuid::nil),
                total_duration_secs: total,
                at: Utc::now(),
            });
        }
        Some(Event::Ticked {
            elapsed_secs: self.elapsed_secs,
            remaining_secs: self.remaining_secs(),
            at: Utc::now(),
        })
    }

    /// Move to the next phase, wrapping forever. Only applies while Running
    /// with a phase cycle; completion of the countdown does not depend on it.
    pub fn advance_phase(&mut self) -> Option<Event> {
        if self.status != TimerStatus::Running {
            return None;
        }
        let cycle = self.config.as_ref()?.phase_cycle()?;
        self.phase_index = cycle.next_index(self.phase_index);
        let phase = cycle.get(self.phase_index)?;
        trace!(phase = %phase.name, "phase advanced");
        Some(Event::PhaseAdvanced {
            phase_index: self.phase_index,
            phase_name: phase.name.clone(),
            duration_secs: phase.duration_secs,
            at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breathing() -> Vec<Phase> {
        vec![
            Phase::new("INHALE", 4),
            Phase::new("HOLD", 4),
            Phase::new("EXHALE", 4),
        ]
    }

    #[test]
    fn start_pause_resume() {
        let mut session = TimerSession::new();
        assert_eq!(session.status(), TimerStatus::Idle);

        assert!(session.start(60, None).is_ok());
        assert_eq!(session.status(), TimerStatus::Running);

        assert!(session.pause().is_some());
        assert_eq!(session.status(), TimerStatus::Paused);

        assert!(session.resume().is_some());
        assert_eq!(session.status(), TimerStatus::Running);
    }

    #[test]
    fn five_second_timer_completes_after_five_ticks() {
        let mut session = TimerSession::new();
        session.start(5, None).unwrap();
        for _ in 0..4 {
            assert!(matches!(session.tick(), Some(Event::Ticked { .. })));
        }
        assert!(matches!(session.tick(), Some(Event::SessionCompleted { .. })));
        assert_eq!(session.status(), TimerStatus::Completed);
        assert_eq!(session.remaining_secs(), 0);
        assert_eq!(session.elapsed_secs(), 5);

        // Completion is idempotent.
        assert!(session.tick().is_none());
        assert_eq!(session.elapsed_secs(), 5);
    }

    #[test]
    fn zero_duration_creates_no_session() {
        let mut session = TimerSession::new();
        let err = session.start(0, None).unwrap_err();
        assert!(matches!(err, TimerError::InvalidConfiguration { .. }));
        assert_eq!(session.status(), TimerStatus::Idle);
        assert!(session.config().is_none());
        assert!(session.session_id().is_none());
    }

    #[test]
    fn invalid_start_leaves_running_session_untouched() {
        let mut session = TimerSession::new();
        session.start(60, None).unwrap();
        session.tick();
        assert!(session.start(30, Some(vec![])).is_err());
        assert_eq!(session.status(), TimerStatus::Running);
        assert_eq!(session.elapsed_secs(), 1);
        assert_eq!(session.total_duration_secs(), 60);
    }

    #[test]
    fn paused_ticks_are_dropped() {
        let mut session = TimerSession::new();
        session.start(60, None).unwrap();
        for _ in 0..10 {
            session.tick();
        }
        session.pause();
        for _ in 0..5 {
            assert!(session.tick().is_none());
        }
        session.resume();
        for _ in 0..10 {
            session.tick();
        }
        assert_eq!(session.elapsed_secs(), 20);
    }

    #[test]
    fn pause_then_stop_resets() {
        let mut session = TimerSession::new();
        session.start(60, Some(breathing())).unwrap();
        for _ in 0..30 {
            session.tick();
        }
        session.advance_phase();
        session.pause();
        assert!(matches!(
            session.stop(),
            Some(Event::SessionStopped { elapsed_secs: 30, .. })
        ));
        assert_eq!(session.status(), TimerStatus::Idle);
        assert_eq!(session.elapsed_secs(), 0);
        assert_eq!(session.current_phase_index(), 0);
        // Protocol retained.
        assert_eq!(session.total_duration_secs(), 60);
        assert!(session.restart().is_some());
        assert_eq!(session.status(), TimerStatus::Running);
    }

    #[test]
    fn stop_when_idle_is_noop() {
        let mut session = TimerSession::new();
        assert!(session.stop().is_none());
        assert!(session.restart().is_none());
    }

    #[test]
    fn pause_and_resume_out_of_order_are_noops() {
        let mut session = TimerSession::new();
        assert!(session.pause().is_none());
        assert!(session.resume().is_none());
        session.start(10, None).unwrap();
        assert!(session.resume().is_none());
        session.pause();
        assert!(session.pause().is_none());
    }

    #[test]
    fn phase_cycle_wraps_and_freezes_when_paused() {
        let mut session = TimerSession::new();
        session.start(3600, Some(breathing())).unwrap();
        assert_eq!(session.current_phase_name(), Some("INHALE"));
        session.advance_phase();
        assert_eq!(session.current_phase_name(), Some("HOLD"));
        session.pause();
        assert!(session.advance_phase().is_none());
        assert_eq!(session.current_phase_name(), Some("HOLD"));
        session.resume();
        session.advance_phase();
        session.advance_phase();
        assert_eq!(session.current_phase_index(), 0);
    }

    #[test]
    fn advance_phase_without_cycle_is_noop() {
        let mut session = TimerSession::new();
        session.start(10, None).unwrap();
        assert!(session.advance_phase().is_none());
        assert_eq!(session.current_phase_name(), None);
    }

    #[test]
    fn start_while_running_restarts_from_zero() {
        let mut session = TimerSession::new();
        session.start(60, None).unwrap();
        let first = session.session_id();
        for _ in 0..7 {
            session.tick();
        }
        session.start(30, None).unwrap();
        assert_eq!(session.elapsed_secs(), 0);
        assert_eq!(session.total_duration_secs(), 30);
        assert_ne!(session.session_id(), first);
    }

    #[test]
    fn snapshot_reports_derived_values() {
        let mut session = TimerSession::new();
        session.start(8, Some(breathing())).unwrap();
        session.tick();
        session.tick();
        let snap = session.snapshot();
        assert_eq!(snap.status, TimerStatus::Running);
        assert_eq!(snap.elapsed_secs, 2);
        assert_eq!(snap.remaining_secs, 6);
        assert!((snap.progress_ratio - 0.25).abs() < f64::EPSILON);
        assert_eq!(snap.current_phase_name.as_deref(), Some("INHALE"));
    }

    #[test]
    fn idle_snapshot_has_zero_progress() {
        let snap = TimerSession::new().snapshot();
        assert_eq!(snap.status, TimerStatus::Idle);
        assert_eq!(snap.progress_ratio, 0.0);
        assert_eq!(snap.current_phase_name, None);
    }
}

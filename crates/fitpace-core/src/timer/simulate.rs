//! Deterministic whole-second replay of the driver's two cadences.
//!
//! Useful wherever a real clock is unwanted: previews, the CLI `simulate`
//! command, and tests. Within one simulated second the elapsed tick is
//! applied first, then the phase boundary if the session is still running.

use super::phase::SessionConfig;
use super::session::TimerSession;
use crate::events::Event;

#[derive(Debug, Clone, Default)]
pub struct SimulatedClock {
    session: TimerSession,
    /// Seconds until the next phase boundary; frozen while paused.
    phase_remaining_secs: Option<u64>,
    wall_secs: u64,
}

impl SimulatedClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &TimerSession {
        &self.session
    }

    /// Simulated seconds that have passed, paused time included.
    pub fn wall_secs(&self) -> u64 {
        self.wall_secs
    }

    pub fn phase_remaining_secs(&self) -> Option<u64> {
        self.phase_remaining_secs
    }

    pub fn start(&mut self, config: SessionConfig) -> Event {
        let event = self.session.start_with(config);
        self.arm_phase();
        event
    }

    pub fn restart(&mut self) -> Option<Event> {
        let event = self.session.restart()?;
        self.arm_phase();
        Some(event)
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.session.pause()
    }

    pub fn resume(&mut self) -> Option<Event> {
        self.session.resume()
    }

    pub fn stop(&mut self) -> Option<Event> {
        self.phase_remaining_secs = None;
        self.session.stop()
    }

    /// Let `secs` seconds pass, returning every event produced in order.
    pub fn advance_secs(&mut self, secs: u64) -> Vec<Event> {
        let mut events = Vec::new();
        for _ in 0..secs {
            self.wall_secs += 1;
            if !self.session.is_running() {
                continue;
            }
            events.extend(self.session.tick());
            if !self.session.is_running() {
                self.phase_remaining_secs = None;
                continue;
            }
            if let Some(remaining) = self.phase_remaining_secs.as_mut() {
                *remaining -= 1;
                if *remaining == 0 {
                    events.extend(self.session.advance_phase());
                    self.phase_remaining_secs =
                        self.session.current_phase().map(|p| p.duration_secs);
                }
            }
        }
        events
    }

    fn arm_phase(&mut self) {
        self.phase_remaining_secs = self.session.current_phase().map(|p| p.duration_secs);
    }
}

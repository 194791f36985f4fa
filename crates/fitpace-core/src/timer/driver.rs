//! Real-time driver for a [`TimerSession`].
//!
//! Two independently scheduled Tokio tasks feed the session: a fixed
//! one-tick-per-period elapsed task and, when the session has a phase cycle,
//! a phase task that sleeps until each phase's own boundary. Both handles
//! live next to the session behind one lock and are torn down together on
//! every transition away from Running.
//!
//! Every firing re-checks the run generation under that lock before touching
//! the session, so a tick that races a teardown is dropped whole.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant};
use tracing::debug;
use uuid::Uuid;

use super::phase::{Phase, SessionConfig};
use super::session::{SessionSnapshot, TimerSession, TimerStatus};
use crate::error::TimerError;
use crate::events::Event;

/// Wall-clock length of one tick.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Default)]
struct TickTasks {
    elapsed: Option<JoinHandle<()>>,
    phase: Option<JoinHandle<()>>,
}

impl TickTasks {
    fn abort_all(&mut self) {
        if let Some(handle) = self.elapsed.take() {
            handle.abort();
        }
        if let Some(handle) = self.phase.take() {
            handle.abort();
        }
    }
}

struct Inner {
    session: TimerSession,
    /// Bumped by every teardown; tasks carry the value they were armed with.
    generation: u64,
    tasks: TickTasks,
    /// Next phase boundary while the phase task is armed.
    phase_deadline: Option<Instant>,
    /// Time left to the next phase boundary, captured at pause.
    phase_pending: Option<Duration>,
}

impl Inner {
    fn teardown(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.tasks.abort_all();
        self.phase_deadline = None;
    }
}

struct Shared {
    inner: Mutex<Inner>,
    events: broadcast::Sender<Event>,
    tick_interval: Duration,
    runtime: Handle,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: Event) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn phase_duration(&self, phase: &Phase) -> Duration {
        let secs = u32::try_from(phase.duration_secs).unwrap_or(u32::MAX);
        self.tick_interval.saturating_mul(secs)
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.lock().teardown();
    }
}

/// Owns a session and the two repeating tasks that advance it.
///
/// Cheap to clone; all clones control the same session. Dropping the last
/// clone cancels both tasks.
#[derive(Clone)]
pub struct TimerDriver {
    shared: Arc<Shared>,
}

impl TimerDriver {
    /// Create an idle driver bound to the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn new() -> Self {
        Self::with_tick_interval(TICK_INTERVAL)
    }

    /// Like [`TimerDriver::new`] with a custom wall-clock length per tick.
    /// Phase boundaries scale with it.
    pub fn with_tick_interval(tick_interval: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    session: TimerSession::new(),
                    generation: 0,
                    tasks: TickTasks::default(),
                    phase_deadline: None,
                    phase_pending: None,
                }),
                events,
                tick_interval: tick_interval.max(Duration::from_millis(1)),
                runtime: Handle::current(),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.events.subscribe()
    }

    pub fn tick_interval(&self) -> Duration {
        self.shared.tick_interval
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.lock().session.snapshot()
    }

    pub fn status(&self) -> TimerStatus {
        self.shared.lock().session.status()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.shared.lock().session.session_id()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.shared.lock().session.started_at()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Validate, then replace any current run with a fresh one.
    ///
    /// # Errors
    ///
    /// Returns [`TimerError::InvalidConfiguration`] before any task is armed.
    pub fn start(
        &self,
        total_duration_secs: u64,
        phases: Option<Vec<Phase>>,
    ) -> Result<Event, TimerError> {
        let config = SessionConfig::new(total_duration_secs, phases)?;
        Ok(self.start_with(config))
    }

    pub fn start_with(&self, config: SessionConfig) -> Event {
        let mut inner = self.shared.lock();
        inner.teardown();
        let event = inner.session.start_with(config);
        self.begin_run(&mut inner, event)
    }

    /// Start again with the retained configuration.
    pub fn restart(&self) -> Option<Event> {
        let mut inner = self.shared.lock();
        inner.teardown();
        let event = inner.session.restart()?;
        Some(self.begin_run(&mut inner, event))
    }

    pub fn pause(&self) -> Option<Event> {
        let mut inner = self.shared.lock();
        let event = inner.session.pause()?;
        let now = Instant::now();
        inner.phase_pending = inner
            .phase_deadline
            .map(|deadline| deadline.saturating_duration_since(now));
        inner.teardown();
        debug!(phase_pending = ?inner.phase_pending, "tick tasks cancelled for pause");
        self.shared.publish(event.clone());
        Some(event)
    }

    pub fn resume(&self) -> Option<Event> {
        let mut inner = self.shared.lock();
        let event = inner.session.resume()?;
        self.arm(&mut inner);
        self.shared.publish(event.clone());
        Some(event)
    }

    pub fn stop(&self) -> Option<Event> {
        let mut inner = self.shared.lock();
        inner.teardown();
        inner.phase_pending = None;
        let event = inner.session.stop()?;
        self.shared.publish(event.clone());
        Some(event)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin_run(&self, inner: &mut Inner, event: Event) -> Event {
        inner.phase_pending = inner
            .session
            .current_phase()
            .map(|phase| self.shared.phase_duration(phase));
        self.arm(inner);
        self.shared.publish(event.clone());
        event
    }

    /// Spawn both tasks for the current generation. Caller holds the lock
    /// and has already torn down the previous pair.
    fn arm(&self, inner: &mut Inner) {
        let generation = inner.generation;
        let weak = Arc::downgrade(&self.shared);
        let period = self.shared.tick_interval;
        let now = Instant::now();
        inner.tasks.elapsed = Some(
            self.shared
                .runtime
                .spawn(run_elapsed(weak.clone(), generation, now + period, period)),
        );
        if let Some(delay) = inner.phase_pending.take() {
            let deadline = now + delay;
            inner.phase_deadline = Some(deadline);
            inner.tasks.phase = Some(
                self.shared
                    .runtime
                    .spawn(run_phases(weak, generation, deadline)),
            );
        }
        debug!(generation, "tick tasks armed");
    }
}

async fn run_elapsed(shared: Weak<Shared>, generation: u64, first_tick: Instant, period: Duration) {
    let mut ticker = interval_at(first_tick, period);
    loop {
        ticker.tick().await;
        let Some(shared) = shared.upgrade() else {
            return;
        };
        let mut inner = shared.lock();
        if inner.generation != generation {
            return;
        }
        let Some(event) = inner.session.tick() else {
            return;
        };
        let completed = matches!(event, Event::SessionCompleted { .. });
        if completed {
            inner.teardown();
            inner.phase_pending = None;
        }
        shared.publish(event);
        if completed {
            return;
        }
    }
}

async fn run_phases(shared: Weak<Shared>, generation: u64, first_deadline: Instant) {
    let mut deadline = first_deadline;
    loop {
        sleep_until(deadline).await;
        let Some(shared) = shared.upgrade() else {
            return;
        };
        let mut inner = shared.lock();
        if inner.generation != generation {
            return;
        }
        let Some(event) = inner.session.advance_phase() else {
            return;
        };
        let Some(next) = inner
            .session
            .current_phase()
            .map(|phase| shared.phase_duration(phase))
        else {
            return;
        };
        // Schedule from the previous boundary, not from now.
        deadline += next;
        inner.phase_deadline = Some(deadline);
        shared.publish(event);
    }
}

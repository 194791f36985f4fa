//! # FitPace Core Library
//!
//! Core logic for the FitPace interval timer: fasting windows, timed
//! meditation and guided breathing all run on the same engine. The `fitpace`
//! CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A pure state machine ([`TimerSession`]) advanced one
//!   second at a time, plus a [`TimerDriver`] that owns the two repeating
//!   tokio timers (elapsed ticks and phase boundaries) and tears both down
//!   together on pause, stop, completion and restart
//! - **Protocols**: Fasting presets and breathing patterns mapped onto
//!   session configurations
//! - **Storage**: SQLite session history and key-value cache, TOML configuration
//! - **Search**: Token filtering and a persisted recent-searches list
//!
//! ## Key Components
//!
//! - [`TimerDriver`]: Live timer backed by the tokio clock
//! - [`SimulatedClock`]: Deterministic whole-second clock for tests and previews
//! - [`Database`]: Session history persistence
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod format;
pub mod protocol;
pub mod search;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, TimerError};
pub use events::Event;
pub use protocol::{BreathingPattern, CatalogEntry, FastingProtocol, Protocol, ProtocolKind};
pub use search::{RecentSearches, Searchable};
pub use storage::{Config, Database, NewSession, SessionOutcome, SessionRecord, SessionStats};
pub use timer::{
    Phase, PhaseCycle, SessionConfig, SessionSnapshot, SimulatedClock, TimerDriver, TimerSession,
    TimerStatus, TICK_INTERVAL,
};

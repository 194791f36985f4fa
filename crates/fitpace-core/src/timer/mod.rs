mod driver;
mod phase;
mod session;
mod simulate;

pub use driver::{TimerDriver, TICK_INTERVAL};
pub use phase::{Phase, PhaseCycle, SessionConfig};
pub use session::{SessionSnapshot, TimerSession, TimerStatus};
pub use simulate::SimulatedClock;

//! Login lockout tracking.

mod clock;
mod registry;
mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use registry::LoginAttemptRegistry;
pub use tracker::{AttemptReservation, LoginAttemptTracker};

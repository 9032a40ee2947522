//! Login handling built on the lockout tracker.

mod login_gate;

pub use login_gate::LoginGate;

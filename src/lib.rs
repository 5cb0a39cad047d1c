pub mod identity;
pub mod gate;
pub mod context;
pub mod config;
pub mod error;

pub use context::{AuthContext, LogoutOutcome};
pub use gate::{GateDecision, RouteRequirement, RouteTable};
pub use identity::{Identity, Role, SessionStatus};

// Debug-build tracing helper for low-level transition dumps.
// Usage: tprintln!("session.dispatch gen={}", gen);
#[cfg(any(test, debug_assertions))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ( if std::env::var_os("COURSEGATE_TRACE").is_some() { eprintln!($($arg)*) } );
}

// In release builds tprintln! keeps format checking but produces no output.
#[cfg(not(any(test, debug_assertions)))]
#[macro_export]
macro_rules! tprintln {
    ($($arg:tt)*) => ({
        if false { let _ = format!($($arg)*); }
    });
}

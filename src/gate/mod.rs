//! Route gating: static route requirements, the pure per-navigation decision,
//! the navigation state machine, and redirect targets.

mod requirement;
mod decision;
mod navigation;
mod redirect;

pub use requirement::{RouteRequirement, RouteTable, normalize_path};
pub use decision::{decide, GateDecision, LoadingPolicy};
pub use navigation::{GateState, NavigationGate};
pub use redirect::RedirectTargets;

//! Who is signed in: the role model, the restored identity, the shared session
//! store, the profile API seam and the bootstrapper that fills the store.

mod principal;
mod role;
mod session;
mod provider;
mod bootstrap;

pub use principal::Identity;
pub use role::{Role, AllowedRoles};
pub use session::{SessionState, SessionStatus, SessionStore};
pub(crate) use session::{Applied, SessionAction};
pub use provider::{ProfileApi, HttpProfileApi, parse_profile};
pub use bootstrap::{SessionBootstrapper, DEFAULT_PROFILE_TIMEOUT};

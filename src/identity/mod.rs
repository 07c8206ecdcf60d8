//! Identity of the signed-in user, the session store holding it, and the profile
//! source that supplies the user's grants.

mod principal;
mod session;
mod provider;

pub use principal::{Division, Identity, Role, RoleCategory};
pub use session::{Session, SessionStore, SessionToken};
pub use provider::{parse_profile, FetchError, HttpProfileClient, Profile, ProfileSource};

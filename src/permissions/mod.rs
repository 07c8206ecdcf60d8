//! Permission resolution: the closed resource/action catalog, the static fallback
//! tables, the per-session grant state and the resolver that combines them.

mod catalog;
pub mod fallback;
mod grants;
mod resolver;

pub use catalog::{Action, Grant, Permission, Resource};
pub use grants::{GrantSet, GrantState, GrantStore};
pub use resolver::{Basis, DecisionPolicy, EmptyGrantsPolicy, LoadingPolicy, PermissionResolver};

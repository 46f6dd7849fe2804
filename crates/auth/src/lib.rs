//! Role model and inventory capability checks.
//!
//! Authentication (tokens, sessions) is a collaborator concern; this crate
//! only answers "may this role perform this inventory operation".

pub mod actor;
pub mod roles;

pub use actor::Actor;
pub use roles::Role;

use serde::{Deserialize, Serialize};

use labstock_core::ActorId;

use crate::roles::Role;

/// The resolved identity behind an operation: who, acting as what.
///
/// Construction is decoupled from transport; API layers derive this from
/// their session/claims however they like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: ActorId, role: Role) -> Self {
        Self { id, role }
    }
}

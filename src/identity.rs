//! The signed-in identity as the views see it

use async_trait::async_trait;
use uuid::Uuid;

/// An authenticated user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: Uuid, email: Option<String>) -> Self {
        Self { id, email }
    }
}

/// Returns the current authenticated identity, or nothing
#[async_trait]
pub trait SessionAccessor: Send + Sync {
    async fn current_identity(&self) -> Option<Identity>;
}

/// Fixed session, for tests and for hosts that resolve the user themselves
#[derive(Debug, Clone, Default)]
pub struct StaticSession(Option<Identity>);

impl StaticSession {
    pub fn signed_in(identity: Identity) -> Self {
        Self(Some(identity))
    }

    pub fn signed_out() -> Self {
        Self(None)
    }
}

#[async_trait]
impl SessionAccessor for StaticSession {
    async fn current_identity(&self) -> Option<Identity> {
        self.0.clone()
    }
}

use crate::errors::{AppError, AppResult};
use crate::models::{Identity, Role};

pub trait IdentityProvider: Send + Sync {
    fn current_identity(&self) -> Option<Identity>;
}

pub fn require_identity(provider: &dyn IdentityProvider) -> AppResult<Identity> {
    provider
        .current_identity()
        .ok_or_else(|| AppError::Identity("no active identity, sign in first".to_string()))
}

#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    identity: Option<Identity>,
}

impl StaticIdentityProvider {
    pub fn signed_in(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }
}

pub fn job_seeker(id: &str, email: &str, display_name: &str) -> Identity {
    Identity {
        id: id.to_string(),
        email: email.to_string(),
        display_name: display_name.to_string(),
        role: Role::JobSeeker,
    }
}

pub fn employer(id: &str, email: &str, display_name: &str) -> Identity {
    Identity {
        id: id.to_string(),
        email: email.to_string(),
        display_name: display_name.to_string(),
        role: Role::Employer,
    }
}

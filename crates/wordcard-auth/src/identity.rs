//! Identity Resolver
//!
//! Turns the identity the auth gate attached to a request into the stored
//! user, so handlers can scope data by the owner's numeric id.

use std::sync::Arc;

use wordcard_db::{CredentialStore, DbUser};

use crate::error::{AuthError, AuthResult};
use crate::types::RequestContext;

#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn CredentialStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Load the authenticated user.
    ///
    /// A token can outlive its account, so a lookup miss is `UserNotFound`
    /// rather than an internal error.
    pub async fn resolve_user(&self, ctx: &RequestContext) -> AuthResult<DbUser> {
        let username = ctx.username().ok_or(AuthError::Unauthenticated)?;

        self.store
            .find_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    pub async fn resolve_user_id(&self, ctx: &RequestContext) -> AuthResult<i64> {
        Ok(self.resolve_user(ctx).await?.id)
    }
}

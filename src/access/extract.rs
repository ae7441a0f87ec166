use axum::{extract::FromRequestParts, http::request::Parts};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use super::{Identity, require_manager};
use crate::auth::models::AccessTokenClaims;
use crate::schema::{groups, user_groups, users};
use crate::utils::{AppError, internal_error, types::AppState};

/// Resolves a user id to an [`Identity`] with its current group memberships.
pub async fn load_identity(
    conn: &mut AsyncPgConnection,
    user_id: i32,
) -> Result<Option<Identity>, AppError> {
    let Some((id, username, is_superuser)) = users::table
        .find(user_id)
        .select((users::id, users::username, users::is_superuser))
        .first::<(i32, String, bool)>(conn)
        .await
        .optional()?
    else {
        return Ok(None);
    };

    let groups = user_groups::table
        .inner_join(groups::table)
        .filter(user_groups::user_id.eq(id))
        .select(groups::name)
        .load::<String>(conn)
        .await?;

    Ok(Some(Identity {
        id,
        username,
        is_superuser,
        groups,
    }))
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = AccessTokenClaims::from_request_parts(parts, state).await?;
        let user_id = claims.user_id()?;

        let mut conn = state.pool.get().await.map_err(internal_error)?;
        load_identity(&mut conn, user_id)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("User not found.".to_owned()))
    }
}

/// An [`Identity`] that passed the manager check.
///
/// Parts extractors run before the body is read, so a non-manager is turned
/// away with 403 whatever the payload looks like.
#[derive(Debug, Clone)]
pub struct Manager(pub Identity);

impl FromRequestParts<AppState> for Manager {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;
        require_manager(&identity)?;
        Ok(Manager(identity))
    }
}

use super::models::{
    CurrentUser, LoginPayload, NewUser, RegisterPayload, SafeUser, TokenResponse, User,
};
use super::token::issue_token;
use crate::access::Identity;
use crate::schema::users;
use crate::utils::{AppError, ValidatedJson, internal_error, types::AppState, types::Result};
use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use bcrypt::{DEFAULT_COST, hash, verify};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

const BAD_CREDENTIALS: &str = "Unable to log in with provided credentials.";

pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterPayload>,
) -> Result<(StatusCode, Json<SafeUser>)> {
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    let taken = users::table
        .filter(users::username.eq(&payload.username))
        .select(users::id)
        .first::<i32>(&mut conn)
        .await
        .optional()?
        .is_some();
    if taken {
        return Err(username_taken());
    }

    let password_hash = create_password_hash(payload.password).await?;

    let user_data = NewUser {
        username: payload.username,
        email: payload.email,
        password_hash,
    };

    let res = diesel::insert_into(users::table)
        .values(&user_data)
        .returning(SafeUser::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(AppError::from)
        .map_err(|e| if e.is_unique_violation() { username_taken() } else { e })?;

    tracing::info!(user_id = res.id, "user registered");
    Ok((StatusCode::CREATED, Json(res)))
}

pub async fn login_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginPayload>,
) -> Result<Json<TokenResponse>> {
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    let user = users::table
        .filter(users::username.eq(&payload.username))
        .select(User::as_select())
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(bad_credentials)?;

    if !verify_password(payload.password, user.password_hash).await? {
        tracing::debug!(user_id = user.id, "login rejected");
        return Err(bad_credentials());
    }

    let auth_token = issue_token(user.id, &state.config.jwt_secret, state.config.token_ttl_secs)?;
    Ok(Json(TokenResponse { auth_token }))
}

pub async fn get_current_user(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<CurrentUser>> {
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    let user = users::table
        .find(identity.id)
        .select(SafeUser::as_select())
        .first(&mut conn)
        .await?;

    Ok(Json(CurrentUser {
        user,
        roles: identity.roles(),
    }))
}

async fn create_password_hash(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await
        .map_err(internal_error)?
        .map_err(internal_error)
}

async fn verify_password(password: String, password_hash: String) -> Result<bool> {
    let verified = tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(internal_error)?;

    // A malformed stored hash is treated as a mismatch.
    Ok(verified.unwrap_or(false))
}

fn username_taken() -> AppError {
    AppError::field("username", "A user with that username already exists.")
}

fn bad_credentials() -> AppError {
    AppError::field(crate::utils::error::NON_FIELD_ERRORS, BAD_CREDENTIALS)
}

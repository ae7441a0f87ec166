use super::models::{AddMemberPayload, NewMembership};
use crate::access::{Manager, StaffGroup};
use crate::auth::models::SafeUser;
use crate::schema::{groups, user_groups, users};
use crate::utils::{
    AppError, Path, ValidatedJson, internal_error, types::AppState, types::Result,
};
use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde_json::{Value, json};

pub async fn list_members(
    State(state): State<AppState>,
    _manager: Manager,
    Path(group): Path<String>,
) -> Result<Json<Vec<SafeUser>>> {
    let group = parse_group(&group)?;
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    let res = users::table
        .inner_join(user_groups::table.inner_join(groups::table))
        .filter(groups::name.eq(group.name()))
        .order(users::id.asc())
        .select(SafeUser::as_select())
        .load(&mut conn)
        .await?;

    Ok(Json(res))
}

pub async fn add_member(
    State(state): State<AppState>,
    Manager(identity): Manager,
    Path(group): Path<String>,
    ValidatedJson(payload): ValidatedJson<AddMemberPayload>,
) -> Result<(StatusCode, Json<Value>)> {
    let group = parse_group(&group)?;
    let username = payload
        .username
        .ok_or_else(|| AppError::field("username", "This field is required."))?;

    let mut conn = state.pool.get().await.map_err(internal_error)?;

    let user_id = users::table
        .filter(users::username.eq(&username))
        .select(users::id)
        .first::<i32>(&mut conn)
        .await
        .optional()?
        .ok_or_else(user_not_found)?;
    let group_id = find_group_id(&mut conn, group).await?;

    diesel::insert_into(user_groups::table)
        .values(&NewMembership { user_id, group_id })
        .on_conflict_do_nothing()
        .execute(&mut conn)
        .await?;

    tracing::info!(user_id, group = group.name(), by = identity.id, "group member added");
    Ok((StatusCode::CREATED, Json(json!({ "message": "ok" }))))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Manager(identity): Manager,
    Path((group, user_id)): Path<(String, i32)>,
) -> Result<Json<Value>> {
    let group = parse_group(&group)?;
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    users::table
        .find(user_id)
        .select(users::id)
        .first::<i32>(&mut conn)
        .await
        .optional()?
        .ok_or_else(user_not_found)?;
    let group_id = find_group_id(&mut conn, group).await?;

    diesel::delete(
        user_groups::table
            .filter(user_groups::user_id.eq(user_id))
            .filter(user_groups::group_id.eq(group_id)),
    )
    .execute(&mut conn)
    .await?;

    tracing::info!(user_id, group = group.name(), by = identity.id, "group member removed");
    Ok(Json(json!({ "message": "The user has been removed." })))
}

pub async fn find_group_id(conn: &mut AsyncPgConnection, group: StaffGroup) -> Result<i32> {
    groups::table
        .filter(groups::name.eq(group.name()))
        .select(groups::id)
        .first::<i32>(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::NotFound("Group not found.".to_owned()))
}

pub async fn is_member(
    conn: &mut AsyncPgConnection,
    user_id: i32,
    group: StaffGroup,
) -> Result<bool> {
    let found = user_groups::table
        .inner_join(groups::table)
        .filter(user_groups::user_id.eq(user_id))
        .filter(groups::name.eq(group.name()))
        .select(user_groups::user_id)
        .first::<i32>(conn)
        .await
        .optional()?;
    Ok(found.is_some())
}

fn parse_group(slug: &str) -> Result<StaffGroup> {
    StaffGroup::from_slug(slug).ok_or_else(|| AppError::NotFound("Group not found.".to_owned()))
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found.".to_owned())
}

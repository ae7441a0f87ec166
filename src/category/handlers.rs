use super::models::{Category, NewCategory, UpdateCategory};
use crate::access::{Identity, Manager};
use crate::schema::{categories, menu_items};
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

pub async fn get_categories(
    State(state): State<AppState>,
    _identity: Identity,
) -> Result<Json<Vec<Category>>> {
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    let res = categories::table
        .order(categories::id.asc())
        .select(Category::as_select())
        .load(&mut conn)
        .await?;

    Ok(Json(res))
}

pub async fn get_category_by_id(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<i32>,
) -> Result<Json<Category>> {
    let mut conn = state.pool.get().await.map_err(internal_error)?;
    Ok(Json(find_category(&mut conn, id).await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    _manager: Manager,
    ValidatedJson(payload): ValidatedJson<NewCategory>,
) -> Result<(StatusCode, Json<Category>)> {
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    ensure_slug_free(&mut conn, &payload.slug, None).await?;

    let res = diesel::insert_into(categories::table)
        .values(&payload)
        .returning(Category::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(AppError::from)
        .map_err(slug_conflict)?;

    tracing::info!(category_id = res.id, slug = %res.slug, "category created");
    Ok((StatusCode::CREATED, Json(res)))
}

pub async fn update_category(
    State(state): State<AppState>,
    _manager: Manager,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateCategory>,
) -> Result<Json<Category>> {
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    let current = find_category(&mut conn, id).await?;
    if payload.is_empty() {
        return Ok(Json(current));
    }
    if let Some(slug) = &payload.slug {
        ensure_slug_free(&mut conn, slug, Some(id)).await?;
    }

    let res = diesel::update(categories::table.find(id))
        .set(&payload)
        .returning(Category::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(AppError::from)
        .map_err(slug_conflict)?;

    tracing::info!(category_id = id, "category updated");
    Ok(Json(res))
}

pub async fn delete_category(
    State(state): State<AppState>,
    _manager: Manager,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    find_category(&mut conn, id).await?;

    let in_use: i64 = menu_items::table
        .filter(menu_items::category_id.eq(id))
        .count()
        .get_result(&mut conn)
        .await?;
    if in_use > 0 {
        return Err(category_in_use());
    }

    diesel::delete(categories::table.find(id))
        .execute(&mut conn)
        .await
        .map_err(AppError::from)
        .map_err(|e| if e.is_foreign_key_violation() { category_in_use() } else { e })?;

    tracing::info!(category_id = id, "category deleted");
    Ok(Json(json!({ "detail": "The object has been deleted" })))
}

pub async fn find_category(conn: &mut AsyncPgConnection, id: i32) -> Result<Category> {
    categories::table
        .find(id)
        .select(Category::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::NotFound("Category not found.".to_owned()))
}

async fn ensure_slug_free(
    conn: &mut AsyncPgConnection,
    slug: &str,
    except: Option<i32>,
) -> Result<()> {
    let mut query = categories::table
        .filter(categories::slug.eq(slug))
        .select(categories::id)
        .into_boxed();
    if let Some(id) = except {
        query = query.filter(categories::id.ne(id));
    }

    match query.first::<i32>(conn).await.optional()? {
        Some(_) => Err(slug_taken()),
        None => Ok(()),
    }
}

fn slug_taken() -> AppError {
    AppError::field("slug", "category with this slug already exists.")
}

fn slug_conflict(err: AppError) -> AppError {
    if err.is_unique_violation() { slug_taken() } else { err }
}

fn category_in_use() -> AppError {
    AppError::Conflict("Category is referenced by menu items and cannot be deleted.".to_owned())
}

use super::models::{
    MenuItem, MenuItemFilters, MenuItemSort, MenuItemView, NewMenuItem, UpdateMenuItem,
};
use crate::access::{Identity, Manager};
use crate::category::models::Category;
use crate::schema::{categories, menu_items};
use crate::utils::query::{PageParams, contains_pattern, parse_ordering};
use crate::utils::{
    AppError, Path, Query, ValidatedJson, internal_error, types::AppState, types::Result,
};
use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde_json::{Value, json};

pub async fn get_menu_items(
    State(state): State<AppState>,
    _identity: Identity,
    Query(filters): Query<MenuItemFilters>,
    Query(paging): Query<PageParams>,
) -> Result<Json<Vec<MenuItemView>>> {
    let ordering = parse_ordering::<MenuItemSort>(filters.ordering.as_deref())?;
    let Some(page) = paging.resolve(state.config.page_size) else {
        return Ok(Json(Vec::new()));
    };

    let mut conn = state.pool.get().await.map_err(internal_error)?;

    let mut query = menu_items::table
        .inner_join(categories::table)
        .select((MenuItem::as_select(), Category::as_select()))
        .into_boxed();

    if let Some(category) = filters.category {
        query = query.filter(categories::title.eq(category));
    }
    if let Some(max_price) = filters.to_price {
        query = query.filter(menu_items::price.le(max_price));
    }
    if let Some(search) = filters.search.filter(|s| !s.is_empty()) {
        query = query.filter(menu_items::title.ilike(contains_pattern(&search)));
    }

    for term in ordering {
        query = match (term.field, term.descending) {
            (MenuItemSort::Id, false) => query.then_order_by(menu_items::id.asc()),
            (MenuItemSort::Id, true) => query.then_order_by(menu_items::id.desc()),
            (MenuItemSort::Title, false) => query.then_order_by(menu_items::title.asc()),
            (MenuItemSort::Title, true) => query.then_order_by(menu_items::title.desc()),
            (MenuItemSort::Price, false) => query.then_order_by(menu_items::price.asc()),
            (MenuItemSort::Price, true) => query.then_order_by(menu_items::price.desc()),
            (MenuItemSort::Featured, false) => query.then_order_by(menu_items::featured.asc()),
            (MenuItemSort::Featured, true) => query.then_order_by(menu_items::featured.desc()),
            (MenuItemSort::Category, false) => query.then_order_by(categories::title.asc()),
            (MenuItemSort::Category, true) => query.then_order_by(categories::title.desc()),
        };
    }

    let rows = query
        .then_order_by(menu_items::id.asc())
        .limit(page.limit)
        .offset(page.offset)
        .load::<(MenuItem, Category)>(&mut conn)
        .await?;

    Ok(Json(rows.into_iter().map(MenuItemView::from).collect()))
}

/// Public: no credentials required.
pub async fn get_menu_item_by_id(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MenuItemView>> {
    let mut conn = state.pool.get().await.map_err(internal_error)?;
    Ok(Json(find_menu_item_view(&mut conn, id).await?))
}

pub async fn create_menu_item(
    State(state): State<AppState>,
    _manager: Manager,
    ValidatedJson(payload): ValidatedJson<NewMenuItem>,
) -> Result<(StatusCode, Json<MenuItemView>)> {
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    ensure_category_exists(&mut conn, payload.category_id).await?;
    ensure_title_free(&mut conn, &payload.title, None).await?;

    let item = diesel::insert_into(menu_items::table)
        .values(&payload)
        .returning(MenuItem::as_returning())
        .get_result(&mut conn)
        .await
        .map_err(AppError::from)
        .map_err(title_conflict)?;

    tracing::info!(menu_item_id = item.id, title = %item.title, "menu item created");
    let view = find_menu_item_view(&mut conn, item.id).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// `PUT`: replaces every field.
pub async fn replace_menu_item(
    State(state): State<AppState>,
    _manager: Manager,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<NewMenuItem>,
) -> Result<Json<MenuItemView>> {
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    find_menu_item(&mut conn, id).await?;
    ensure_category_exists(&mut conn, payload.category_id).await?;
    ensure_title_free(&mut conn, &payload.title, Some(id)).await?;

    diesel::update(menu_items::table.find(id))
        .set(&payload)
        .execute(&mut conn)
        .await
        .map_err(AppError::from)
        .map_err(title_conflict)?;

    tracing::info!(menu_item_id = id, "menu item replaced");
    Ok(Json(find_menu_item_view(&mut conn, id).await?))
}

/// `PATCH`: changes only the fields present in the body.
pub async fn update_menu_item(
    State(state): State<AppState>,
    _manager: Manager,
    Path(id): Path<i32>,
    ValidatedJson(payload): ValidatedJson<UpdateMenuItem>,
) -> Result<Json<MenuItemView>> {
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    find_menu_item(&mut conn, id).await?;
    if payload.is_empty() {
        return Ok(Json(find_menu_item_view(&mut conn, id).await?));
    }
    if let Some(category_id) = payload.category_id {
        ensure_category_exists(&mut conn, category_id).await?;
    }
    if let Some(title) = &payload.title {
        ensure_title_free(&mut conn, title, Some(id)).await?;
    }

    diesel::update(menu_items::table.find(id))
        .set(&payload)
        .execute(&mut conn)
        .await
        .map_err(AppError::from)
        .map_err(title_conflict)?;

    tracing::info!(menu_item_id = id, "menu item updated");
    Ok(Json(find_menu_item_view(&mut conn, id).await?))
}

pub async fn delete_menu_item(
    State(state): State<AppState>,
    _manager: Manager,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    let deleted = diesel::delete(menu_items::table.find(id))
        .execute(&mut conn)
        .await
        .map_err(AppError::from)
        .map_err(|e| {
            if e.is_foreign_key_violation() {
                AppError::Conflict(
                    "Menu item appears in existing orders and cannot be deleted.".to_owned(),
                )
            } else {
                e
            }
        })?;

    if deleted == 0 {
        return Err(menu_item_not_found());
    }

    tracing::info!(menu_item_id = id, "menu item deleted");
    Ok(Json(json!({ "detail": "The object has been deleted" })))
}

pub async fn find_menu_item(conn: &mut AsyncPgConnection, id: i32) -> Result<MenuItem> {
    menu_items::table
        .find(id)
        .select(MenuItem::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(menu_item_not_found)
}

async fn find_menu_item_view(conn: &mut AsyncPgConnection, id: i32) -> Result<MenuItemView> {
    menu_items::table
        .inner_join(categories::table)
        .filter(menu_items::id.eq(id))
        .select((MenuItem::as_select(), Category::as_select()))
        .first::<(MenuItem, Category)>(conn)
        .await
        .optional()?
        .map(MenuItemView::from)
        .ok_or_else(menu_item_not_found)
}

async fn ensure_category_exists(conn: &mut AsyncPgConnection, category_id: i32) -> Result<()> {
    let found = categories::table
        .find(category_id)
        .select(categories::id)
        .first::<i32>(conn)
        .await
        .optional()?;

    match found {
        Some(_) => Ok(()),
        None => Err(AppError::field(
            "category_id",
            "Category with the given ID does not exist.",
        )),
    }
}

async fn ensure_title_free(
    conn: &mut AsyncPgConnection,
    title: &str,
    except: Option<i32>,
) -> Result<()> {
    let mut query = menu_items::table
        .filter(menu_items::title.eq(title))
        .select(menu_items::id)
        .into_boxed();
    if let Some(id) = except {
        query = query.filter(menu_items::id.ne(id));
    }

    match query.first::<i32>(conn).await.optional()? {
        Some(_) => Err(title_taken()),
        None => Ok(()),
    }
}

fn title_taken() -> AppError {
    AppError::field("title", "menu item with this title already exists.")
}

fn title_conflict(err: AppError) -> AppError {
    if err.is_unique_violation() { title_taken() } else { err }
}

fn menu_item_not_found() -> AppError {
    AppError::NotFound("Menu item not found.".to_owned())
}

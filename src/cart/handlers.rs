use super::models::{AddToCart, CartLine, CartLineView, NewCartLine};
use crate::access::Identity;
use crate::menu_item::models::MenuItem;
use crate::schema::{cart_lines, menu_items};
use crate::utils::{AppError, ValidatedJson, internal_error, types::AppState, types::Result};
use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::{Value, json};

pub async fn get_cart(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<CartLineView>>> {
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    let rows = cart_lines::table
        .inner_join(menu_items::table)
        .filter(cart_lines::user_id.eq(identity.id))
        .order(cart_lines::id.asc())
        .select((CartLine::as_select(), MenuItem::as_select()))
        .load::<(CartLine, MenuItem)>(&mut conn)
        .await?;

    Ok(Json(rows.into_iter().map(CartLineView::from).collect()))
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    identity: Identity,
    ValidatedJson(payload): ValidatedJson<AddToCart>,
) -> Result<(StatusCode, Json<Value>)> {
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    let item = menu_items::table
        .find(payload.menuitem_id)
        .select(MenuItem::as_select())
        .first(&mut conn)
        .await
        .optional()?
        .ok_or_else(|| AppError::field("menuitem_id", "MenuItem with this id does not exist."))?;

    let line = NewCartLine::snapshot(identity.id, &item, payload.quantity)?;

    diesel::insert_into(cart_lines::table)
        .values(&line)
        .execute(&mut conn)
        .await
        .map_err(AppError::from)
        .map_err(|e| {
            if e.is_unique_violation() {
                AppError::Conflict(
                    "The combination of menu item and user already exists in the cart.".to_owned(),
                )
            } else {
                e
            }
        })?;

    tracing::info!(
        user_id = identity.id,
        menu_item_id = item.id,
        quantity = line.quantity,
        "added to cart"
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "The item has been added" })),
    ))
}

/// Empties the caller's cart; succeeds on an empty cart too.
pub async fn clear_cart(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Value>> {
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    let removed = diesel::delete(cart_lines::table.filter(cart_lines::user_id.eq(identity.id)))
        .execute(&mut conn)
        .await?;

    tracing::info!(user_id = identity.id, removed, "cart cleared");
    Ok(Json(json!({ "message": "All menu items deleted" })))
}

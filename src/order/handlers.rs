use std::collections::HashMap;

use super::models::{Order, OrderFilters, OrderItem, OrderItemView, OrderSort, OrderView};
use super::workflow::{draft_order, parse_patch, plan_patch};
use crate::access::{
    Identity, OrderScope, StaffGroup, can_delete_order, can_view_order, order_patch_grant,
    order_scope,
};
use crate::auth::models::SafeUser;
use crate::cart::models::CartLine;
use crate::group::handlers::is_member;
use crate::schema::{cart_lines, menu_items, order_items, orders, users};
use crate::utils::query::{PageParams, contains_pattern, parse_ordering};
use crate::utils::{AppError, Path, Query, internal_error, types::AppState, types::Result};
use axum::{
    body::Bytes,
    extract::{Json, State},
    http::StatusCode,
};
use diesel::prelude::*;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use scoped_futures::ScopedFutureExt;
use serde_json::{Value, json};

pub async fn list_orders(
    State(state): State<AppState>,
    identity: Identity,
    Query(filters): Query<OrderFilters>,
    Query(paging): Query<PageParams>,
) -> Result<Json<Vec<OrderView>>> {
    let ordering = parse_ordering::<OrderSort>(filters.ordering.as_deref())?;
    let Some(page) = paging.resolve(state.config.page_size) else {
        return Ok(Json(Vec::new()));
    };

    let mut conn = state.pool.get().await.map_err(internal_error)?;

    let mut query = orders::table
        .inner_join(users::table.on(users::id.eq(orders::user_id)))
        .select(Order::as_select())
        .into_boxed();

    query = match order_scope(&identity) {
        OrderScope::All => query,
        OrderScope::AssignedTo(crew_id) => query.filter(orders::delivery_crew_id.eq(crew_id)),
        OrderScope::OwnedBy(owner_id) => query.filter(orders::user_id.eq(owner_id)),
    };

    for term in ordering {
        query = match (term.field, term.descending) {
            (OrderSort::Id, false) => query.then_order_by(orders::id.asc()),
            (OrderSort::Id, true) => query.then_order_by(orders::id.desc()),
            (OrderSort::Date, false) => query.then_order_by(orders::date.asc()),
            (OrderSort::Date, true) => query.then_order_by(orders::date.desc()),
            (OrderSort::Total, false) => query.then_order_by(orders::total.asc()),
            (OrderSort::Total, true) => query.then_order_by(orders::total.desc()),
            (OrderSort::Status, false) => query.then_order_by(orders::status.asc()),
            (OrderSort::Status, true) => query.then_order_by(orders::status.desc()),
        };
    }
    query = query.then_order_by(orders::id.asc());

    if let Some(search) = filters.search.filter(|s| !s.is_empty()) {
        query = query.filter(users::username.ilike(contains_pattern(&search)));
    }

    let rows = query
        .limit(page.limit)
        .offset(page.offset)
        .load::<Order>(&mut conn)
        .await?;

    Ok(Json(load_views(&mut conn, rows).await?))
}

/// Places an order from the caller's cart.
pub async fn create_order(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<(StatusCode, Json<OrderView>)> {
    let mut pooled = state.pool.get().await.map_err(internal_error)?;
    let conn: &mut AsyncPgConnection = &mut pooled;
    let user_id = identity.id;
    let today = chrono::Local::now().date_naive();

    let order = conn
        .transaction::<Order, AppError, _>(|conn| {
            async move {
                // Row locks serialize concurrent placements from the same cart.
                let lines = cart_lines::table
                    .filter(cart_lines::user_id.eq(user_id))
                    .order(cart_lines::id.asc())
                    .select(CartLine::as_select())
                    .for_update()
                    .load::<CartLine>(conn)
                    .await?;

                let draft = draft_order(user_id, &lines, today)?;

                let order = diesel::insert_into(orders::table)
                    .values(&draft.order)
                    .returning(Order::as_returning())
                    .get_result(conn)
                    .await?;

                let rows: Vec<_> = draft
                    .items
                    .into_iter()
                    .map(|item| item.into_row(order.id))
                    .collect();
                diesel::insert_into(order_items::table)
                    .values(&rows)
                    .execute(conn)
                    .await?;

                let consumed =
                    cart_lines::table.filter(cart_lines::id.eq_any(&draft.cart_line_ids));
                diesel::delete(consumed).execute(conn).await?;

                Ok(order)
            }
            .scope_boxed()
        })
        .await
        .inspect_err(|e| tracing::warn!(user_id, error = %e, "order placement failed"))?;

    tracing::info!(order_id = order.id, user_id, total = %order.total, "order placed");
    let view = load_view(conn, order).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_order(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i32>,
) -> Result<Json<OrderView>> {
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    let order = find_order(&mut conn, id).await?;
    can_view_order(&identity, order.user_id)?;

    Ok(Json(load_view(&mut conn, order).await?))
}

/// Assigns delivery crew and/or flips the status.
///
/// The body is read raw so the authorization check runs before any payload
/// validation.
pub async fn patch_order(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i32>,
    body: Bytes,
) -> Result<Json<OrderView>> {
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    let order = find_order(&mut conn, id).await?;
    let grant = order_patch_grant(&identity, order.delivery_crew_id).inspect_err(|denied| {
        tracing::warn!(
            order_id = id,
            user_id = identity.id,
            detail = denied.detail,
            "order patch denied"
        )
    })?;
    let changes = plan_patch(grant, parse_patch(&body)?)?;

    if let Some(Some(crew_id)) = changes.delivery_crew_id {
        ensure_delivery_crew(&mut conn, crew_id).await?;
    }

    let order = diesel::update(orders::table.find(id))
        .set(&changes)
        .returning(Order::as_returning())
        .get_result(&mut conn)
        .await?;

    tracing::info!(
        order_id = id,
        by = identity.id,
        delivery_crew_id = ?order.delivery_crew_id,
        status = order.status,
        "order updated"
    );
    Ok(Json(load_view(&mut conn, order).await?))
}

pub async fn delete_order(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    can_delete_order(&identity)?;
    let mut conn = state.pool.get().await.map_err(internal_error)?;

    let deleted = diesel::delete(orders::table.find(id))
        .execute(&mut conn)
        .await?;
    if deleted == 0 {
        return Err(order_not_found());
    }

    tracing::info!(order_id = id, by = identity.id, "order deleted");
    Ok(Json(json!({ "detail": "The order has been deleted" })))
}

async fn find_order(conn: &mut AsyncPgConnection, id: i32) -> Result<Order> {
    orders::table
        .find(id)
        .select(Order::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(order_not_found)
}

/// A delivery assignee must exist and belong to the Delivery Crew group.
async fn ensure_delivery_crew(conn: &mut AsyncPgConnection, user_id: i32) -> Result<()> {
    let exists = users::table
        .find(user_id)
        .select(users::id)
        .first::<i32>(conn)
        .await
        .optional()?
        .is_some();
    if !exists {
        return Err(AppError::field(
            "delivery_crew_id",
            "Delivery crew with this ID does not exist.",
        ));
    }

    if !is_member(conn, user_id, StaffGroup::DeliveryCrew).await? {
        return Err(AppError::field(
            "delivery_crew_id",
            "User is not a member of the Delivery Crew group.",
        ));
    }
    Ok(())
}

async fn load_view(conn: &mut AsyncPgConnection, order: Order) -> Result<OrderView> {
    load_views(conn, vec![order])
        .await?
        .pop()
        .ok_or_else(order_not_found)
}

/// Attaches items and the assigned delivery crew member to each order.
async fn load_views(conn: &mut AsyncPgConnection, rows: Vec<Order>) -> Result<Vec<OrderView>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<i32> = rows.iter().map(|o| o.id).collect();
    let crew_ids: Vec<i32> = rows.iter().filter_map(|o| o.delivery_crew_id).collect();

    let items = order_items::table
        .inner_join(menu_items::table)
        .filter(order_items::order_id.eq_any(&order_ids))
        .order(order_items::id.asc())
        .select((OrderItem::as_select(), menu_items::title))
        .load::<(OrderItem, String)>(conn)
        .await?;

    let mut items_by_order: HashMap<i32, Vec<OrderItemView>> = HashMap::new();
    for (item, title) in items {
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push(OrderItemView::from((item, title)));
    }

    let crew: HashMap<i32, SafeUser> = if crew_ids.is_empty() {
        HashMap::new()
    } else {
        users::table
            .filter(users::id.eq_any(&crew_ids))
            .select(SafeUser::as_select())
            .load::<SafeUser>(conn)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect()
    };

    Ok(rows
        .into_iter()
        .map(|order| OrderView {
            delivery_crew: order.delivery_crew_id.and_then(|id| crew.get(&id).cloned()),
            order_items: items_by_order.remove(&order.id).unwrap_or_default(),
            id: order.id,
            user_id: order.user_id,
            status: order.status,
            total: order.total,
            date: order.date,
        })
        .collect())
}

fn order_not_found() -> AppError {
    AppError::NotFound("Order not found.".to_owned())
}

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::auth::models::SafeUser;
use crate::schema::{order_items, orders};
use crate::utils::query::SortField;

#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Order {
    pub id: i32,
    pub user_id: i32,
    pub delivery_crew_id: Option<i32>,
    /// `false` while pending, `true` once delivered.
    pub status: bool,
    pub total: BigDecimal,
    pub date: NaiveDate,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub user_id: i32,
    pub status: bool,
    pub total: BigDecimal,
    pub date: NaiveDate,
}

#[derive(Queryable, Selectable, Debug, Clone, PartialEq, Identifiable)]
#[diesel(table_name = order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub menuitem_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub price: BigDecimal,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = order_items)]
pub struct NewOrderItem {
    pub order_id: i32,
    pub menuitem_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub price: BigDecimal,
}

/// Body of `PATCH /orders/{id}`.
///
/// `delivery_crew_id` is absent (`None`), `null` (`Some(None)`, unassign) or
/// a user id.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OrderPatch {
    #[serde(default, deserialize_with = "present")]
    pub delivery_crew_id: Option<Option<i32>>,
    pub status: Option<bool>,
}

/// Keeps an explicit `null` apart from a missing field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(AsChangeset, Debug, Default, PartialEq)]
#[diesel(table_name = orders)]
pub struct OrderChangeset {
    pub delivery_crew_id: Option<Option<i32>>,
    pub status: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct OrderItemView {
    pub menuitem_id: i32,
    pub title: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub price: BigDecimal,
}

impl From<(OrderItem, String)> for OrderItemView {
    fn from((item, title): (OrderItem, String)) -> Self {
        Self {
            menuitem_id: item.menuitem_id,
            title,
            quantity: item.quantity,
            unit_price: item.unit_price,
            price: item.price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: i32,
    pub user_id: i32,
    pub delivery_crew: Option<SafeUser>,
    pub status: bool,
    pub total: BigDecimal,
    pub date: NaiveDate,
    pub order_items: Vec<OrderItemView>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilters {
    /// Substring of the owner's username.
    pub search: Option<String>,
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderSort {
    Id,
    Date,
    Total,
    Status,
}

impl SortField for OrderSort {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "id" => Some(OrderSort::Id),
            "date" => Some(OrderSort::Date),
            "total" => Some(OrderSort::Total),
            "status" => Some(OrderSort::Status),
            _ => None,
        }
    }
}

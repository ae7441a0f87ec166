//! End-to-end tests against a real PostgreSQL database.
//!
//! Set `TEST_DATABASE_URL` to a disposable database to run them; without it
//! every test returns early. Each test migrates, truncates and seeds the
//! database, so they take a shared lock and run one at a time.

use std::sync::LazyLock;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use diesel::prelude::*;
use lemon_api::{
    access::{DELIVERY_CREW_GROUP, MANAGER_GROUP},
    app,
    auth::token::issue_token,
    config::Config,
    establish_connection,
    pool::lazy_pool,
    run_migrations,
    schema::{cart_lines, categories, groups, menu_items, order_items, orders, user_groups, users},
    utils::types::AppState,
};
use serde_json::{Value, json};
use tokio::sync::{Mutex, MutexGuard};
use tower::ServiceExt;

const SECRET: &str = "store-test-secret";

static DB_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

struct Store {
    app: Router,
    conn: PgConnection,
    _guard: MutexGuard<'static, ()>,
}

impl Store {
    async fn open() -> Option<Self> {
        let Ok(db_url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return None;
        };
        let guard = DB_LOCK.lock().await;

        run_migrations(&db_url).unwrap();
        let mut conn = establish_connection(&db_url).unwrap();
        diesel::sql_query(
            "TRUNCATE order_items, orders, cart_lines, menu_items, categories, \
             user_groups, users RESTART IDENTITY CASCADE",
        )
        .execute(&mut conn)
        .unwrap();

        let config = Config {
            database_url: db_url.clone(),
            jwt_secret: SECRET.to_owned(),
            token_ttl_secs: 3600,
            page_size: 100,
            listen_addr: "127.0.0.1:0".to_owned(),
            run_migrations: false,
        };
        let app = app(AppState::new(lazy_pool(&db_url), config));

        Some(Store {
            app,
            conn,
            _guard: guard,
        })
    }

    /// Creates a user in `group_names` and returns `(id, bearer token)`.
    fn user(&mut self, username: &str, group_names: &[&str]) -> (i32, String) {
        let id: i32 = diesel::insert_into(users::table)
            .values((
                users::username.eq(username),
                users::email.eq(format!("{username}@lemon.test")),
                users::password_hash.eq("!"),
            ))
            .returning(users::id)
            .get_result(&mut self.conn)
            .unwrap();

        for name in group_names {
            let group_id: i32 = groups::table
                .filter(groups::name.eq(*name))
                .select(groups::id)
                .first(&mut self.conn)
                .unwrap();
            diesel::insert_into(user_groups::table)
                .values((user_groups::user_id.eq(id), user_groups::group_id.eq(group_id)))
                .execute(&mut self.conn)
                .unwrap();
        }

        (id, issue_token(id, SECRET, 3600).unwrap())
    }

    fn category(&mut self, slug: &str, title: &str) -> i32 {
        diesel::insert_into(categories::table)
            .values((categories::slug.eq(slug), categories::title.eq(title)))
            .returning(categories::id)
            .get_result(&mut self.conn)
            .unwrap()
    }

    fn menu_item(&mut self, title: &str, price: &str, category_id: i32) -> i32 {
        diesel::sql_query(
            "INSERT INTO menu_items (title, price, featured, category_id) \
             VALUES ($1, $2::numeric, false, $3) RETURNING id",
        )
        .bind::<diesel::sql_types::Text, _>(title)
        .bind::<diesel::sql_types::Text, _>(price)
        .bind::<diesel::sql_types::Integer, _>(category_id)
        .get_result::<InsertedId>(&mut self.conn)
        .unwrap()
        .id
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
        let body = match body {
            Some(body) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }
}

#[derive(QueryableByName)]
struct InsertedId {
    #[diesel(sql_type = diesel::sql_types::Integer)]
    id: i32,
}

#[tokio::test]
async fn non_managers_are_refused_before_the_body_is_read() {
    let Some(mut store) = Store::open().await else { return };
    let (_, customer) = store.user("mario", &[]);
    let (_, manager) = store.user("adrian", &[MANAGER_GROUP]);

    let (status, _) = store
        .send(Method::POST, "/api/menu-items/", &customer, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = store
        .send(Method::POST, "/api/groups/manager/users", &customer, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = store
        .send(Method::POST, "/api/categories", &customer, Some(json!({"slug": ""})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = store
        .send(Method::POST, "/api/groups/manager/users", &manager, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["username"].is_array());
}

#[tokio::test]
async fn adding_the_same_item_twice_keeps_one_line() {
    let Some(mut store) = Store::open().await else { return };
    let (_, customer) = store.user("mario", &[]);
    let mains = store.category("mains", "Main Course");
    let pasta = store.menu_item("Pasta", "9.50", mains);

    let add = json!({ "menuitem_id": pasta, "quantity": 2 });
    let (status, _) = store
        .send(Method::POST, "/api/cart/menu-items", &customer, Some(add.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = store
        .send(Method::POST, "/api/cart/menu-items", &customer, Some(add))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, cart) = store
        .send(Method::GET, "/api/cart/menu-items", &customer, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let lines = cart.as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["price"], "19.00");
}

#[tokio::test]
async fn oversized_cart_line_is_a_quantity_error() {
    let Some(mut store) = Store::open().await else { return };
    let (_, customer) = store.user("mario", &[]);
    let desserts = store.category("desserts", "Desserts");
    let cake = store.menu_item("Wedding Cake", "9999.99", desserts);

    let add = json!({ "menuitem_id": cake, "quantity": 2_000_000_000 });
    let (status, body) = store
        .send(Method::POST, "/api/cart/menu-items", &customer, Some(add))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["quantity"].is_array());
}

#[tokio::test]
async fn placing_an_order_moves_the_cart_into_order_items() {
    let Some(mut store) = Store::open().await else { return };
    let (customer_id, customer) = store.user("mario", &[]);
    let mains = store.category("mains", "Main Course");
    let pasta = store.menu_item("Pasta", "9.50", mains);
    let salad = store.menu_item("Greek Salad", "4.00", mains);

    for (item, quantity) in [(pasta, 2), (salad, 1)] {
        let add = json!({ "menuitem_id": item, "quantity": quantity });
        let (status, _) = store
            .send(Method::POST, "/api/cart/menu-items", &customer, Some(add))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, order) = store.send(Method::POST, "/api/orders", &customer, None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["total"], "23.00");
    assert_eq!(order["status"], false);
    assert_eq!(order["order_items"].as_array().unwrap().len(), 2);

    let left: i64 = cart_lines::table
        .filter(cart_lines::user_id.eq(customer_id))
        .count()
        .get_result(&mut store.conn)
        .unwrap();
    assert_eq!(left, 0);
    let items: i64 = order_items::table.count().get_result(&mut store.conn).unwrap();
    assert_eq!(items, 2);

    let (status, body) = store.send(Method::POST, "/api/orders", &customer, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Your cart is empty");
    let placed: i64 = orders::table.count().get_result(&mut store.conn).unwrap();
    assert_eq!(placed, 1);
}

#[tokio::test]
async fn order_listing_is_scoped_by_role() {
    let Some(mut store) = Store::open().await else { return };
    let (_, mario) = store.user("mario", &[]);
    let (_, luigi) = store.user("luigi", &[]);
    let (crew_id, crew) = store.user("toad", &[DELIVERY_CREW_GROUP]);
    let (_, manager) = store.user("adrian", &[MANAGER_GROUP]);
    let mains = store.category("mains", "Main Course");
    let pasta = store.menu_item("Pasta", "9.50", mains);

    let mut placed = Vec::new();
    for token in [&mario, &luigi] {
        let add = json!({ "menuitem_id": pasta, "quantity": 1 });
        store
            .send(Method::POST, "/api/cart/menu-items", token, Some(add))
            .await;
        let (status, order) = store.send(Method::POST, "/api/orders", token, None).await;
        assert_eq!(status, StatusCode::CREATED);
        placed.push(order["id"].as_i64().unwrap());
    }
    let marios_order = format!("/api/orders/{}", placed[0]);

    let (status, _) = store
        .send(
            Method::PATCH,
            &marios_order,
            &manager,
            Some(json!({ "delivery_crew_id": crew_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let count = |body: &Value| body.as_array().map(Vec::len).unwrap_or_default();
    let (_, body) = store.send(Method::GET, "/api/orders", &mario, None).await;
    assert_eq!(count(&body), 1);
    assert_eq!(body[0]["id"].as_i64(), Some(placed[0]));
    let (_, body) = store.send(Method::GET, "/api/orders", &luigi, None).await;
    assert_eq!(count(&body), 1);
    let (_, body) = store.send(Method::GET, "/api/orders", &crew, None).await;
    assert_eq!(count(&body), 1);
    assert_eq!(body[0]["delivery_crew"]["id"], crew_id);
    let (_, body) = store.send(Method::GET, "/api/orders", &manager, None).await;
    assert_eq!(count(&body), 2);

    let (status, body) = store
        .send(
            Method::PATCH,
            &marios_order,
            &manager,
            Some(json!({ "delivery_crew_id": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["delivery_crew"], Value::Null);
    let (_, body) = store.send(Method::GET, "/api/orders", &crew, None).await;
    assert_eq!(count(&body), 0);
}

#[tokio::test]
async fn menu_item_titles_are_unique_on_create_and_update() {
    let Some(mut store) = Store::open().await else { return };
    let (_, manager) = store.user("adrian", &[MANAGER_GROUP]);
    let mains = store.category("mains", "Main Course");
    store.menu_item("Pasta", "9.50", mains);
    let salad = store.menu_item("Greek Salad", "4.00", mains);

    let body = json!({
        "title": "Pasta",
        "price": "8.00",
        "featured": false,
        "category_id": mains,
    });
    let (status, body) = store
        .send(Method::POST, "/api/menu-items/", &manager, Some(body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["title"].is_array());

    let uri = format!("/api/menu-items/{salad}");
    let (status, body) = store
        .send(Method::PATCH, &uri, &manager, Some(json!({ "title": "Pasta" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["title"].is_array());

    let (status, body) = store
        .send(Method::PATCH, &uri, &manager, Some(json!({ "title": "Horiatiki" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Horiatiki");
}

#[tokio::test]
async fn category_in_use_cannot_be_deleted() {
    let Some(mut store) = Store::open().await else { return };
    let (_, manager) = store.user("adrian", &[MANAGER_GROUP]);
    let mains = store.category("mains", "Main Course");
    let sides = store.category("sides", "Sides");
    store.menu_item("Pasta", "9.50", mains);

    let (status, body) = store
        .send(Method::DELETE, &format!("/api/categories/{mains}"), &manager, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = store
        .send(Method::DELETE, &format!("/api/categories/{sides}"), &manager, None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let remaining: i64 = categories::table.count().get_result(&mut store.conn).unwrap();
    assert_eq!(remaining, 1);
    let items: i64 = menu_items::table.count().get_result(&mut store.conn).unwrap();
    assert_eq!(items, 1);
}

#[tokio::test]
async fn malformed_query_string_is_a_json_error() {
    let Some(mut store) = Store::open().await else { return };
    let (_, customer) = store.user("mario", &[]);

    let (status, body) = store
        .send(Method::GET, "/api/menu-items/?to_price=cheap", &customer, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["non_field_errors"].is_array());
}

use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;

/// Token issued by `POST /api/login` and accepted in strict mode.
pub const TOKEN: &str = "QpwL5tke4Pnpja7X4";

/// How user routes treat requests without a valid bearer token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthMode {
    /// Serve everyone, like the public sandbox.
    #[default]
    Open,
    /// 403 without an `Authorization` header, 401 for an unknown token.
    Strict,
}

impl AuthMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "open" => Some(AuthMode::Open),
            "strict" => Some(AuthMode::Strict),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub auth: AuthMode,
    /// The first `login_failures` calls to `/api/login` answer 503.
    pub login_failures: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: u64,
    pub user_id: u64,
    pub title: String,
    pub body: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub image: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub struct AppState {
    options: ServerOptions,
    users: Vec<User>,
    posts: Vec<Post>,
    products: Vec<Product>,
    next_user_id: AtomicU64,
    login_calls: AtomicUsize,
}

pub type Db = Arc<AppState>;

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

const POSTS_CREATED_ID: u64 = 101;

pub fn app() -> Router {
    app_with(ServerOptions::default())
}

pub fn app_with(options: ServerOptions) -> Router {
    let db: Db = Arc::new(AppState {
        options,
        users: seed_users(),
        posts: seed_posts(),
        products: seed_products(),
        next_user_id: AtomicU64::new(100),
        login_calls: AtomicUsize::new(0),
    });
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/{id}", get(get_user).put(update_user))
        .route("/api/login", post(login))
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/{id}", get(get_post).put(update_post))
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, ServerOptions::default()).await
}

pub async fn run_with(listener: TcpListener, options: ServerOptions) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(options)).await
}

fn error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

fn check_auth(db: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    if db.options.auth == AuthMode::Open {
        return Ok(());
    }
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Err(error(StatusCode::FORBIDDEN, "Missing API key"));
    };
    match value.to_str() {
        Ok(v) if v == format!("Bearer {TOKEN}") => Ok(()),
        _ => Err(error(StatusCode::UNAUTHORIZED, "Invalid token")),
    }
}

// ---------------------------------------------------------------------------
// User-management sandbox
// ---------------------------------------------------------------------------

async fn list_users(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(page): Query<Pagination>,
) -> ApiResult {
    check_auth(&db, &headers)?;
    let per_page = page.per_page.unwrap_or(6).max(1);
    let page_no = page.page.unwrap_or(1).max(1);
    let total = db.users.len() as u32;
    let offset = (page_no as usize - 1).saturating_mul(per_page as usize);
    let data: Vec<&User> = db
        .users
        .iter()
        .skip(offset)
        .take(per_page as usize)
        .collect();
    Ok(Json(json!({
        "page": page_no,
        "per_page": per_page,
        "total": total,
        "total_pages": total.div_ceil(per_page),
        "data": data,
    })))
}

async fn get_user(State(db): State<Db>, headers: HeaderMap, Path(id): Path<u64>) -> ApiResult {
    check_auth(&db, &headers)?;
    let user = db
        .users
        .iter()
        .find(|u| u.id == id)
        .ok_or((StatusCode::NOT_FOUND, Json(json!({}))))?;
    Ok(Json(json!({
        "data": user,
        "support": {
            "url": "https://reqres.in/#support-heading",
            "text": "To keep ReqRes free, contributions towards server costs are appreciated!",
        },
    })))
}

async fn create_user(
    State(db): State<Db>,
    Json(mut input): Json<Map<String, Value>>,
) -> (StatusCode, Json<Value>) {
    let id = db.next_user_id.fetch_add(1, Ordering::SeqCst);
    input.insert("id".to_string(), Value::String(id.to_string()));
    tracing::info!(id, "created user");
    (StatusCode::CREATED, Json(Value::Object(input)))
}

async fn update_user(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(_id): Path<u64>,
    Json(input): Json<Map<String, Value>>,
) -> ApiResult {
    check_auth(&db, &headers)?;
    Ok(Json(Value::Object(input)))
}

async fn login(State(db): State<Db>, Json(input): Json<LoginRequest>) -> ApiResult {
    let call = db.login_calls.fetch_add(1, Ordering::SeqCst);
    if call < db.options.login_failures {
        tracing::warn!(call, "injected login failure");
        return Err(error(StatusCode::SERVICE_UNAVAILABLE, "Service unavailable"));
    }
    let email = input
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "Missing email or username"))?;
    if input.password.as_deref().unwrap_or_default().is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "Missing password"));
    }
    if !db.users.iter().any(|u| u.email == email) {
        return Err(error(StatusCode::BAD_REQUEST, "user not found"));
    }
    Ok(Json(json!({ "token": TOKEN })))
}

// ---------------------------------------------------------------------------
// Placeholder JSON API
// ---------------------------------------------------------------------------

async fn list_posts(State(db): State<Db>) -> Json<Vec<Post>> {
    Json(db.posts.clone())
}

async fn get_post(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Post>, StatusCode> {
    db.posts
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn create_post(Json(mut input): Json<Map<String, Value>>) -> (StatusCode, Json<Value>) {
    input.insert("id".to_string(), json!(POSTS_CREATED_ID));
    (StatusCode::CREATED, Json(Value::Object(input)))
}

async fn update_post(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(mut input): Json<Map<String, Value>>,
) -> Result<Json<Value>, StatusCode> {
    if !db.posts.iter().any(|p| p.id == id) {
        return Err(StatusCode::NOT_FOUND);
    }
    input.insert("id".to_string(), json!(id));
    Ok(Json(Value::Object(input)))
}

// ---------------------------------------------------------------------------
// Inventory API
// ---------------------------------------------------------------------------

async fn list_products(State(db): State<Db>) -> Json<Vec<Product>> {
    Json(db.products.clone())
}

async fn get_product(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<Product>, StatusCode> {
    db.products
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

fn seed_users() -> Vec<User> {
    [
        (1, "George", "Bluth"),
        (2, "Janet", "Weaver"),
        (3, "Emma", "Wong"),
        (4, "Eve", "Holt"),
        (5, "Charles", "Morris"),
        (6, "Tracey", "Ramos"),
        (7, "Michael", "Lawson"),
        (8, "Lindsay", "Ferguson"),
        (9, "Tobias", "Funke"),
        (10, "Byron", "Fields"),
        (11, "George", "Edwards"),
        (12, "Rachel", "Howell"),
    ]
    .into_iter()
    .map(|(id, first, last)| User {
        id,
        email: format!("{}.{}@reqres.in", first.to_lowercase(), last.to_lowercase()),
        first_name: first.to_string(),
        last_name: last.to_string(),
        avatar: format!("https://reqres.in/img/faces/{id}-image.jpg"),
    })
    .collect()
}

fn seed_posts() -> Vec<Post> {
    (1..=10)
        .map(|id| Post {
            id,
            user_id: (id - 1) / 5 + 1,
            title: format!("post title {id}"),
            body: format!("body of post {id}"),
        })
        .collect()
}

fn seed_products() -> Vec<Product> {
    [
        (1, "Backpack", 109.95, "Fits 15 inch laptops"),
        (2, "Slim Fit T-Shirt", 22.3, "Lightweight cotton tee"),
        (3, "Cotton Jacket", 55.99, "Outerwear for spring"),
        (4, "Casual Slim Fit", 15.99, "Everyday wear"),
        (5, "Chain Bracelet", 695.0, "Silver dragon station chain"),
    ]
    .into_iter()
    .map(|(id, name, price, description)| Product {
        id,
        name: name.to_string(),
        price,
        description: description.to_string(),
        image: format!("https://fakestoreapi.com/img/{id}.jpg"),
    })
    .collect()
}

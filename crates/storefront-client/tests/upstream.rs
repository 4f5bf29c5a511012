//! End-to-end tests of the HTTP adapter and action layer against a stub
//! upstream served by axum on a random local port.

use std::{
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use axum::{
  Json, Router,
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
  routing::{get, post, put},
};
use serde_json::{Value, json};
use storefront_client::{
  Actions, ClientConfig, HttpClient,
  actions::token_of,
  models::{Address, Checkout, PaymentMethod, ProfileUpdate, SignIn},
};
use storefront_core::{
  dispatch::Dispatch,
  intent::{MutationIntent, ResourceId},
  outcome::ReconciliationResult,
  session::SessionProvider,
};
use tokio::net::TcpListener;

// ─── Fixtures ────────────────────────────────────────────────────────────────

struct FixedToken(Option<&'static str>);

impl SessionProvider for FixedToken {
  fn token(&self) -> Option<String> { self.0.map(str::to_owned) }

  fn redirect_to_login(&self, _return_path: &str, _intent: &MutationIntent) {}
}

#[derive(Clone, Default)]
struct Hits(Arc<AtomicUsize>);

fn authorised(headers: &HeaderMap) -> bool {
  headers.get("token").and_then(|v| v.to_str().ok()) == Some("good")
}

async fn add_wishlist(
  State(hits): State<Hits>,
  headers: HeaderMap,
  Json(body): Json<Value>,
) -> impl IntoResponse {
  hits.0.fetch_add(1, Ordering::SeqCst);
  if !authorised(&headers) {
    return (
      StatusCode::UNAUTHORIZED,
      Json(json!({ "statusMsg": "fail", "message": "Invalid Token. please login again" })),
    );
  }
  let product = body["productId"].as_str().unwrap_or_default().to_owned();
  if product == "dup" {
    return (
      StatusCode::CONFLICT,
      Json(json!({ "message": "Product already in wishlist" })),
    );
  }
  (
    StatusCode::OK,
    Json(json!({
      "status": "success",
      "message": "Product added successfully to your wishlist",
      "data": [product],
    })),
  )
}

async fn remove_wishlist(Path(id): Path<String>) -> impl IntoResponse {
  Json(json!({ "status": "success", "message": "Product removed", "data": [], "removed": id }))
}

async fn list_wishlist() -> impl IntoResponse {
  Json(json!({ "status": "success", "count": 2, "data": [{ "_id": "p1" }, { "_id": "p2" }] }))
}

async fn get_cart() -> impl IntoResponse {
  Json(json!({
    "status": "success",
    "numOfCartItems": 2,
    "cartId": "cart-1",
    "data": {
      "_id": "cart-1",
      "products": [
        { "count": 2, "product": { "_id": "p1" } },
        { "count": 1, "product": "p2" },
      ],
    },
  }))
}

async fn slow_add_to_cart() -> impl IntoResponse {
  tokio::time::sleep(Duration::from_millis(500)).await;
  Json(json!({ "status": "success" }))
}

async fn broken_cart_line() -> impl IntoResponse {
  (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn not_json_profile() -> impl IntoResponse { (StatusCode::OK, "<html>ok</html>") }

async fn sign_in(Json(body): Json<Value>) -> impl IntoResponse {
  if body["password"] == "secret1" {
    (
      StatusCode::OK,
      Json(json!({ "message": "success", "user": { "name": "Mona" }, "token": "good" })),
    )
  } else {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Incorrect email or password" })))
  }
}

async fn cash_order(State(hits): State<Hits>, Path(cart): Path<String>) -> impl IntoResponse {
  hits.0.fetch_add(1, Ordering::SeqCst);
  (StatusCode::CREATED, Json(json!({ "status": "success", "data": { "cart": cart } })))
}

async fn add_address(Json(body): Json<Value>) -> impl IntoResponse {
  let mut saved = body;
  saved["_id"] = json!("a1");
  Json(json!({ "status": "success", "message": "Address added successfully", "data": [saved] }))
}

async fn remove_address(Path(id): Path<String>) -> impl IntoResponse {
  if id == "a1" {
    (StatusCode::OK, Json(json!({ "status": "success", "data": [] })))
  } else {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "Address does not exist" })))
  }
}

async fn serve(hits: Hits) -> String {
  let app = Router::new()
    .route("/wishlist", get(list_wishlist).post(add_wishlist))
    .route("/wishlist/{id}", axum::routing::delete(remove_wishlist))
    .route("/cart", get(get_cart).post(slow_add_to_cart))
    .route("/cart/{id}", put(broken_cart_line))
    .route("/users/updateMe", put(not_json_profile))
    .route("/auth/signin", post(sign_in))
    .route("/orders/{cart}", post(cash_order))
    .route("/addresses", post(add_address))
    .route("/addresses/{id}", axum::routing::delete(remove_address))
    .with_state(hits);

  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });
  format!("http://{addr}")
}

fn actions(base_url: String, token: Option<&'static str>) -> Actions {
  let mut config = ClientConfig::new(base_url);
  config.read_timeout = Duration::from_millis(100);
  config.auth_timeout = Duration::from_secs(2);
  Actions::new(HttpClient::new(config, Arc::new(FixedToken(token))).unwrap())
}

fn address() -> Address {
  Address {
    id:      None,
    name:    "Home".into(),
    details: "12 Tahrir St".into(),
    phone:   "01010700999".into(),
    city:    "Cairo".into(),
  }
}

// ─── Classification over the wire ────────────────────────────────────────────

#[tokio::test]
async fn wishlist_add_succeeds_with_token() {
  let hits = Hits::default();
  let a = actions(serve(hits.clone()).await, Some("good"));

  let result = a.toggle_wishlist("p9", true).await.unwrap();
  match result {
    ReconciliationResult::Success(body) => assert_eq!(body["data"], json!(["p9"])),
    other => panic!("expected success, got {other:?}"),
  }
  assert_eq!(hits.0.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_token_is_unauthenticated() {
  let a = actions(serve(Hits::default()).await, None);
  let result = a.toggle_wishlist("p9", true).await.unwrap();
  assert_eq!(result, ReconciliationResult::Unauthenticated);
}

#[tokio::test]
async fn conflict_is_already_exists() {
  let a = actions(serve(Hits::default()).await, Some("good"));
  let result = a.toggle_wishlist("dup", true).await.unwrap();
  assert_eq!(result, ReconciliationResult::AlreadyExists);
}

#[tokio::test]
async fn server_error_is_classified() {
  let a = actions(serve(Hits::default()).await, Some("good"));
  let result = a.set_cart_line_quantity("p1", 3).await.unwrap();
  assert_eq!(result, ReconciliationResult::ServerError);
}

#[tokio::test]
async fn slow_upstream_times_out() {
  let a = actions(serve(Hits::default()).await, Some("good"));
  let result = a.add_to_cart("p1", 1).await.unwrap();
  assert_eq!(result, ReconciliationResult::Timeout);
}

#[tokio::test]
async fn non_json_success_is_unknown_failure() {
  let a = actions(serve(Hits::default()).await, Some("good"));
  let update = ProfileUpdate { name: Some("Mona".into()), ..Default::default() };
  let result = a.update_profile(&update).await.unwrap();
  assert!(matches!(result, ReconciliationResult::UnknownFailure(Some(_))));
}

#[tokio::test]
async fn refused_connection_is_network_error() {
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  let a = actions(format!("http://{addr}"), Some("good"));
  let result = a.toggle_wishlist("p1", true).await.unwrap();
  assert_eq!(result, ReconciliationResult::NetworkError);
}

#[tokio::test]
async fn validation_never_reaches_the_network() {
  let hits = Hits::default();
  let a = actions(serve(hits.clone()).await, Some("good"));

  assert!(matches!(
    a.toggle_wishlist("  ", true).await.unwrap(),
    ReconciliationResult::Invalid(_)
  ));
  assert!(matches!(
    a.add_to_cart("p1", 0).await.unwrap(),
    ReconciliationResult::Invalid(_)
  ));

  let checkout = Checkout {
    cart_id:    "cart-1".into(),
    address:    address(),
    method:     PaymentMethod::Card,
    return_url: None,
  };
  assert!(matches!(
    a.checkout(&checkout).await.unwrap(),
    ReconciliationResult::Invalid(_)
  ));

  assert_eq!(hits.0.load(Ordering::SeqCst), 0);
}

// ─── Reads, auth, checkout ───────────────────────────────────────────────────

#[tokio::test]
async fn reads_parse_wishlist_and_cart() {
  let a = actions(serve(Hits::default()).await, Some("good"));

  assert_eq!(a.wishlist().await.unwrap(), vec!["p1".to_string(), "p2".to_string()]);

  let cart = a.cart().await.unwrap();
  assert_eq!(cart.cart_id.as_deref(), Some("cart-1"));
  assert_eq!(cart.lines.get("p1"), Some(&2));
  assert_eq!(cart.lines.get("p2"), Some(&1));
}

#[tokio::test]
async fn sign_in_yields_token() {
  let a = actions(serve(Hits::default()).await, None);

  let ok = a
    .sign_in(&SignIn { email: "mona@example.com".into(), password: "secret1".into() })
    .await
    .unwrap();
  assert_eq!(token_of(&ok).as_deref(), Some("good"));

  let bad = a
    .sign_in(&SignIn { email: "mona@example.com".into(), password: "wrong".into() })
    .await
    .unwrap();
  assert_eq!(bad, ReconciliationResult::Unauthenticated);
}

#[tokio::test]
async fn cash_checkout_issues_one_request() {
  let hits = Hits::default();
  let a = actions(serve(hits.clone()).await, Some("good"));

  let checkout = Checkout {
    cart_id:    "cart-1".into(),
    address:    address(),
    method:     PaymentMethod::Cash,
    return_url: None,
  };
  let result = a.checkout(&checkout).await.unwrap();
  assert!(result.is_success());
  assert_eq!(hits.0.load(Ordering::SeqCst), 1);
}

// ─── Dispatch routing ────────────────────────────────────────────────────────

#[tokio::test]
async fn dispatch_routes_wishlist_intents() {
  let a = actions(serve(Hits::default()).await, Some("good"));

  let add = MutationIntent::add(ResourceId::wishlist("p5").unwrap(), Value::Null);
  assert!(a.dispatch(add).await.unwrap().is_success());

  let remove = MutationIntent::remove(ResourceId::wishlist("p5").unwrap());
  assert!(a.dispatch(remove).await.unwrap().is_success());
}

#[tokio::test]
async fn dispatch_rejects_unknown_namespace() {
  let a = actions(serve(Hits::default()).await, Some("good"));
  let intent = MutationIntent::update(ResourceId::new("orders", "o1").unwrap(), Value::Null);
  assert!(a.dispatch(intent).await.is_err());
}

#[tokio::test]
async fn dispatch_validates_cart_update_payload() {
  let a = actions(serve(Hits::default()).await, Some("good"));
  let intent = MutationIntent::update(ResourceId::cart("p1").unwrap(), json!({}));
  assert!(matches!(
    a.dispatch(intent).await.unwrap(),
    ReconciliationResult::Invalid(_)
  ));
}

#[tokio::test]
async fn dispatch_routes_address_intents() {
  let a = actions(serve(Hits::default()).await, Some("good"));

  let payload = serde_json::to_value(address()).unwrap();
  let add = MutationIntent::add(ResourceId::address("new").unwrap(), payload);
  match a.dispatch(add).await.unwrap() {
    ReconciliationResult::Success(body) => assert_eq!(body["data"][0]["city"], "Cairo"),
    other => panic!("expected success, got {other:?}"),
  }

  let remove = MutationIntent::remove(ResourceId::address("a1").unwrap());
  assert!(a.dispatch(remove).await.unwrap().is_success());

  let missing = MutationIntent::remove(ResourceId::address("zz").unwrap());
  assert!(matches!(
    a.dispatch(missing).await.unwrap(),
    ReconciliationResult::UnknownFailure(Some(_))
  ));
}

#[tokio::test]
async fn dispatch_rejects_malformed_address_payload() {
  let hits = Hits::default();
  let a = actions(serve(hits.clone()).await, Some("good"));
  let intent = MutationIntent::add(ResourceId::address("new").unwrap(), json!({ "city": 3 }));
  assert!(matches!(
    a.dispatch(intent).await.unwrap(),
    ReconciliationResult::Invalid(_)
  ));
  assert_eq!(hits.0.load(Ordering::SeqCst), 0);
}

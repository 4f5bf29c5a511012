//! The action layer: one operation per business capability.
//!
//! Each mutating operation validates its inputs locally, issues exactly one
//! request and classifies the response. Expected failures come back as
//! [`ReconciliationResult`] values; only conditions the classification cannot
//! express (an unbuildable request) are returned as `Err`.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | [`Actions::toggle_wishlist`] | `POST wishlist` / `DELETE wishlist/{id}` |
//! | [`Actions::add_to_cart`] | `POST cart` |
//! | [`Actions::set_cart_line_quantity`] | `PUT cart/{id}` |
//! | [`Actions::remove_cart_line`] | `DELETE cart/{id}` |
//! | [`Actions::update_profile`] | `PUT users/updateMe` |
//! | [`Actions::change_password`] | `PUT users/changeMyPassword` |
//! | [`Actions::submit_address`] | `POST addresses` / `PUT addresses/{id}` |
//! | [`Actions::delete_address`] | `DELETE addresses/{id}` |
//! | [`Actions::checkout`] | `POST orders/{cart}` / `POST orders/checkout-session/{cart}` |
//! | [`Actions::sign_in`], [`Actions::sign_up`] | `POST auth/signin`, `POST auth/signup` |
//! | password reset | `POST auth/forgotPasswords`, `POST auth/verifyResetCode`, `PUT auth/resetPassword` |

use serde_json::{Value, json};
use storefront_core::{
  dispatch::Dispatch,
  intent::{MutationIntent, MutationKind, namespace},
  outcome::{ReconciliationResult, ValidationError},
};

use crate::{
  Error, Result,
  classify::classify_sent,
  config::TimeoutClass,
  http::{ApiRequest, HttpClient},
  models::{
    Address, CartSnapshot, Checkout, PasswordChange, PaymentMethod, ProfileUpdate, SignIn, SignUp,
  },
  validate::{self, Checked},
};

/// Turn a failed local check into an early `Invalid` result.
macro_rules! checked {
  ($check:expr) => {
    if let Err(e) = $check {
      return Ok(ReconciliationResult::Invalid(e));
    }
  };
}

#[derive(Clone)]
pub struct Actions {
  http: HttpClient,
}

impl Actions {
  pub fn new(http: HttpClient) -> Self { Self { http } }

  async fn execute(&self, request: ApiRequest) -> Result<ReconciliationResult> {
    let path = request.path.clone();
    let result = classify_sent(self.http.send(request).await)?;
    tracing::debug!(%path, result = result.label(), "request classified");
    Ok(result)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn read(&self, request: ApiRequest) -> Result<Value> {
    match self.execute(request).await? {
      ReconciliationResult::Success(body) => Ok(body),
      other => Err(Error::Upstream(other)),
    }
  }

  /// `GET wishlist`: ids of the products currently in the wishlist.
  pub async fn wishlist(&self) -> Result<Vec<String>> {
    let body = self.read(ApiRequest::get("wishlist")).await?;
    let items = body.get("data").and_then(Value::as_array).cloned().unwrap_or_default();
    Ok(items.iter().filter_map(product_id_of).collect())
  }

  /// `GET cart`: the current cart lines.
  pub async fn cart(&self) -> Result<CartSnapshot> {
    let body = self.read(ApiRequest::get("cart")).await?;
    let data = body.get("data").cloned().unwrap_or(Value::Null);

    let cart_id = body
      .get("cartId")
      .or_else(|| data.get("_id"))
      .and_then(Value::as_str)
      .map(str::to_owned);

    let lines = data
      .get("products")
      .and_then(Value::as_array)
      .map(|products| {
        products
          .iter()
          .filter_map(|line| {
            let id = line.get("product").and_then(product_id_of)?;
            let count = line
              .get("count")
              .or_else(|| line.get("quantity"))
              .and_then(Value::as_u64)
              .unwrap_or(1);
            Some((id, u32::try_from(count).unwrap_or(u32::MAX)))
          })
          .collect()
      })
      .unwrap_or_default();

    Ok(CartSnapshot { cart_id, lines })
  }

  // ── Wishlist ──────────────────────────────────────────────────────────────

  pub async fn toggle_wishlist(&self, product_id: &str, add: bool) -> Result<ReconciliationResult> {
    checked!(validate::required("productId", product_id));
    let request = if add {
      ApiRequest::post("wishlist", json!({ "productId": product_id }))
    } else {
      ApiRequest::delete(format!("wishlist/{product_id}"))
    };
    self.execute(request).await
  }

  // ── Cart ──────────────────────────────────────────────────────────────────

  pub async fn add_to_cart(&self, product_id: &str, quantity: u32) -> Result<ReconciliationResult> {
    checked!(validate::required("productId", product_id));
    checked!(validate::quantity("quantity", quantity));
    self
      .execute(ApiRequest::post(
        "cart",
        json!({ "productId": product_id, "quantity": quantity }),
      ))
      .await
  }

  pub async fn set_cart_line_quantity(
    &self,
    product_id: &str,
    quantity: u32,
  ) -> Result<ReconciliationResult> {
    checked!(validate::required("productId", product_id));
    checked!(validate::quantity("count", quantity));
    self
      .execute(ApiRequest::put(format!("cart/{product_id}"), json!({ "count": quantity })))
      .await
  }

  pub async fn remove_cart_line(&self, product_id: &str) -> Result<ReconciliationResult> {
    checked!(validate::required("productId", product_id));
    self.execute(ApiRequest::delete(format!("cart/{product_id}"))).await
  }

  // ── Account ───────────────────────────────────────────────────────────────

  pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<ReconciliationResult> {
    checked!(check_profile(update));
    self
      .execute(ApiRequest::put("users/updateMe", serde_json::to_value(update)?))
      .await
  }

  pub async fn change_password(&self, change: &PasswordChange) -> Result<ReconciliationResult> {
    checked!(validate::required("currentPassword", &change.current_password));
    checked!(validate::password("password", &change.password));
    checked!(validate::confirmation("rePassword", &change.password, &change.re_password));
    self
      .execute(
        ApiRequest::put("users/changeMyPassword", serde_json::to_value(change)?)
          .class(TimeoutClass::Auth),
      )
      .await
  }

  // ── Addresses ─────────────────────────────────────────────────────────────

  /// Create `address`, or update it when it carries an id.
  pub async fn submit_address(&self, address: &Address) -> Result<ReconciliationResult> {
    checked!(check_address(address));
    let body = json!({
      "name": address.name.trim(),
      "details": address.details.trim(),
      "phone": address.phone.trim(),
      "city": address.city.trim(),
    });
    let request = match &address.id {
      Some(id) => ApiRequest::put(format!("addresses/{id}"), body),
      None => ApiRequest::post("addresses", body),
    };
    self.execute(request).await
  }

  pub async fn delete_address(&self, address_id: &str) -> Result<ReconciliationResult> {
    checked!(validate::required("addressId", address_id));
    self.execute(ApiRequest::delete(format!("addresses/{address_id}"))).await
  }

  // ── Checkout ──────────────────────────────────────────────────────────────

  /// Place an order. Issues one request, chosen by payment method.
  pub async fn checkout(&self, checkout: &Checkout) -> Result<ReconciliationResult> {
    checked!(validate::required("cartId", &checkout.cart_id));
    checked!(check_address(&checkout.address));

    let body = json!({
      "shippingAddress": {
        "details": checkout.address.details.trim(),
        "phone": checkout.address.phone.trim(),
        "city": checkout.address.city.trim(),
      }
    });
    let request = match checkout.method {
      PaymentMethod::Cash => ApiRequest::post(format!("orders/{}", checkout.cart_id), body),
      PaymentMethod::Card => {
        let Some(url) = checkout.return_url.as_deref().filter(|u| !u.trim().is_empty()) else {
          return Ok(ReconciliationResult::Invalid(ValidationError::new(
            "returnUrl",
            "is required for card payments",
          )));
        };
        ApiRequest::post(format!("orders/checkout-session/{}", checkout.cart_id), body)
          .query("url", url)
      }
    };
    self.execute(request).await
  }

  // ── Auth ──────────────────────────────────────────────────────────────────

  /// Sign in. On success the token is under `token` in the body; see
  /// [`token_of`].
  pub async fn sign_in(&self, credentials: &SignIn) -> Result<ReconciliationResult> {
    checked!(validate::email("email", &credentials.email));
    checked!(validate::required("password", &credentials.password));
    self
      .execute(
        ApiRequest::post("auth/signin", serde_json::to_value(credentials)?)
          .class(TimeoutClass::Auth),
      )
      .await
  }

  pub async fn sign_up(&self, account: &SignUp) -> Result<ReconciliationResult> {
    checked!(validate::required("name", &account.name));
    checked!(validate::email("email", &account.email));
    checked!(validate::password("password", &account.password));
    checked!(validate::confirmation("rePassword", &account.password, &account.re_password));
    checked!(validate::phone("phone", &account.phone));
    self
      .execute(
        ApiRequest::post("auth/signup", serde_json::to_value(account)?).class(TimeoutClass::Auth),
      )
      .await
  }

  // ── Password reset ────────────────────────────────────────────────────────

  /// Step 1: ask the upstream to email a reset code.
  pub async fn forgot_password(&self, email: &str) -> Result<ReconciliationResult> {
    checked!(validate::email("email", email));
    self
      .execute(
        ApiRequest::post("auth/forgotPasswords", json!({ "email": email.trim() }))
          .class(TimeoutClass::Reset),
      )
      .await
  }

  /// Step 2: check the emailed code.
  pub async fn verify_reset_code(&self, code: &str) -> Result<ReconciliationResult> {
    checked!(validate::reset_code("resetCode", code));
    self
      .execute(
        ApiRequest::post("auth/verifyResetCode", json!({ "resetCode": code.trim() }))
          .class(TimeoutClass::Reset),
      )
      .await
  }

  /// Step 3: set the new password.
  pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<ReconciliationResult> {
    checked!(validate::email("email", email));
    checked!(validate::password("newPassword", new_password));
    self
      .execute(
        ApiRequest::put(
          "auth/resetPassword",
          json!({ "email": email.trim(), "newPassword": new_password }),
        )
        .class(TimeoutClass::Reset),
      )
      .await
  }
}

// ─── Dispatch ────────────────────────────────────────────────────────────────

/// Routes replayable intents by resource namespace. Password changes and
/// checkout are never routed: they must not be persisted for replay.
impl Dispatch for Actions {
  type Error = Error;

  async fn dispatch(&self, intent: MutationIntent) -> Result<ReconciliationResult> {
    let id = intent.resource_id();
    let key = id.key();

    match (id.namespace(), intent.kind()) {
      (namespace::WISHLIST, MutationKind::Add) => self.toggle_wishlist(key, true).await,
      (namespace::WISHLIST, MutationKind::Remove) => self.toggle_wishlist(key, false).await,

      (namespace::CART, MutationKind::Add) => {
        self.add_to_cart(key, quantity_of(&intent).unwrap_or(1)).await
      }
      (namespace::CART, MutationKind::Update) => match quantity_of(&intent) {
        Some(q) => self.set_cart_line_quantity(key, q).await,
        None => Ok(ReconciliationResult::Invalid(ValidationError::new(
          "quantity",
          "is required",
        ))),
      },
      (namespace::CART, MutationKind::Remove) => self.remove_cart_line(key).await,

      (namespace::PROFILE, MutationKind::Update) => match intent.payload_as::<ProfileUpdate>() {
        Ok(update) => self.update_profile(&update).await,
        Err(e) => Ok(ReconciliationResult::Invalid(ValidationError::new("profile", e.to_string()))),
      },

      (namespace::ADDRESS, MutationKind::Add | MutationKind::Update) => {
        match intent.payload_as::<Address>() {
          Ok(address) => self.submit_address(&address).await,
          Err(e) => {
            Ok(ReconciliationResult::Invalid(ValidationError::new("address", e.to_string())))
          }
        }
      }
      (namespace::ADDRESS, MutationKind::Remove) => self.delete_address(key).await,

      (_, kind) => Err(Error::Unroutable { resource: id.to_string(), kind }),
    }
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn quantity_of(intent: &MutationIntent) -> Option<u32> {
  intent
    .payload_u64("quantity")
    .map(|q| u32::try_from(q).unwrap_or(u32::MAX))
}

fn check_profile(update: &ProfileUpdate) -> Checked {
  if update.is_empty() {
    return Err(ValidationError::new("profile", "nothing to update"));
  }
  if let Some(name) = &update.name {
    validate::required("name", name)?;
  }
  if let Some(email) = &update.email {
    validate::email("email", email)?;
  }
  if let Some(phone) = &update.phone {
    validate::phone("phone", phone)?;
  }
  Ok(())
}

fn check_address(address: &Address) -> Checked {
  validate::required("name", &address.name)?;
  validate::required("details", &address.details)?;
  validate::phone("phone", &address.phone)?;
  validate::required("city", &address.city)
}

/// A product id from either a bare string or an object with `_id` / `id`.
fn product_id_of(item: &Value) -> Option<String> {
  match item {
    Value::String(s) => Some(s.clone()),
    Value::Object(o) => o
      .get("_id")
      .or_else(|| o.get("id"))
      .and_then(Value::as_str)
      .map(str::to_owned),
    _ => None,
  }
}

/// The session token in a successful sign-in body.
pub fn token_of(result: &ReconciliationResult) -> Option<String> {
  match result {
    ReconciliationResult::Success(body) => {
      body.get("token").and_then(Value::as_str).map(str::to_owned)
    }
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn product_ids_from_mixed_shapes() {
    assert_eq!(product_id_of(&json!("p1")), Some("p1".into()));
    assert_eq!(product_id_of(&json!({ "_id": "p2", "title": "Shoe" })), Some("p2".into()));
    assert_eq!(product_id_of(&json!({ "id": "p3" })), Some("p3".into()));
    assert_eq!(product_id_of(&json!(42)), None);
  }

  #[test]
  fn token_only_from_success() {
    let ok = ReconciliationResult::Success(json!({ "message": "success", "token": "abc" }));
    assert_eq!(token_of(&ok), Some("abc".into()));
    assert_eq!(token_of(&ReconciliationResult::Unauthenticated), None);
  }

  #[test]
  fn profile_check_requires_a_field() {
    assert!(check_profile(&ProfileUpdate::default()).is_err());
    let update = ProfileUpdate { phone: Some("01010700999".into()), ..Default::default() };
    assert!(check_profile(&update).is_ok());
    let update = ProfileUpdate { email: Some("nope".into()), ..Default::default() };
    assert_eq!(check_profile(&update).unwrap_err().field, "email");
  }
}

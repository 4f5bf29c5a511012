//! Request bodies and read models exchanged with the upstream.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name:  Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
}

impl ProfileUpdate {
  pub fn is_empty(&self) -> bool {
    self.name.is_none() && self.email.is_none() && self.phone.is_none()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
  pub current_password: String,
  pub password:         String,
  pub re_password:      String,
}

/// A shipping address. `id` is set when editing an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
  #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
  pub id:      Option<String>,
  /// Label such as "Home" or "Office".
  pub name:    String,
  pub details: String,
  pub phone:   String,
  pub city:    String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUp {
  pub name:        String,
  pub email:       String,
  pub password:    String,
  pub re_password: String,
  pub phone:       String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignIn {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
  /// Cash on delivery.
  Cash,
  /// Hosted card checkout; the response carries a session URL.
  Card,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Checkout {
  pub cart_id:    String,
  pub address:    Address,
  pub method:     PaymentMethod,
  /// Where the hosted card page sends the user afterwards.
  pub return_url: Option<String>,
}

/// The upstream cart, reduced to what the quantity steppers need.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
  pub cart_id: Option<String>,
  /// Product id -> quantity.
  pub lines:   BTreeMap<String, u32>,
}

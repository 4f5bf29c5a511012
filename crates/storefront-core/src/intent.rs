//! Resource identifiers and mutation intents.
//!
//! A [`MutationIntent`] is created when the user triggers a mutating action.
//! It is immutable once built: the controller consumes it, and if the
//! mutation cannot be confirmed it is persisted verbatim inside a
//! [`PendingRetryRecord`](crate::retry::PendingRetryRecord) for replay.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Namespaces ──────────────────────────────────────────────────────────────

/// Well-known resource namespaces.
pub mod namespace {
  pub const WISHLIST: &str = "wishlist";
  pub const CART: &str = "cart";
  pub const PROFILE: &str = "profile";
  pub const ADDRESS: &str = "address";
}

// ─── ResourceId ──────────────────────────────────────────────────────────────

/// Identifies one trackable resource, e.g. `wishlist:6428ebc6dc1175abc65ca0b9`.
///
/// Rendered as `namespace:key`. Neither part may be empty and the namespace
/// may not contain `:` (the key may).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId {
  namespace: String,
  key:       String,
}

impl ResourceId {
  pub fn new(namespace: impl Into<String>, key: impl Into<String>) -> Result<Self> {
    let namespace = namespace.into();
    let key = key.into();
    if namespace.trim().is_empty() || key.trim().is_empty() || namespace.contains(':') {
      return Err(Error::InvalidResourceId(format!("{namespace}:{key}")));
    }
    Ok(Self { namespace, key })
  }

  /// Wishlist membership of one product.
  pub fn wishlist(product_id: &str) -> Result<Self> {
    Self::new(namespace::WISHLIST, product_id)
  }

  /// Quantity of one cart line, keyed by product.
  pub fn cart(product_id: &str) -> Result<Self> { Self::new(namespace::CART, product_id) }

  /// The signed-in user's profile form.
  pub fn profile() -> Self {
    Self { namespace: namespace::PROFILE.to_owned(), key: "me".to_owned() }
  }

  pub fn address(address_id: &str) -> Result<Self> {
    Self::new(namespace::ADDRESS, address_id)
  }

  pub fn namespace(&self) -> &str { &self.namespace }

  pub fn key(&self) -> &str { &self.key }

  /// The page the user should land on again after signing in.
  pub fn return_path(&self) -> String { format!("/{}", self.namespace) }
}

impl fmt::Display for ResourceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.namespace, self.key)
  }
}

impl FromStr for ResourceId {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let (namespace, key) = s
      .split_once(':')
      .ok_or_else(|| Error::InvalidResourceId(s.to_owned()))?;
    Self::new(namespace, key)
  }
}

impl TryFrom<String> for ResourceId {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> { s.parse() }
}

impl From<ResourceId> for String {
  fn from(id: ResourceId) -> Self { id.to_string() }
}

// ─── MutationKind ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
  Add,
  Remove,
  Update,
}

impl MutationKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Add => "add",
      Self::Remove => "remove",
      Self::Update => "update",
    }
  }
}

impl fmt::Display for MutationKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for MutationKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "add" => Ok(Self::Add),
      "remove" => Ok(Self::Remove),
      "update" => Ok(Self::Update),
      other => Err(Error::UnknownMutationKind(other.to_owned())),
    }
  }
}

// ─── MutationIntent ──────────────────────────────────────────────────────────

/// A user-triggered change to one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationIntent {
  intent_id:   Uuid,
  resource_id: ResourceId,
  kind:        MutationKind,
  payload:     Value,
  created_at:  DateTime<Utc>,
}

impl MutationIntent {
  pub fn new(resource_id: ResourceId, kind: MutationKind, payload: Value) -> Self {
    Self {
      intent_id: Uuid::new_v4(),
      resource_id,
      kind,
      payload,
      created_at: Utc::now(),
    }
  }

  pub fn add(resource_id: ResourceId, payload: Value) -> Self {
    Self::new(resource_id, MutationKind::Add, payload)
  }

  pub fn remove(resource_id: ResourceId) -> Self {
    Self::new(resource_id, MutationKind::Remove, Value::Null)
  }

  pub fn update(resource_id: ResourceId, payload: Value) -> Self {
    Self::new(resource_id, MutationKind::Update, payload)
  }

  /// Rebuild an intent loaded from durable storage.
  pub fn restore(
    intent_id: Uuid,
    resource_id: ResourceId,
    kind: MutationKind,
    payload: Value,
    created_at: DateTime<Utc>,
  ) -> Self {
    Self { intent_id, resource_id, kind, payload, created_at }
  }

  pub fn intent_id(&self) -> Uuid { self.intent_id }

  pub fn resource_id(&self) -> &ResourceId { &self.resource_id }

  pub fn kind(&self) -> MutationKind { self.kind }

  pub fn payload(&self) -> &Value { &self.payload }

  pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

  /// Deserialise the payload into a typed request body.
  pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
    Ok(serde_json::from_value(self.payload.clone())?)
  }

  /// A `u64` field of an object payload, if present.
  pub fn payload_u64(&self, field: &str) -> Option<u64> {
    self.payload.get(field).and_then(Value::as_u64)
  }
}

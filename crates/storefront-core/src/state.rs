//! Speculative resource state.
//!
//! Each tracked resource holds a locally-believed value that is changed
//! optimistically before the upstream confirms it. [`ResourceState`] tells
//! the controller how an intent moves that value, what "present" means for
//! an already-exists reconciliation, and how a confirmed payload is adopted.

use std::fmt;

use serde_json::{Map, Value};

use crate::intent::{MutationIntent, MutationKind, namespace};

pub trait ResourceState: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
  /// The resource namespace this state type tracks (see
  /// [`namespace`](crate::intent::namespace)).
  const NAMESPACE: &'static str;

  /// Human-readable noun for notifications, e.g. "wishlist".
  const LABEL: &'static str;

  /// The value the intent drives toward, applied optimistically.
  fn target(&self, intent: &MutationIntent) -> Self;

  /// The "resource exists" variant, forced when the upstream reports the
  /// change as already applied.
  fn present(&self) -> Self;

  /// Fold the upstream's confirmed payload into the optimistic value.
  fn confirm(&self, _payload: &Value) -> Self { self.clone() }
}

// ─── Wishlist ────────────────────────────────────────────────────────────────

/// Whether one product is in the wishlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WishlistMembership(pub bool);

impl ResourceState for WishlistMembership {
  const NAMESPACE: &'static str = namespace::WISHLIST;
  const LABEL: &'static str = "wishlist";

  fn target(&self, intent: &MutationIntent) -> Self {
    match intent.kind() {
      MutationKind::Add => Self(true),
      MutationKind::Remove => Self(false),
      MutationKind::Update => *self,
    }
  }

  fn present(&self) -> Self { Self(true) }
}

// ─── Cart ────────────────────────────────────────────────────────────────────

/// Quantity of one cart line; zero means the line is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartQuantity(pub u32);

impl CartQuantity {
  fn requested(intent: &MutationIntent) -> Option<u32> {
    intent
      .payload_u64("quantity")
      .map(|q| u32::try_from(q).unwrap_or(u32::MAX))
  }
}

impl ResourceState for CartQuantity {
  const NAMESPACE: &'static str = namespace::CART;
  const LABEL: &'static str = "cart";

  fn target(&self, intent: &MutationIntent) -> Self {
    match intent.kind() {
      MutationKind::Add => Self(self.0.saturating_add(Self::requested(intent).unwrap_or(1))),
      MutationKind::Update => Self(Self::requested(intent).unwrap_or(self.0)),
      MutationKind::Remove => Self(0),
    }
  }

  fn present(&self) -> Self { Self(self.0.max(1)) }
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// The editable profile fields as a JSON object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileDraft(pub Map<String, Value>);

impl ProfileDraft {
  fn merged(&self, patch: &Value) -> Self {
    let mut fields = self.0.clone();
    if let Value::Object(patch) = patch {
      for (k, v) in patch {
        fields.insert(k.clone(), v.clone());
      }
    }
    Self(fields)
  }
}

impl ResourceState for ProfileDraft {
  const NAMESPACE: &'static str = namespace::PROFILE;
  const LABEL: &'static str = "profile";

  fn target(&self, intent: &MutationIntent) -> Self {
    match intent.kind() {
      MutationKind::Update | MutationKind::Add => self.merged(intent.payload()),
      MutationKind::Remove => self.clone(),
    }
  }

  fn present(&self) -> Self { self.clone() }

  /// Adopts the server's echo of the user (`user` or `data`) when present.
  fn confirm(&self, payload: &Value) -> Self {
    match payload.get("user").or_else(|| payload.get("data")) {
      Some(echo) => self.merged(echo),
      None => self.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::intent::ResourceId;

  #[test]
  fn wishlist_targets() {
    let id = ResourceId::wishlist("p1").unwrap();
    let add = MutationIntent::add(id.clone(), Value::Null);
    let remove = MutationIntent::remove(id);

    assert_eq!(WishlistMembership(false).target(&add), WishlistMembership(true));
    assert_eq!(WishlistMembership(true).target(&remove), WishlistMembership(false));
    assert_eq!(WishlistMembership(false).present(), WishlistMembership(true));
  }

  #[test]
  fn cart_targets() {
    let id = ResourceId::cart("p1").unwrap();
    let add_two = MutationIntent::add(id.clone(), json!({ "quantity": 2 }));
    let add_default = MutationIntent::add(id.clone(), Value::Null);
    let set_five = MutationIntent::update(id.clone(), json!({ "quantity": 5 }));
    let remove = MutationIntent::remove(id);

    assert_eq!(CartQuantity(1).target(&add_two), CartQuantity(3));
    assert_eq!(CartQuantity(0).target(&add_default), CartQuantity(1));
    assert_eq!(CartQuantity(1).target(&set_five), CartQuantity(5));
    assert_eq!(CartQuantity(4).target(&remove), CartQuantity(0));
    assert_eq!(CartQuantity(0).present(), CartQuantity(1));
    assert_eq!(CartQuantity(3).present(), CartQuantity(3));
  }

  #[test]
  fn profile_merges_patch_and_confirmation() {
    let base = ProfileDraft(
      json!({ "name": "Mona", "phone": "01010700999" })
        .as_object()
        .cloned()
        .unwrap(),
    );
    let intent = MutationIntent::update(ResourceId::profile(), json!({ "name": "Mona Lisa" }));

    let speculative = base.target(&intent);
    assert_eq!(speculative.0["name"], "Mona Lisa");
    assert_eq!(speculative.0["phone"], "01010700999");

    let confirmed = speculative.confirm(&json!({
      "message": "success",
      "user": { "name": "Mona Lisa", "email": "m@example.com" }
    }));
    assert_eq!(confirmed.0["email"], "m@example.com");

    assert_eq!(confirmed.0.get("message"), None);

    // Bodies without a user echo leave the draft untouched.
    assert_eq!(speculative.confirm(&json!({ "message": "success" })), speculative);
  }
}

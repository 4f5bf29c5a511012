//! One synchronizer per optimistic resource kind, wired to the live API.

use std::sync::Arc;

use serde_json::json;
use storefront_client::{Actions, models::ProfileUpdate};
use storefront_core::{
  intent::{MutationIntent, ResourceId},
  notify::Notifier,
  retry::{PendingRetryRecord, RetryStore},
  session::SessionProvider,
  state::{CartQuantity, ProfileDraft, WishlistMembership},
};
use storefront_sync::{Connectivity, ReplayReport, Services, SyncConfig, Synchronizer, TriggerOutcome};

pub struct App<R> {
  actions:  Arc<Actions>,
  retries:  Arc<R>,
  wishlist: Synchronizer<WishlistMembership, Actions, R>,
  cart:     Synchronizer<CartQuantity, Actions, R>,
  profile:  Synchronizer<ProfileDraft, Actions, R>,
}

impl<R: RetryStore> App<R> {
  pub fn new(
    actions: Actions,
    retries: Arc<R>,
    notifier: Arc<dyn Notifier>,
    session: Arc<dyn SessionProvider>,
    config: SyncConfig,
  ) -> Self {
    let actions = Arc::new(actions);
    let services = Services {
      dispatcher: actions.clone(),
      retries: retries.clone(),
      connectivity: Arc::new(Connectivity::new(notifier.clone())),
      notifier,
      session,
    };
    Self {
      wishlist: Synchronizer::new(services.clone(), config.clone()),
      cart: Synchronizer::new(services.clone(), config.clone()),
      profile: Synchronizer::new(services, config),
      actions,
      retries,
    }
  }

  pub fn actions(&self) -> &Actions { &self.actions }

  // ── Optimistic mutations ──────────────────────────────────────────────────

  pub async fn wishlist(&self, product_id: &str, add: bool) -> anyhow::Result<TriggerOutcome> {
    let id = ResourceId::wishlist(product_id)?;
    match self.actions.wishlist().await {
      Ok(ids) => {
        let present = ids.iter().any(|p| p == product_id);
        self.wishlist.track(id.clone(), WishlistMembership(present));
      }
      Err(e) => tracing::warn!(error = %e, "could not load wishlist; assuming item is absent"),
    }

    let intent = if add {
      MutationIntent::add(id, json!({ "productId": product_id }))
    } else {
      MutationIntent::remove(id)
    };
    Ok(self.wishlist.trigger(intent).await)
  }

  pub async fn cart_add(&self, product_id: &str, quantity: u32) -> anyhow::Result<TriggerOutcome> {
    let id = self.track_cart_line(product_id).await?;
    let intent = MutationIntent::add(id, json!({ "productId": product_id, "quantity": quantity }));
    Ok(self.cart.trigger(intent).await)
  }

  pub async fn cart_set(&self, product_id: &str, quantity: u32) -> anyhow::Result<TriggerOutcome> {
    let id = self.track_cart_line(product_id).await?;
    let intent = MutationIntent::update(id, json!({ "quantity": quantity }));
    Ok(self.cart.trigger(intent).await)
  }

  pub async fn cart_remove(&self, product_id: &str) -> anyhow::Result<TriggerOutcome> {
    let id = self.track_cart_line(product_id).await?;
    Ok(self.cart.trigger(MutationIntent::remove(id)).await)
  }

  async fn track_cart_line(&self, product_id: &str) -> anyhow::Result<ResourceId> {
    let id = ResourceId::cart(product_id)?;
    match self.actions.cart().await {
      Ok(cart) => {
        let quantity = cart.lines.get(product_id).copied().unwrap_or(0);
        self.cart.track(id.clone(), CartQuantity(quantity));
      }
      Err(e) => tracing::warn!(error = %e, "could not load cart; assuming line is empty"),
    }
    Ok(id)
  }

  pub async fn update_profile(&self, update: &ProfileUpdate) -> anyhow::Result<TriggerOutcome> {
    let intent = MutationIntent::update(ResourceId::profile(), serde_json::to_value(update)?);
    Ok(self.profile.trigger(intent).await)
  }

  // ── Retry records ─────────────────────────────────────────────────────────

  pub async fn pending(&self) -> anyhow::Result<Vec<PendingRetryRecord>> {
    self
      .retries
      .list()
      .await
      .map_err(|e| anyhow::anyhow!("failed to list retry records: {e}"))
  }

  /// One replay pass over every optimistic resource kind.
  pub async fn replay(&self) -> ReplayReport {
    let reports = [
      self.wishlist.replay_pending().await,
      self.cart.replay_pending().await,
      self.profile.replay_pending().await,
    ];
    reports.into_iter().fold(ReplayReport::default(), |acc, r| ReplayReport {
      replayed:  acc.replayed + r.replayed,
      confirmed: acc.confirmed + r.confirmed,
      discarded: acc.discarded + r.discarded,
      skipped:   acc.skipped + r.skipped,
    })
  }
}

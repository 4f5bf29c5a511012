//! `storefront`: drive the storefront's optimistic mutations from a
//! terminal.
//!
//! # Usage
//!
//! ```
//! storefront --token $TOKEN wishlist add 6428ebc6dc1175abc65ca0b9
//! storefront --retry-db ~/.storefront/retries.db cart set 6428ebc6 3
//! storefront --retry-db ~/.storefront/retries.db retry
//! ```

mod app;
mod settings;
mod terminal;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use app::App;
use clap::{Parser, Subcommand, ValueEnum};
use settings::Settings;
use storefront_client::{
  Actions, HttpClient,
  actions::token_of,
  models::{Address, Checkout, PasswordChange, PaymentMethod, ProfileUpdate, SignIn, SignUp},
};
use storefront_core::{
  notify::Notifier,
  outcome::ReconciliationResult,
  retry::{MemoryRetryStore, RetryStore},
};
use storefront_store_sqlite::SqliteRetryStore;
use storefront_sync::TriggerOutcome;
use terminal::{ConfiguredSession, TerminalNotifier};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "storefront", version, about = "Optimistic storefront mutations from the terminal")]
struct Cli {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the upstream API.
  #[arg(long)]
  url: Option<String>,

  /// Session token.
  #[arg(long)]
  token: Option<String>,

  /// SQLite file for pending-retry records.
  #[arg(long, value_name = "FILE")]
  retry_db: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Add or remove a wishlist item.
  Wishlist {
    #[command(subcommand)]
    action: WishlistAction,
  },
  /// Change cart lines.
  Cart {
    #[command(subcommand)]
    action: CartAction,
  },
  /// Update profile fields.
  Profile {
    #[arg(long)]
    name:  Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
  },
  /// Save or delete a shipping address.
  Address {
    #[command(subcommand)]
    action: AddressAction,
  },
  /// Place an order for the current cart.
  Checkout {
    #[arg(long, value_enum, default_value_t = Method::Cash)]
    method:     Method,
    /// Address label, e.g. "Home".
    #[arg(long, default_value = "Home")]
    name:       String,
    #[arg(long)]
    details:    String,
    #[arg(long)]
    phone:      String,
    #[arg(long)]
    city:       String,
    /// Where the hosted card page returns to (card payments only).
    #[arg(long)]
    return_url: Option<String>,
  },
  /// Sign in and print the session token.
  Login {
    #[arg(long)]
    email:    String,
    #[arg(long)]
    password: String,
  },
  /// Create an account.
  Signup {
    #[arg(long)]
    name:        String,
    #[arg(long)]
    email:       String,
    #[arg(long)]
    password:    String,
    #[arg(long)]
    re_password: String,
    #[arg(long)]
    phone:       String,
  },
  /// Change or reset the account password.
  Password {
    #[command(subcommand)]
    action: PasswordAction,
  },
  /// List pending-retry records.
  Pending,
  /// Replay every pending-retry record once.
  Retry,
}

#[derive(Subcommand, Debug)]
enum WishlistAction {
  Add { product: String },
  Remove { product: String },
}

#[derive(Subcommand, Debug)]
enum CartAction {
  Add {
    product:  String,
    #[arg(long, default_value_t = 1)]
    quantity: u32,
  },
  Set {
    product:  String,
    quantity: u32,
  },
  Remove {
    product: String,
  },
}

#[derive(Subcommand, Debug)]
enum AddressAction {
  /// Create an address, or update one when `--id` is given.
  Add {
    #[arg(long)]
    id:      Option<String>,
    #[arg(long)]
    name:    String,
    #[arg(long)]
    details: String,
    #[arg(long)]
    phone:   String,
    #[arg(long)]
    city:    String,
  },
  Remove {
    id: String,
  },
}

#[derive(Subcommand, Debug)]
enum PasswordAction {
  Change {
    #[arg(long)]
    current: String,
    #[arg(long)]
    new:     String,
    #[arg(long)]
    confirm: String,
  },
  /// Email a reset code.
  Forgot {
    #[arg(long)]
    email: String,
  },
  Verify {
    code: String,
  },
  Reset {
    #[arg(long)]
    email: String,
    #[arg(long)]
    new:   String,
  },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Method {
  Cash,
  Card,
}

impl From<Method> for PaymentMethod {
  fn from(method: Method) -> Self {
    match method {
      Method::Cash => PaymentMethod::Cash,
      Method::Card => PaymentMethod::Card,
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  // Flags override the config file and environment.
  let mut settings = Settings::load(cli.config.clone())?;
  if let Some(url) = cli.url.clone() {
    settings.base_url = url;
  }
  if let Some(token) = cli.token.clone() {
    settings.token = Some(token);
  }
  if let Some(path) = cli.retry_db.clone() {
    settings.retry_db = Some(path);
  }

  match settings.retry_db.clone() {
    Some(path) => {
      let store = SqliteRetryStore::open(&path)
        .await
        .with_context(|| format!("failed to open retry database at {path:?}"))?;
      run(cli.command, &settings, Arc::new(store)).await
    }
    None => run(cli.command, &settings, Arc::new(MemoryRetryStore::new())).await,
  }
}

async fn run<R: RetryStore>(
  command: Command,
  settings: &Settings,
  retries: Arc<R>,
) -> anyhow::Result<()> {
  let notifier: Arc<dyn Notifier> = Arc::new(TerminalNotifier);
  let session = Arc::new(ConfiguredSession::new(settings.token.clone()));
  let http = HttpClient::new(settings.client_config(), session.clone())?;
  let app = App::new(
    Actions::new(http),
    retries,
    notifier.clone(),
    session,
    settings.sync_config(),
  );

  match command {
    Command::Wishlist { action } => {
      let outcome = match action {
        WishlistAction::Add { product } => app.wishlist(&product, true).await?,
        WishlistAction::Remove { product } => app.wishlist(&product, false).await?,
      };
      report(&outcome);
    }

    Command::Cart { action } => {
      let outcome = match action {
        CartAction::Add { product, quantity } => app.cart_add(&product, quantity).await?,
        CartAction::Set { product, quantity } => app.cart_set(&product, quantity).await?,
        CartAction::Remove { product } => app.cart_remove(&product).await?,
      };
      report(&outcome);
    }

    Command::Profile { name, email, phone } => {
      let outcome = app
        .update_profile(&ProfileUpdate { name, email, phone })
        .await?;
      report(&outcome);
    }

    Command::Address { action } => {
      let result = match action {
        AddressAction::Add { id, name, details, phone, city } => {
          let address = Address { id, name, details, phone, city };
          app.actions().submit_address(&address).await?
        }
        AddressAction::Remove { id } => app.actions().delete_address(&id).await?,
      };
      finish(notifier.as_ref(), &result, "Address saved");
    }

    Command::Checkout { method, name, details, phone, city, return_url } => {
      let cart = app.actions().cart().await.context("failed to load cart")?;
      let cart_id = cart.cart_id.context("the cart is empty")?;
      let checkout = Checkout {
        cart_id,
        address: Address { id: None, name, details, phone, city },
        method: method.into(),
        return_url,
      };
      let result = app.actions().checkout(&checkout).await?;
      // Card payments answer with a hosted payment page.
      let session_url = match &result {
        ReconciliationResult::Success(body) => body.pointer("/session/url").and_then(|u| u.as_str()),
        _ => None,
      };
      if let Some(url) = session_url {
        println!("{url}");
      }
      finish(notifier.as_ref(), &result, "Order placed");
    }

    Command::Login { email, password } => {
      let result = app.actions().sign_in(&SignIn { email, password }).await?;
      match token_of(&result) {
        Some(token) => println!("{token}"),
        None => finish(notifier.as_ref(), &result, "Signed in"),
      }
    }

    Command::Signup { name, email, password, re_password, phone } => {
      let account = SignUp { name, email, password, re_password, phone };
      let result = app.actions().sign_up(&account).await?;
      finish(notifier.as_ref(), &result, "Account created");
    }

    Command::Password { action } => {
      let (result, done) = match action {
        PasswordAction::Change { current, new, confirm } => {
          let change = PasswordChange {
            current_password: current,
            password:         new,
            re_password:      confirm,
          };
          (app.actions().change_password(&change).await?, "Password changed")
        }
        PasswordAction::Forgot { email } => {
          (app.actions().forgot_password(&email).await?, "Reset code sent")
        }
        PasswordAction::Verify { code } => {
          (app.actions().verify_reset_code(&code).await?, "Code verified")
        }
        PasswordAction::Reset { email, new } => {
          (app.actions().reset_password(&email, &new).await?, "Password reset")
        }
      };
      finish(notifier.as_ref(), &result, done);
    }

    Command::Pending => {
      for record in app.pending().await? {
        println!(
          "{}\t{}\t{}\treplays={}",
          record.resource_id,
          record.intent.kind(),
          record.timestamp.to_rfc3339(),
          record.replays
        );
      }
    }

    Command::Retry => {
      let report = app.replay().await;
      println!(
        "replayed {} (confirmed {}), discarded {}, skipped {}",
        report.replayed, report.confirmed, report.discarded, report.skipped
      );
    }
  }

  Ok(())
}

fn report(outcome: &TriggerOutcome) {
  tracing::debug!(?outcome, "trigger finished");
}

/// Notify the user of a direct (non-optimistic) action's result.
fn finish(notifier: &dyn Notifier, result: &ReconciliationResult, done: &str) {
  use storefront_core::notify::Notification;

  let notification = match result {
    ReconciliationResult::Success(_) => Notification::success(done),
    ReconciliationResult::Invalid(e) => Notification::error(e.to_string()),
    ReconciliationResult::UnknownFailure(Some(message)) => Notification::error(message.clone()),
    other => Notification::error(format!("Request failed: {other}")),
  };
  notifier.notify(notification);
}

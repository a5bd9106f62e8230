//! Async LinkIO SDK.
//!
//! Wraps the synchronous core from `linkio-core` with the backend calls:
//! deferred-link lookup and referral reporting over reqwest.
//!
//! # Example
//! ```rust,no_run
//! use linkio_core::{RedbStore, SdkConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> linkio_core::Result<()> {
//!     let store = Arc::new(RedbStore::open("./data/linkio.redb")?);
//!     let config = SdkConfig::new("example.com", "https://api.example.com");
//!     let linkio = linkio_client::configure(config, store)?;
//!
//!     linkio.set_deep_link_handler(|link| println!("route to {}", link.url));
//!     linkio.on_app_foreground();
//!
//!     let accepted = linkio.track_referral_now("FRIEND10", "user-42", None).await;
//!     println!("referral accepted: {}", accepted);
//!     Ok(())
//! }
//! ```

mod global;
mod referral;
mod resolver;
mod sdk;

pub use global::{configure, instance};
pub use referral::ReferralReporter;
pub use resolver::PendingLinkResolver;
pub use sdk::{LinkIo, PendingOutcome, ReferralCallback};

/// Re-export the core crate for callers that only depend on the client.
pub use linkio_core as core;

//! Core of the LinkIO deep-link SDK.
//!
//! Everything here is synchronous: link classification, device identity,
//! persistence, and the delivery state machine. Networking and the public
//! SDK instance live in `linkio-client`.

pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod identity;
pub mod storage;
pub mod types;

pub use classifier::classify;
pub use config::SdkConfig;
pub use dispatcher::{DeepLinkDispatcher, DeepLinkHandler, Delivery, DispatcherState};
pub use error::{LinkIoError, Result};
pub use identity::{DeviceIdentity, DEVICE_ID_KEY, PREFS_NAMESPACE};
pub use storage::{MemoryStore, RedbStore, Store};
pub use types::DeepLink;

//! Delivery state machine for deep links.
//!
//! The dispatcher owns exactly one handler slot and one buffered-link slot,
//! modelled as a single tagged state:
//!
//! - `Idle`: no handler, nothing buffered
//! - `Buffered(link)`: a link arrived before any handler was registered
//! - `Delivering(handler)`: links go straight to the handler
//!
//! All transitions happen under one mutex. Handlers are invoked after the
//! lock is released, so a handler may call back into the SDK. A buffered
//! link is moved out of the state under the lock, which is what makes
//! delivery exactly-once when registration races with link arrival.

use crate::types::DeepLink;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Host callback that receives resolved deep links.
pub type DeepLinkHandler = Arc<dyn Fn(DeepLink) + Send + Sync>;

#[derive(Default)]
enum DeliveryState {
    #[default]
    Idle,
    Buffered(DeepLink),
    Delivering(DeepLinkHandler),
}

/// Read-only view of the dispatcher state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    Buffered(DeepLink),
    Delivering,
}

/// What `on_link_produced` did with a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the registered handler.
    Delivered,
    /// Stored for the next handler. `replaced` is true when an older
    /// buffered link was overwritten.
    Buffered { replaced: bool },
}

#[derive(Default)]
pub struct DeepLinkDispatcher {
    state: Mutex<DeliveryState>,
}

impl fmt::Debug for DeepLinkDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepLinkDispatcher")
            .field("state", &self.state())
            .finish()
    }
}

impl DeepLinkDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DeliveryState> {
        // Every transition is a single assignment, so a poisoned guard still holds a valid state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver `link` to the handler, or buffer it if none is registered.
    ///
    /// Only one link is ever buffered: a newer link overwrites an older one.
    pub fn on_link_produced(&self, link: DeepLink) -> Delivery {
        let mut state = self.lock();

        let handler = match &*state {
            DeliveryState::Delivering(handler) => Some(handler.clone()),
            _ => None,
        };

        if let Some(handler) = handler {
            drop(state);
            log::debug!("Delivering deep link {} (deferred={})", link.url, link.is_deferred);
            handler(link);
            return Delivery::Delivered;
        }

        let replaced = matches!(*state, DeliveryState::Buffered(_));
        if replaced {
            log::debug!("Replacing buffered deep link with {}", link.url);
        } else {
            log::debug!("No handler registered, buffering deep link {}", link.url);
        }
        *state = DeliveryState::Buffered(link);
        Delivery::Buffered { replaced }
    }

    /// Install `handler`, replacing any previous one.
    ///
    /// A buffered link is delivered to the new handler before this returns,
    /// and the buffer is cleared. Returns whether such a link was delivered.
    pub fn register_handler<F>(&self, handler: F) -> bool
    where
        F: Fn(DeepLink) + Send + Sync + 'static,
    {
        self.register_shared_handler(Arc::new(handler))
    }

    /// Same as [`register_handler`](Self::register_handler) for an already shared handler.
    pub fn register_shared_handler(&self, handler: DeepLinkHandler) -> bool {
        let previous = {
            let mut state = self.lock();
            std::mem::replace(&mut *state, DeliveryState::Delivering(handler.clone()))
        };

        match previous {
            DeliveryState::Buffered(link) => {
                log::debug!("Handler registered, flushing buffered deep link {}", link.url);
                handler(link);
                true
            }
            _ => false,
        }
    }

    pub fn state(&self) -> DispatcherState {
        match &*self.lock() {
            DeliveryState::Idle => DispatcherState::Idle,
            DeliveryState::Buffered(link) => DispatcherState::Buffered(link.clone()),
            DeliveryState::Delivering(_) => DispatcherState::Delivering,
        }
    }

    pub fn has_handler(&self) -> bool {
        matches!(*self.lock(), DeliveryState::Delivering(_))
    }
}

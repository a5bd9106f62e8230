use crate::referral::ReferralReporter;
use crate::resolver::PendingLinkResolver;
use linkio_core::{
    classify, DeepLink, DeepLinkDispatcher, Delivery, DeviceIdentity, LinkIoError, Result,
    SdkConfig, Store,
};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Completion callback for [`LinkIo::track_referral`].
pub type ReferralCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// Result of a pending (deferred) link check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOutcome {
    /// A link was found and handed to the registered handler.
    Delivered(DeepLink),
    /// A link was found and buffered until a handler is registered.
    Buffered(DeepLink),
    /// The backend had nothing for this device, or the lookup failed.
    NoPendingLink,
    /// Another check was still running; no request was made.
    AlreadyInFlight,
}

/// A configured LinkIO SDK instance.
///
/// Construct one explicitly with [`LinkIo::new`] and pass it around, or use
/// [`crate::configure`] / [`crate::instance`] for a process-wide one.
///
/// # Example
/// ```rust,no_run
/// use linkio_client::LinkIo;
/// use linkio_core::{MemoryStore, SdkConfig};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> linkio_core::Result<()> {
///     let config = SdkConfig::new("example.com", "https://api.example.com");
///     let linkio = LinkIo::new(config, Arc::new(MemoryStore::new()))?;
///
///     linkio.set_deep_link_handler(|link| println!("open {}", link.url));
///     linkio.handle_deep_link(Some("https://www.example.com/promo?ref=abc"));
///     linkio.check_pending_link_now().await;
///     Ok(())
/// }
/// ```
pub struct LinkIo {
    config: Arc<SdkConfig>,
    store: Arc<dyn Store>,
    dispatcher: Arc<DeepLinkDispatcher>,
    resolver: PendingLinkResolver,
    reporter: ReferralReporter,
    pending_in_flight: Arc<AtomicBool>,
}

impl LinkIo {
    /// Validate `config` and build an instance backed by `store`.
    pub fn new(config: SdkConfig, store: Arc<dyn Store>) -> Result<Self> {
        let config = Arc::new(config.validate()?);

        let http = reqwest::Client::builder()
            .connect_timeout(config.request_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| LinkIoError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(Self {
            resolver: PendingLinkResolver::new(http.clone(), config.clone()),
            reporter: ReferralReporter::new(http, config.clone()),
            config,
            store,
            dispatcher: Arc::new(DeepLinkDispatcher::new()),
            pending_in_flight: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &DeepLinkDispatcher {
        &self.dispatcher
    }

    /// Direct navigation entry point.
    ///
    /// Returns `true` if the URI belongs to this app; the link is then
    /// delivered or buffered. Foreign or malformed URIs return `false` and
    /// leave the dispatcher untouched.
    pub fn handle_deep_link(&self, uri: Option<&str>) -> bool {
        match classify(uri, &self.config) {
            Some(link) => {
                self.dispatcher.on_link_produced(link);
                true
            }
            None => false,
        }
    }

    /// Register the host's handler. A buffered link is delivered right away.
    pub fn set_deep_link_handler<F>(&self, handler: F)
    where
        F: Fn(DeepLink) + Send + Sync + 'static,
    {
        self.dispatcher.register_handler(handler);
    }

    /// The persisted device id, created on first call.
    pub fn device_id(&self) -> Result<String> {
        DeviceIdentity::get_or_create(self.store.as_ref())
    }

    /// Start a deferred-link check in the background.
    ///
    /// Must be called from within a tokio runtime; otherwise returns
    /// [`LinkIoError::NoRuntime`].
    pub fn check_pending_link(&self) -> Result<JoinHandle<PendingOutcome>> {
        let handle = Handle::try_current().map_err(|_| LinkIoError::NoRuntime)?;
        let check = self.pending_check();
        Ok(handle.spawn(check.run()))
    }

    /// Run a deferred-link check and wait for it.
    pub async fn check_pending_link_now(&self) -> PendingOutcome {
        self.pending_check().run().await
    }

    /// Lifecycle hook for the host's foreground/start signal.
    ///
    /// Starts a pending-link check when `auto_check_pending_links` is on.
    pub fn on_app_foreground(&self) -> Option<JoinHandle<PendingOutcome>> {
        if !self.config.auto_check_pending_links {
            return None;
        }
        match self.check_pending_link() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Skipping pending link check: {}", e);
                None
            }
        }
    }

    /// Report a referral in the background. `callback` receives `true` iff
    /// the backend accepted the event.
    pub fn track_referral(
        &self,
        referral_code: impl Into<String>,
        user_id: impl Into<String>,
        metadata: Option<Value>,
        callback: Option<ReferralCallback>,
    ) -> Result<JoinHandle<bool>> {
        let handle = Handle::try_current().map_err(|_| LinkIoError::NoRuntime)?;
        let reporter = self.reporter.clone();
        let referral_code = referral_code.into();
        let user_id = user_id.into();

        Ok(handle.spawn(async move {
            let success = reporter.report(&referral_code, &user_id, metadata).await;
            if let Some(callback) = callback {
                callback(success);
            }
            success
        }))
    }

    /// Report a referral and wait for the result.
    pub async fn track_referral_now(
        &self,
        referral_code: &str,
        user_id: &str,
        metadata: Option<Value>,
    ) -> bool {
        self.reporter.report(referral_code, user_id, metadata).await
    }

    fn pending_check(&self) -> PendingCheck {
        PendingCheck {
            store: self.store.clone(),
            dispatcher: self.dispatcher.clone(),
            resolver: self.resolver.clone(),
            in_flight: self
                .config
                .coalesce_pending_checks
                .then(|| self.pending_in_flight.clone()),
        }
    }
}

/// Owned state for one pending-link check, so it can run on a spawned task.
struct PendingCheck {
    store: Arc<dyn Store>,
    dispatcher: Arc<DeepLinkDispatcher>,
    resolver: PendingLinkResolver,
    in_flight: Option<Arc<AtomicBool>>,
}

/// Clears the in-flight flag when the check finishes or its task is dropped.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PendingCheck {
    async fn run(self) -> PendingOutcome {
        let _guard = match &self.in_flight {
            Some(flag) => {
                if flag
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    debug!("Pending link check already in flight");
                    return PendingOutcome::AlreadyInFlight;
                }
                Some(InFlightGuard(flag.clone()))
            }
            None => None,
        };

        // Store writes block (redb fsyncs on commit); keep them off the async workers.
        let store = self.store.clone();
        let device_id =
            match tokio::task::spawn_blocking(move || DeviceIdentity::get_or_create(store.as_ref()))
                .await
            {
                Ok(Ok(id)) => id,
                Ok(Err(e)) => {
                    warn!("Cannot resolve device id, skipping pending link check: {}", e);
                    return PendingOutcome::NoPendingLink;
                }
                Err(e) => {
                    warn!("Device id lookup task failed: {}", e);
                    return PendingOutcome::NoPendingLink;
                }
            };

        let Some(link) = self.resolver.fetch_pending_link(&device_id).await else {
            return PendingOutcome::NoPendingLink;
        };

        match self.dispatcher.on_link_produced(link.clone()) {
            Delivery::Delivered => PendingOutcome::Delivered(link),
            Delivery::Buffered { replaced } => {
                if replaced {
                    debug!("Deferred link superseded a buffered link");
                }
                PendingOutcome::Buffered(link)
            }
        }
    }
}

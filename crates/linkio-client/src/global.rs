//! Process-wide SDK instance with init-once, read-many lifecycle.

use crate::sdk::LinkIo;
use linkio_core::{LinkIoError, Result, SdkConfig, Store};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

static INSTANCE: OnceLock<LinkIo> = OnceLock::new();

/// Initialize the process-wide instance, or return the existing one.
///
/// Idempotent: once an instance exists, later calls return it and their
/// `config` and `store` are ignored. An invalid config leaves the cell empty.
pub fn configure(config: SdkConfig, store: Arc<dyn Store>) -> Result<&'static LinkIo> {
    if let Some(existing) = INSTANCE.get() {
        debug!("LinkIO already configured, ignoring new config");
        return Ok(existing);
    }

    let linkio = LinkIo::new(config, store)?;
    let instance = INSTANCE.get_or_init(|| {
        info!("LinkIO configured for domain {}", linkio.config().domain);
        linkio
    });
    Ok(instance)
}

/// The process-wide instance. Fails with `NotConfigured` before [`configure`].
pub fn instance() -> Result<&'static LinkIo> {
    INSTANCE.get().ok_or(LinkIoError::NotConfigured)
}

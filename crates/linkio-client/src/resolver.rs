use linkio_core::{DeepLink, SdkConfig};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fetches the deferred deep link recorded for a device, if any.
///
/// Every failure mode resolves to `None`: most devices simply have no
/// pending link, and a broken backend must never surface in the host app.
#[derive(Clone)]
pub struct PendingLinkResolver {
    http: reqwest::Client,
    config: Arc<SdkConfig>,
}

impl PendingLinkResolver {
    pub fn new(http: reqwest::Client, config: Arc<SdkConfig>) -> Self {
        Self { http, config }
    }

    /// `GET {backend}/api/pending-link/{device_id}`. One request per call.
    pub async fn fetch_pending_link(&self, device_id: &str) -> Option<DeepLink> {
        let url = self.config.pending_link_url(device_id);

        let resp = match self.http.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                debug!("Pending link request failed: {}", e);
                return None;
            }
        };

        if !resp.status().is_success() {
            debug!("No pending link (status {})", resp.status());
            return None;
        }

        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!("Failed to read pending link body: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<DeepLink>(&body) {
            Ok(mut link) => {
                link.is_deferred = true;
                Some(link)
            }
            Err(e) => {
                warn!("Discarding malformed pending link payload: {}", e);
                None
            }
        }
    }
}

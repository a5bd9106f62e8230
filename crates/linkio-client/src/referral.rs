use linkio_core::SdkConfig;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackReferralRequest<'a> {
    referral_code: &'a str,
    user_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Map<String, Value>>,
}

/// Reports referral attribution events to the backend.
#[derive(Clone)]
pub struct ReferralReporter {
    http: reqwest::Client,
    config: Arc<SdkConfig>,
}

impl ReferralReporter {
    pub fn new(http: reqwest::Client, config: Arc<SdkConfig>) -> Self {
        Self { http, config }
    }

    /// `POST {backend}/api/track-referral`.
    ///
    /// Returns `true` iff the backend answered 2xx. Transport failures,
    /// timeouts and non-success statuses return `false`, as does metadata
    /// that is not a JSON object (no request is sent in that case).
    pub async fn report(&self, referral_code: &str, user_id: &str, metadata: Option<Value>) -> bool {
        let metadata = match metadata {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map),
            Some(other) => {
                warn!("Referral metadata must be a JSON object, got {}", other);
                return false;
            }
        };

        let body = TrackReferralRequest {
            referral_code,
            user_id,
            metadata,
        };

        match self
            .http
            .post(self.config.track_referral_url())
            .json(&body)
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                debug!("Referral {} tracked for user {}", referral_code, user_id);
                true
            }
            Ok(resp) => {
                warn!("Referral tracking rejected with status {}", resp.status());
                false
            }
            Err(e) => {
                warn!("Referral tracking request failed: {}", e);
                false
            }
        }
    }
}

//! Maps raw navigation URIs onto [`DeepLink`] records.
//!
//! Classification is pure: no I/O, no shared state.

use crate::config::SdkConfig;
use crate::types::DeepLink;
use std::collections::HashMap;
use url::Url;

/// Classify a navigation URI against the configured domain.
///
/// Returns `None` when the URI is absent, unparseable, has no host, or the
/// host is neither `domain` nor `www.` + `domain`. When `app_scheme` is
/// configured, URIs using that custom scheme match regardless of host;
/// `http` and `https` URIs are always held to the domain check.
///
/// Every query parameter is copied into `params`; if a key repeats, the
/// last value wins.
pub fn classify(uri: Option<&str>, config: &SdkConfig) -> Option<DeepLink> {
    let raw = uri?.trim();
    let parsed = Url::parse(raw).ok()?;

    if !matches_app_scheme(&parsed, config) {
        let host = parsed.host_str()?;
        if !host_matches(host, &config.domain) {
            return None;
        }
    }

    let params: HashMap<String, String> = parsed
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    Some(DeepLink::new(raw, params, false))
}

fn matches_app_scheme(uri: &Url, config: &SdkConfig) -> bool {
    if is_web_scheme(uri.scheme()) {
        return false;
    }
    config
        .app_scheme
        .as_deref()
        .is_some_and(|scheme| uri.scheme().eq_ignore_ascii_case(scheme))
}

fn is_web_scheme(scheme: &str) -> bool {
    scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")
}

fn host_matches(host: &str, domain: &str) -> bool {
    if host.eq_ignore_ascii_case(domain) {
        return true;
    }
    match host.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("www.") => {
            host[4..].eq_ignore_ascii_case(domain)
        }
        _ => false,
    }
}

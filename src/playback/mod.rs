use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::GatewayError;
use crate::gateway::Gateway;

/// Signed, time-limited media URL for one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackLink {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Wire shape of `GET /videos/{id}/playback`.
#[derive(Debug, Deserialize)]
pub struct PlaybackResponse {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl PlaybackLink {
    /// Build a link from the wire response. A missing or blank URL means the
    /// media is unavailable. Expiry is the backend's `expires_in` if given,
    /// otherwise `default_ttl_secs` from fetch time.
    pub fn from_response(
        resp: PlaybackResponse,
        fetched_at: DateTime<Utc>,
        default_ttl_secs: i64,
    ) -> Option<Self> {
        let url = resp.url.filter(|u| !u.trim().is_empty())?;
        let expires_at = resp
            .expires_in
            .filter(|s| *s > 0)
            .and_then(|ttl| expiry(fetched_at, ttl))
            .or_else(|| expiry(fetched_at, default_ttl_secs))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Some(Self {
            url,
            fetched_at,
            expires_at,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// `None` when the offset is not positive or overflows the calendar.
fn expiry(from: DateTime<Utc>, ttl_secs: i64) -> Option<DateTime<Utc>> {
    if ttl_secs <= 0 {
        return None;
    }
    Duration::try_seconds(ttl_secs).and_then(|d| from.checked_add_signed(d))
}

/// Holds the link of the item currently on screen, and nothing else.
///
/// Every `fetch` goes to the backend. The cached link is only handed back for
/// the same item and before it expires; it is never refreshed proactively.
#[derive(Debug, Default)]
pub struct PlaybackLinkCache {
    current: Option<(String, PlaybackLink)>,
}

impl PlaybackLinkCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh link for `item_id`, replacing whatever was held.
    ///
    /// Unavailable media and request failures both yield `None`: the caller
    /// just omits the playback control.
    pub async fn fetch<G: Gateway + ?Sized>(
        &mut self,
        gateway: &G,
        item_id: &str,
    ) -> Option<&PlaybackLink> {
        let result = gateway.get_playback_link(item_id).await;
        self.store(item_id, result)
    }

    /// Record the outcome of a playback request made elsewhere.
    pub fn store(
        &mut self,
        item_id: &str,
        result: Result<Option<PlaybackLink>, GatewayError>,
    ) -> Option<&PlaybackLink> {
        self.current = None;
        match result {
            Ok(Some(link)) => {
                debug!(item_id, expires_at = %link.expires_at, "Playback link fetched");
                self.current = Some((item_id.to_string(), link));
            }
            Ok(None) => debug!(item_id, "No playback media for item"),
            Err(e) => warn!(item_id, error = %e, "Playback link unavailable"),
        }
        self.current.as_ref().map(|(_, link)| link)
    }

    /// Held link, if it belongs to `item_id` and has not expired at `now`.
    pub fn current(&self, item_id: &str, now: DateTime<Utc>) -> Option<&PlaybackLink> {
        self.current
            .as_ref()
            .filter(|(id, link)| id == item_id && !link.is_expired(now))
            .map(|(_, link)| link)
    }

    /// Drop the held link when the view goes away.
    pub fn teardown(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_expiry_from_backend_or_default() {
        let link = PlaybackLink::from_response(
            PlaybackResponse { url: Some("https://m/x".into()), expires_in: Some(60) },
            at(0),
            3600,
        )
        .unwrap();
        assert_eq!(link.expires_at, at(60));
        assert!(!link.is_expired(at(59)));
        assert!(link.is_expired(at(60)));

        let link = PlaybackLink::from_response(
            PlaybackResponse { url: Some("https://m/x".into()), expires_in: None },
            at(0),
            3600,
        )
        .unwrap();
        assert_eq!(link.expires_at, at(3600));
    }

    #[test]
    fn test_oversized_expires_in_falls_back_to_default() {
        for huge in [i64::MAX, 1_000_000_000_000_000] {
            let link = PlaybackLink::from_response(
                PlaybackResponse { url: Some("https://m/x".into()), expires_in: Some(huge) },
                at(0),
                3600,
            )
            .unwrap();
            assert_eq!(link.expires_at, at(3600));
        }
    }

    #[test]
    fn test_oversized_default_ttl_saturates() {
        let link = PlaybackLink::from_response(
            PlaybackResponse { url: Some("https://m/x".into()), expires_in: Some(i64::MAX) },
            at(0),
            i64::MAX,
        )
        .unwrap();
        assert_eq!(link.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(!link.is_expired(at(1_000_000_000)));
    }

    #[test]
    fn test_blank_url_is_unavailable() {
        assert!(PlaybackLink::from_response(PlaybackResponse { url: Some(" ".into()), expires_in: None }, at(0), 10).is_none());
        assert!(PlaybackLink::from_response(PlaybackResponse { url: None, expires_in: Some(5) }, at(0), 10).is_none());
    }

    #[test]
    fn test_current_is_scoped_to_item_and_expiry() {
        let link = PlaybackLink {
            url: "https://m/x".into(),
            fetched_at: at(0),
            expires_at: at(100),
        };
        let mut cache = PlaybackLinkCache {
            current: Some(("v1".to_string(), link)),
        };
        assert!(cache.current("v1", at(10)).is_some());
        assert!(cache.current("v2", at(10)).is_none());
        assert!(cache.current("v1", at(100)).is_none());

        cache.teardown();
        assert!(cache.current("v1", at(10)).is_none());
    }
}

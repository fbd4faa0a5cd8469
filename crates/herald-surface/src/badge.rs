//! Unread-count badge.
//!
//! The count is only ever replaced by an authoritative value from the
//! backend (explicit fetch, list envelope or mutation ack). Toast arrivals
//! never touch it, and a failed fetch keeps the last known value.

use serde::Serialize;
use tracing::{debug, warn};

use herald_core::{defaults, NotificationApi, Result};

/// Rendered badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeView {
    pub visible: bool,
    pub label: String,
}

/// Capped badge label; `None` when the badge is hidden.
pub fn badge_label(count: u64) -> Option<String> {
    match count {
        0 => None,
        n if n > defaults::BADGE_DISPLAY_CAP => Some(format!("{}+", defaults::BADGE_DISPLAY_CAP)),
        n => Some(n.to_string()),
    }
}

#[derive(Debug, Clone, Default)]
pub struct BadgeReconciler {
    count: u64,
    synced: bool,
}

impl BadgeReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Whether at least one authoritative value has been applied.
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Fetch the authoritative count and apply it.
    ///
    /// On failure the current value is kept and the error returned for
    /// logging; it is never shown to the user.
    pub async fn reconcile<A>(&mut self, api: &A) -> Result<u64>
    where
        A: NotificationApi + ?Sized,
    {
        let fetched = api.unread_count().await;
        self.settle(fetched)
    }

    /// Apply the outcome of an unread-count fetch made elsewhere.
    pub fn settle(&mut self, fetched: Result<u64>) -> Result<u64> {
        match fetched {
            Ok(count) => {
                self.apply(count);
                Ok(count)
            }
            Err(e) => {
                warn!(
                    component = "badge",
                    error = %e,
                    kept = self.count,
                    "Unread count fetch failed, keeping last value"
                );
                Err(e)
            }
        }
    }

    /// Apply an authoritative count from any successful response.
    pub fn apply(&mut self, count: u64) {
        if count != self.count {
            debug!(component = "badge", from = self.count, to = count, "Unread count changed");
        }
        self.count = count;
        self.synced = true;
    }

    pub fn view(&self) -> BadgeView {
        match badge_label(self.count) {
            Some(label) => BadgeView {
                visible: true,
                label,
            },
            None => BadgeView {
                visible: false,
                label: String::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::FakeNotifications;
    use herald_core::Error;

    #[test]
    fn test_label_caps_at_99() {
        assert_eq!(badge_label(0), None);
        assert_eq!(badge_label(1).as_deref(), Some("1"));
        assert_eq!(badge_label(99).as_deref(), Some("99"));
        assert_eq!(badge_label(100).as_deref(), Some("99+"));
        assert_eq!(badge_label(12_345).as_deref(), Some("99+"));
    }

    #[test]
    fn test_view_never_mutates_count() {
        let mut badge = BadgeReconciler::new();
        badge.apply(250);
        assert_eq!(badge.view().label, "99+");
        assert_eq!(badge.count(), 250);
        badge.apply(0);
        assert!(!badge.view().visible);
    }

    #[tokio::test]
    async fn test_reconcile_applies_fetched_value() {
        let api = FakeNotifications::default();
        api.set_unread(Ok(7));
        let mut badge = BadgeReconciler::new();
        assert_eq!(badge.reconcile(&api).await.unwrap(), 7);
        assert_eq!(badge.count(), 7);
        assert!(badge.is_synced());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_value() {
        let api = FakeNotifications::default();
        let mut badge = BadgeReconciler::new();
        badge.apply(4);

        api.set_unread(Err(Error::Request("connection refused".into())));
        assert!(badge.reconcile(&api).await.is_err());
        assert_eq!(badge.count(), 4);

        api.set_unread(Err(Error::Rejected("Acesso negado".into())));
        assert!(badge.reconcile(&api).await.is_err());
        assert_eq!(badge.count(), 4);

        api.set_unread(Ok(2));
        badge.reconcile(&api).await.unwrap();
        assert_eq!(badge.count(), 2);
    }
}

//! Centralized default constants for herald.
//!
//! **This module is the single source of truth** for shared default values.
//! Config structs, the surface loop and the CLI reference these constants
//! instead of defining their own magic numbers.

// =============================================================================
// TOASTS
// =============================================================================

/// Maximum number of live toasts before the oldest is evicted.
pub const TOAST_CAPACITY: usize = 5;

/// How long a toast stays on screen before dismissing itself.
pub const TOAST_DISPLAY_TIMEOUT_MS: u64 = 5_000;

/// Exit-animation delay between marking a toast hidden and removing it.
pub const TOAST_DISMISS_DELAY_MS: u64 = 300;

/// Delay before a freshly created toast becomes visible (entry animation tick).
pub const TOAST_SHOW_DELAY_MS: u64 = 10;

// =============================================================================
// BADGE
// =============================================================================

/// Unread-count poll interval.
pub const BADGE_POLL_INTERVAL_SECS: u64 = 60;

/// Largest count rendered literally; anything above shows as `"99+"`.
pub const BADGE_DISPLAY_CAP: u64 = 99;

// =============================================================================
// PAGINATION
// =============================================================================

/// Page size for the notification list.
pub const NOTIFICATION_PAGE_SIZE: u32 = 20;

/// Page size for the audit log list.
pub const ADMIN_LOG_PAGE_SIZE: u32 = 50;

/// Periodic refresh of the open notification list.
pub const LIST_REFRESH_INTERVAL_SECS: u64 = 30;

// =============================================================================
// BACKUPS
// =============================================================================

/// Default number of recent backups kept by cleanup.
pub const BACKUP_KEEP_COUNT: u32 = 10;

/// Default age window (days) kept by cleanup.
pub const BACKUP_KEEP_DAYS: u32 = 30;

// =============================================================================
// SERVER / CONNECTION
// =============================================================================

/// Default backend base URL.
pub const SERVER_URL: &str = "http://127.0.0.1:5000";

/// HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Fixed delay before re-opening a dropped push connection.
pub const RECONNECT_DELAY_MS: u64 = 1_000;

/// Socket.IO handshake path.
pub const SOCKET_IO_PATH: &str = "/socket.io/";

/// Header carrying the CSRF token on mutating requests.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Broadcast channel capacity for connection and toast events.
pub const EVENT_BUS_CAPACITY: usize = 256;

// =============================================================================
// PRESENTATION
// =============================================================================

/// Viewport width at or below which the sidebar runs in mobile mode.
pub const MOBILE_BREAKPOINT_PX: u32 = 768;

/// File name of the persisted preferences inside the config directory.
pub const PREFERENCES_FILE: &str = "preferences.json";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_lifetime_bound() {
        // A never-touched toast is gone 5.3s after creation.
        assert_eq!(TOAST_DISPLAY_TIMEOUT_MS + TOAST_DISMISS_DELAY_MS, 5_300);
        assert!(TOAST_SHOW_DELAY_MS < TOAST_DISPLAY_TIMEOUT_MS);
    }

    #[test]
    fn test_page_sizes_nonzero() {
        assert!(NOTIFICATION_PAGE_SIZE > 0);
        assert!(ADMIN_LOG_PAGE_SIZE > 0);
    }
}

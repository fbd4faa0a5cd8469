//! Structured logging field name constants for herald.
//!
//! All crates use these names for `tracing` fields so log output can be
//! filtered consistently regardless of which component emitted it.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Surface cannot continue a loop iteration |
//! | WARN  | Recoverable issue, last known state kept (badge, list) |
//! | INFO  | Lifecycle events (connect, disconnect, startup, shutdown) |
//! | DEBUG | Decision points: evictions, stale responses, room joins |
//! | TRACE | Per-frame and per-tick activity |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Component emitting the event.
/// Values: "connection", "toast", "badge", "list", "backup", "admin_logs", "sidebar"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "reconcile", "load", "mark_read", "restore"
pub const OPERATION: &str = "op";

/// Authenticated user id joined to the push channel.
pub const USER_ID: &str = "user_id";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Notification record id.
pub const NOTIFICATION_ID: &str = "notification_id";

/// Toast handle id.
pub const TOAST_ID: &str = "toast_id";

/// Backup id.
pub const BACKUP_ID: &str = "backup_id";

/// Audit log entry id.
pub const LOG_ID: &str = "log_id";

// ─── Push fields ───────────────────────────────────────────────────────────

/// Push channel name ("notification", "admin_notification").
pub const CHANNEL: &str = "channel";

/// Push event kind ("success", "info", ...).
pub const KIND: &str = "kind";

/// Socket.IO session id.
pub const SID: &str = "sid";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of records returned by a list call.
pub const RESULT_COUNT: &str = "result_count";

/// Unread count reported by the backend.
pub const UNREAD_COUNT: &str = "unread_count";

/// Monotonic list-load sequence number.
pub const SEQUENCE: &str = "seq";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_names_unique_snake_case() {
        let fields = [
            COMPONENT,
            OPERATION,
            USER_ID,
            NOTIFICATION_ID,
            TOAST_ID,
            BACKUP_ID,
            LOG_ID,
            CHANNEL,
            KIND,
            SID,
            DURATION_MS,
            RESULT_COUNT,
            UNREAD_COUNT,
            SEQUENCE,
            SUCCESS,
            ERROR_MSG,
        ];
        let unique: HashSet<_> = fields.iter().collect();
        assert_eq!(unique.len(), fields.len());
        for field in fields {
            assert!(field
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }
}

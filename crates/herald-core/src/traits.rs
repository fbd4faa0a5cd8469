//! Core traits for herald abstractions.
//!
//! The surface and panels depend on these traits rather than on the HTTP
//! client, so they can be driven against in-memory fakes in tests.

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// BACKEND APIS
// =============================================================================

/// Notification endpoints used by the badge and the list view.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Fetch one server-filtered, server-paginated window.
    async fn list(&self, filter: ListFilter, page: u32, per_page: u32) -> Result<NotificationPage>;

    /// Authoritative unread count.
    async fn unread_count(&self) -> Result<u64>;

    async fn mark_read(&self, id: i64) -> Result<ActionAck>;

    async fn mark_unread(&self, id: i64) -> Result<ActionAck>;

    async fn delete(&self, id: i64) -> Result<ActionAck>;

    async fn mark_all_read(&self) -> Result<ActionAck>;

    async fn clear_read(&self) -> Result<ActionAck>;
}

/// Backup administration endpoints.
#[async_trait]
pub trait BackupApi: Send + Sync {
    async fn list_backups(&self) -> Result<BackupListing>;

    async fn create_backup(&self, notes: Option<&str>) -> Result<BackupRecord>;

    async fn validate_backup(&self, id: i64) -> Result<BackupValidation>;

    async fn restore_backup(&self, id: i64) -> Result<RestoreOutcome>;

    async fn delete_backup(&self, id: i64) -> Result<()>;

    /// Returns the number of backups removed.
    async fn cleanup_backups(&self, policy: CleanupPolicy) -> Result<u64>;

    /// URL the browser would navigate to for the file download.
    fn download_url(&self, id: i64) -> String;

    /// Stream the backup file to `dest`, returning the number of bytes written.
    async fn download_backup(&self, id: i64, dest: &Path) -> Result<u64>;
}

/// Audit log endpoints.
#[async_trait]
pub trait AdminLogApi: Send + Sync {
    async fn list_logs(&self, filter: &LogFilter, page: u32, per_page: u32)
        -> Result<AdminLogPage>;

    async fn get_log(&self, id: i64) -> Result<AdminLogEntry>;

    /// CSV export URL for the given filters (a download, not a fetch).
    fn export_url(&self, filter: &LogFilter) -> String;
}

// =============================================================================
// FRONT-END HOOKS
// =============================================================================

/// Plays the audio cue for an incoming toast.
///
/// Failures are never surfaced to the user; the renderer logs and ignores them.
pub trait SoundPlayer: Send + Sync {
    fn play(&self, kind: &EventKind) -> Result<()>;
}

/// Asks the operator to confirm a destructive action.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Confirmation that always answers the same way (`--yes`, tests).
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

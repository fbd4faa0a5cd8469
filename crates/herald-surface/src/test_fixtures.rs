//! In-memory fakes of the backend APIs for unit tests.
//!
//! Each fake records the calls it receives as short strings
//! (`"list unread 1 20"`, `"mark_read 3"`) and answers from queued or fixed
//! responses. Errors are replayed by rebuilding the same variant, since
//! [`Error`] is not `Clone`.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;

use herald_core::{
    ActionAck, AdminLogApi, AdminLogEntry, AdminLogPage, BackupApi, BackupListing, BackupRecord,
    BackupStats, BackupValidation, Category, CleanupPolicy, Error, EventKind, ListFilter,
    LogFilter, NotificationApi, NotificationPage, NotificationRecord, RestoreOutcome, Result,
};

fn replay(err: &Error) -> Error {
    match err {
        Error::Request(m) => Error::Request(m.clone()),
        Error::Rejected(m) => Error::Rejected(m.clone()),
        Error::NotFound(m) => Error::NotFound(m.clone()),
        Error::Connection(m) => Error::Connection(m.clone()),
        other => Error::Internal(other.to_string()),
    }
}

fn replay_result<T: Clone>(result: &Result<T>) -> Result<T> {
    match result {
        Ok(v) => Ok(v.clone()),
        Err(e) => Err(replay(e)),
    }
}

#[derive(Default)]
struct CallLog(Mutex<Vec<String>>);

impl CallLog {
    fn push(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    fn snapshot(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

// =============================================================================
// RECORD BUILDERS
// =============================================================================

/// Challenge notification created at a fixed instant.
pub fn record(id: i64, is_read: bool) -> NotificationRecord {
    NotificationRecord {
        id,
        user_id: Some(7),
        kind: EventKind::Success,
        category: Category::Challenge,
        message: format!("Notificação {id}"),
        data: json!({}),
        is_read,
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
    }
}

pub fn page_of(
    notifications: Vec<NotificationRecord>,
    total: u64,
    unread_count: u64,
    page: u32,
    total_pages: u32,
) -> NotificationPage {
    NotificationPage {
        notifications,
        total,
        unread_count,
        page,
        per_page: Some(20),
        total_pages,
    }
}

pub fn backup(id: i64, is_valid: bool) -> BackupRecord {
    BackupRecord {
        id,
        filename: format!("backup_{id}.db.gz"),
        filepath: None,
        size_bytes: 2_097_152,
        size_mb: 2.0,
        md5_hash: None,
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 3, 0, 0).unwrap(),
        created_by: None,
        creator_name: "Sistema".to_string(),
        backup_type: "automatic".to_string(),
        is_valid,
        notes: None,
    }
}

pub fn log_entry(id: i64, action: &str) -> AdminLogEntry {
    AdminLogEntry {
        id,
        admin_id: Some(1),
        admin_name: "Admin".to_string(),
        action: action.to_string(),
        resource_type: "user".to_string(),
        resource_id: Some(42),
        description: format!("{action} user 42"),
        ip_address: Some("127.0.0.1".to_string()),
        user_agent: None,
        changes: json!({"status": ["active", "banned"]}),
        created_at: Utc.with_ymd_and_hms(2025, 3, 2, 9, 30, 0).unwrap(),
    }
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

pub struct FakeNotifications {
    calls: CallLog,
    pages: Mutex<VecDeque<Result<NotificationPage>>>,
    unread: Mutex<Result<u64>>,
    unread_delay: Mutex<Duration>,
    ack: Mutex<Result<ActionAck>>,
}

impl Default for FakeNotifications {
    fn default() -> Self {
        Self {
            calls: CallLog::default(),
            pages: Mutex::new(VecDeque::new()),
            unread: Mutex::new(Ok(0)),
            unread_delay: Mutex::new(Duration::ZERO),
            ack: Mutex::new(Ok(ActionAck::default())),
        }
    }
}

impl FakeNotifications {
    /// Queue the answer to the next `list` call. An empty queue answers
    /// with an empty first page.
    pub fn push_page(&self, page: Result<NotificationPage>) {
        self.pages.lock().unwrap().push_back(page);
    }

    pub fn set_unread(&self, result: Result<u64>) {
        *self.unread.lock().unwrap() = result;
    }

    /// Make every `unread_count` call take `delay` before answering.
    pub fn set_unread_delay(&self, delay: Duration) {
        *self.unread_delay.lock().unwrap() = delay;
    }

    pub fn set_ack(&self, result: Result<ActionAck>) {
        *self.ack.lock().unwrap() = result;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.snapshot()
    }

    fn ack(&self, call: String) -> Result<ActionAck> {
        self.calls.push(call);
        replay_result(&*self.ack.lock().unwrap())
    }
}

#[async_trait]
impl NotificationApi for FakeNotifications {
    async fn list(&self, filter: ListFilter, page: u32, per_page: u32) -> Result<NotificationPage> {
        self.calls.push(format!("list {filter} {page} {per_page}"));
        self.pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(page_of(vec![], 0, 0, 1, 0)))
    }

    async fn unread_count(&self) -> Result<u64> {
        self.calls.push("unread_count");
        let delay = *self.unread_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        replay_result(&*self.unread.lock().unwrap())
    }

    async fn mark_read(&self, id: i64) -> Result<ActionAck> {
        self.ack(format!("mark_read {id}"))
    }

    async fn mark_unread(&self, id: i64) -> Result<ActionAck> {
        self.ack(format!("mark_unread {id}"))
    }

    async fn delete(&self, id: i64) -> Result<ActionAck> {
        self.ack(format!("delete {id}"))
    }

    async fn mark_all_read(&self) -> Result<ActionAck> {
        self.ack("mark_all_read".to_string())
    }

    async fn clear_read(&self) -> Result<ActionAck> {
        self.ack("clear_read".to_string())
    }
}

// =============================================================================
// BACKUPS
// =============================================================================

pub struct FakeBackups {
    calls: CallLog,
    listing: Mutex<Result<BackupListing>>,
    validation: Mutex<Result<BackupValidation>>,
    restore: Mutex<Result<RestoreOutcome>>,
    mutation: Mutex<Result<()>>,
    removed: Mutex<Result<u64>>,
}

impl Default for FakeBackups {
    fn default() -> Self {
        Self {
            calls: CallLog::default(),
            listing: Mutex::new(Ok(BackupListing::default())),
            validation: Mutex::new(Ok(BackupValidation {
                is_valid: true,
                message: "Backup válido".to_string(),
            })),
            restore: Mutex::new(Ok(RestoreOutcome::default())),
            mutation: Mutex::new(Ok(())),
            removed: Mutex::new(Ok(0)),
        }
    }
}

impl FakeBackups {
    pub fn set_listing(&self, backups: Vec<BackupRecord>, stats: BackupStats) {
        *self.listing.lock().unwrap() = Ok(BackupListing { backups, stats });
    }

    pub fn fail_listing(&self, err: Error) {
        *self.listing.lock().unwrap() = Err(err);
    }

    pub fn set_validation(&self, result: Result<BackupValidation>) {
        *self.validation.lock().unwrap() = result;
    }

    pub fn set_restore(&self, result: Result<RestoreOutcome>) {
        *self.restore.lock().unwrap() = result;
    }

    /// Answer for create and delete.
    pub fn set_mutation(&self, result: Result<()>) {
        *self.mutation.lock().unwrap() = result;
    }

    pub fn set_removed(&self, result: Result<u64>) {
        *self.removed.lock().unwrap() = result;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.snapshot()
    }
}

#[async_trait]
impl BackupApi for FakeBackups {
    async fn list_backups(&self) -> Result<BackupListing> {
        self.calls.push("list_backups");
        replay_result(&*self.listing.lock().unwrap())
    }

    async fn create_backup(&self, notes: Option<&str>) -> Result<BackupRecord> {
        self.calls
            .push(format!("create_backup {}", notes.unwrap_or_default()).trim_end().to_string());
        replay_result(&*self.mutation.lock().unwrap()).map(|_| backup(99, true))
    }

    async fn validate_backup(&self, id: i64) -> Result<BackupValidation> {
        self.calls.push(format!("validate_backup {id}"));
        replay_result(&*self.validation.lock().unwrap())
    }

    async fn restore_backup(&self, id: i64) -> Result<RestoreOutcome> {
        self.calls.push(format!("restore_backup {id}"));
        replay_result(&*self.restore.lock().unwrap())
    }

    async fn delete_backup(&self, id: i64) -> Result<()> {
        self.calls.push(format!("delete_backup {id}"));
        replay_result(&*self.mutation.lock().unwrap())
    }

    async fn cleanup_backups(&self, policy: CleanupPolicy) -> Result<u64> {
        self.calls.push(format!(
            "cleanup_backups {} {}",
            policy.keep_count, policy.keep_days
        ));
        replay_result(&*self.removed.lock().unwrap())
    }

    fn download_url(&self, id: i64) -> String {
        format!("http://backend/admin/backup/api/download/{id}")
    }

    async fn download_backup(&self, id: i64, dest: &Path) -> Result<u64> {
        self.calls.push(format!("download_backup {id}"));
        let body = b"backup-bytes";
        std::fs::write(dest, body)?;
        Ok(body.len() as u64)
    }
}

// =============================================================================
// AUDIT LOG
// =============================================================================

pub struct FakeLogs {
    calls: CallLog,
    pages: Mutex<VecDeque<Result<AdminLogPage>>>,
    detail: Mutex<Result<AdminLogEntry>>,
}

impl Default for FakeLogs {
    fn default() -> Self {
        Self {
            calls: CallLog::default(),
            pages: Mutex::new(VecDeque::new()),
            detail: Mutex::new(Ok(log_entry(1, "UPDATE"))),
        }
    }
}

impl FakeLogs {
    pub fn push_page(&self, page: Result<AdminLogPage>) {
        self.pages.lock().unwrap().push_back(page);
    }

    pub fn set_detail(&self, result: Result<AdminLogEntry>) {
        *self.detail.lock().unwrap() = result;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.snapshot()
    }
}

#[async_trait]
impl AdminLogApi for FakeLogs {
    async fn list_logs(&self, filter: &LogFilter, page: u32, per_page: u32) -> Result<AdminLogPage> {
        let query: Vec<String> = filter
            .query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        self.calls
            .push(format!("list_logs {page} {per_page} [{}]", query.join("&")));
        self.pages.lock().unwrap().pop_front().unwrap_or_else(|| {
            Ok(AdminLogPage {
                logs: vec![],
                total: 0,
                page: 1,
                per_page: Some(per_page),
                total_pages: 0,
            })
        })
    }

    async fn get_log(&self, id: i64) -> Result<AdminLogEntry> {
        self.calls.push(format!("get_log {id}"));
        replay_result(&*self.detail.lock().unwrap())
    }

    fn export_url(&self, filter: &LogFilter) -> String {
        if filter.is_empty() {
            "http://backend/admin/logs/api/export".to_string()
        } else {
            let query: Vec<String> = filter
                .query_pairs()
                .into_iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            format!("http://backend/admin/logs/api/export?{}", query.join("&"))
        }
    }
}

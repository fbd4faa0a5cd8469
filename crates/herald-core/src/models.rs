//! Wire models shared by the client, the surface and the CLI.
//!
//! Field names follow the backend's JSON. Response envelopes are decoded by
//! the client after the `success` flag has been checked, so the structs here
//! only carry payload fields.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Error;

// =============================================================================
// TIMESTAMPS
// =============================================================================

/// Timestamp parsing for backend payloads.
///
/// The backend emits `isoformat()` strings of naive UTC datetimes
/// (`2025-03-01T12:00:00.123456`); some payloads carry an explicit offset.
/// Both are accepted and normalized to UTC.
pub mod wire_time {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer};

    /// Parse an ISO-8601 timestamp with or without an offset.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        raw.parse::<NaiveDateTime>()
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Strict deserializer: the field must hold a parseable timestamp.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    /// Optional timestamp; null, missing or unparseable values become `None`.
    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().and_then(parse))
    }

    /// Lenient deserializer for push events: falls back to the receipt time.
    pub fn deserialize_or_now<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(deserialize_option(deserializer)?.unwrap_or_else(Utc::now))
    }
}

// =============================================================================
// PUSH EVENTS
// =============================================================================

/// Severity of a push event.
///
/// Unrecognized strings are kept verbatim in [`EventKind::Unknown`] so that a
/// newer backend can never make an event undeliverable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Success,
    #[default]
    Info,
    Warning,
    Error,
    Unknown(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<String> for EventKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "success" => Self::Success,
            "info" => Self::Info,
            "warning" => Self::Warning,
            "error" => Self::Error,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<&str> for EventKind {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Unknown(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-initiated notification delivered over the push connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushEvent {
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    #[serde(default)]
    pub message: String,
    #[serde(
        default = "Utc::now",
        deserialize_with = "wire_time::deserialize_or_now"
    )]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
}

impl PushEvent {
    pub fn new(kind: impl Into<EventKind>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            timestamp: Utc::now(),
            category: None,
            data: None,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

// =============================================================================
// NOTIFICATION RECORDS
// =============================================================================

/// Category tag attached to persisted notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Welcome,
    Challenge,
    LevelUp,
    Boss,
    Team,
    Achievement,
    Event,
    System,
    Admin,
    UserRegistration,
    #[default]
    General,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Welcome => "welcome",
            Self::Challenge => "challenge",
            Self::LevelUp => "level_up",
            Self::Boss => "boss",
            Self::Team => "team",
            Self::Achievement => "achievement",
            Self::Event => "event",
            Self::System => "system",
            Self::Admin => "admin",
            Self::UserRegistration => "user_registration",
            Self::General => "general",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "welcome" => Self::Welcome,
            "challenge" => Self::Challenge,
            "level_up" => Self::LevelUp,
            "boss" => Self::Boss,
            "team" => Self::Team,
            "achievement" => Self::Achievement,
            "event" => Self::Event,
            "system" => Self::System,
            "admin" => Self::Admin,
            "user_registration" => Self::UserRegistration,
            "general" => Self::General,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for Category {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        match category {
            Category::Other(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

/// One persisted notification as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    #[serde(default)]
    pub category: Category,
    pub message: String,
    #[serde(default)]
    pub data: JsonValue,
    #[serde(default)]
    pub is_read: bool,
    #[serde(deserialize_with = "wire_time::deserialize")]
    pub created_at: DateTime<Utc>,
}

/// Server-side list filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListFilter {
    #[default]
    All,
    Unread,
    Read,
}

impl ListFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Unread => "unread",
            Self::Read => "read",
        }
    }
}

impl FromStr for ListFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "unread" => Ok(Self::Unread),
            "read" => Ok(Self::Read),
            other => Err(Error::InvalidInput(format!("unknown filter: {other}"))),
        }
    }
}

impl fmt::Display for ListFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn first_page() -> u32 {
    1
}

/// Page of notifications plus the counts the list view displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPage {
    #[serde(default)]
    pub notifications: Vec<NotificationRecord>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub unread_count: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub total_pages: u32,
}

/// Body of the unread-count endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    pub unread_count: u64,
}

/// Body returned by the mutating notification endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionAck {
    #[serde(default)]
    pub unread_count: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// BACKUPS
// =============================================================================

fn system_creator() -> String {
    "Sistema".to_string()
}

/// One database backup known to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub id: i64,
    pub filename: String,
    #[serde(default)]
    pub filepath: Option<String>,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub size_mb: f64,
    #[serde(default)]
    pub md5_hash: Option<String>,
    #[serde(deserialize_with = "wire_time::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<i64>,
    #[serde(default = "system_creator")]
    pub creator_name: String,
    #[serde(default)]
    pub backup_type: String,
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Aggregate numbers shown above the backup table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupStats {
    #[serde(default)]
    pub total_backups: u64,
    #[serde(default)]
    pub total_size_bytes: u64,
    #[serde(default)]
    pub total_size_mb: f64,
    #[serde(default)]
    pub latest_backup: Option<BackupRecord>,
}

/// Backup list endpoint body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackupListing {
    #[serde(default)]
    pub backups: Vec<BackupRecord>,
    #[serde(default)]
    pub stats: BackupStats,
}

/// Result of a backup integrity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupValidation {
    pub is_valid: bool,
    #[serde(default)]
    pub message: String,
}

/// Result of a successful restore.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreOutcome {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub safety_backup_id: Option<i64>,
}

/// Retention policy sent to the cleanup endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupPolicy {
    pub keep_count: u32,
    pub keep_days: u32,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            keep_count: crate::defaults::BACKUP_KEEP_COUNT,
            keep_days: crate::defaults::BACKUP_KEEP_DAYS,
        }
    }
}

// =============================================================================
// AUDIT LOG
// =============================================================================

fn unknown_admin() -> String {
    "Unknown".to_string()
}

/// One entry of the administrative audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminLogEntry {
    pub id: i64,
    #[serde(default)]
    pub admin_id: Option<i64>,
    #[serde(default = "unknown_admin")]
    pub admin_name: String,
    pub action: String,
    pub resource_type: String,
    #[serde(default)]
    pub resource_id: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub changes: JsonValue,
    #[serde(deserialize_with = "wire_time::deserialize")]
    pub created_at: DateTime<Utc>,
}

/// Audit log list endpoint body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminLogPage {
    #[serde(default)]
    pub logs: Vec<AdminLogEntry>,
    #[serde(default)]
    pub total: u64,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub total_pages: u32,
}

/// Audit log filters. Unset fields are omitted from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub admin_id: Option<i64>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

impl LogFilter {
    /// Query pairs for the populated filters, in a stable order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(admin_id) = self.admin_id {
            pairs.push(("admin_id", admin_id.to_string()));
        }
        let text_fields = [
            ("action", &self.action),
            ("resource_type", &self.resource_type),
            ("date_from", &self.date_from),
            ("date_to", &self.date_to),
        ];
        for (key, value) in text_fields {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((key, value.to_string()));
            }
        }
        pairs
    }

    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};
    use serde_json::json;

    #[test]
    fn test_parse_naive_isoformat() {
        let dt = wire_time::parse("2025-03-01T12:30:45.123456").unwrap();
        assert_eq!(dt.year(), 2025);
        assert_eq!(dt.hour(), 12);
        assert_eq!(dt.minute(), 30);
    }

    #[test]
    fn test_parse_naive_without_fraction() {
        let dt = wire_time::parse("2025-03-01T12:30:45").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 45).unwrap());
    }

    #[test]
    fn test_parse_rfc3339_offset_normalized() {
        let dt = wire_time::parse("2025-03-01T09:00:00-03:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(wire_time::parse("yesterday").is_none());
    }

    #[test]
    fn test_event_kind_known_and_unknown() {
        assert_eq!(EventKind::from("success"), EventKind::Success);
        assert_eq!(EventKind::from("error"), EventKind::Error);
        assert_eq!(
            EventKind::from("mystery"),
            EventKind::Unknown("mystery".to_string())
        );
        assert_eq!(EventKind::from("mystery").as_str(), "mystery");
    }

    #[test]
    fn test_push_event_from_wire() {
        let event: PushEvent = serde_json::from_value(json!({
            "type": "warning",
            "message": "Servidor reiniciando",
            "timestamp": "2025-03-01T12:00:00"
        }))
        .unwrap();
        assert_eq!(event.kind, EventKind::Warning);
        assert_eq!(event.message, "Servidor reiniciando");
        assert_eq!(
            event.timestamp,
            Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
        );
        assert!(event.category.is_none());
    }

    #[test]
    fn test_push_event_tolerates_missing_fields() {
        let before = Utc::now();
        let event: PushEvent = serde_json::from_value(json!({"message": "oi"})).unwrap();
        assert_eq!(event.kind, EventKind::Info);
        assert!(event.timestamp >= before);

        let event: PushEvent =
            serde_json::from_value(json!({"type": "x", "timestamp": "not a date"})).unwrap();
        assert_eq!(event.kind, EventKind::Unknown("x".into()));
        assert!(event.timestamp >= before);
    }

    #[test]
    fn test_push_event_serializes_kind_as_type() {
        let event = PushEvent::new(EventKind::Success, "ok");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "success");
        assert!(value.get("category").is_none());
    }

    #[test]
    fn test_notification_record_from_wire() {
        let record: NotificationRecord = serde_json::from_value(json!({
            "id": 7,
            "user_id": 3,
            "type": "success",
            "category": "level_up",
            "message": "Você subiu de nível!",
            "data": {"level": 4},
            "is_read": false,
            "created_at": "2025-03-01T12:00:00.000001",
            "timestamp": "2025-03-01T12:00:00.000001"
        }))
        .unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.category, Category::LevelUp);
        assert!(!record.is_read);
        assert_eq!(record.data["level"], 4);
    }

    #[test]
    fn test_category_fallback_keeps_raw() {
        let category = Category::from("seasonal");
        assert_eq!(category, Category::Other("seasonal".into()));
        assert_eq!(String::from(category), "seasonal");
    }

    #[test]
    fn test_list_filter_parse() {
        assert_eq!("unread".parse::<ListFilter>().unwrap(), ListFilter::Unread);
        assert_eq!("ALL".parse::<ListFilter>().unwrap(), ListFilter::All);
        assert!("starred".parse::<ListFilter>().is_err());
        assert_eq!(ListFilter::Read.to_string(), "read");
    }

    #[test]
    fn test_notification_page_defaults() {
        let page: NotificationPage = serde_json::from_value(json!({
            "notifications": [],
            "total": 0,
            "unread_count": 0,
            "total_pages": 0
        }))
        .unwrap();
        assert_eq!(page.page, 1);
        assert!(page.per_page.is_none());
    }

    #[test]
    fn test_backup_record_defaults_creator() {
        let backup: BackupRecord = serde_json::from_value(json!({
            "id": 1,
            "filename": "backup_20250301.db.gz",
            "size_bytes": 2097152,
            "size_mb": 2.0,
            "created_at": "2025-03-01T03:00:00",
            "backup_type": "automatic",
            "is_valid": true
        }))
        .unwrap();
        assert_eq!(backup.creator_name, "Sistema");
        assert!(backup.notes.is_none());
    }

    #[test]
    fn test_cleanup_policy_default() {
        let policy = CleanupPolicy::default();
        assert_eq!(policy.keep_count, 10);
        assert_eq!(policy.keep_days, 30);
    }

    #[test]
    fn test_log_filter_query_pairs_skip_blank() {
        let filter = LogFilter {
            admin_id: Some(2),
            action: Some("DELETE".into()),
            resource_type: Some("   ".into()),
            date_from: None,
            date_to: Some("2025-03-31".into()),
        };
        assert_eq!(
            filter.query_pairs(),
            vec![
                ("admin_id", "2".to_string()),
                ("action", "DELETE".to_string()),
                ("date_to", "2025-03-31".to_string()),
            ]
        );
        assert!(LogFilter::default().is_empty());
    }
}

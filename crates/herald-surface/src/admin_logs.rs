//! Paginated audit log view with filters, details and CSV export.

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use herald_core::{
    format_datetime, AdminLogApi, AdminLogEntry, AdminLogPage, LogFilter, Pagination,
    PaginationView, Result,
};

/// One rendered table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRowView {
    pub id: i64,
    pub created_at: String,
    pub admin_name: String,
    pub action: String,
    pub resource: String,
    pub description: String,
    pub ip_address: String,
}

impl LogRowView {
    pub fn from_entry(entry: &AdminLogEntry) -> Self {
        let resource = match entry.resource_id {
            Some(id) => format!("{} #{}", entry.resource_type, id),
            None => entry.resource_type.clone(),
        };
        Self {
            id: entry.id,
            created_at: format_datetime(entry.created_at),
            admin_name: entry.admin_name.clone(),
            action: entry.action.clone(),
            resource,
            description: entry.description.clone(),
            ip_address: entry.ip_address.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// Detail view of one entry, with the change set pretty-printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogDetailView {
    pub row: LogRowView,
    pub user_agent: Option<String>,
    pub changes: Option<String>,
}

impl LogDetailView {
    pub fn from_entry(entry: &AdminLogEntry) -> Self {
        let changes = match &entry.changes {
            JsonValue::Null => None,
            JsonValue::Object(map) if map.is_empty() => None,
            other => serde_json::to_string_pretty(other).ok(),
        };
        Self {
            row: LogRowView::from_entry(entry),
            user_agent: entry.user_agent.clone(),
            changes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdminLogView {
    filter: LogFilter,
    per_page: u32,
    pagination: Pagination,
    entries: Vec<AdminLogEntry>,
    total: u64,
}

impl AdminLogView {
    pub fn new(per_page: u32) -> Self {
        Self {
            filter: LogFilter::default(),
            per_page: per_page.max(1),
            pagination: Pagination::default(),
            entries: Vec::new(),
            total: 0,
        }
    }

    pub fn filter(&self) -> &LogFilter {
        &self.filter
    }

    pub fn page(&self) -> u32 {
        self.pagination.page
    }

    pub fn entries(&self) -> &[AdminLogEntry] {
        &self.entries
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Load the current page with the current filters.
    pub async fn load<A>(&mut self, api: &A) -> Result<()>
    where
        A: AdminLogApi + ?Sized,
    {
        let page = self.pagination.page;
        self.fetch(api, page).await
    }

    /// Jump straight to `page` with the current filters.
    pub async fn load_page<A>(&mut self, api: &A, page: u32) -> Result<()>
    where
        A: AdminLogApi + ?Sized,
    {
        self.fetch(api, page.max(1)).await
    }

    /// Replace the filters and restart from page 1.
    pub async fn apply_filters<A>(&mut self, api: &A, filter: LogFilter) -> Result<()>
    where
        A: AdminLogApi + ?Sized,
    {
        self.filter = filter;
        self.fetch(api, 1).await
    }

    pub async fn clear_filters<A>(&mut self, api: &A) -> Result<()>
    where
        A: AdminLogApi + ?Sized,
    {
        self.apply_filters(api, LogFilter::default()).await
    }

    /// `None` when already on the first page; nothing is fetched.
    pub async fn previous_page<A>(&mut self, api: &A) -> Option<Result<()>>
    where
        A: AdminLogApi + ?Sized,
    {
        let target = self.pagination.previous()?;
        Some(self.fetch(api, target).await)
    }

    /// `None` when already on the last page; nothing is fetched.
    pub async fn next_page<A>(&mut self, api: &A) -> Option<Result<()>>
    where
        A: AdminLogApi + ?Sized,
    {
        let target = self.pagination.next()?;
        Some(self.fetch(api, target).await)
    }

    pub async fn details<A>(&self, api: &A, id: i64) -> Result<LogDetailView>
    where
        A: AdminLogApi + ?Sized,
    {
        let entry = api.get_log(id).await?;
        Ok(LogDetailView::from_entry(&entry))
    }

    /// CSV export URL for the active filters.
    pub fn export_url<A>(&self, api: &A) -> String
    where
        A: AdminLogApi + ?Sized,
    {
        api.export_url(&self.filter)
    }

    async fn fetch<A>(&mut self, api: &A, page: u32) -> Result<()>
    where
        A: AdminLogApi + ?Sized,
    {
        match api.list_logs(&self.filter, page, self.per_page).await {
            Ok(result) => {
                self.apply_page(result);
                Ok(())
            }
            Err(e) => {
                warn!(component = "admin_logs", page, error = %e, "Failed to load audit log");
                Err(e)
            }
        }
    }

    fn apply_page(&mut self, result: AdminLogPage) {
        debug!(
            component = "admin_logs",
            page = result.page,
            result_count = result.logs.len(),
            "Audit log page loaded"
        );
        self.pagination = Pagination::new(result.page, result.total_pages);
        self.total = result.total;
        self.entries = result.logs;
    }

    pub fn rows(&self) -> Vec<LogRowView> {
        self.entries.iter().map(LogRowView::from_entry).collect()
    }

    pub fn pagination(&self) -> PaginationView {
        self.pagination.view()
    }
}

impl Default for AdminLogView {
    fn default() -> Self {
        Self::new(herald_core::defaults::ADMIN_LOG_PAGE_SIZE)
    }
}

//! Paginated, filtered notification list.
//!
//! Every load takes a ticket carrying a monotonic sequence number. Only the
//! result for the most recently issued ticket is applied; anything older is
//! discarded, so a slow response can never overwrite a newer page.
//!
//! Mutations are fire-and-confirm: after the backend accepts them the
//! current filter and page are reloaded wholesale.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use herald_core::pagination::Pagination;
use herald_core::{
    time_ago, ActionAck, Confirm, EventKind, ListFilter, NotificationApi, NotificationPage,
    NotificationRecord, PaginationView, Result,
};

use crate::render::{category_label, Glyph};

pub const CONFIRM_DELETE: &str = "Tem certeza que deseja excluir esta notificação?";
pub const CONFIRM_CLEAR_READ: &str = "Tem certeza que deseja excluir todas as notificações lidas?";

const LOADING_TEXT: &str = "Carregando notificações...";
const ERROR_TEXT: &str = "Erro ao carregar notificações";

/// What the list area currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum ListState {
    Loading,
    Items,
    Empty,
    Error(String),
}

/// Per-filter counts shown on the filter buttons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListCounts {
    pub all: u64,
    pub unread: u64,
    pub read: u64,
}

impl ListCounts {
    fn from_page(page: &NotificationPage) -> Self {
        Self {
            all: page.total,
            unread: page.unread_count,
            read: page.total.saturating_sub(page.unread_count),
        }
    }

    pub fn for_filter(&self, filter: ListFilter) -> u64 {
        match filter {
            ListFilter::All => self.all,
            ListFilter::Unread => self.unread,
            ListFilter::Read => self.read,
        }
    }
}

/// A load that has been issued but not yet applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub seq: u64,
    pub filter: ListFilter,
    pub page: u32,
    pub per_page: u32,
}

/// Result of applying a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Page replaced; carries the authoritative unread count.
    Loaded { unread_count: u64 },
    /// Backend or transport failure; previous records kept.
    Failed,
    /// A newer load was issued meanwhile; result dropped.
    Stale,
}

impl LoadOutcome {
    pub fn unread_count(&self) -> Option<u64> {
        match self {
            LoadOutcome::Loaded { unread_count } => Some(*unread_count),
            _ => None,
        }
    }
}

/// Result of an accepted mutation and the reload that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub ack: ActionAck,
    pub reload: LoadOutcome,
}

impl MutationOutcome {
    /// Freshest unread count known after the mutation.
    pub fn unread_count(&self) -> Option<u64> {
        self.reload.unread_count().or(self.ack.unread_count)
    }
}

/// Which read-state toggle a row offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadToggle {
    MarkRead,
    MarkUnread,
}

impl ReadToggle {
    pub fn title(&self) -> &'static str {
        match self {
            ReadToggle::MarkRead => "Marcar como lida",
            ReadToggle::MarkUnread => "Marcar como não lida",
        }
    }
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationItemView {
    pub id: i64,
    pub glyph: Glyph,
    pub icon_class: &'static str,
    pub kind: String,
    pub message: String,
    pub time_label: String,
    pub category_label: String,
    pub is_read: bool,
    pub toggle: ReadToggle,
}

impl NotificationItemView {
    pub fn from_record(record: &NotificationRecord, now: DateTime<Utc>) -> Self {
        let glyph = Glyph::for_category(&record.category);
        Self {
            id: record.id,
            glyph,
            icon_class: glyph.icon_class(),
            kind: record.kind.as_str().to_string(),
            message: record.message.clone(),
            time_label: time_ago(record.created_at, now),
            category_label: category_label(&record.category),
            is_read: record.is_read,
            toggle: if record.is_read {
                ReadToggle::MarkUnread
            } else {
                ReadToggle::MarkRead
            },
        }
    }

    pub fn row_class(&self) -> &'static str {
        if self.is_read {
            "read"
        } else {
            "unread"
        }
    }

    /// Severity of the record, for front ends that color rows.
    pub fn event_kind(&self) -> EventKind {
        EventKind::from(self.kind.as_str())
    }
}

/// Full rendered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListView {
    pub filter: ListFilter,
    pub state: ListState,
    pub status_text: Option<&'static str>,
    pub items: Vec<NotificationItemView>,
    pub counts: ListCounts,
    pub pagination: PaginationView,
    pub show_pagination: bool,
}

/// Client-side state of the notification list page.
#[derive(Debug, Clone)]
pub struct NotificationListView {
    filter: ListFilter,
    page: u32,
    per_page: u32,
    pagination: Pagination,
    records: Vec<NotificationRecord>,
    counts: ListCounts,
    state: ListState,
    issued: u64,
}

impl NotificationListView {
    pub fn new(per_page: u32) -> Self {
        Self {
            filter: ListFilter::All,
            page: 1,
            per_page: per_page.max(1),
            pagination: Pagination::default(),
            records: Vec::new(),
            counts: ListCounts::default(),
            state: ListState::Loading,
            issued: 0,
        }
    }

    pub fn filter(&self) -> ListFilter {
        self.filter
    }

    /// Page the next reload targets. Paging only moves it once the new
    /// page has loaded; an explicit `load` or filter change sets it directly.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn records(&self) -> &[NotificationRecord] {
        &self.records
    }

    pub fn counts(&self) -> ListCounts {
        self.counts
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    /// Sequence number of the latest issued load.
    pub fn latest_seq(&self) -> u64 {
        self.issued
    }

    // ------------------------------------------------------------------
    // Two-phase loading
    // ------------------------------------------------------------------

    /// Issue a load for the current filter and page.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.issue(self.page)
    }

    /// Switch filter and issue a load for its first page.
    pub fn begin_filter(&mut self, filter: ListFilter) -> LoadTicket {
        self.filter = filter;
        self.page = 1;
        self.begin_load()
    }

    /// Issue a load for the previous page. `None` on the first page.
    pub fn begin_previous(&mut self) -> Option<LoadTicket> {
        let target = self.pagination.previous()?;
        Some(self.issue(target))
    }

    /// Issue a load for the next page. `None` on the last page.
    pub fn begin_next(&mut self) -> Option<LoadTicket> {
        let target = self.pagination.next()?;
        Some(self.issue(target))
    }

    fn issue(&mut self, page: u32) -> LoadTicket {
        self.issued += 1;
        self.state = ListState::Loading;
        let ticket = LoadTicket {
            seq: self.issued,
            filter: self.filter,
            page,
            per_page: self.per_page,
        };
        debug!(
            component = "list",
            seq = ticket.seq,
            filter = %ticket.filter,
            page = ticket.page,
            "List load issued"
        );
        ticket
    }

    /// Apply the result of a previously issued load.
    pub fn apply(&mut self, ticket: LoadTicket, result: Result<NotificationPage>) -> LoadOutcome {
        if ticket.seq != self.issued {
            debug!(
                component = "list",
                seq = ticket.seq,
                latest = self.issued,
                "Discarding stale list response"
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(page) => {
                self.counts = ListCounts::from_page(&page);
                self.pagination = Pagination::new(page.page, page.total_pages);
                self.page = self.pagination.page;
                self.state = if page.notifications.is_empty() {
                    ListState::Empty
                } else {
                    ListState::Items
                };
                let unread_count = page.unread_count;
                self.records = page.notifications;
                debug!(
                    component = "list",
                    seq = ticket.seq,
                    result_count = self.records.len(),
                    unread_count,
                    "List page applied"
                );
                LoadOutcome::Loaded { unread_count }
            }
            Err(e) => {
                warn!(component = "list", seq = ticket.seq, error = %e, "List load failed");
                self.state = ListState::Error(e.to_string());
                LoadOutcome::Failed
            }
        }
    }

    // ------------------------------------------------------------------
    // Sequential convenience API
    // ------------------------------------------------------------------

    /// Reload the current filter and page.
    pub async fn reload<A>(&mut self, api: &A) -> LoadOutcome
    where
        A: NotificationApi + ?Sized,
    {
        let ticket = self.begin_load();
        self.fetch(api, ticket).await
    }

    async fn fetch<A>(&mut self, api: &A, ticket: LoadTicket) -> LoadOutcome
    where
        A: NotificationApi + ?Sized,
    {
        let result = api.list(ticket.filter, ticket.page, ticket.per_page).await;
        self.apply(ticket, result)
    }

    /// Load an explicit filter and page.
    pub async fn load<A>(&mut self, api: &A, filter: ListFilter, page: u32) -> LoadOutcome
    where
        A: NotificationApi + ?Sized,
    {
        self.filter = filter;
        self.page = page.max(1);
        self.reload(api).await
    }

    /// Switch filter; always restarts from page 1.
    pub async fn set_filter<A>(&mut self, api: &A, filter: ListFilter) -> LoadOutcome
    where
        A: NotificationApi + ?Sized,
    {
        let ticket = self.begin_filter(filter);
        self.fetch(api, ticket).await
    }

    /// Go back one page. `None` when already on the first page.
    pub async fn previous_page<A>(&mut self, api: &A) -> Option<LoadOutcome>
    where
        A: NotificationApi + ?Sized,
    {
        let ticket = self.begin_previous()?;
        Some(self.fetch(api, ticket).await)
    }

    /// Advance one page. `None` when already on the last page.
    pub async fn next_page<A>(&mut self, api: &A) -> Option<LoadOutcome>
    where
        A: NotificationApi + ?Sized,
    {
        let ticket = self.begin_next()?;
        Some(self.fetch(api, ticket).await)
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    pub async fn mark_read<A>(&mut self, api: &A, id: i64) -> Result<MutationOutcome>
    where
        A: NotificationApi + ?Sized,
    {
        let ack = api.mark_read(id).await?;
        info!(component = "list", notification_id = id, "Marked as read");
        self.after_mutation(api, ack).await
    }

    pub async fn mark_unread<A>(&mut self, api: &A, id: i64) -> Result<MutationOutcome>
    where
        A: NotificationApi + ?Sized,
    {
        let ack = api.mark_unread(id).await?;
        info!(component = "list", notification_id = id, "Marked as unread");
        self.after_mutation(api, ack).await
    }

    /// Delete one notification after confirmation. `Ok(None)` when declined.
    pub async fn delete<A>(
        &mut self,
        api: &A,
        confirm: &dyn Confirm,
        id: i64,
    ) -> Result<Option<MutationOutcome>>
    where
        A: NotificationApi + ?Sized,
    {
        if !confirm.confirm(CONFIRM_DELETE) {
            debug!(component = "list", notification_id = id, "Delete declined");
            return Ok(None);
        }
        let ack = api.delete(id).await?;
        info!(component = "list", notification_id = id, "Notification deleted");
        self.after_mutation(api, ack).await.map(Some)
    }

    pub async fn mark_all_read<A>(&mut self, api: &A) -> Result<MutationOutcome>
    where
        A: NotificationApi + ?Sized,
    {
        let ack = api.mark_all_read().await?;
        info!(component = "list", "Marked all as read");
        self.after_mutation(api, ack).await
    }

    /// Delete every read notification after confirmation.
    pub async fn clear_read<A>(
        &mut self,
        api: &A,
        confirm: &dyn Confirm,
    ) -> Result<Option<MutationOutcome>>
    where
        A: NotificationApi + ?Sized,
    {
        if !confirm.confirm(CONFIRM_CLEAR_READ) {
            debug!(component = "list", "Clear read declined");
            return Ok(None);
        }
        let ack = api.clear_read().await?;
        info!(component = "list", "Read notifications cleared");
        self.after_mutation(api, ack).await.map(Some)
    }

    async fn after_mutation<A>(&mut self, api: &A, ack: ActionAck) -> Result<MutationOutcome>
    where
        A: NotificationApi + ?Sized,
    {
        let reload = self.reload(api).await;
        Ok(MutationOutcome { ack, reload })
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    pub fn view(&self, now: DateTime<Utc>) -> ListView {
        let (status_text, items) = match &self.state {
            ListState::Loading => (Some(LOADING_TEXT), Vec::new()),
            ListState::Error(_) => (Some(ERROR_TEXT), Vec::new()),
            ListState::Empty => (None, Vec::new()),
            ListState::Items => (
                None,
                self.records
                    .iter()
                    .map(|r| NotificationItemView::from_record(r, now))
                    .collect(),
            ),
        };

        ListView {
            filter: self.filter,
            state: self.state.clone(),
            status_text,
            show_pagination: self.state == ListState::Items,
            items,
            counts: self.counts,
            pagination: self.pagination.view(),
        }
    }
}

impl Default for NotificationListView {
    fn default() -> Self {
        Self::new(herald_core::defaults::NOTIFICATION_PAGE_SIZE)
    }
}

//! Surface event loop.
//!
//! One task owns the toast queue, the badge and (optionally) the
//! notification list. It multiplexes connection events, front-end commands,
//! the badge poll, the list refresh and toast deadlines with
//! `tokio::select!`, and publishes what changed on a [`SurfaceEvent`] bus.
//!
//! Backend calls never run on the loop itself. Each one is spawned into a
//! `JoinSet` and its result comes back as a [`Completion`], so a slow
//! backend cannot hold up toast timers or push intake.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use herald_client::HeraldClient;
use herald_core::{
    ActionAck, AutoConfirm, Confirm, ConnectionEvent, Error, EventBus, HeraldConfig, ListFilter,
    NotificationApi, NotificationPage, Result, SoundPlayer,
};

use crate::badge::{BadgeReconciler, BadgeView};
use crate::list::{
    ListView, LoadOutcome, LoadTicket, NotificationListView, CONFIRM_CLEAR_READ, CONFIRM_DELETE,
};
use crate::toast::{ToastEvent, ToastId, ToastRenderer};

/// Input from the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCommand {
    Dismiss(ToastId),
    SetFilter(ListFilter),
    PreviousPage,
    NextPage,
    MarkRead(i64),
    MarkUnread(i64),
    Delete(i64),
    MarkAllRead,
    ClearRead,
    RefreshBadge,
    SetSound(bool),
}

/// What the surface published after handling an input.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    BadgeChanged(BadgeView),
    ListChanged(ListView),
    /// A user-initiated action failed; front ends show a blocking alert.
    ActionFailed { action: &'static str, message: String },
}

/// Timers driving the loop.
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    pub badge_poll_interval: Duration,
    pub list_refresh_interval: Duration,
    pub list_per_page: u32,
}

impl SurfaceConfig {
    pub fn from_config(config: &HeraldConfig) -> Self {
        Self {
            badge_poll_interval: Duration::from_secs(config.badge.poll_interval_secs),
            list_refresh_interval: Duration::from_secs(config.list.refresh_interval_secs),
            list_per_page: config.list.per_page,
        }
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self::from_config(&HeraldConfig::default())
    }
}

/// Write request sent on behalf of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    MarkRead(i64),
    MarkUnread(i64),
    Delete(i64),
    MarkAllRead,
    ClearRead,
}

impl Mutation {
    fn name(&self) -> &'static str {
        match self {
            Mutation::MarkRead(_) => "mark_read",
            Mutation::MarkUnread(_) => "mark_unread",
            Mutation::Delete(_) => "delete",
            Mutation::MarkAllRead => "mark_all_read",
            Mutation::ClearRead => "clear_read",
        }
    }

    fn confirmation(&self) -> Option<&'static str> {
        match self {
            Mutation::Delete(_) => Some(CONFIRM_DELETE),
            Mutation::ClearRead => Some(CONFIRM_CLEAR_READ),
            _ => None,
        }
    }

    async fn send(self, api: &dyn NotificationApi) -> Result<ActionAck> {
        match self {
            Mutation::MarkRead(id) => api.mark_read(id).await,
            Mutation::MarkUnread(id) => api.mark_unread(id).await,
            Mutation::Delete(id) => api.delete(id).await,
            Mutation::MarkAllRead => api.mark_all_read().await,
            Mutation::ClearRead => api.clear_read().await,
        }
    }
}

/// Result of a backend call spawned by the loop.
enum Completion {
    Badge {
        seq: u64,
        fetched: Result<u64>,
    },
    List {
        ticket: LoadTicket,
        result: Result<NotificationPage>,
    },
    /// `Ok(None)` when the user declined the confirmation.
    Mutation {
        action: &'static str,
        result: Result<Option<ActionAck>>,
    },
}

pub struct Surface {
    api: Arc<dyn NotificationApi>,
    config: SurfaceConfig,
    toasts: ToastRenderer,
    badge: BadgeReconciler,
    badge_seq: u64,
    list: Option<NotificationListView>,
    confirm: Arc<dyn Confirm>,
    events: EventBus<SurfaceEvent>,
    in_flight: JoinSet<Completion>,
}

/// Handle to a running surface.
pub struct SurfaceHandle {
    commands: mpsc::Sender<SurfaceCommand>,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<Surface>,
}

impl SurfaceHandle {
    pub async fn send(&self, command: SurfaceCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::Internal("Surface is not running".into()))
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))
    }

    /// Wait for the loop to stop and take back the surface state.
    pub async fn join(self) -> Result<Surface> {
        self.task
            .await
            .map_err(|e| Error::Internal(format!("Surface task failed: {e}")))
    }
}

impl Surface {
    pub fn new(api: Arc<dyn NotificationApi>, config: &HeraldConfig) -> Self {
        Self {
            api,
            config: SurfaceConfig::from_config(config),
            toasts: ToastRenderer::new(config.toast.clone()),
            badge: BadgeReconciler::new(),
            badge_seq: 0,
            list: None,
            confirm: Arc::new(AutoConfirm(false)),
            events: EventBus::default(),
            in_flight: JoinSet::new(),
        }
    }

    /// Surface backed by the HTTP client described by `config`.
    pub fn from_config(config: &HeraldConfig) -> Result<Self> {
        let client = HeraldClient::from_config(config)?;
        Ok(Self::new(Arc::new(client), config))
    }

    pub fn with_surface_config(mut self, config: SurfaceConfig) -> Self {
        self.config = config;
        self
    }

    /// Also own the notification list page (refreshed periodically).
    pub fn with_list(mut self) -> Self {
        self.list = Some(NotificationListView::new(self.config.list_per_page));
        self
    }

    pub fn with_sound(mut self, player: Arc<dyn SoundPlayer>, enabled: bool) -> Self {
        self.toasts = self.toasts.with_sound(player, enabled);
        self
    }

    /// Confirmation for delete and clear-read commands. Without one both
    /// are declined and nothing is sent.
    ///
    /// `confirm` is called from a worker task, never from the loop.
    pub fn with_confirm(mut self, confirm: Arc<dyn Confirm>) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SurfaceEvent> {
        self.events.subscribe()
    }

    pub fn subscribe_toasts(&self) -> broadcast::Receiver<ToastEvent> {
        self.toasts.subscribe()
    }

    pub fn toasts(&self) -> &ToastRenderer {
        &self.toasts
    }

    pub fn badge(&self) -> &BadgeReconciler {
        &self.badge
    }

    pub fn list(&self) -> Option<&NotificationListView> {
        self.list.as_ref()
    }

    /// Spawn the loop over `connection` events.
    pub fn start(self, connection: broadcast::Receiver<ConnectionEvent>) -> SurfaceHandle {
        let (commands, command_rx) = mpsc::channel(32);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(self.run(connection, command_rx, shutdown_rx));
        SurfaceHandle {
            commands,
            shutdown_tx,
            task,
        }
    }

    async fn run(
        mut self,
        mut connection: broadcast::Receiver<ConnectionEvent>,
        mut commands: mpsc::Receiver<SurfaceCommand>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) -> Self {
        info!(
            component = "surface",
            badge_poll_secs = self.config.badge_poll_interval.as_secs(),
            list = self.list.is_some(),
            "Notification surface started"
        );

        let mut badge_poll = interval(self.config.badge_poll_interval);
        badge_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut list_refresh = interval(self.config.list_refresh_interval);
        list_refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut connection_open = true;
        let mut commands_open = true;

        loop {
            let deadline = self.toasts.next_deadline();

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!(component = "surface", "Surface received shutdown signal");
                    break;
                }
                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.handle_command(command),
                    None => commands_open = false,
                },
                event = connection.recv(), if connection_open => match event {
                    Ok(event) => self.handle_connection_event(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(component = "surface", skipped, "Connection events lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(component = "surface", "Connection event stream closed");
                        connection_open = false;
                    }
                },
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    match joined {
                        Ok(done) => self.handle_completion(done),
                        Err(e) => {
                            warn!(component = "surface", error = %e, "Backend call task failed");
                        }
                    }
                }
                _ = badge_poll.tick() => self.spawn_badge_fetch(),
                _ = list_refresh.tick(), if self.list.is_some() => self.refresh_list(),
                _ = wait_for(deadline) => self.toasts.tick(Instant::now()),
            }
        }

        self.in_flight.abort_all();
        info!(component = "surface", "Notification surface stopped");
        self
    }

    fn handle_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Connected { sid } => {
                debug!(component = "surface", sid = %sid, "Connected, reconciling badge");
                self.spawn_badge_fetch();
            }
            ConnectionEvent::Notification { channel, event } => {
                debug!(
                    component = "surface",
                    channel = channel.event_name(),
                    kind = %event.kind,
                    "Push notification"
                );
                self.toasts.present(event, Instant::now());
            }
            ConnectionEvent::Disconnected { reason } => {
                debug!(component = "surface", reason = %reason, "Push connection lost");
            }
        }
    }

    fn handle_command(&mut self, command: SurfaceCommand) {
        match command {
            SurfaceCommand::Dismiss(id) => {
                self.toasts.dismiss(id, Instant::now());
            }
            SurfaceCommand::SetSound(enabled) => self.toasts.set_sound_enabled(enabled),
            SurfaceCommand::RefreshBadge => self.spawn_badge_fetch(),
            SurfaceCommand::SetFilter(filter) => {
                if let Some(ticket) = self.list.as_mut().map(|list| list.begin_filter(filter)) {
                    self.spawn_list_load(ticket);
                }
            }
            SurfaceCommand::PreviousPage => {
                if let Some(ticket) = self
                    .list
                    .as_mut()
                    .and_then(NotificationListView::begin_previous)
                {
                    self.spawn_list_load(ticket);
                }
            }
            SurfaceCommand::NextPage => {
                if let Some(ticket) = self
                    .list
                    .as_mut()
                    .and_then(NotificationListView::begin_next)
                {
                    self.spawn_list_load(ticket);
                }
            }
            SurfaceCommand::MarkRead(id) => self.spawn_mutation(Mutation::MarkRead(id)),
            SurfaceCommand::MarkUnread(id) => self.spawn_mutation(Mutation::MarkUnread(id)),
            SurfaceCommand::Delete(id) => self.spawn_mutation(Mutation::Delete(id)),
            SurfaceCommand::MarkAllRead => self.spawn_mutation(Mutation::MarkAllRead),
            SurfaceCommand::ClearRead => self.spawn_mutation(Mutation::ClearRead),
        }
    }

    fn spawn_badge_fetch(&mut self) {
        self.badge_seq += 1;
        let seq = self.badge_seq;
        let api = Arc::clone(&self.api);
        self.in_flight.spawn(async move {
            let fetched = api.unread_count().await;
            Completion::Badge { seq, fetched }
        });
    }

    fn spawn_list_load(&mut self, ticket: LoadTicket) {
        let api = Arc::clone(&self.api);
        self.in_flight.spawn(async move {
            let result = api.list(ticket.filter, ticket.page, ticket.per_page).await;
            Completion::List { ticket, result }
        });
    }

    fn spawn_mutation(&mut self, mutation: Mutation) {
        let api = Arc::clone(&self.api);
        let confirm = Arc::clone(&self.confirm);
        self.in_flight.spawn(async move {
            let action = mutation.name();
            if let Some(prompt) = mutation.confirmation() {
                if !confirm.confirm(prompt) {
                    return Completion::Mutation {
                        action,
                        result: Ok(None),
                    };
                }
            }
            let result = mutation.send(&*api).await.map(Some);
            Completion::Mutation { action, result }
        });
    }

    fn refresh_list(&mut self) {
        if let Some(ticket) = self.list.as_mut().map(NotificationListView::begin_load) {
            self.spawn_list_load(ticket);
        }
    }

    fn handle_completion(&mut self, done: Completion) {
        match done {
            Completion::Badge { seq, fetched } => {
                if seq != self.badge_seq {
                    debug!(
                        component = "surface",
                        seq,
                        latest = self.badge_seq,
                        "Discarding stale unread count"
                    );
                    return;
                }
                let before = self.badge.count();
                let was_synced = self.badge.is_synced();
                if self.badge.settle(fetched).is_ok()
                    && (!was_synced || before != self.badge.count())
                {
                    self.events.emit(SurfaceEvent::BadgeChanged(self.badge.view()));
                }
            }
            Completion::List { ticket, result } => {
                let outcome = match self.list.as_mut() {
                    Some(list) => list.apply(ticket, result),
                    None => return,
                };
                if outcome != LoadOutcome::Stale {
                    self.after_load(outcome.unread_count());
                }
            }
            Completion::Mutation { action, result } => match result {
                Ok(Some(ack)) => {
                    info!(component = "surface", op = action, "Action applied");
                    if let Some(count) = ack.unread_count {
                        self.apply_count(count);
                    }
                    if self.list.is_some() {
                        self.refresh_list();
                    } else if ack.unread_count.is_none() {
                        // No list to reload from: ask the backend directly.
                        self.spawn_badge_fetch();
                    }
                }
                Ok(None) => debug!(component = "surface", op = action, "Action declined"),
                Err(e) => {
                    warn!(component = "surface", op = action, error = %e, "Action failed");
                    self.events.emit(SurfaceEvent::ActionFailed {
                        action,
                        message: e.to_string(),
                    });
                }
            },
        }
    }

    /// Publish the list and apply the authoritative count it carried.
    fn after_load(&mut self, unread_count: Option<u64>) {
        if let Some(list) = self.list.as_ref() {
            self.events
                .emit(SurfaceEvent::ListChanged(list.view(Utc::now())));
        }
        if let Some(count) = unread_count {
            self.apply_count(count);
        }
    }

    fn apply_count(&mut self, count: u64) {
        let changed = !self.badge.is_synced() || self.badge.count() != count;
        self.badge.apply(count);
        if changed {
            self.events.emit(SurfaceEvent::BadgeChanged(self.badge.view()));
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

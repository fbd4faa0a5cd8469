//! Bounded toast queue.
//!
//! The renderer is a deterministic state machine driven by explicit
//! instants: [`ToastRenderer::present`] and [`ToastRenderer::dismiss`] start
//! transitions, [`ToastRenderer::tick`] applies every transition that is due,
//! and [`ToastRenderer::next_deadline`] tells the caller how long it may
//! sleep. Each handle moves `Created → Visible → Dismissing → Removed` and
//! never goes back.
//!
//! At most `capacity` toasts are live (created or visible). Presenting one
//! more immediately starts dismissing the oldest live toast by arrival order.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, trace};

use herald_core::{time_ago, EventBus, EventKind, PushEvent, SoundPlayer, ToastConfig};

use crate::render::{toast_class, Glyph};

pub type ToastId = u64;

/// Lifecycle state of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastState {
    Created,
    Visible,
    Dismissing,
    Removed,
}

impl ToastState {
    /// Created or visible; counts against capacity.
    pub fn is_live(&self) -> bool {
        matches!(self, ToastState::Created | ToastState::Visible)
    }
}

/// Why a toast started dismissing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DismissReason {
    Timeout,
    Closed,
    Evicted,
}

/// Lifecycle notifications published to front ends.
#[derive(Debug, Clone, PartialEq)]
pub enum ToastEvent {
    Shown { id: ToastId, event: PushEvent },
    Dismissing { id: ToastId, reason: DismissReason },
    Removed { id: ToastId },
}

/// One queued toast.
#[derive(Debug, Clone)]
pub struct ToastHandle {
    id: ToastId,
    event: PushEvent,
    state: ToastState,
    created_at: Instant,
    show_at: Instant,
    expires_at: Instant,
    remove_at: Option<Instant>,
}

impl ToastHandle {
    pub fn id(&self) -> ToastId {
        self.id
    }

    pub fn event(&self) -> &PushEvent {
        &self.event
    }

    pub fn state(&self) -> ToastState {
        self.state
    }

    pub fn visible(&self) -> bool {
        self.state == ToastState::Visible
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Next instant at which this handle changes state, if any.
    fn deadline(&self) -> Option<Instant> {
        match self.state {
            ToastState::Created => Some(self.show_at.min(self.expires_at)),
            ToastState::Visible => Some(self.expires_at),
            ToastState::Dismissing => self.remove_at,
            ToastState::Removed => None,
        }
    }

    pub fn view(&self, now: DateTime<Utc>) -> ToastView {
        let glyph = Glyph::for_kind(&self.event.kind);
        ToastView {
            id: self.id,
            glyph,
            icon_class: glyph.icon_class(),
            css_class: toast_class(&self.event.kind),
            message: self.event.message.clone(),
            time_label: time_ago(self.event.timestamp, now),
            visible: self.visible(),
        }
    }
}

/// Renderable form of a toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToastView {
    pub id: ToastId,
    pub glyph: Glyph,
    pub icon_class: &'static str,
    pub css_class: String,
    pub message: String,
    pub time_label: String,
    pub visible: bool,
}

/// Fixed-capacity toast queue with timed two-phase dismissal.
pub struct ToastRenderer {
    config: ToastConfig,
    queue: VecDeque<ToastHandle>,
    next_id: ToastId,
    events: EventBus<ToastEvent>,
    sound: Option<Arc<dyn SoundPlayer>>,
    sound_enabled: bool,
}

impl ToastRenderer {
    pub fn new(config: ToastConfig) -> Self {
        Self {
            config,
            queue: VecDeque::new(),
            next_id: 1,
            events: EventBus::default(),
            sound: None,
            sound_enabled: true,
        }
    }

    /// Attach an audio cue player, gated by the persisted sound preference.
    pub fn with_sound(mut self, player: Arc<dyn SoundPlayer>, enabled: bool) -> Self {
        self.sound = Some(player);
        self.sound_enabled = enabled;
        self
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ToastEvent> {
        self.events.subscribe()
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Queue a toast for `event`, evicting the oldest live toast if full.
    pub fn present(&mut self, event: PushEvent, now: Instant) -> ToastId {
        let id = self.next_id;
        self.next_id += 1;

        let kind = event.kind.clone();
        trace!(toast_id = id, kind = %kind, "Toast created");
        self.queue.push_back(ToastHandle {
            id,
            event,
            state: ToastState::Created,
            created_at: now,
            show_at: now + self.config.show_delay(),
            expires_at: now + self.config.display_timeout(),
            remove_at: None,
        });

        while self.live_count() > self.config.capacity {
            let Some(index) = self.queue.iter().position(|t| t.state.is_live()) else {
                break;
            };
            self.begin_dismiss(index, DismissReason::Evicted, now);
        }

        self.play_sound(&kind);
        id
    }

    /// Explicit close. Returns `false` if the toast is not live.
    pub fn dismiss(&mut self, id: ToastId, now: Instant) -> bool {
        match self
            .queue
            .iter()
            .position(|t| t.id == id && t.state.is_live())
        {
            Some(index) => {
                self.begin_dismiss(index, DismissReason::Closed, now);
                true
            }
            None => false,
        }
    }

    /// Apply every transition due at `now` and drop removed handles.
    pub fn tick(&mut self, now: Instant) {
        for index in 0..self.queue.len() {
            let toast = &mut self.queue[index];

            if toast.state == ToastState::Created && now >= toast.show_at {
                toast.state = ToastState::Visible;
                self.events.emit(ToastEvent::Shown {
                    id: toast.id,
                    event: toast.event.clone(),
                });
            }

            if self.queue[index].state.is_live() && now >= self.queue[index].expires_at {
                self.begin_dismiss(index, DismissReason::Timeout, now);
            }

            let toast = &mut self.queue[index];
            if toast.state == ToastState::Dismissing && toast.remove_at.is_some_and(|at| now >= at)
            {
                toast.state = ToastState::Removed;
                trace!(toast_id = toast.id, "Toast removed");
                self.events.emit(ToastEvent::Removed { id: toast.id });
            }
        }

        self.queue.retain(|t| t.state != ToastState::Removed);
    }

    /// Earliest pending transition, or `None` when the queue is idle.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.iter().filter_map(ToastHandle::deadline).min()
    }

    /// Toasts still in the queue, oldest first (includes dismissing ones).
    pub fn toasts(&self) -> impl Iterator<Item = &ToastHandle> {
        self.queue.iter()
    }

    pub fn get(&self, id: ToastId) -> Option<&ToastHandle> {
        self.queue.iter().find(|t| t.id == id)
    }

    pub fn live_count(&self) -> usize {
        self.queue.iter().filter(|t| t.state.is_live()).count()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn views(&self, now: DateTime<Utc>) -> Vec<ToastView> {
        self.queue.iter().map(|t| t.view(now)).collect()
    }

    fn begin_dismiss(&mut self, index: usize, reason: DismissReason, now: Instant) {
        let toast = &mut self.queue[index];
        toast.state = ToastState::Dismissing;
        toast.remove_at = Some(now + self.config.dismiss_delay());
        let id = toast.id;
        match reason {
            DismissReason::Evicted => debug!(toast_id = id, "Toast evicted at capacity"),
            _ => trace!(toast_id = id, ?reason, "Toast dismissing"),
        }
        self.events.emit(ToastEvent::Dismissing { id, reason });
    }

    fn play_sound(&self, kind: &EventKind) {
        if !self.sound_enabled {
            return;
        }
        if let Some(ref player) = self.sound {
            if let Err(e) = player.play(kind) {
                debug!(kind = %kind, error = %e, "Toast sound unavailable");
            }
        }
    }
}

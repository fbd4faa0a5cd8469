//! # herald-surface
//!
//! Client-side state of the notification surface: the bounded toast queue,
//! the unread badge, the paginated notification list, the backup and audit
//! log admin panels and the sidebar. Everything here is owned by one task
//! at a time; [`Surface`] is the event loop that ties the pieces to a push
//! connection.
//!
//! # Example
//!
//! ```ignore
//! use herald_client::{PushConfig, PushConnection};
//! use herald_core::HeraldConfig;
//! use herald_surface::Surface;
//!
//! let config = HeraldConfig::load()?;
//! let push = PushConnection::new(PushConfig::from_config(&config));
//! let surface = Surface::from_config(&config)?.with_list();
//! let mut toasts = surface.subscribe_toasts();
//! let handle = surface.start(push.subscribe());
//! let push = push.start();
//! ```

pub mod admin_logs;
pub mod backup;
pub mod badge;
pub mod list;
pub mod render;
pub mod sidebar;
pub mod surface;
pub mod toast;

#[cfg(test)]
mod test_fixtures;

pub use admin_logs::{AdminLogView, LogDetailView, LogRowView};
pub use backup::{BackupPanel, BackupRowView, BackupStatsView};
pub use badge::{badge_label, BadgeReconciler, BadgeView};
pub use list::{ListState, ListView, LoadOutcome, NotificationItemView, NotificationListView};
pub use render::Glyph;
pub use sidebar::{Layout, SidebarController, SidebarView};
pub use surface::{Surface, SurfaceCommand, SurfaceConfig, SurfaceEvent, SurfaceHandle};
pub use toast::{DismissReason, ToastEvent, ToastId, ToastRenderer, ToastState, ToastView};

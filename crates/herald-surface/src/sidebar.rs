//! Sidebar controller.
//!
//! A single owner for the sidebar state. On desktop the toggle collapses the
//! sidebar and the choice is persisted; on narrow viewports it opens and
//! closes a drawer instead, and nothing is persisted.

use serde::Serialize;
use tracing::{debug, warn};

use herald_core::{defaults, PreferencesStore, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Desktop,
    Mobile,
}

impl Layout {
    pub fn for_width(width_px: u32) -> Self {
        if width_px <= defaults::MOBILE_BREAKPOINT_PX {
            Layout::Mobile
        } else {
            Layout::Desktop
        }
    }
}

/// Rendered sidebar classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarView {
    pub layout: Layout,
    pub collapsed: bool,
    pub mobile_open: bool,
    pub overlay_active: bool,
}

impl SidebarView {
    /// CSS classes of the sidebar element.
    pub fn classes(&self) -> Vec<&'static str> {
        let mut classes = vec!["sidebar"];
        if self.collapsed {
            classes.push("collapsed");
        }
        if self.mobile_open {
            classes.push("mobile-open");
        }
        classes
    }
}

#[derive(Debug)]
pub struct SidebarController {
    store: PreferencesStore,
    layout: Layout,
    collapsed: bool,
    mobile_open: bool,
}

impl SidebarController {
    /// Build the controller for the initial viewport width, restoring the
    /// persisted collapsed flag on desktop.
    pub fn new(store: PreferencesStore, width_px: u32) -> Self {
        let mut controller = Self {
            store,
            layout: Layout::for_width(width_px),
            collapsed: false,
            mobile_open: false,
        };
        controller.settle();
        controller
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub fn is_mobile_open(&self) -> bool {
        self.mobile_open
    }

    /// Toggle button. Persists only in desktop mode.
    pub fn toggle(&mut self) -> Result<()> {
        match self.layout {
            Layout::Desktop => {
                self.collapsed = !self.collapsed;
                let collapsed = self.collapsed;
                debug!(component = "sidebar", collapsed, "Desktop toggle");
                if let Err(e) = self.store.update(|p| p.sidebar_collapsed = collapsed) {
                    warn!(component = "sidebar", error = %e, "Failed to persist sidebar state");
                    return Err(e);
                }
                Ok(())
            }
            Layout::Mobile => {
                self.mobile_open = !self.mobile_open;
                debug!(component = "sidebar", open = self.mobile_open, "Mobile toggle");
                Ok(())
            }
        }
    }

    /// Overlay or navigation link activated.
    pub fn close_mobile(&mut self) {
        if self.layout == Layout::Mobile && self.mobile_open {
            self.mobile_open = false;
            debug!(component = "sidebar", "Mobile drawer closed");
        }
    }

    /// Viewport resized.
    pub fn resize(&mut self, width_px: u32) {
        let layout = Layout::for_width(width_px);
        if layout != self.layout {
            debug!(component = "sidebar", ?layout, "Layout changed");
        }
        self.layout = layout;
        self.settle();
    }

    fn settle(&mut self) {
        self.mobile_open = false;
        self.collapsed = match self.layout {
            Layout::Desktop => self.store.load().sidebar_collapsed,
            Layout::Mobile => false,
        };
    }

    pub fn view(&self) -> SidebarView {
        SidebarView {
            layout: self.layout,
            collapsed: self.collapsed,
            mobile_open: self.mobile_open,
            overlay_active: self.mobile_open,
        }
    }
}

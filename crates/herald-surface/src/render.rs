//! Glyph and label lookups shared by the toast renderer and the list view.
//!
//! Every lookup is total: unrecognized kinds and categories degrade to the
//! generic bell glyph (and, for category labels, to the raw tag).

use serde::Serialize;

use herald_core::{Category, EventKind};

/// Icon glyph shown next to a toast or list row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Glyph {
    CheckCircle,
    InfoCircle,
    ExclamationTriangle,
    TimesCircle,
    Bell,
    HandSparkles,
    Trophy,
    LevelUp,
    Dragon,
    Users,
    Medal,
    CalendarStar,
    Cog,
    ShieldAlt,
    UserPlus,
}

impl Glyph {
    /// Glyph for a push event kind.
    pub fn for_kind(kind: &EventKind) -> Self {
        match kind {
            EventKind::Success => Glyph::CheckCircle,
            EventKind::Info => Glyph::InfoCircle,
            EventKind::Warning => Glyph::ExclamationTriangle,
            EventKind::Error => Glyph::TimesCircle,
            EventKind::Unknown(_) => Glyph::Bell,
        }
    }

    /// Glyph for a notification category.
    pub fn for_category(category: &Category) -> Self {
        match category {
            Category::Welcome => Glyph::HandSparkles,
            Category::Challenge => Glyph::Trophy,
            Category::LevelUp => Glyph::LevelUp,
            Category::Boss => Glyph::Dragon,
            Category::Team => Glyph::Users,
            Category::Achievement => Glyph::Medal,
            Category::Event => Glyph::CalendarStar,
            Category::System => Glyph::Cog,
            Category::Admin => Glyph::ShieldAlt,
            Category::UserRegistration => Glyph::UserPlus,
            Category::General | Category::Other(_) => Glyph::Bell,
        }
    }

    /// Font Awesome class name used by the web front end.
    pub fn icon_class(&self) -> &'static str {
        match self {
            Glyph::CheckCircle => "fa-check-circle",
            Glyph::InfoCircle => "fa-info-circle",
            Glyph::ExclamationTriangle => "fa-exclamation-triangle",
            Glyph::TimesCircle => "fa-times-circle",
            Glyph::Bell => "fa-bell",
            Glyph::HandSparkles => "fa-hand-sparkles",
            Glyph::Trophy => "fa-trophy",
            Glyph::LevelUp => "fa-level-up-alt",
            Glyph::Dragon => "fa-dragon",
            Glyph::Users => "fa-users",
            Glyph::Medal => "fa-medal",
            Glyph::CalendarStar => "fa-calendar-star",
            Glyph::Cog => "fa-cog",
            Glyph::ShieldAlt => "fa-shield-alt",
            Glyph::UserPlus => "fa-user-plus",
        }
    }

    /// Single-character rendition for terminal front ends.
    pub fn symbol(&self) -> &'static str {
        match self {
            Glyph::CheckCircle => "✔",
            Glyph::InfoCircle => "ℹ",
            Glyph::ExclamationTriangle => "⚠",
            Glyph::TimesCircle => "✖",
            Glyph::Bell => "🔔",
            Glyph::HandSparkles => "👋",
            Glyph::Trophy => "🏆",
            Glyph::LevelUp => "⬆",
            Glyph::Dragon => "🐉",
            Glyph::Users => "👥",
            Glyph::Medal => "🏅",
            Glyph::CalendarStar => "📅",
            Glyph::Cog => "⚙",
            Glyph::ShieldAlt => "🛡",
            Glyph::UserPlus => "👤",
        }
    }
}

/// Translated category label; unknown tags are shown as-is.
pub fn category_label(category: &Category) -> String {
    let label = match category {
        Category::Welcome => "Boas-vindas",
        Category::Challenge => "Desafio",
        Category::LevelUp => "Level Up",
        Category::Boss => "Boss Fight",
        Category::Team => "Time",
        Category::Achievement => "Conquista",
        Category::Event => "Evento",
        Category::System => "Sistema",
        Category::Admin => "Admin",
        Category::UserRegistration => "Novo Usuário",
        Category::General => "Geral",
        Category::Other(raw) => return raw.clone(),
    };
    label.to_string()
}

/// CSS-style class of a toast (`notification-success`, ...).
pub fn toast_class(kind: &EventKind) -> String {
    format!("notification-{}", kind.as_str())
}

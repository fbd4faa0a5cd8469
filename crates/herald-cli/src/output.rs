//! Plain-text rendering of the surface views.

use chrono::{DateTime, Utc};

use herald_core::{time_ago, PushEvent};
use herald_surface::list::ListState;
use herald_surface::{
    BackupRowView, BackupStatsView, BadgeView, Glyph, ListView, LogDetailView, LogRowView,
};

pub fn badge_line(count: u64, view: &BadgeView) -> String {
    if view.visible {
        format!("Não lidas: {count} [{}]", view.label)
    } else {
        "Nenhuma notificação não lida".to_string()
    }
}

pub fn toast_line(event: &PushEvent, now: DateTime<Utc>) -> String {
    format!(
        "{} [{}] {} ({})",
        Glyph::for_kind(&event.kind).symbol(),
        event.kind,
        event.message,
        time_ago(event.timestamp, now)
    )
}

pub fn list_lines(view: &ListView) -> Vec<String> {
    let mut lines = vec![format!(
        "Todas: {} | Não lidas: {} | Lidas: {}",
        view.counts.all, view.counts.unread, view.counts.read
    )];

    if let Some(status) = view.status_text {
        lines.push(status.to_string());
    }
    if view.state == ListState::Empty {
        lines.push("Nenhuma notificação".to_string());
    }

    for item in &view.items {
        lines.push(format!(
            "{} #{:<5} {} {:<14} {} ({})",
            if item.is_read { " " } else { "●" },
            item.id,
            item.glyph.symbol(),
            item.category_label,
            item.message,
            item.time_label
        ));
    }

    if view.show_pagination {
        lines.push(view.pagination.label.clone());
    }
    lines
}

pub fn backup_lines(stats: &BackupStatsView, rows: &[BackupRowView]) -> Vec<String> {
    let mut lines = vec![format!(
        "Backups: {} | Tamanho total: {} | Último backup: {}",
        stats.total_backups, stats.total_size, stats.latest_backup
    )];
    if rows.is_empty() {
        lines.push("Nenhum backup encontrado".to_string());
    }
    for row in rows {
        lines.push(format!(
            "#{:<5} {}  {:<10} {:>10}  {:<16} {}",
            row.id, row.created_at, row.backup_type, row.size, row.creator_name, row.status
        ));
    }
    lines
}

pub fn log_lines(rows: &[LogRowView], pagination_label: &str) -> Vec<String> {
    let mut lines: Vec<String> = rows
        .iter()
        .map(|row| {
            format!(
                "#{:<6} {}  {:<16} {:<10} {:<16} {}",
                row.id, row.created_at, row.admin_name, row.action, row.resource, row.description
            )
        })
        .collect();
    if lines.is_empty() {
        lines.push("Nenhum registro encontrado".to_string());
    }
    lines.push(pagination_label.to_string());
    lines
}

pub fn log_detail_lines(detail: &LogDetailView) -> Vec<String> {
    let row = &detail.row;
    let mut lines = vec![
        format!("Registro #{}", row.id),
        format!("Data:       {}", row.created_at),
        format!("Admin:      {}", row.admin_name),
        format!("Ação:       {}", row.action),
        format!("Recurso:    {}", row.resource),
        format!("Descrição:  {}", row.description),
        format!("IP:         {}", row.ip_address),
    ];
    if let Some(agent) = &detail.user_agent {
        lines.push(format!("User-Agent: {agent}"));
    }
    if let Some(changes) = &detail.changes {
        lines.push("Alterações:".to_string());
        lines.extend(changes.lines().map(|l| format!("  {l}")));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::PaginationView;
    use herald_surface::list::ListCounts;

    #[test]
    fn test_badge_line_hidden_at_zero() {
        let hidden = BadgeView {
            visible: false,
            label: String::new(),
        };
        assert_eq!(badge_line(0, &hidden), "Nenhuma notificação não lida");

        let capped = BadgeView {
            visible: true,
            label: "99+".into(),
        };
        assert_eq!(badge_line(120, &capped), "Não lidas: 120 [99+]");
    }

    #[test]
    fn test_toast_line_uses_glyph_and_age() {
        let now = Utc::now();
        let event = PushEvent::new("warning", "Servidor reiniciando").at(now);
        assert_eq!(toast_line(&event, now), "⚠ [warning] Servidor reiniciando (Agora)");
    }

    #[test]
    fn test_empty_list_lines() {
        let view = ListView {
            filter: Default::default(),
            state: ListState::Empty,
            status_text: None,
            items: vec![],
            counts: ListCounts::default(),
            pagination: PaginationView {
                page: 1,
                total_pages: 0,
                previous_disabled: true,
                next_disabled: true,
                label: "Página 1 de 0".into(),
            },
            show_pagination: false,
        };
        let lines = list_lines(&view);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "Nenhuma notificação");
    }

    #[test]
    fn test_log_lines_always_end_with_pagination() {
        let lines = log_lines(&[], "Página 1 de 1");
        assert_eq!(lines, vec!["Nenhum registro encontrado", "Página 1 de 1"]);
    }
}

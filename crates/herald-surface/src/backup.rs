//! Backup administration panel.
//!
//! Holds the last fetched backup listing and drives the backup endpoints.
//! Every accepted mutation reloads the listing; a restore additionally
//! tells the caller that all application state is now stale.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use herald_core::{
    format_datetime, BackupApi, BackupRecord, BackupStats, BackupValidation, CleanupPolicy,
    Confirm, RestoreOutcome, Result,
};

pub const CONFIRM_DELETE_BACKUP: &str = "Tem certeza que deseja deletar este backup?";

const NEVER: &str = "Nunca";

/// Prompt shown before a restore.
pub fn restore_prompt(filename: &str) -> String {
    format!(
        "Restaurar o backup {filename}? O banco de dados atual será substituído."
    )
}

fn size_label(size_mb: f64) -> String {
    format!("{size_mb} MB")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupStatsView {
    pub total_backups: u64,
    pub total_size: String,
    pub latest_backup: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupRowView {
    pub id: i64,
    pub filename: String,
    pub created_at: String,
    pub backup_type: String,
    pub size: String,
    pub creator_name: String,
    pub is_valid: bool,
    pub status: &'static str,
}

impl BackupRowView {
    pub fn from_record(backup: &BackupRecord) -> Self {
        Self {
            id: backup.id,
            filename: backup.filename.clone(),
            created_at: format_datetime(backup.created_at),
            backup_type: backup.backup_type.clone(),
            size: size_label(backup.size_mb),
            creator_name: backup.creator_name.clone(),
            is_valid: backup.is_valid,
            status: if backup.is_valid { "Valido" } else { "Invalido" },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BackupPanel {
    backups: Vec<BackupRecord>,
    stats: BackupStats,
    last_error: Option<String>,
}

impl BackupPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backups(&self) -> &[BackupRecord] {
        &self.backups
    }

    pub fn stats(&self) -> &BackupStats {
        &self.stats
    }

    /// Message of the last failed load, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Fetch the listing. On failure the previous listing is kept.
    pub async fn load<A>(&mut self, api: &A) -> Result<()>
    where
        A: BackupApi + ?Sized,
    {
        match api.list_backups().await {
            Ok(listing) => {
                debug!(
                    component = "backup",
                    result_count = listing.backups.len(),
                    "Backup listing loaded"
                );
                self.backups = listing.backups;
                self.stats = listing.stats;
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                warn!(component = "backup", error = %e, "Failed to load backups");
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn create<A>(&mut self, api: &A, notes: Option<&str>) -> Result<BackupRecord>
    where
        A: BackupApi + ?Sized,
    {
        let backup = api.create_backup(notes).await?;
        info!(component = "backup", backup_id = backup.id, "Backup created");
        self.reload(api).await;
        Ok(backup)
    }

    pub async fn validate<A>(&mut self, api: &A, id: i64) -> Result<BackupValidation>
    where
        A: BackupApi + ?Sized,
    {
        let validation = api.validate_backup(id).await?;
        info!(
            component = "backup",
            backup_id = id,
            is_valid = validation.is_valid,
            "Backup validated"
        );
        self.reload(api).await;
        Ok(validation)
    }

    pub fn download_url<A>(&self, api: &A, id: i64) -> String
    where
        A: BackupApi + ?Sized,
    {
        api.download_url(id)
    }

    pub async fn download<A>(&self, api: &A, id: i64, dest: &Path) -> Result<u64>
    where
        A: BackupApi + ?Sized,
    {
        let bytes = api.download_backup(id, dest).await?;
        info!(
            component = "backup",
            backup_id = id,
            bytes,
            dest = %dest.display(),
            "Backup downloaded"
        );
        Ok(bytes)
    }

    /// Restore after confirmation. `Ok(None)` when declined.
    ///
    /// A successful restore replaces the whole database: the caller must
    /// discard every cached view (list, badge, this panel) and start over.
    pub async fn restore<A>(
        &mut self,
        api: &A,
        confirm: &dyn Confirm,
        id: i64,
    ) -> Result<Option<RestoreOutcome>>
    where
        A: BackupApi + ?Sized,
    {
        let filename = self
            .backups
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.filename.clone())
            .unwrap_or_else(|| format!("#{id}"));
        if !confirm.confirm(&restore_prompt(&filename)) {
            debug!(component = "backup", backup_id = id, "Restore declined");
            return Ok(None);
        }

        let outcome = api.restore_backup(id).await?;
        info!(
            component = "backup",
            backup_id = id,
            safety_backup_id = ?outcome.safety_backup_id,
            "Database restored"
        );
        Ok(Some(outcome))
    }

    /// Delete after confirmation. Returns whether anything was sent.
    pub async fn delete<A>(&mut self, api: &A, confirm: &dyn Confirm, id: i64) -> Result<bool>
    where
        A: BackupApi + ?Sized,
    {
        if !confirm.confirm(CONFIRM_DELETE_BACKUP) {
            debug!(component = "backup", backup_id = id, "Delete declined");
            return Ok(false);
        }
        api.delete_backup(id).await?;
        info!(component = "backup", backup_id = id, "Backup deleted");
        self.reload(api).await;
        Ok(true)
    }

    /// Apply a retention policy; returns how many backups were removed.
    pub async fn cleanup<A>(&mut self, api: &A, policy: CleanupPolicy) -> Result<u64>
    where
        A: BackupApi + ?Sized,
    {
        let removed = api.cleanup_backups(policy).await?;
        info!(
            component = "backup",
            removed,
            keep_count = policy.keep_count,
            keep_days = policy.keep_days,
            "Backups cleaned up"
        );
        self.reload(api).await;
        Ok(removed)
    }

    // A failed reload after an accepted mutation is already logged by load.
    async fn reload<A>(&mut self, api: &A)
    where
        A: BackupApi + ?Sized,
    {
        let _ = self.load(api).await;
    }

    pub fn stats_view(&self) -> BackupStatsView {
        BackupStatsView {
            total_backups: self.stats.total_backups,
            total_size: size_label(self.stats.total_size_mb),
            latest_backup: self
                .stats
                .latest_backup
                .as_ref()
                .map(|b| format_datetime(b.created_at))
                .unwrap_or_else(|| NEVER.to_string()),
        }
    }

    pub fn rows(&self) -> Vec<BackupRowView> {
        self.backups.iter().map(BackupRowView::from_record).collect()
    }
}

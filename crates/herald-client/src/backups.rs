//! Backup administration endpoints.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use herald_core::{
    BackupApi, BackupListing, BackupRecord, BackupValidation, CleanupPolicy, Error, Result,
    RestoreOutcome,
};

use crate::client::HeraldClient;

const BASE: &str = "/admin/backup/api";

#[derive(Debug, Deserialize)]
struct CreatedBackup {
    backup: BackupRecord,
}

#[derive(Debug, Deserialize)]
struct ValidationEnvelope {
    validation: BackupValidation,
}

#[derive(Debug, Deserialize)]
struct CleanupEnvelope {
    #[serde(default)]
    removed_count: u64,
}

#[async_trait]
impl BackupApi for HeraldClient {
    async fn list_backups(&self) -> Result<BackupListing> {
        let req = self.build_get_request(&format!("{}/list", BASE));
        self.send(req, "list_backups").await
    }

    async fn create_backup(&self, notes: Option<&str>) -> Result<BackupRecord> {
        let req = self
            .build_request(Method::POST, &format!("{}/create", BASE))
            .json(&serde_json::json!({ "notes": notes.unwrap_or_default() }));
        let created: CreatedBackup = self.send(req, "create_backup").await?;
        info!(
            backup_id = created.backup.id,
            filename = %created.backup.filename,
            "Backup created"
        );
        Ok(created.backup)
    }

    async fn validate_backup(&self, id: i64) -> Result<BackupValidation> {
        let req = self.build_get_request(&format!("{}/validate/{}", BASE, id));
        let body: ValidationEnvelope = self.send(req, "validate_backup").await?;
        Ok(body.validation)
    }

    async fn restore_backup(&self, id: i64) -> Result<RestoreOutcome> {
        let req = self.build_request(Method::POST, &format!("{}/restore/{}", BASE, id));
        let outcome: RestoreOutcome = self.send(req, "restore_backup").await?;
        info!(
            backup_id = id,
            safety_backup_id = ?outcome.safety_backup_id,
            "Database restored from backup"
        );
        Ok(outcome)
    }

    async fn delete_backup(&self, id: i64) -> Result<()> {
        let req = self.build_request(Method::POST, &format!("{}/delete/{}", BASE, id));
        let _: serde_json::Value = self.send(req, "delete_backup").await?;
        info!(backup_id = id, "Backup deleted");
        Ok(())
    }

    async fn cleanup_backups(&self, policy: CleanupPolicy) -> Result<u64> {
        let req = self
            .build_request(Method::POST, &format!("{}/cleanup", BASE))
            .json(&policy);
        let body: CleanupEnvelope = self.send(req, "cleanup_backups").await?;
        info!(
            removed = body.removed_count,
            keep_count = policy.keep_count,
            keep_days = policy.keep_days,
            "Old backups cleaned up"
        );
        Ok(body.removed_count)
    }

    fn download_url(&self, id: i64) -> String {
        self.url(&format!("{}/download/{}", BASE, id))
    }

    async fn download_backup(&self, id: i64, dest: &Path) -> Result<u64> {
        let mut response = self
            .build_get_request(&format!("{}/download/{}", BASE, id))
            .send()
            .await
            .map_err(|e| Error::Request(format!("download_backup failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            // Failures come back as a JSON envelope instead of the file.
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {}", status));
            warn!(backup_id = id, status = status.as_u16(), error = %message, "Download refused");
            return Err(if status == reqwest::StatusCode::NOT_FOUND {
                Error::NotFound(message)
            } else {
                Error::Rejected(message)
            });
        }

        // Stream into a sibling file so a broken transfer never leaves a
        // truncated backup at `dest`.
        let partial = partial_path(dest)?;
        let written = match stream_to_file(&mut response, &partial).await {
            Ok(written) => written,
            Err(e) => {
                warn!(backup_id = id, error = %e, "Download interrupted, discarding partial file");
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e);
            }
        };
        tokio::fs::rename(&partial, dest).await?;

        info!(backup_id = id, bytes = written, dest = %dest.display(), "Backup downloaded");
        Ok(written)
    }
}

fn partial_path(dest: &Path) -> Result<PathBuf> {
    let name = dest
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("Not a file path: {}", dest.display())))?;
    let mut partial = name.to_os_string();
    partial.push(".part");
    Ok(dest.with_file_name(partial))
}

async fn stream_to_file(response: &mut reqwest::Response, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

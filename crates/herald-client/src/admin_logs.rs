//! Audit log endpoints.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use herald_core::{AdminLogApi, AdminLogEntry, AdminLogPage, LogFilter, Result};

use crate::client::HeraldClient;

const BASE: &str = "/admin/logs/api";

#[derive(Debug, Deserialize)]
struct LogEnvelope {
    log: AdminLogEntry,
}

#[async_trait]
impl AdminLogApi for HeraldClient {
    async fn list_logs(
        &self,
        filter: &LogFilter,
        page: u32,
        per_page: u32,
    ) -> Result<AdminLogPage> {
        let mut query = vec![("page", page.to_string()), ("per_page", per_page.to_string())];
        query.extend(filter.query_pairs());

        let req = self
            .build_get_request(&format!("{}/list", BASE))
            .query(&query);
        let result: AdminLogPage = self.send(req, "list_logs").await?;
        debug!(
            page,
            result_count = result.logs.len(),
            total = result.total,
            "Loaded audit log page"
        );
        Ok(result)
    }

    async fn get_log(&self, id: i64) -> Result<AdminLogEntry> {
        let req = self.build_get_request(&format!("{}/{}", BASE, id));
        let body: LogEnvelope = self.send(req, "get_log").await?;
        Ok(body.log)
    }

    fn export_url(&self, filter: &LogFilter) -> String {
        let base = self.url(&format!("{}/export", BASE));
        let pairs = filter.query_pairs();
        if pairs.is_empty() {
            return base;
        }
        let query = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", base, query)
    }
}

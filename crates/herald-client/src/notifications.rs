//! Notification endpoints.

use async_trait::async_trait;
use reqwest::Method;
use tracing::debug;

use herald_core::{ActionAck, ListFilter, NotificationApi, NotificationPage, Result, UnreadCount};

use crate::client::HeraldClient;

const BASE: &str = "/notifications/api";

#[async_trait]
impl NotificationApi for HeraldClient {
    async fn list(&self, filter: ListFilter, page: u32, per_page: u32) -> Result<NotificationPage> {
        let req = self.build_get_request(&format!("{}/list", BASE)).query(&[
            ("filter", filter.as_str().to_string()),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ]);
        let result: NotificationPage = self.send(req, "list_notifications").await?;
        debug!(
            filter = %filter,
            page,
            result_count = result.notifications.len(),
            unread_count = result.unread_count,
            "Loaded notifications"
        );
        Ok(result)
    }

    async fn unread_count(&self) -> Result<u64> {
        let req = self.build_get_request(&format!("{}/unread-count", BASE));
        let body: UnreadCount = self.send(req, "unread_count").await?;
        Ok(body.unread_count)
    }

    async fn mark_read(&self, id: i64) -> Result<ActionAck> {
        let req = self.build_request(Method::POST, &format!("{}/{}/read", BASE, id));
        self.send(req, "mark_read").await
    }

    async fn mark_unread(&self, id: i64) -> Result<ActionAck> {
        let req = self.build_request(Method::POST, &format!("{}/{}/unread", BASE, id));
        self.send(req, "mark_unread").await
    }

    async fn delete(&self, id: i64) -> Result<ActionAck> {
        let req = self.build_request(Method::DELETE, &format!("{}/{}", BASE, id));
        self.send(req, "delete_notification").await
    }

    async fn mark_all_read(&self) -> Result<ActionAck> {
        let req = self.build_request(Method::POST, &format!("{}/mark-all-read", BASE));
        self.send(req, "mark_all_read").await
    }

    async fn clear_read(&self) -> Result<ActionAck> {
        let req = self.build_request(Method::POST, &format!("{}/clear-read", BASE));
        self.send(req, "clear_read").await
    }
}

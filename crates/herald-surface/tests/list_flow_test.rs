//! End-to-end flows of the surface views through the real HTTP client.

use chrono::Utc;
use herald_client::HeraldClient;
use herald_core::config::ServerConfig;
use herald_core::{AutoConfirm, ListFilter};
use herald_surface::{BadgeReconciler, ListState, LoadOutcome, NotificationListView};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HeraldClient {
    HeraldClient::new(ServerConfig {
        base_url: server.uri(),
        timeout_secs: 5,
        csrf_token: Some("csrf-abc".to_string()),
        session_cookie: Some("session=xyz".to_string()),
    })
    .expect("Failed to create client")
}

fn record(id: i64, is_read: bool, category: &str) -> serde_json::Value {
    json!({
        "id": id,
        "type": "success",
        "category": category,
        "message": format!("Notificação {id}"),
        "is_read": is_read,
        "created_at": "2025-03-01T12:00:00"
    })
}

#[tokio::test]
async fn test_unread_first_page_renders_three_items() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notifications/api/list"))
        .and(query_param("filter", "unread"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "notifications": [
                record(1, false, "challenge"),
                record(2, false, "boss"),
                record(3, false, "seasonal")
            ],
            "total": 23,
            "unread_count": 23,
            "page": 1,
            "per_page": 20,
            "total_pages": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut list = NotificationListView::default();
    let mut badge = BadgeReconciler::new();

    let outcome = list.load(&client, ListFilter::Unread, 1).await;
    if let Some(count) = outcome.unread_count() {
        badge.apply(count);
    }

    let view = list.view(Utc::now());
    assert_eq!(view.items.len(), 3);
    assert_eq!(view.pagination.label, "Página 1 de 2");
    assert!(view.pagination.previous_disabled);
    assert!(!view.pagination.next_disabled);
    assert_eq!(view.items[1].icon_class, "fa-dragon");
    assert_eq!(view.items[2].icon_class, "fa-bell");
    assert_eq!(view.items[2].category_label, "seasonal");
    assert_eq!(badge.view().label, "23");
}

#[tokio::test]
async fn test_backend_rejection_shows_error_state() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notifications/api/list"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"success": false, "error": "Erro interno"})),
        )
        .mount(&server)
        .await;

    let mut list = NotificationListView::default();
    let outcome = list.reload(&client_for(&server)).await;
    assert_eq!(outcome, LoadOutcome::Failed);
    assert!(matches!(list.state(), ListState::Error(m) if m.contains("Erro interno")));
}

#[tokio::test]
async fn test_mark_all_read_then_reload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/notifications/api/mark-all-read"))
        .and(header("X-CSRFToken", "csrf-abc"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "unread_count": 0})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/notifications/api/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "notifications": [record(1, true, "team")],
            "total": 1,
            "unread_count": 0,
            "page": 1,
            "total_pages": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut list = NotificationListView::default();
    let outcome = list.mark_all_read(&client_for(&server)).await.unwrap();
    assert_eq!(outcome.unread_count(), Some(0));
    assert!(list.records()[0].is_read);
}

#[tokio::test]
async fn test_declined_delete_sends_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(0)
        .mount(&server)
        .await;

    let mut list = NotificationListView::default();
    let result = list
        .delete(&client_for(&server), &AutoConfirm(false), 5)
        .await
        .unwrap();
    assert!(result.is_none());
}

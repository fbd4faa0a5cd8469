//! Integration tests for the HTTP endpoints against a mock backend.

use herald_client::HeraldClient;
use herald_core::config::ServerConfig;
use herald_core::{
    AdminLogApi, BackupApi, CleanupPolicy, Error, ListFilter, LogFilter, NotificationApi,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
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

fn record(id: i64, is_read: bool) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": 1,
        "type": "info",
        "category": "challenge",
        "message": format!("Notificação {id}"),
        "data": {},
        "is_read": is_read,
        "created_at": "2025-03-01T12:00:00.000000",
        "timestamp": "2025-03-01T12:00:00.000000"
    })
}

#[tokio::test]
async fn test_list_sends_filter_and_paging() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notifications/api/list"))
        .and(query_param("filter", "unread"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "20"))
        .and(header("Cookie", "session=xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "notifications": [record(1, false), record(2, false), record(3, false)],
            "total": 23,
            "unread_count": 3,
            "page": 1,
            "per_page": 20,
            "total_pages": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client_for(&server)
        .list(ListFilter::Unread, 1, 20)
        .await
        .expect("list should succeed");

    assert_eq!(page.notifications.len(), 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.unread_count, 3);
    assert_eq!(page.per_page, Some(20));
}

#[tokio::test]
async fn test_unread_count() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/notifications/api/unread-count"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "unread_count": 120})),
        )
        .mount(&server)
        .await;

    assert_eq!(client_for(&server).unread_count().await.unwrap(), 120);
}

#[tokio::test]
async fn test_mutations_carry_csrf_header() {
    let server = MockServer::start().await;
    let ack = ResponseTemplate::new(200).set_body_json(json!({"success": true, "unread_count": 4}));

    for (verb, route) in [
        ("POST", "/notifications/api/7/read"),
        ("POST", "/notifications/api/7/unread"),
        ("DELETE", "/notifications/api/7"),
        ("POST", "/notifications/api/mark-all-read"),
        ("POST", "/notifications/api/clear-read"),
    ] {
        Mock::given(method(verb))
            .and(path(route))
            .and(header("X-CSRFToken", "csrf-abc"))
            .respond_with(ack.clone())
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client_for(&server);
    assert_eq!(client.mark_read(7).await.unwrap().unread_count, Some(4));
    assert_eq!(client.mark_unread(7).await.unwrap().unread_count, Some(4));
    assert_eq!(client.delete(7).await.unwrap().unread_count, Some(4));
    assert_eq!(client.mark_all_read().await.unwrap().unread_count, Some(4));
    assert_eq!(client.clear_read().await.unwrap().unread_count, Some(4));
}

#[tokio::test]
async fn test_success_false_is_rejected_with_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/notifications/api/99/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": "Notificação não encontrada"
        })))
        .mount(&server)
        .await;

    match client_for(&server).mark_read(99).await {
        Err(Error::Rejected(msg)) => assert_eq!(msg, "Notificação não encontrada"),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_http_error_status_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/backup/api/list"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"success": false, "error": "Acesso negado"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).list_backups().await.unwrap_err();
    assert!(matches!(err, Error::Rejected(ref m) if m == "Acesso negado"));
    assert!(!err.is_transport());
}

#[tokio::test]
async fn test_transport_failure_is_request_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = HeraldClient::new(ServerConfig {
        base_url: uri,
        timeout_secs: 2,
        ..ServerConfig::default()
    })
    .unwrap();

    let err = client.unread_count().await.unwrap_err();
    assert!(err.is_transport(), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_backup_create_and_cleanup() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/admin/backup/api/create"))
        .and(body_json(json!({"notes": "antes da migração"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Backup criado com sucesso",
            "backup": {
                "id": 12,
                "filename": "backup_20250301_120000.db.gz",
                "size_bytes": 1048576,
                "size_mb": 1.0,
                "created_at": "2025-03-01T12:00:00",
                "created_by": 1,
                "creator_name": "Ana",
                "backup_type": "manual",
                "is_valid": true,
                "notes": "antes da migração"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/admin/backup/api/cleanup"))
        .and(body_json(json!({"keep_count": 10, "keep_days": 30})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "3 backups removidos",
            "removed_count": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let backup = client.create_backup(Some("antes da migração")).await.unwrap();
    assert_eq!(backup.id, 12);
    assert_eq!(backup.creator_name, "Ana");

    let removed = client.cleanup_backups(CleanupPolicy::default()).await.unwrap();
    assert_eq!(removed, 3);
}

#[tokio::test]
async fn test_backup_validate_restore_delete() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/admin/backup/api/validate/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "validation": {"is_valid": false, "message": "Hash MD5 não corresponde - arquivo corrompido"}
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/admin/backup/api/restore/5"))
        .and(header_exists("X-CSRFToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Banco de dados restaurado com sucesso",
            "safety_backup_id": 13
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/admin/backup/api/delete/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Erro ao remover backup"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let validation = client.validate_backup(5).await.unwrap();
    assert!(!validation.is_valid);

    let outcome = client.restore_backup(5).await.unwrap();
    assert_eq!(outcome.safety_backup_id, Some(13));

    let err = client.delete_backup(5).await.unwrap_err();
    assert!(matches!(err, Error::Rejected(ref m) if m == "Erro ao remover backup"));
}

#[tokio::test]
async fn test_backup_download_writes_file() {
    let server = MockServer::start().await;
    let payload = vec![0x1fu8, 0x8b, 0x08, 0x00, 1, 2, 3, 4];

    Mock::given(method("GET"))
        .and(path("/admin/backup/api/download/3"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/backup/api/download/4"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "error": "Arquivo de backup não encontrado"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("backup.db.gz");

    let written = client.download_backup(3, &dest).await.unwrap();
    assert_eq!(written, payload.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), payload);
    assert!(!dir.path().join("backup.db.gz.part").exists());

    let err = client
        .download_backup(4, &dir.path().join("missing.db.gz"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    assert_eq!(
        client.download_url(3),
        format!("{}/admin/backup/api/download/3", server.uri())
    );
}

#[tokio::test]
async fn test_interrupted_download_leaves_no_partial_file() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Announces 64 bytes, sends 8, then hangs up.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = vec![0u8; 4096];
        let _ = socket.read(&mut request).await;
        let head = "HTTP/1.1 200 OK\r\n\
                    content-type: application/gzip\r\n\
                    content-length: 64\r\n\r\n";
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&[0x1f, 0x8b, 0x08, 0x00, 1, 2, 3, 4]).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    let client = HeraldClient::new(ServerConfig {
        base_url: format!("http://{addr}"),
        timeout_secs: 5,
        csrf_token: None,
        session_cookie: None,
    })
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("backup.db.gz");
    std::fs::write(&dest, b"previous").unwrap();

    assert!(client.download_backup(7, &dest).await.is_err());
    assert_eq!(std::fs::read(&dest).unwrap(), b"previous");
    assert!(!dir.path().join("backup.db.gz.part").exists());
}

#[tokio::test]
async fn test_admin_logs_list_and_detail() {
    let server = MockServer::start().await;
    let entry = json!({
        "id": 41,
        "admin_id": 1,
        "admin_name": "Ana",
        "action": "DELETE",
        "resource_type": "Backup",
        "resource_id": 5,
        "description": "Removeu backup",
        "ip_address": "10.0.0.2",
        "user_agent": "Mozilla/5.0",
        "changes": {},
        "created_at": "2025-03-02T08:15:00"
    });

    Mock::given(method("GET"))
        .and(path("/admin/logs/api/list"))
        .and(query_param("page", "2"))
        .and(query_param("per_page", "50"))
        .and(query_param("action", "DELETE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "logs": [entry.clone()],
            "total": 51,
            "page": 2,
            "per_page": 50,
            "total_pages": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin/logs/api/41"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "log": entry})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let filter = LogFilter {
        action: Some("DELETE".to_string()),
        ..LogFilter::default()
    };
    let page = client.list_logs(&filter, 2, 50).await.unwrap();
    assert_eq!(page.logs.len(), 1);
    assert_eq!(page.total_pages, 2);

    let detail = client.get_log(41).await.unwrap();
    assert_eq!(detail.admin_name, "Ana");
    assert_eq!(detail.resource_id, Some(5));
}

#![allow(clippy::unwrap_used)]
// Integration tests for `RestClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use courtside_api::rest::{ListQuery, NotificationCreate};
use courtside_api::{Error, RestClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RestClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let token: secrecy::SecretString = "test-token".to_string().into();
    let client = RestClient::with_client(reqwest::Client::new(), base_url, Some(token));
    (server, client)
}

fn record(id: &str, read: bool) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": "u1",
        "title": "Milestone",
        "message": "Tatum reached 30 points",
        "type": "alert",
        "read": read,
        "data": { "threshold": 30 },
        "url": "/players/p1",
        "created_at": "2026-02-10T12:00:00Z"
    })
}

// ── Notifications ───────────────────────────────────────────────────

#[tokio::test]
async fn test_create_notification_sends_bearer_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/notifications"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({ "type": "alert", "user_id": "u1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(record("n1", false)))
        .expect(1)
        .mount(&server)
        .await;

    let created = client
        .create_notification(&NotificationCreate {
            user_id: "u1".into(),
            title: "Milestone".into(),
            message: "Tatum reached 30 points".into(),
            kind: "alert".into(),
            data: None,
            url: Some("/players/p1".into()),
        })
        .await
        .unwrap();

    assert_eq!(created.id, "n1");
    assert_eq!(created.kind, "alert");
    assert!(!created.read);
}

#[tokio::test]
async fn test_list_notifications_passes_filters() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/notifications"))
        .and(query_param("limit", "100"))
        .and(query_param("offset", "20"))
        .and(query_param("type", "alert"))
        .and(query_param("read", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [record("n1", false), record("n2", false)],
            "count": 2,
            "total": 22,
            "has_more": false
        })))
        .mount(&server)
        .await;

    let page = client
        .list_notifications(&ListQuery {
            limit: 250,
            offset: 20,
            kind: Some("alert".into()),
            read: Some(false),
        })
        .await
        .unwrap();

    assert_eq!(page.data.len(), 2);
    assert_eq!(page.total, 22);
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_unread_count() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/notifications/unread-count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "count": 7 })))
        .mount(&server)
        .await;

    assert_eq!(client.unread_count().await.unwrap(), 7);
}

#[tokio::test]
async fn test_mark_read_and_mark_all() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/notifications/n1/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record("n1", true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/notifications/mark-all-read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.mark_read("n1").await.unwrap().read);
    client.mark_all_read().await.unwrap();
}

#[tokio::test]
async fn test_delete_one_and_all() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/notifications/n1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/notifications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_notification("n1").await.unwrap();
    client.delete_all_notifications().await.unwrap();
}

#[tokio::test]
async fn test_ids_are_escaped_as_one_path_segment() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/notifications/a%2Fb%3Fc%23d/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(record("a/b?c#d", true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/notifications/x%2F..%2Fmark-all-read"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/u%2F1/preferences"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let read = client.mark_read("a/b?c#d").await.unwrap();
    assert_eq!(read.id, "a/b?c#d");
    client.delete_notification("x/../mark-all-read").await.unwrap();
    client.get_preferences("u/1").await.unwrap();
}

#[tokio::test]
async fn test_not_found_maps_to_api_error() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/v1/notifications/missing/read"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "detail": "Notification not found" })),
        )
        .mount(&server)
        .await;

    let err = client.mark_read("missing").await.unwrap_err();
    assert!(err.is_not_found(), "expected 404, got: {err:?}");
    assert!(
        matches!(&err, Error::Api { message, .. } if message == "Notification not found"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/notifications/unread-count"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "Not authenticated" })))
        .mount(&server)
        .await;

    let result = client.unread_count().await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_unexpected_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/notifications/unread-count"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.unread_count().await;
    assert!(
        matches!(result, Err(Error::Deserialization { ref body, .. }) if body.contains("oops")),
        "expected Deserialization error, got: {result:?}"
    );
}

// ── Preferences ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_preferences_reads_camel_case() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/u1/preferences"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "notificationsEnabled": true,
            "enableNotificationSound": false,
            "enableDesktopNotifications": true,
            "notificationTypes": { "system": true, "alert": false, "info": true, "update": true }
        })))
        .mount(&server)
        .await;

    let prefs = client.get_preferences("u1").await.unwrap();
    assert!(prefs.notifications_enabled);
    assert!(!prefs.enable_notification_sound);
    assert!(prefs.enable_desktop_notifications);
    assert!(!prefs.notification_types.unwrap().alert);
}

mod common;

use axum::http::StatusCode;
use chrono::DateTime;
use serde_json::json;
use ticketdesk_core::TicketStore;

use common::TestFixture;

#[tokio::test]
async fn test_create_ticket() {
    let fixture = TestFixture::new();

    let response = fixture
        .post(
            "/tickets",
            json!({
                "title": "Testing integration ticket",
                "description": "Testing without mock"
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert!(uuid::Uuid::parse_str(response.body["id"].as_str().unwrap()).is_ok());
    assert_eq!(response.body["title"], "Testing integration ticket");
    assert_eq!(response.body["description"], "Testing without mock");
    assert_eq!(response.body["status"], "open");
    assert_eq!(response.body["created_at"], response.body["updated_at"]);
}

#[tokio::test]
async fn test_create_ticket_without_description() {
    let fixture = TestFixture::new();

    let response = fixture.post("/tickets", json!({ "title": "Bare" })).await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert!(response.body["description"].is_null());
}

#[tokio::test]
async fn test_create_ticket_with_status() {
    let fixture = TestFixture::new();
    let ticket = fixture.create_ticket("Blocked", Some("stalled")).await;
    assert_eq!(ticket["status"], "stalled");
}

#[tokio::test]
async fn test_create_ticket_reject_duplicates() {
    let fixture = TestFixture::new();
    fixture.create_ticket("Testing integration ticket", None).await;

    let response = fixture
        .post(
            "/tickets?reject_duplicates=true",
            json!({ "title": "Testing integration ticket" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["error"],
        "A ticket with the title: Testing integration ticket, already exists."
    );
    assert_eq!(fixture.store.count().unwrap(), 1);
}

#[tokio::test]
async fn test_create_ticket_duplicates_allowed_by_default() {
    let fixture = TestFixture::new();
    fixture.create_ticket("Same title", None).await;
    fixture.create_ticket("Same title", None).await;
    assert_eq!(fixture.store.count().unwrap(), 2);
}

#[tokio::test]
async fn test_create_ticket_validation_failures() {
    let fixture = TestFixture::new();

    let short_title = fixture.post("/tickets", json!({ "title": "ab" })).await;
    assert_eq!(short_title.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(short_title.body["error"].as_str().unwrap().contains("title"));

    let long_title = fixture
        .post("/tickets", json!({ "title": "a".repeat(101) }))
        .await;
    assert_eq!(long_title.status, StatusCode::UNPROCESSABLE_ENTITY);

    let long_description = fixture
        .post(
            "/tickets",
            json!({ "title": "Sample", "description": "x".repeat(501) }),
        )
        .await;
    assert_eq!(long_description.status, StatusCode::UNPROCESSABLE_ENTITY);

    let bad_status = fixture
        .post("/tickets", json!({ "title": "Sample", "status": "archived" }))
        .await;
    assert_eq!(bad_status.status, StatusCode::UNPROCESSABLE_ENTITY);

    let missing_title = fixture
        .post("/tickets", json!({ "description": "no title" }))
        .await;
    assert_eq!(missing_title.status, StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(fixture.store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_create_ticket_malformed_json() {
    let fixture = TestFixture::new();
    let response = fixture.post_raw("/tickets", "{not json").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_list_tickets() {
    let fixture = TestFixture::new();
    for i in 0..3 {
        fixture.create_ticket(&format!("Ticket {}", i), None).await;
    }

    let response = fixture.get("/tickets").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 3);
    assert_eq!(response.body["skip"], 0);
    assert_eq!(response.body["limit"], 10);
    let results = response.body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["title"], "Ticket 0");
}

#[tokio::test]
async fn test_list_tickets_pagination() {
    let fixture = TestFixture::new();
    for i in 0..5 {
        fixture.create_ticket(&format!("Ticket {}", i), None).await;
    }

    let response = fixture.get("/tickets?skip=3&limit=10").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 5);
    assert_eq!(response.body["skip"], 3);
    let results = response.body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["title"], "Ticket 3");

    let response = fixture.get("/tickets?limit=0").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total"], 5);
    assert!(response.body["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_tickets_rejects_out_of_range_params() {
    let fixture = TestFixture::new();

    let response = fixture.get("/tickets?limit=101").await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = fixture.get("/tickets?skip=-1").await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let response = fixture.get("/tickets?limit=many").await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_get_ticket() {
    let fixture = TestFixture::new();
    let created = fixture.create_ticket("Sample", None).await;
    let id = created["id"].as_str().unwrap();

    let response = fixture.get(&format!("/tickets/{}", id)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], id);
    assert_eq!(response.body["title"], "Sample");
}

#[tokio::test]
async fn test_get_nonexistent_ticket() {
    let fixture = TestFixture::new();
    let id = uuid::Uuid::new_v4();

    let response = fixture.get(&format!("/tickets/{}", id)).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.body["error"],
        format!("Ticket with ID {} is not found.", id)
    );
}

#[tokio::test]
async fn test_get_ticket_malformed_id() {
    let fixture = TestFixture::new();
    let response = fixture.get("/tickets/not-a-uuid").await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_update_ticket() {
    let fixture = TestFixture::new();
    let created = fixture.create_ticket("Old title", None).await;
    let id = created["id"].as_str().unwrap();

    let response = fixture
        .put(
            &format!("/tickets/{}", id),
            json!({ "title": "New title", "status": "stalled" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "New title");
    assert_eq!(response.body["status"], "stalled");
    assert_eq!(response.body["description"], created["description"]);

    let fetched = fixture.get(&format!("/tickets/{}", id)).await;
    assert_eq!(fetched.body, response.body);
}

#[tokio::test]
async fn test_update_ticket_empty_patch_advances_updated_at() {
    let fixture = TestFixture::new();
    let created = fixture.create_ticket("Sample", None).await;
    let id = created["id"].as_str().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let response = fixture.put(&format!("/tickets/{}", id), json!({})).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], created["title"]);
    assert_eq!(response.body["description"], created["description"]);
    assert_eq!(response.body["created_at"], created["created_at"]);

    let before = DateTime::parse_from_rfc3339(created["updated_at"].as_str().unwrap()).unwrap();
    let after =
        DateTime::parse_from_rfc3339(response.body["updated_at"].as_str().unwrap()).unwrap();
    assert!(after > before);
}

#[tokio::test]
async fn test_update_ticket_errors() {
    let fixture = TestFixture::new();

    let missing = fixture
        .put(&format!("/tickets/{}", uuid::Uuid::new_v4()), json!({}))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let malformed = fixture.put("/tickets/abc", json!({})).await;
    assert_eq!(malformed.status, StatusCode::UNPROCESSABLE_ENTITY);

    let created = fixture.create_ticket("Sample", None).await;
    let invalid = fixture
        .put(
            &format!("/tickets/{}", created["id"].as_str().unwrap()),
            json!({ "title": "x" }),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_close_ticket_twice() {
    let fixture = TestFixture::new();
    let created = fixture.create_ticket("Sample", None).await;
    let path = format!("/tickets/{}/close", created["id"].as_str().unwrap());

    let first = fixture.patch(&path).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["status"], "closed");

    let fetched = fixture
        .get(&format!("/tickets/{}", created["id"].as_str().unwrap()))
        .await;
    assert_eq!(fetched.body, first.body);

    let second = fixture.patch(&path).await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
    assert!(second.body["error"]
        .as_str()
        .unwrap()
        .contains("already closed"));
}

#[tokio::test]
async fn test_close_stalled_ticket() {
    let fixture = TestFixture::new();
    let created = fixture.create_ticket("Sample", Some("stalled")).await;
    let path = format!("/tickets/{}/close", created["id"].as_str().unwrap());

    let response = fixture.patch(&path).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Cannot close a stalled ticket");
}

#[tokio::test]
async fn test_close_nonexistent_ticket() {
    let fixture = TestFixture::new();
    let response = fixture
        .patch(&format!("/tickets/{}/close", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_open_ticket_requires_force() {
    let fixture = TestFixture::new();
    let created = fixture.create_ticket("Sample", None).await;
    let id = created["id"].as_str().unwrap();

    let response = fixture.delete(&format!("/tickets/{}", id)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = fixture
        .delete(&format!("/tickets/{}?force_delete=true", id))
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.text.is_empty());

    let response = fixture.get(&format!("/tickets/{}", id)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_nonexistent_ticket() {
    let fixture = TestFixture::new();
    let response = fixture
        .delete(&format!("/tickets/{}", uuid::Uuid::new_v4()))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_all_tickets() {
    let fixture = TestFixture::new();
    let first = fixture.create_ticket("First", None).await;
    fixture.create_ticket("Second", None).await;
    fixture.create_ticket("Third", Some("closed")).await;
    fixture
        .patch(&format!("/tickets/{}/close", first["id"].as_str().unwrap()))
        .await;

    let response = fixture.delete("/tickets").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["message"],
        "2 tickets deleted. 1 remaining tickets."
    );

    let response = fixture.delete("/tickets").await;
    assert_eq!(
        response.body["message"],
        "No tickets were deleted. 1 remaining tickets."
    );

    let response = fixture.delete("/tickets?force_delete=true").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["deleted"], 1);
    assert_eq!(response.body["remaining"], 0);
}

#[tokio::test]
async fn test_ticket_lifecycle() {
    let fixture = TestFixture::new();

    let created = fixture
        .post("/tickets", json!({ "title": "Sample", "description": "x" }))
        .await;
    let id = created.body["id"].as_str().unwrap().to_string();

    let fetched = fixture.get(&format!("/tickets/{}", id)).await;
    assert_eq!(fetched.body["title"], "Sample");

    let updated = fixture.put(&format!("/tickets/{}", id), json!({})).await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["title"], "Sample");
    assert_eq!(updated.body["description"], "x");

    let closed = fixture.patch(&format!("/tickets/{}/close", id)).await;
    assert_eq!(closed.body["status"], "closed");

    let again = fixture.patch(&format!("/tickets/{}/close", id)).await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);

    let deleted = fixture.delete(&format!("/tickets/{}", id)).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let gone = fixture.get(&format!("/tickets/{}", id)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_metrics_endpoints() {
    let fixture = TestFixture::new();

    let health = fixture.get("/health").await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "ok");

    fixture.create_ticket("Counted", None).await;

    let metrics = fixture.get("/metrics").await;
    assert_eq!(metrics.status, StatusCode::OK);
    assert!(metrics.text.contains("ticketdesk_tickets_created_total"));
    assert!(metrics.text.contains("ticketdesk_http_requests_total"));
}

#[tokio::test]
async fn test_config_endpoint() {
    let fixture = TestFixture::new();
    let response = fixture.get("/config").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["server"]["port"], 8080);
    assert_eq!(response.body["database"]["path"], "ticketdesk.db");
}

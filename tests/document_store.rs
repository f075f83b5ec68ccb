mod common;

use axum::http::StatusCode;
use common::{TOKEN, TestApp, body_json};
use serde_json::json;
use visitlog::store::VisitStore;

#[tokio::test]
async fn document_backend_serves_the_same_contract() {
    let app = TestApp::with_document_store().await;

    let resp = app.get("/visit", Some(TOKEN)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let created = app.create_visit("alice", "lab visit").await;
    let id = created["id"].as_str().unwrap().to_string();

    let resp = app.get(&format!("/visit/{id}"), Some(TOKEN)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, created);

    let body = json!({ "user": "alice", "information": "follow-up" });
    let resp = app.put_json(&format!("/visit/{id}"), &body, Some(TOKEN)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated = body_json(resp).await;
    assert_eq!(updated["information"], "follow-up");

    let resp = app.get("/visit", Some(TOKEN)).await;
    let visits = body_json(resp).await;
    assert_eq!(visits, json!([updated.clone()]));

    let resp = app.delete(&format!("/visit/{id}"), Some(TOKEN)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, updated);

    let resp = app.delete(&format!("/visit/{id}"), Some(TOKEN)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn each_visit_is_one_file() {
    let app = TestApp::with_document_store().await;
    let created = app.create_visit("bob", "archive").await;
    let id = created["id"].as_str().unwrap();

    let VisitStore::Document(store) = &app.store else {
        panic!("expected the document store");
    };
    let path = store.dir().join(format!("{id}.json"));
    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(stored["id"], id);
    assert_eq!(stored["partitionKey"], "visit");
    assert_eq!(stored["user"], "bob");
}

#[tokio::test]
async fn path_like_ids_are_not_found() {
    let app = TestApp::with_document_store().await;

    let resp = app.get("/visit/..%2Fsecret", Some(TOKEN)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn overlong_ids_are_not_found_on_either_backend() {
    let id = "a".repeat(300);
    let uri = format!("/visit/{id}");
    let body = json!({ "user": "alice", "information": "lab visit" });

    for app in [TestApp::with_document_store().await, TestApp::new().await] {
        let resp = app.get(&uri, Some(TOKEN)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app.put_json(&uri, &body, Some(TOKEN)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = app.delete(&uri, Some(TOKEN)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

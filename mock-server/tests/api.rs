use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use jsbin_mock::{app, app_with_token, ListedSnapshot};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- list ---

#[tokio::test]
async fn list_bins_empty() {
    let resp = app().oneshot(empty_request("GET", "/")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let entries: Vec<Vec<ListedSnapshot>> = body_json(resp).await;
    assert!(entries.is_empty());
}

// --- create ---

#[tokio::test]
async fn create_bin_returns_first_snapshot() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/save",
            r#"{"settings":"{\"title\":\"Hello\"}","html":"<p>hi</p>"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let result: Value = body_json(resp).await;
    assert_eq!(result["snapshot"], 1);
    assert_eq!(result["summary"], "Hello");
    assert_eq!(result["url"].as_str().unwrap().len(), 8);
}

#[tokio::test]
async fn create_bin_rejects_non_object_settings() {
    let resp = app()
        .oneshot(json_request("POST", "/save", r#"{"settings":"\"nope\""}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert!(body["error"].is_string());
}

// --- read ---

#[tokio::test]
async fn read_unknown_bin_returns_error_body() {
    let resp = app().oneshot(empty_request("GET", "/nope")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body, json!({"error": "bin not found"}));
}

#[tokio::test]
async fn read_bad_snapshot_number_returns_400() {
    let resp = app().oneshot(empty_request("GET", "/abc/latest")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- save ---

#[tokio::test]
async fn save_to_unknown_bin_returns_404() {
    let resp = app()
        .oneshot(json_request("POST", "/nope/save", r#"{"settings":"{}"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- remove ---

#[tokio::test]
async fn remove_unknown_bin_returns_404() {
    let resp = app().oneshot(empty_request("DELETE", "/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- auth ---

#[tokio::test]
async fn token_is_required_when_configured() {
    let router = app_with_token(Some("s3cret".to_string()));

    let resp = router.clone().oneshot(empty_request("GET", "/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert!(body["error"].is_string());

    let authed = Request::builder()
        .uri("/")
        .header(http::header::AUTHORIZATION, "token s3cret")
        .body(String::new())
        .unwrap();
    let resp = router.oneshot(authed).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// --- full lifecycle ---

#[tokio::test]
async fn bin_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            "/save",
            r#"{"settings":"{}","javascript":"console.log(1)"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let created: Value = body_json(resp).await;
    let id = created["url"].as_str().unwrap().to_string();

    // second snapshot
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request(
            "POST",
            &format!("/{id}/save"),
            r#"{"settings":"{\"title\":\"Two\"}","javascript":"console.log(2)"}"#,
        ))
        .await
        .unwrap();
    let saved: Value = body_json(resp).await;
    assert_eq!(saved["snapshot"], 2);

    // list: one entry, newest snapshot first
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/"))
        .await
        .unwrap();
    let entries: Vec<Vec<ListedSnapshot>> = body_json(resp).await;
    assert_eq!(entries.len(), 1);
    let snapshots: Vec<u32> = entries[0].iter().map(|s| s.snapshot).collect();
    assert_eq!(snapshots, vec![2, 1]);
    assert_eq!(entries[0][0].title.as_deref(), Some("Two"));
    assert_eq!(entries[0][1].title, None);

    // read first snapshot
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", &format!("/{id}/1")))
        .await
        .unwrap();
    let content: Value = body_json(resp).await;
    assert_eq!(content["javascript"], "console.log(1)");
    assert_eq!(content["snapshot"], 1);

    // remove snapshot 2, latest falls back to 1
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &format!("/{id}/2")))
        .await
        .unwrap();
    let removed: Value = body_json(resp).await;
    assert_eq!(removed, json!({"url": id, "snapshot": 2, "deleted": true}));

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", &format!("/{id}")))
        .await
        .unwrap();
    let content: Value = body_json(resp).await;
    assert_eq!(content["snapshot"], 1);

    // remove the bin, list shows the tombstone
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("DELETE", &format!("/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/"))
        .await
        .unwrap();
    let entries: Vec<Vec<ListedSnapshot>> = body_json(resp).await;
    assert_eq!(entries[0][0].url, format!("deleted/{id}"));

    // read after remove is 404
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", &format!("/{id}")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

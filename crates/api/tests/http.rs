use api::{middleware::request_deadline, router, AppState};
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Request, StatusCode,
    },
    middleware, routing::get, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use workreq_core::{test_database, AppConfig};

const BASE_CONFIG: &str = r#"
[auth]
jwt_secret = "http-test-secret"
"#;

async fn app_with(extra: &str) -> Router {
    let db = test_database().await.unwrap();
    let config = AppConfig::from_toml_str(&format!("{BASE_CONFIG}\n{extra}")).unwrap();
    router(Arc::new(AppState::new(db, &config)))
}

async fn app() -> Router {
    app_with("").await
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn account_body(username: &str, role: &str) -> Value {
    json!({
        "username": username,
        "password": "secret123",
        "name": format!("{username} name"),
        "email": format!("{username}@example.com"),
        "unit": "IT",
        "role": role,
    })
}

async fn register_and_login(app: &Router, username: &str, role: &str) -> String {
    let (status, _) = send(app, "POST", "/api/auth/register", None, Some(account_body(username, role))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

fn procurement(date: &str) -> Value {
    json!({
        "jenis_request": "pengadaan",
        "unit": "IT",
        "tgl_request": date,
        "nama_barang_array": ["Laptop", "Mouse"],
        "type_model_array": ["X1", "M100"],
        "jumlah_array": [2, 5],
        "keterangan_array": ["", "wireless"],
    })
}

#[tokio::test]
async fn test_health_is_public() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_returns_account_without_hash() {
    let app = app().await;
    let (status, body) = send(&app, "POST", "/api/auth/register", None, Some(account_body("alice", "user"))).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "user");
    assert!(body.get("password_hash").is_none());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let app = app().await;

    let mut short = account_body("bob", "user");
    short["password"] = json!("12345");
    let (status, _) = send(&app, "POST", "/api/auth/register", None, Some(short)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/auth/register", None, Some(account_body("bob", "admin"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/auth/register", None, Some(account_body("bob", "user"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "POST", "/api/auth/register", None, Some(account_body("bob", "user"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = app().await;
    register_and_login(&app, "alice", "user").await;

    let (wrong_status, wrong_body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "wrongpass" })),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "nonexistent", "password": "x" })),
    )
    .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn test_login_response_shape() {
    let app = app().await;
    send(&app, "POST", "/api/auth/register", None, Some(account_body("alice", "operator"))).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "secret123" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["user"]["role"], "operator");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_protected_routes_require_bearer_token() {
    let app = app().await;

    let (status, _) = send(&app, "GET", "/api/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for header in ["Token abc", "Bearer", "Bearer not.a.jwt"] {
        let request = Request::builder()
            .uri("/api/requests")
            .header(AUTHORIZATION, header)
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "header {header:?}");
    }
}

#[tokio::test]
async fn test_me_returns_caller() {
    let app = app().await;
    let token = register_and_login(&app, "alice", "user").await;

    let (status, body) = send(&app, "GET", "/api/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
}

#[tokio::test]
async fn test_admin_routes_need_operator() {
    let app = app().await;
    let user = register_and_login(&app, "alice", "user").await;
    let operator = register_and_login(&app, "olga", "operator").await;

    let (status, _) = send(&app, "POST", "/api/users", Some(&user), Some(account_body("carol", "user"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "POST", "/api/users", Some(&operator), Some(account_body("carol", "user"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["username"], "carol");
    let carol_id = body["user"]["id"].as_str().unwrap().to_string();

    // Plain listing stays open to every authenticated caller
    let (status, body) = send(&app, "GET", "/api/users", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let uri = format!("/api/users/{carol_id}");
    let (status, _) = send(&app, "DELETE", &uri, Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "DELETE", &uri, Some(&operator), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = send(&app, "GET", &uri, Some(&operator), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_user_changes_only_supplied_fields() {
    let app = app().await;
    let token = register_and_login(&app, "alice", "user").await;
    let (_, me) = send(&app, "GET", "/api/users/me", Some(&token), None).await;
    let uri = format!("/api/users/{}", me["id"].as_str().unwrap());

    let (status, body) = send(&app, "PUT", &uri, Some(&token), Some(json!({ "unit": "Finance", "name": "" }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["unit"], "Finance");
    assert_eq!(body["user"]["name"], "alice name");
    assert_eq!(body["user"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_create_request_flow() {
    let app = app().await;
    let token = register_and_login(&app, "alice", "user").await;

    let (status, body) = send(&app, "POST", "/api/requests", Some(&token), Some(procurement("2024-03-01"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);

    let request = &body["request"];
    assert_eq!(request["status_request"], "DIAJUKAN");
    assert_eq!(request["requested_by"], "alice name");
    assert_eq!(request["tgl_request"], "2024-03-01");
    assert_eq!(request["nama_barang_array"], json!(["Laptop", "Mouse"]));

    let uri = format!("/api/requests/{}", request["id"]);
    let (status, fetched) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["jumlah_array"], json!([2, 5]));

    let (status, mine) = send(&app, "GET", "/api/requests/my-requests", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_dates_are_validation_errors() {
    let app = app().await;
    let token = register_and_login(&app, "alice", "user").await;

    let (status, body) = send(&app, "POST", "/api/requests", Some(&token), Some(procurement("2024-02-30"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("tgl_request"));

    let loan = json!({
        "jenis_request": "peminjaman",
        "unit": "IT",
        "tgl_request": "2024-03-01",
        "lokasi_peminjaman_array": ["Aula", "Lab"],
        "tgl_peminjaman_array": ["2024-03-05", "2024-3-6"],
    });
    let (status, body) = send(&app, "POST", "/api/requests", Some(&token), Some(loan)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("tgl_peminjaman_array[1]"));
}

#[tokio::test]
async fn test_list_requests_paginates_newest_first() {
    let app = app().await;
    let token = register_and_login(&app, "alice", "user").await;

    for _ in 0..25 {
        let (status, _) = send(&app, "POST", "/api/requests", Some(&token), Some(procurement("2024-03-01"))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, "GET", "/api/requests?page=2&limit=10", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 10);
    assert_eq!(data[0]["id"], 15);
    assert_eq!(data[9]["id"], 6);
    assert_eq!(body["pagination"]["page"], 2);
    assert_eq!(body["pagination"]["limit"], 10);
    assert_eq!(body["pagination"]["total"], 25);
    assert_eq!(body["pagination"]["total_pages"], 3);

    // Defaults and clamping
    let (_, body) = send(&app, "GET", "/api/requests?page=0&limit=1000", Some(&token), None).await;
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 100);
    assert_eq!(body["data"].as_array().unwrap().len(), 25);

    for query in ["page=abc", "limit=-1"] {
        let (status, body) = send(&app, "GET", &format!("/api/requests?{query}"), Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{query}");
        assert!(body["error"].is_string(), "{query}");
    }
}

#[tokio::test]
async fn test_status_filter_and_transitions() {
    let app = app().await;
    let token = register_and_login(&app, "alice", "user").await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let (_, body) = send(&app, "POST", "/api/requests", Some(&token), Some(procurement("2024-03-01"))).await;
        ids.push(body["request"]["id"].as_i64().unwrap());
    }

    let uri = format!("/api/requests/{}/status", ids[1]);
    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        Some(&token),
        Some(json!({ "status_request": "DISETUJUI", "approved_by": "Budi" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Request status updated successfully");

    let (_, body) = send(&app, "GET", "/api/requests?status=DIAJUKAN", Some(&token), None).await;
    let listed: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(listed, vec![ids[2], ids[0]]);

    let (status, _) = send(&app, "GET", "/api/requests?status=approved", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Finished requests may go back to the start
    let (status, _) = send(&app, "PUT", &uri, Some(&token), Some(json!({ "status_request": "SELESAI" }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "PUT", &uri, Some(&token), Some(json!({ "status_request": "DIAJUKAN" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "PUT",
        "/api/requests/9999/status",
        Some(&token),
        Some(json!({ "status_request": "DITOLAK" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_request_ids_are_not_found() {
    let app = app().await;
    let token = register_and_login(&app, "alice", "user").await;

    for uri in ["/api/requests/9999", "/api/requests/not-a-number"] {
        let (status, _) = send(&app, "GET", uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        let (status, _) = send(&app, "DELETE", uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_delete_is_unrestricted_by_default() {
    let app = app().await;
    let alice = register_and_login(&app, "alice", "user").await;
    let bob = register_and_login(&app, "bob", "user").await;

    let (_, body) = send(&app, "POST", "/api/requests", Some(&alice), Some(procurement("2024-03-01"))).await;
    let uri = format!("/api/requests/{}", body["request"]["id"]);

    let (status, body) = send(&app, "DELETE", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Request deleted successfully");
}

#[tokio::test]
async fn test_owner_or_operator_delete_policy() {
    let app = app_with("[policy]\nrequest_delete = \"owner_or_operator\"").await;
    let alice = register_and_login(&app, "alice", "user").await;
    let bob = register_and_login(&app, "bob", "user").await;
    let olga = register_and_login(&app, "olga", "operator").await;

    let mut uris = Vec::new();
    for _ in 0..2 {
        let (_, body) = send(&app, "POST", "/api/requests", Some(&alice), Some(procurement("2024-03-01"))).await;
        uris.push(format!("/api/requests/{}", body["request"]["id"]));
    }

    let (status, _) = send(&app, "DELETE", &uris[0], Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &uris[0], Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "DELETE", &uris[1], Some(&olga), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_dashboard_stats_scoped_by_role() {
    let app = app().await;
    let user = register_and_login(&app, "alice", "user").await;
    let operator = register_and_login(&app, "olga", "operator").await;

    for _ in 0..2 {
        send(&app, "POST", "/api/requests", Some(&user), Some(procurement("2024-03-01"))).await;
    }
    send(&app, "PUT", "/api/requests/1/status", Some(&operator), Some(json!({ "status_request": "DIPROSES" }))).await;

    let (status, stats) = send(&app, "GET", "/api/dashboard/stats", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["role"], "user");
    assert_eq!(stats["total_pengajuan"], 2);
    assert_eq!(stats["total_riwayat"], 2);
    assert_eq!(stats["total_persetujuan"], 0);
    assert_eq!(stats["total_pengguna"], 0);

    let (_, stats) = send(&app, "GET", "/api/dashboard/stats", Some(&operator), None).await;
    assert_eq!(stats["role"], "operator");
    assert_eq!(stats["total_persetujuan"], 1);
    assert_eq!(stats["total_pengguna"], 2);
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = app().await;
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/requests")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "authorization,content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_request_deadline_cancels_slow_handlers() {
    let app = Router::new()
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "done"
            }),
        )
        .layer(middleware::from_fn_with_state(Duration::from_millis(20), request_deadline));

    let response = app
        .oneshot(Request::builder().uri("/slow").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}

#[tokio::test]
async fn test_users_cannot_promote_themselves() {
    let app = app().await;
    let mallory = register_and_login(&app, "mallory", "user").await;
    let (_, me) = send(&app, "GET", "/api/users/me", Some(&mallory), None).await;
    let uri = format!("/api/users/{}", me["id"].as_str().unwrap());

    let (status, body) = send(&app, "PUT", &uri, Some(&mallory), Some(json!({ "role": "operator" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    // Still a plain user after a fresh login
    let (_, login) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "username": "mallory", "password": "secret123" })),
    )
    .await;
    assert_eq!(login["user"]["role"], "user");
    let token = login["token"].as_str().unwrap();
    let (status, _) = send(&app, "POST", "/api/users", Some(token), Some(account_body("eve", "user"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Operators may still change roles
    let olga = register_and_login(&app, "olga", "operator").await;
    let (status, body) = send(&app, "PUT", &uri, Some(&olga), Some(json!({ "role": "operator" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["role"], "operator");
}

#[tokio::test]
async fn test_status_update_clears_omitted_approver_and_remarks() {
    let app = app().await;
    let token = register_and_login(&app, "alice", "user").await;

    let mut body = procurement("2024-03-01");
    body["keterangan"] = json!("old");
    let (_, created) = send(&app, "POST", "/api/requests", Some(&token), Some(body)).await;
    let uri = format!("/api/requests/{}", created["request"]["id"]);
    let status_uri = format!("{uri}/status");

    send(
        &app,
        "PUT",
        &status_uri,
        Some(&token),
        Some(json!({ "status_request": "DISETUJUI", "approved_by": "Budi", "keterangan": "approved" })),
    )
    .await;
    let (status, _) = send(
        &app,
        "PUT",
        &status_uri,
        Some(&token),
        Some(json!({ "status_request": "DIAJUKAN", "keterangan": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, request) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(request["status_request"], "DIAJUKAN");
    assert_eq!(request["approved_by"], Value::Null);
    assert_eq!(request["keterangan"], "");
}

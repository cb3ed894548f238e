//! End-to-end tests of the HTTP API over in-memory stores.

use std::net::SocketAddr;

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;

use jobtrack_api::{create_router, ApiConfig, AppState};
use jobtrack_models::YearMonth;

fn test_config() -> ApiConfig {
    ApiConfig {
        bcrypt_cost: 4,
        jwt_secret: "test-secret".to_string(),
        ..Default::default()
    }
}

fn app_with(config: ApiConfig) -> Router {
    create_router(AppState::in_memory(config), None)
}

fn app() -> Router {
    app_with(test_config())
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, name: &str, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({"name": name, "email": email, "password": "secret123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["user"]["token"].as_str().unwrap().to_string()
}

async fn create_job(app: &Router, token: &str, body: Value) -> Value {
    let (status, body) = send(app, Method::POST, "/api/v1/jobs", Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["job"].clone()
}

#[tokio::test]
async fn test_register_and_login() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({"name": "Alice", "email": "a@x.com", "password": "secret123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "a@x.com");
    assert_eq!(body["user"]["name"], "Alice");
    assert!(body["user"]["lastName"].is_null());
    assert!(body["user"].get("password").is_none());
    assert!(!body["user"]["token"].as_str().unwrap().is_empty());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "a@x.com", "password": "secret123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["user"]["token"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "a@x.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Invalid Credentials.");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "a@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "Please provide email and password.");
}

#[tokio::test]
async fn test_register_validation_and_duplicates() {
    let app = app();
    register(&app, "Alice", "a@x.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({"name": "Alicia", "email": "A@X.com", "password": "other123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["msg"],
        "Duplicate value entered for email field, please choose another value"
    );

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({"name": "Bo", "email": "b@x.com", "password": "secret123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({"name": "Bobby", "email": "not-an-email", "password": "secret123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_jobs_require_valid_token() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/jobs", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Authentication invalid");

    let (status, _) = send(&app, Method::GET, "/api/v1/jobs", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let other = app_with(ApiConfig {
        jwt_secret: "another-secret".to_string(),
        ..test_config()
    });
    let foreign_token = register(&other, "Alice", "a@x.com").await;
    let (status, _) = send(&app, Method::GET, "/api/v1/jobs", Some(&foreign_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_fifteen_jobs_second_page() {
    let app = app();
    let token = register(&app, "Alice", "a@x.com").await;
    for i in 0..15 {
        create_job(&app, &token, json!({"company": "Acme", "position": format!("Role {}", i)})).await;
    }

    let (status, body) = send(&app, Method::GET, "/api/v1/jobs?page=2&limit=10", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["jobs"].as_array().unwrap().len(), 5);
    assert_eq!(body["totalJobs"], 15);
    assert_eq!(body["numOfPages"], 2);
}

#[tokio::test]
async fn test_list_filters_and_sort() {
    let app = app();
    let token = register(&app, "Alice", "a@x.com").await;
    create_job(&app, &token, json!({"company": "Acme", "position": "Backend Dev", "status": "interview"})).await;
    create_job(&app, &token, json!({"company": "Initech", "position": "Android dev", "status": "interview", "jobType": "remote"})).await;
    create_job(&app, &token, json!({"company": "Globex", "position": "Designer", "status": "interview"})).await;
    create_job(&app, &token, json!({"company": "Umbrella", "position": "DevOps", "status": "declined"})).await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/jobs?search=DEV&status=interview&jobType=all&sort=a-z",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let positions: Vec<&str> = body["jobs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|j| j["position"].as_str().unwrap())
        .collect();
    assert_eq!(positions, vec!["Android dev", "Backend Dev"]);
    assert_eq!(body["totalJobs"], 2);
    assert_eq!(body["numOfPages"], 1);

    let (_, body) = send(&app, Method::GET, "/api/v1/jobs?jobType=remote", Some(&token), None).await;
    assert_eq!(body["totalJobs"], 1);
    assert_eq!(body["jobs"][0]["company"], "Initech");

    let (_, body) = send(&app, Method::GET, "/api/v1/jobs?status=pending", Some(&token), None).await;
    assert_eq!(body["totalJobs"], 0);
    assert_eq!(body["numOfPages"], 0);
}

#[tokio::test]
async fn test_job_lifecycle() {
    let app = app();
    let token = register(&app, "Alice", "a@x.com").await;

    let job = create_job(
        &app,
        &token,
        json!({"company": "Acme", "position": "Dev", "createdBy": "someone-else"}),
    )
    .await;
    assert_eq!(job["status"], "pending");
    assert_eq!(job["jobType"], "full-time");
    assert_ne!(job["createdBy"], "someone-else");
    let id = job["id"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/jobs/{}", id);

    let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"], job);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&token),
        Some(json!({"company": "Acme Corp", "position": "Lead Dev", "status": "interview"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["company"], "Acme Corp");
    assert_eq!(body["job"]["status"], "interview");
    assert_eq!(body["job"]["jobType"], "full-time");

    let (status, body) = send(&app, Method::PATCH, &uri, Some(&token), Some(json!({"company": "Acme"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "Please provide company and position.");

    let (status, body) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], format!("No job was found with id {}.", id));
}

#[tokio::test]
async fn test_owner_isolation() {
    let app = app();
    let alice = register(&app, "Alice", "a@x.com").await;
    let bob = register(&app, "Bobby", "b@x.com").await;

    let job = create_job(&app, &alice, json!({"company": "Acme", "position": "Dev"})).await;
    let uri = format!("/api/v1/jobs/{}", job["id"].as_str().unwrap());

    let (_, body) = send(&app, Method::GET, "/api/v1/jobs", Some(&bob), None).await;
    assert_eq!(body["totalJobs"], 0);

    let (status, _) = send(&app, Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&bob),
        Some(json!({"company": "Mine", "position": "Now"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["job"]["company"], "Acme");
}

#[tokio::test]
async fn test_stats() {
    let app = app();
    let token = register(&app, "Alice", "a@x.com").await;
    create_job(&app, &token, json!({"company": "Acme", "position": "Dev", "status": "declined"})).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/jobs/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["defaultStats"], json!({"pending": 0, "interview": 0, "declined": 1}));

    let monthly = body["monthlyApplications"].as_array().unwrap();
    assert_eq!(monthly.len(), 1);
    assert_eq!(monthly[0]["label"], YearMonth::of(&Utc::now()).label());
    assert_eq!(monthly[0]["count"], 1);
}

#[tokio::test]
async fn test_update_user() {
    let app = app();
    let token = register(&app, "Alice", "a@x.com").await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/v1/auth/updateUser",
        Some(&token),
        Some(json!({"name": "Alice", "email": "a@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "Please provide all values");

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/v1/auth/updateUser",
        Some(&token),
        Some(json!({"name": "Alice", "email": "alice@y.com", "lastName": "Smith", "location": "Lisbon"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "alice@y.com");
    assert_eq!(body["user"]["lastName"], "Smith");
    assert_eq!(body["user"]["location"], "Lisbon");
    let new_token = body["user"]["token"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::GET, "/api/v1/jobs", Some(&new_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "alice@y.com", "password": "secret123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({"email": "a@x.com", "password": "secret123"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_demo_user_is_read_only() {
    let app = app_with(ApiConfig {
        demo_user_email: Some("demo@x.com".to_string()),
        ..test_config()
    });
    let token = register(&app, "Demo User", "demo@x.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/jobs",
        Some(&token),
        Some(json!({"company": "Acme", "position": "Dev"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["msg"], "Test user. Read only!");

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/v1/auth/updateUser",
        Some(&token),
        Some(json!({"name": "Hacker", "email": "h@x.com", "lastName": "X", "location": "Y"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, Method::GET, "/api/v1/jobs", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

fn login_from(peer: &str, forwarded_for: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/login")
        .header("Content-Type", "application/json")
        .header("X-Forwarded-For", forwarded_for)
        .extension(ConnectInfo(peer.parse::<SocketAddr>().unwrap()))
        .body(Body::from(json!({"email": "a@x.com", "password": "pw"}).to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_auth_routes_are_rate_limited() {
    let app = app_with(ApiConfig {
        auth_rate_limit_max: 2,
        ..test_config()
    });

    // A fresh forwarded address per request does not reset the quota
    for i in 0..2 {
        let request = login_from("192.0.2.10:4000", &format!("203.0.113.{}", i));
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app
        .clone()
        .oneshot(login_from("192.0.2.10:4000", "203.0.113.99"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body["msg"],
        "Too many requests from this IP, please try again after 15 minutes"
    );

    let response = app
        .clone()
        .oneshot(login_from("192.0.2.11:4000", "203.0.113.99"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_trusted_proxy_limits_by_forwarded_address() {
    let app = app_with(ApiConfig {
        auth_rate_limit_max: 1,
        trust_proxy_headers: true,
        ..test_config()
    });

    let response = app
        .clone()
        .oneshot(login_from("10.0.0.1:4000", "203.0.113.9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(login_from("10.0.0.1:4000", "203.0.113.9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Same proxy, different client
    let response = app
        .clone()
        .oneshot(login_from("10.0.0.1:4000", "203.0.113.10"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_and_ready() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["store"]["status"], "ok");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/login")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().contains_key("x-request-id"));
}

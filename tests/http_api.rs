//! In-process HTTP tests: the full router over in-memory storage

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use catalog_server::{
    api,
    config::AppConfig,
    models::{
        book::BookInput,
        book_instance::{BookInstance, LoanStatus},
        user::Capability,
    },
    repository::{BookInstancesRepository, MemoryStore, Repository},
    services::{sessions::MemorySessionStore, Services},
    AppState,
};

struct TestApp {
    router: Router,
    repository: Repository,
    services: Arc<Services>,
}

impl TestApp {
    async fn new() -> Self {
        let config = AppConfig::default();
        let repository = Repository::in_memory(MemoryStore::new());
        let services = Arc::new(Services::new(
            repository.clone(),
            config.auth.clone(),
            Arc::new(MemorySessionStore::new(3600)),
        ));

        let router = api::create_router(AppState {
            config: Arc::new(config),
            services: services.clone(),
        });

        Self {
            router,
            repository,
            services,
        }
    }

    async fn token(&self, username: &str, capabilities: &[Capability]) -> String {
        let user = self
            .services
            .auth
            .create_user(username, "1X<ISRUkw+tuK", capabilities)
            .await
            .unwrap();
        self.services.auth.create_token_for_user(&user).unwrap()
    }

    async fn loaned_copy(&self, due_back: NaiveDate) -> BookInstance {
        let book = self
            .repository
            .books
            .create(&BookInput {
                title: "Book Title".to_string(),
                summary: "My book summary".to_string(),
                isbn: "ABCDEFG".to_string(),
                author_id: 1,
                language_id: 1,
                genre_ids: vec![1],
            })
            .await
            .unwrap();
        let mut copy = BookInstance::new(book.id, "Unlikely Imprint, 2016");
        copy.status = LoanStatus::OnLoan;
        copy.borrower_id = Some(1);
        copy.due_back = Some(due_back);
        self.repository.instances.insert(&copy).await.unwrap();
        copy
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, axum::http::HeaderMap, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, json)
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[tokio::test]
async fn health_and_readiness() {
    let app = TestApp::new().await;

    let (status, _, body) = app.send(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _, body) = app.send(Method::GET, "/api/v1/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn login_and_me() {
    let app = TestApp::new().await;
    app.services
        .auth
        .create_user("testuser1", "1X<ISRUkw+tuK", &[])
        .await
        .unwrap();

    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "testuser1", "password": "1X<ISRUkw+tuK" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _, body) = app.send(Method::GET, "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "testuser1");

    let (status, _, _) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "testuser1", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn anonymous_caller_gets_bearer_challenge() {
    let app = TestApp::new().await;

    let (status, headers, body) = app.send(Method::GET, "/api/v1/loans/mine", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(headers[header::WWW_AUTHENTICATE], "Bearer");
    assert_eq!(body["error"], "NotAuthenticated");
}

#[tokio::test]
async fn malformed_token_is_rejected() {
    let app = TestApp::new().await;

    let (status, _, _) = app
        .send(Method::GET, "/api/v1/loans/mine", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn outstanding_loans_need_capability() {
    let app = TestApp::new().await;
    let reader = app.token("testuser1", &[]).await;
    let librarian = app.token("testuser2", &[Capability::CanMarkReturned]).await;
    app.loaned_copy(today() + Duration::days(3)).await;

    let (status, _, _) = app.send(Method::GET, "/api/v1/loans", Some(&reader), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = app
        .send(Method::GET, "/api/v1/loans", Some(&librarian), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["per_page"], 10);
    assert_eq!(body["items"][0]["book_title"], "Book Title");
    assert_eq!(body["items"][0]["is_overdue"], false);
}

#[tokio::test]
async fn renew_form_flow() {
    let app = TestApp::new().await;
    let librarian = app.token("testuser2", &[Capability::CanMarkReturned]).await;
    let copy = app.loaned_copy(today() + Duration::days(2)).await;
    let uri = format!("/api/v1/instances/{}/renew", copy.id);

    let (status, _, body) = app.send(Method::GET, &uri, Some(&librarian), None).await;
    assert_eq!(status, StatusCode::OK);
    let proposed: NaiveDate = body["renewal_date"].as_str().unwrap().parse().unwrap();
    // The proposal is three weeks from the server's own date
    let server_today = proposed - Duration::days(21);
    assert!((server_today - today()).num_days().abs() <= 1);

    let (status, _, body) = app
        .send(
            Method::POST,
            &uri,
            Some(&librarian),
            Some(json!({ "renewal_date": (server_today - Duration::days(1)).to_string() })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["field"], "renewal_date");
    assert_eq!(body["message"], "Invalid date - renewal in past.");

    // Stays out of range even if the date rolls over between requests
    let (status, _, body) = app
        .send(
            Method::POST,
            &uri,
            Some(&librarian),
            Some(json!({ "renewal_date": (server_today + Duration::days(30)).to_string() })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Invalid date - renewal more than 4 weeks ahead.");

    let new_date = server_today + Duration::days(14);
    let (status, _, body) = app
        .send(
            Method::POST,
            &uri,
            Some(&librarian),
            Some(json!({ "renewal_date": new_date.to_string() })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["next"], "/api/v1/loans");
    assert_eq!(body["instance"]["due_back"], new_date.to_string());
    assert_eq!(body["instance"]["status"], "on_loan");
}

#[tokio::test]
async fn renew_unknown_copy_is_not_found() {
    let app = TestApp::new().await;
    let librarian = app.token("testuser2", &[Capability::CanMarkReturned]).await;
    let uri = format!("/api/v1/instances/{}/renew", Uuid::new_v4());

    let (status, _, _) = app.send(Method::GET, &uri, Some(&librarian), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn catalog_management_and_summary() {
    let app = TestApp::new().await;
    let staff = app.token("librarian", &[Capability::CatalogStaff]).await;

    let (status, _, author) = app
        .send(
            Method::POST,
            "/api/v1/authors",
            Some(&staff),
            Some(json!({ "first_name": "Christian", "last_name": "Surname" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, _, genre) = app
        .send(Method::POST, "/api/v1/genres", Some(&staff), Some(json!({ "name": "Fantasy" })))
        .await;
    let (_, _, language) = app
        .send(Method::POST, "/api/v1/languages", Some(&staff), Some(json!({ "name": "English" })))
        .await;

    let (status, _, book) = app
        .send(
            Method::POST,
            "/api/v1/books",
            Some(&staff),
            Some(json!({
                "title": "Harry Potter and the Test Suite",
                "summary": "",
                "isbn": "978-0-00-000000-0",
                "author_id": author["id"],
                "language_id": language["id"],
                "genre_ids": [genre["id"]]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, copy) = app
        .send(
            Method::POST,
            &format!("/api/v1/books/{}/instances", book["id"]),
            Some(&staff),
            Some(json!({ "imprint": "Unlikely Imprint, 2016", "status": "available" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(copy["status"], "available");

    let (status, _, details) = app
        .send(Method::GET, &format!("/api/v1/books/{}", book["id"]), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["display_genre"], "Fantasy");
    assert_eq!(details["instances"].as_array().unwrap().len(), 1);

    let (status, _, _) = app
        .send(Method::DELETE, &format!("/api/v1/books/{}", book["id"]), Some(&staff), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, summary) = app
        .send(Method::GET, "/api/v1/catalog?title=harry%20potter", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["num_books"], 1);
    assert_eq!(summary["num_instances"], 1);
    assert_eq!(summary["num_instances_available"], 1);
    assert_eq!(summary["num_authors"], 1);
    assert_eq!(summary["num_genres"], 1);
    assert_eq!(summary["num_matching_titles"], 1);

    let (status, _, page) = app
        .send(Method::GET, "/api/v1/books?title=POTTER", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["per_page"], 5);
}

#[tokio::test]
async fn author_writes_need_staff_capability() {
    let app = TestApp::new().await;
    let librarian = app.token("testuser2", &[Capability::CanMarkReturned]).await;
    let body = json!({ "first_name": "Christian", "last_name": "Surname" });

    let (status, _, _) = app
        .send(Method::POST, "/api/v1/authors", None, Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = app
        .send(Method::POST, "/api/v1/authors", Some(&librarian), Some(body))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn visit_counter_follows_session_cookie() {
    let app = TestApp::new().await;

    let first = app
        .router
        .clone()
        .oneshot(Request::get("/api/v1/catalog").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let cookie = first.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("catalog_session="));
    let body: Value =
        serde_json::from_slice(&to_bytes(first.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["num_visits"], 0);

    for expected in 1..=2 {
        let response = app
            .router
            .clone()
            .oneshot(
                Request::get("/api/v1/catalog")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body: Value =
            serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap())
                .unwrap();
        assert_eq!(body["num_visits"], expected);
    }
}

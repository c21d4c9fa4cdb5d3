//! End-to-end catalog flows against a real Postgres.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use bookhub_service::{build_router, db, services::Database, AppState};
use common::test_config;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct DbApp {
    router: Router,
    suffix: String,
}

impl DbApp {
    async fn new() -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let config = test_config(&[("DATABASE_URL", url.as_str()), ("ALLOW_ADMIN_SIGNUP", "true")]);

        let pool = db::create_pool(&config.database)
            .await
            .expect("Failed to connect to Postgres");
        db::run_migrations(&pool).await.expect("Failed to migrate");

        let database = Database::new(pool);
        let store = Arc::new(database.clone());
        let state = AppState::new(config, database, store.clone(), store).unwrap();

        Self {
            router: build_router(state),
            suffix: chrono::Utc::now().timestamp_nanos_opt().unwrap().to_string(),
        }
    }

    fn unique(&self, name: &str) -> String {
        format!("{}-{}", name, self.suffix)
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Register an account and sign it in, returning (account id, token).
    async fn account(&self, name: &str, role: &str) -> (i64, String) {
        let username = self.unique(name);
        let email = format!("{}@example.com", username);
        let (status, account) = self
            .send(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({ "username": username, "email": email, "password": "secret123", "role": role })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", account);

        let (status, token) = self
            .send(
                Method::POST,
                "/auth/signin",
                None,
                Some(json!({ "identifier": email, "password": "secret123" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", token);

        (
            account["id"].as_i64().unwrap(),
            token["token"].as_str().unwrap().to_string(),
        )
    }

    async fn create(&self, token: &str, uri: &str, body: Value) -> Value {
        let (status, created) = self.send(Method::POST, uri, Some(token), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", created);
        created
    }
}

fn id(value: &Value) -> i64 {
    value["id"].as_i64().unwrap()
}

#[tokio::test]
#[ignore]
async fn catalog_management_round_trip() {
    let app = DbApp::new().await;
    let (_, admin) = app.account("admin", "admin").await;

    let author = app
        .create(&admin, "/authors", json!({ "name": app.unique("Le Guin"), "bio": "Novelist" }))
        .await;
    let fiction = app
        .create(&admin, "/categories", json!({ "name": app.unique("fiction") }))
        .await;
    let classics = app
        .create(&admin, "/categories", json!({ "name": app.unique("classics") }))
        .await;

    let book = app
        .create(
            &admin,
            "/books",
            json!({ "title": "The Dispossessed", "authorId": id(&author), "categories": [id(&fiction), id(&classics)] }),
        )
        .await;

    let (status, detail) = app
        .send(Method::GET, &format!("/books/{}", id(&book)), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["author"]["id"], author["id"]);
    assert_eq!(detail["categories"].as_array().unwrap().len(), 2);
    assert_eq!(detail["reviews"], json!([]));

    let (status, updated) = app
        .send(
            Method::PUT,
            &format!("/books/{}", id(&book)),
            Some(&admin),
            Some(json!({ "title": "The Dispossessed (reissue)", "authorId": id(&author), "categories": [id(&fiction)] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    let (_, detail) = app
        .send(Method::GET, &format!("/books/{}", id(&book)), None, None)
        .await;
    assert_eq!(detail["title"], "The Dispossessed (reissue)");
    assert_eq!(detail["categories"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .send(Method::POST, "/categories", Some(&admin), Some(json!({ "name": fiction["name"] })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Category already exists");

    let (status, _) = app
        .send(
            Method::POST,
            "/books",
            Some(&admin),
            Some(json!({ "title": "Orphan", "authorId": i64::MAX, "categories": [id(&fiction)] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::DELETE, &format!("/authors/{}", id(&author)), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(Method::DELETE, &format!("/books/{}", id(&book)), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send(Method::DELETE, &format!("/authors/{}", id(&author)), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send(Method::GET, &format!("/authors/{}", id(&author)), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn book_listing_sorts_and_filters() {
    let app = DbApp::new().await;
    let (_, admin) = app.account("lister", "admin").await;

    let author = app
        .create(&admin, "/authors", json!({ "name": app.unique("Calvino") }))
        .await;
    let category_name = app.unique("fables");
    let fables = app
        .create(&admin, "/categories", json!({ "name": category_name }))
        .await;
    for title in ["Baron in the Trees", "Invisible Cities", "Cosmicomics"] {
        app.create(
            &admin,
            "/books",
            json!({ "title": title, "authorId": id(&author), "categories": [id(&fables)] }),
        )
        .await;
    }

    let (status, books) = app
        .send(
            Method::GET,
            &format!("/books?sortBy=title&order=desc&category={}", category_name),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = books
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Invisible Cities", "Cosmicomics", "Baron in the Trees"]);

    let (status, _) = app
        .send(Method::GET, "/books?sortBy=price", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn reviews_belong_to_their_author() {
    let app = DbApp::new().await;
    let (_, admin) = app.account("curator", "admin").await;
    let (writer_id, writer) = app.account("writer", "user").await;
    let (_, other) = app.account("other", "user").await;

    let author = app
        .create(&admin, "/authors", json!({ "name": app.unique("Borges") }))
        .await;
    let category = app
        .create(&admin, "/categories", json!({ "name": app.unique("stories") }))
        .await;
    let book = app
        .create(
            &admin,
            "/books",
            json!({ "title": "Ficciones", "authorId": id(&author), "categories": [id(&category)] }),
        )
        .await;

    let review = app
        .create(
            &writer,
            "/reviews",
            json!({ "content": "Labyrinthine", "rating": 5, "bookId": id(&book) }),
        )
        .await;
    assert_eq!(review["userId"], writer_id);
    let review_uri = format!("/reviews/{}", id(&review));

    let (status, listed) = app
        .send(Method::GET, &format!("/reviews/book/{}", id(&book)), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed[0]["user"]["id"], writer_id);
    assert!(listed[0]["user"].get("password_hash").is_none());

    let edit = json!({ "content": "Still labyrinthine", "rating": 4 });
    let (status, _) = app
        .send(Method::PUT, &review_uri, Some(&other), Some(edit.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = app
        .send(Method::PUT, &review_uri, Some(&writer), Some(edit))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["rating"], 4);

    // Deleting the book removes its reviews with it.
    let (status, _) = app
        .send(Method::DELETE, &format!("/books/{}", id(&book)), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(Method::DELETE, &review_uri, Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Review not found");
}

#[tokio::test]
#[ignore]
async fn emails_differing_only_in_case_are_one_account() {
    let app = DbApp::new().await;
    let local = app.unique("Casey");
    let first = json!({
        "username": format!("{}-a", local),
        "email": format!("{}@Example.com", local),
        "password": "secret123",
    });
    let second = json!({
        "username": format!("{}-b", local),
        "email": format!("{}@example.com", local.to_lowercase()),
        "password": "other-secret",
    });

    let (status, _) = app.send(Method::POST, "/auth/signup", None, Some(first)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = app.send(Method::POST, "/auth/signup", None, Some(second)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username or email already registered");

    let (status, _) = app
        .send(
            Method::POST,
            "/auth/signin",
            None,
            Some(json!({ "identifier": format!("{}@EXAMPLE.COM", local.to_uppercase()), "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

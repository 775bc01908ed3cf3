use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::{ConnectionTrait, Database, Statement};
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;
use server::{ServerState, router};

async fn test_router() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (id, name, role, token) in [
        ("admin-1", "Ada", "admin", "tok-admin"),
        ("bene-1", "Bruno", "beneficiary", "tok-bruno"),
        ("bene-2", "Carla", "beneficiary", "tok-carla"),
    ] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (id, name, role, token) VALUES (?, ?, ?, ?)",
            vec![id.into(), name.into(), role.into(), token.into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder().database(db.clone()).build().await.unwrap();
    router(ServerState {
        engine: Arc::new(engine),
        db,
    })
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_project(app: &Router, token: &str) -> String {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/projects",
            Some(token),
            Some(json!({
                "title": "Well drilling",
                "requested_amount_minor": 10_000
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn requests_without_token_get_401() {
    let app = test_router().await;
    let response = app
        .oneshot(request("GET", "/projects", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn non_bearer_authorization_gets_401() {
    let app = test_router().await;
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/projects")
                .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_token_gets_401() {
    let app = test_router().await;
    let response = app
        .oneshot(request("GET", "/projects", Some("tok-nobody"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn owner_records_transaction_non_owner_is_forbidden() {
    let app = test_router().await;
    let project_id = create_project(&app, "tok-bruno").await;

    let payload = json!({
        "project_id": project_id,
        "kind": "expense",
        "amount_minor": 500,
        "category": "supplies"
    });

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/transactions",
            Some("tok-bruno"),
            Some(payload.clone()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["balance_minor"], json!(-500));

    let response = app
        .oneshot(request(
            "POST",
            "/transactions",
            Some("tok-carla"),
            Some(payload),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn client_disbursement_kind_gets_422() {
    let app = test_router().await;
    let project_id = create_project(&app, "tok-bruno").await;

    let response = app
        .oneshot(request(
            "POST",
            "/transactions",
            Some("tok-bruno"),
            Some(json!({
                "project_id": project_id,
                "kind": "disbursement",
                "amount_minor": 500
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn milestone_approval_flow_over_http() {
    let app = test_router().await;
    let project_id = create_project(&app, "tok-bruno").await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/milestones",
            Some("tok-bruno"),
            Some(json!({
                "project_id": project_id,
                "title": "Phase 1",
                "tranche_amount_minor": 2_000
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let milestone_id = json_body(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/projects/{project_id}/tranches"),
            Some("tok-admin"),
            Some(json!({
                "milestone_id": milestone_id,
                "amount_minor": 2_000
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/milestones/{milestone_id}/approve"),
            Some("tok-admin"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A decided milestone cannot be decided again.
    let response = app
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/milestones/{milestone_id}/approve"),
            Some("tok-admin"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .oneshot(request(
            "GET",
            &format!("/projects/{project_id}"),
            Some("tok-bruno"),
            None,
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["total_disbursed_minor"], json!(2_000));
}

#[tokio::test]
async fn project_balance_reflects_recorded_transactions() {
    let app = test_router().await;
    let project_id = create_project(&app, "tok-bruno").await;

    for (kind, amount) in [("revenue", 900), ("expense", 400)] {
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/transactions",
                Some("tok-bruno"),
                Some(json!({
                    "project_id": project_id,
                    "kind": kind,
                    "amount_minor": amount
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(request(
            "GET",
            &format!("/projects/{project_id}/balance"),
            Some("tok-bruno"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["balance_minor"], json!(500));
}

#[tokio::test]
async fn kpis_report_margin_as_two_decimal_string() {
    let app = test_router().await;
    let project_id = create_project(&app, "tok-bruno").await;

    for (kind, amount) in [("revenue", 3_000), ("expense", 1_000)] {
        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/transactions",
                Some("tok-bruno"),
                Some(json!({
                    "project_id": project_id,
                    "kind": kind,
                    "amount_minor": amount
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .oneshot(request(
            "GET",
            &format!("/projects/{project_id}/kpis"),
            Some("tok-bruno"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["margin"], json!("20.00"));
    assert_eq!(body["total_budget_minor"], json!(10_000));
}

#[tokio::test]
async fn milestone_approval_requires_admin() {
    let app = test_router().await;
    let project_id = create_project(&app, "tok-bruno").await;

    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/milestones",
            Some("tok-bruno"),
            Some(json!({
                "project_id": project_id,
                "title": "Phase 1"
            })),
        ))
        .await
        .unwrap();
    let milestone_id = json_body(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .oneshot(request(
            "PATCH",
            &format!("/milestones/{milestone_id}/approve"),
            Some("tok-bruno"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

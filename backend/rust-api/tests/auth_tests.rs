use axum::http::StatusCode;
use serde_json::json;

mod common;

use common::{create_test_app, post_json, post_raw};

#[tokio::test]
async fn test_register_then_duplicate_conflicts() {
    let (app, state) = create_test_app();
    let body = json!({ "name": "Asha", "roll_number": "12", "school_name": "Hillview" });

    let (status, first) = post_json(&app, "/register", body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["created"], true);
    assert_eq!(first["name"], "Asha");
    assert!(first["userId"].as_i64().unwrap() > 0);

    let (status, second) = post_json(&app, "/register", body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(second["message"], "User already exists. Please log in.");

    let users = state
        .users
        .find_by_login(&mindtrack_api::models::user::LoginCredentials {
            name: "Asha".into(),
            roll_number: "12".into(),
        })
        .await
        .unwrap();
    assert!(users.is_some());
}

#[tokio::test]
async fn test_register_trims_and_assigns_increasing_ids() {
    let (app, _) = create_test_app();

    let (_, a) = post_json(
        &app,
        "/register",
        json!({ "name": "  Asha ", "roll_number": "12", "school_name": "Hillview" }),
    )
    .await;
    let (_, b) = post_json(
        &app,
        "/register",
        json!({ "name": "Bilal", "roll_number": "13", "school_name": "Hillview" }),
    )
    .await;

    assert_eq!(a["name"], "Asha");
    assert!(b["userId"].as_i64().unwrap() > a["userId"].as_i64().unwrap());
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let (app, _) = create_test_app();

    let (status, body) = post_json(&app, "/register", json!({ "name": "Asha", "roll_number": "12" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid payload");

    let (status, body) = post_json(
        &app,
        "/register",
        json!({ "name": "Asha", "roll_number": " ", "school_name": "Hillview" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "name, roll_number and school_name are required");

    let (status, body) = post_raw(&app, "/register", "{not json".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid payload");
}

#[tokio::test]
async fn test_login_flow() {
    let (app, _) = create_test_app();

    let (status, body) = post_json(&app, "/login", json!({ "name": "Asha", "roll_number": "12" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found. Please register first.");

    let (_, registered) = post_json(
        &app,
        "/register",
        json!({ "name": "Asha", "roll_number": "12", "school_name": "Hillview" }),
    )
    .await;

    let (status, body) = post_json(&app, "/login", json!({ "name": " Asha", "roll_number": "12 " })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], registered["userId"]);
    assert_eq!(body["school_name"], "Hillview");
    assert!(body.get("created").is_none());
}

#[tokio::test]
async fn test_login_rejects_bad_input() {
    let (app, _) = create_test_app();

    let (status, _) = post_json(&app, "/login", json!({ "name": "Asha" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(&app, "/login", json!({ "name": "", "roll_number": "12" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Both name and roll_number are required");
}

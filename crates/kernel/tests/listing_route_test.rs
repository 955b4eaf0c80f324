#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Listing routes: request decoding, tenant header and validation.
//!
//! Every request here is answered before a database round trip.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::json;
use sift_test_utils::{assert, requests};

use common::{TENANT_HEADER, TestApp};

#[tokio::test]
async fn lists_registered_entities() {
    let app = TestApp::offline();
    let (status, body) = app.get("/api/entities").await;

    assert_eq!(status, StatusCode::OK);
    let entities: Vec<&str> = body["entities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(entities.contains(&"lead"));
    assert!(entities.contains(&"shipment"));
    assert!(entities.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn describes_columns_with_operators() {
    let app = TestApp::offline();
    let (status, body) = app.get("/api/lead/columns").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entity"], "lead");

    let columns = body["columns"].as_array().unwrap();
    let company_size = columns
        .iter()
        .find(|c| c["column"] == "companySize")
        .unwrap();
    assert_eq!(company_size["columnType"], "number");
    assert!(
        company_size["operators"]
            .as_array()
            .unwrap()
            .contains(&json!("greaterThan"))
    );
}

#[tokio::test]
async fn unknown_entity_columns_is_not_found() {
    let app = TestApp::offline();
    let (status, body) = app.get("/api/invoice/columns").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert::contains(body["error"].as_str().unwrap(), "invoice");
}

#[tokio::test]
async fn page_without_tenant_header_is_unauthorized() {
    let app = TestApp::offline();
    let request = Request::post("/api/lead/page")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(requests::first_page().to_string()))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert::contains(body["error"].as_str().unwrap(), TENANT_HEADER);
}

#[tokio::test]
async fn page_with_non_numeric_tenant_is_unauthorized() {
    let app = TestApp::offline();
    let request = Request::post("/api/lead/page")
        .header(header::CONTENT_TYPE, "application/json")
        .header(TENANT_HEADER, "acme")
        .body(Body::from(requests::first_page().to_string()))
        .unwrap();

    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn page_for_unknown_entity_is_not_found() {
    let app = TestApp::offline();
    let (status, _) = app.page("invoice", 1, &requests::first_page()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn operator_invalid_for_type_is_rejected() {
    let app = TestApp::offline();
    let body = requests::page(
        "AND",
        vec![requests::condition("firstName", "greaterThan", "5")],
        0,
        10,
    );

    let (status, body) = app.page("lead", 1, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Invalid operator 'greaterThan' for string column 'firstName'. Valid operators: \
         contains, equals, startsWith, endsWith, isEmpty, isNotEmpty, isOneOf, isNotOneOf, \
         containsOneOf"
    );
}

#[tokio::test]
async fn non_numeric_number_comparison_is_rejected() {
    let app = TestApp::offline();

    let body = requests::page(
        "AND",
        vec![requests::condition("companySize", ">", "many")],
        0,
        10,
    );
    let (status, body) = app.page("lead", 1, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Invalid value 'many' for number column 'companySize'"
    );

    let body = requests::page(
        "AND",
        vec![requests::condition("companySize", "=", true)],
        0,
        10,
    );
    let (status, _) = app.page("lead", 1, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn user_log_page_without_user_header_is_unauthorized() {
    let app = TestApp::offline();
    let (status, body) = app.page("user_log", 1, &requests::first_page()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert::contains(body["error"].as_str().unwrap(), "x-user-id");
}

#[tokio::test]
async fn unknown_column_is_rejected() {
    let app = TestApp::offline();
    let body = requests::page(
        "AND",
        vec![requests::condition("password", "equals", "x")],
        0,
        10,
    );

    let (status, body) = app.page("lead", 1, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert::contains(body["error"].as_str().unwrap(), "password");
}

#[tokio::test]
async fn invalid_logic_operator_is_rejected() {
    let app = TestApp::offline();
    let body = requests::page("XOR", Vec::new(), 0, 10);

    let (status, _) = app.page("lead", 1, &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn out_of_range_pagination_is_rejected() {
    let app = TestApp::offline();

    let (status, body) = app
        .page("lead", 1, &requests::page("AND", Vec::new(), -1, 10))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert::contains(body["error"].as_str().unwrap(), "offset");

    let (status, body) = app
        .page("lead", 1, &requests::page("AND", Vec::new(), 0, 1000))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert::contains(body["error"].as_str().unwrap(), "limit");
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = TestApp::offline();
    let request = Request::post("/api/lead/page")
        .header(header::CONTENT_TYPE, "application/json")
        .header(TENANT_HEADER, "1")
        .body(Body::from("{\"filters\": 3"))
        .unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert::has_key(&body, "error");
}

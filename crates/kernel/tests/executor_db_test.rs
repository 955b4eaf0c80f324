#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Listing queries against a live PostgreSQL database.
//!
//! Each test seeds rows under fresh random tenant ids and removes them at
//! the end. Tests return early when `DATABASE_URL` is not set.

mod common;

use axum::http::StatusCode;
use sift_kernel::filter::entities::{LEAD, PROMO, USER_LOG};
use sift_kernel::filter::{EntityCatalog, ListingQuery, ListingScope, PageQuery};
use sift_test_utils::{
    assert, cleanup_tenant, cleanup_user_logs, requests, test_lead, test_promo, test_tenant,
    test_user_log,
};

use common::TestApp;

macro_rules! require_db {
    () => {
        match TestApp::connect().await {
            Some(app) => app,
            None => {
                eprintln!("DATABASE_URL not set; skipping");
                return;
            }
        }
    };
}

fn listing(body: serde_json::Value, catalog: &EntityCatalog) -> ListingQuery {
    serde_json::from_value::<PageQuery>(body)
        .unwrap()
        .validate(catalog, 100)
        .unwrap()
}

#[tokio::test]
async fn contains_and_soft_delete_scenario() {
    let app = require_db!();
    let tenant = test_tenant();
    let other = test_tenant();

    let john = test_lead(tenant, "John").insert(&app.db).await.unwrap();
    test_lead(tenant, "Johnny").deleted().insert(&app.db).await.unwrap();
    test_lead(tenant, "Mary").insert(&app.db).await.unwrap();
    test_lead(other, "John").insert(&app.db).await.unwrap();

    let query = listing(
        requests::page(
            "AND",
            vec![requests::condition("firstName", "contains", "john")],
            0,
            10,
        ),
        &LEAD,
    );
    let page = app
        .state
        .executor()
        .find_page(&LEAD, ListingScope::tenant(tenant), &query)
        .await
        .unwrap();

    assert_eq!(page.total_count, 1);
    assert_eq!(
        assert::row_ids(&serde_json::to_value(&page).unwrap(), "lead_id"),
        vec![john]
    );

    cleanup_tenant(&app.db, tenant).await;
    cleanup_tenant(&app.db, other).await;
}

#[tokio::test]
async fn or_filters_stay_inside_tenant() {
    let app = require_db!();
    let tenant = test_tenant();
    let other = test_tenant();

    test_lead(tenant, "Ada").insert(&app.db).await.unwrap();
    test_lead(other, "Grace").insert(&app.db).await.unwrap();
    test_lead(other, "Hedy").deleted().insert(&app.db).await.unwrap();

    // Matches every row in the table if the OR escaped its parentheses.
    let query = listing(
        requests::page(
            "OR",
            vec![
                requests::condition("firstName", "contains", "a"),
                requests::condition("isDeleted", "is", true),
                requests::condition("isDeleted", "is", false),
            ],
            0,
            50,
        ),
        &LEAD,
    );
    let page = app
        .state
        .executor()
        .find_page(&LEAD, ListingScope::tenant(tenant), &query)
        .await
        .unwrap();

    assert_eq!(page.total_count, 1);
    assert!(
        page.rows
            .iter()
            .all(|row| row["client_id"].as_i64() == Some(tenant))
    );

    cleanup_tenant(&app.db, tenant).await;
    cleanup_tenant(&app.db, other).await;
}

#[tokio::test]
async fn include_deleted_and_selected_ids() {
    let app = require_db!();
    let tenant = test_tenant();

    let live = test_lead(tenant, "Live").insert(&app.db).await.unwrap();
    let gone = test_lead(tenant, "Gone").deleted().insert(&app.db).await.unwrap();
    test_lead(tenant, "Other").insert(&app.db).await.unwrap();

    let mut body = requests::first_page();
    body["includeDeleted"] = serde_json::json!(true);
    body["selectedIds"] = serde_json::json!([live, gone]);
    let query = listing(body, &LEAD);

    let page = app
        .state
        .executor()
        .find_page(&LEAD, ListingScope::tenant(tenant), &query)
        .await
        .unwrap();

    assert_eq!(page.total_count, 2);
    let ids: Vec<i64> = page
        .rows
        .iter()
        .filter_map(|r| r["lead_id"].as_i64())
        .collect();
    assert_eq!(ids, vec![gone, live]);

    cleanup_tenant(&app.db, tenant).await;
}

#[tokio::test]
async fn pages_are_newest_first_with_stable_total() {
    let app = require_db!();
    let tenant = test_tenant();

    let mut ids = Vec::new();
    for name in ["A", "B", "C", "D", "E"] {
        ids.push(test_lead(tenant, name).insert(&app.db).await.unwrap());
    }
    ids.reverse();

    let first = listing(requests::page("AND", Vec::new(), 0, 2), &LEAD);
    let last = listing(requests::page("AND", Vec::new(), 4, 2), &LEAD);
    let executor = app.state.executor();

    let page = executor.find_page(&LEAD, ListingScope::tenant(tenant), &first).await.unwrap();
    assert_eq!(page.total_count, 5);
    assert!(page.has_next());
    let got: Vec<i64> = page
        .rows
        .iter()
        .filter_map(|r| r["lead_id"].as_i64())
        .collect();
    assert_eq!(got, ids[..2].to_vec());

    let page = executor.find_page(&LEAD, ListingScope::tenant(tenant), &last).await.unwrap();
    assert_eq!(page.total_count, 5);
    assert!(!page.has_next());
    assert_eq!(page.rows.len(), 1);

    cleanup_tenant(&app.db, tenant).await;
}

#[tokio::test]
async fn number_and_boolean_filters() {
    let app = require_db!();
    let tenant = test_tenant();

    let big = test_promo(tenant, "BIG")
        .with_discount(25.0)
        .percent()
        .insert(&app.db)
        .await
        .unwrap();
    test_promo(tenant, "SMALL")
        .with_discount(5.0)
        .percent()
        .insert(&app.db)
        .await
        .unwrap();
    test_promo(tenant, "FLAT")
        .with_discount(40.0)
        .insert(&app.db)
        .await
        .unwrap();

    let query = listing(
        requests::page(
            "AND",
            vec![
                requests::condition("discountValue", ">", 10),
                requests::condition("isPercent", "is", "true"),
            ],
            0,
            10,
        ),
        &PROMO,
    );
    let page = app
        .state
        .executor()
        .find_page(&PROMO, ListingScope::tenant(tenant), &query)
        .await
        .unwrap();

    assert_eq!(page.total_count, 1);
    assert_eq!(page.rows[0]["promo_id"].as_i64(), Some(big));

    cleanup_tenant(&app.db, tenant).await;
}

#[tokio::test]
async fn page_route_returns_embedded_rows() {
    let app = require_db!();
    let tenant = test_tenant();

    test_lead(tenant, "Embed")
        .with_email("embed@example.com")
        .insert(&app.db)
        .await
        .unwrap();

    let (status, body) = app.page("lead", tenant, &requests::first_page()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 1);
    assert_eq!(body["offset"], 0);
    assert_eq!(body["limit"], 10);
    let row = &body["rows"][0];
    assert_eq!(row["email"], "embed@example.com");
    assert::has_key(row, "address");
    assert!(row["address"].is_null());

    cleanup_tenant(&app.db, tenant).await;
}

#[tokio::test]
async fn user_log_lists_own_entries_in_tenant_and_shared() {
    let app = require_db!();
    let tenant = test_tenant();
    let other_tenant = test_tenant();
    let user = test_tenant();
    let other_user = test_tenant();

    let own = test_user_log(user, tenant, "login")
        .insert(&app.db)
        .await
        .unwrap();
    let shared = test_user_log(user, tenant, "password reset")
        .shared()
        .insert(&app.db)
        .await
        .unwrap();
    test_user_log(user, other_tenant, "login")
        .insert(&app.db)
        .await
        .unwrap();
    test_user_log(other_user, tenant, "login")
        .insert(&app.db)
        .await
        .unwrap();
    test_user_log(other_user, tenant, "export")
        .shared()
        .insert(&app.db)
        .await
        .unwrap();

    let query = listing(requests::first_page(), &USER_LOG);
    let page = app
        .state
        .executor()
        .find_page(&USER_LOG, ListingScope::tenant(tenant).with_user(user), &query)
        .await
        .unwrap();

    assert_eq!(page.total_count, 2);
    let ids: Vec<i64> = page
        .rows
        .iter()
        .filter_map(|r| r["log_id"].as_i64())
        .collect();
    let mut expected = vec![own, shared];
    expected.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(ids, expected);

    let (status, body) = app
        .page_as("user_log", tenant, user, &requests::first_page())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 2);

    cleanup_user_logs(&app.db, user).await;
    cleanup_user_logs(&app.db, other_user).await;
}

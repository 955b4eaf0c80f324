//! Sift test utilities.
//!
//! Helpers for integration testing: tenant and user ids, row seeders, request
//! fixtures, and assertion utilities for listing responses.

use rand::Rng;
use sqlx::PgPool;

/// Pick a tenant id unlikely to collide with other test runs.
pub fn test_tenant() -> i64 {
    rand::thread_rng().gen_range(1_000_000..i64::from(i32::MAX))
}

/// Create a test lead with default values.
pub fn test_lead(client_id: i64, first_name: &str) -> TestLead {
    TestLead {
        client_id,
        first_name: first_name.to_string(),
        last_name: None,
        email: None,
        company: None,
        company_size: None,
        lead_status: None,
        is_deleted: false,
    }
}

/// A lead row builder.
#[derive(Debug, Clone)]
pub struct TestLead {
    pub client_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub company_size: Option<i32>,
    pub lead_status: Option<String>,
    pub is_deleted: bool,
}

impl TestLead {
    pub fn with_last_name(mut self, last_name: &str) -> Self {
        self.last_name = Some(last_name.to_string());
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn with_company(mut self, company: &str, size: i32) -> Self {
        self.company = Some(company.to_string());
        self.company_size = Some(size);
        self
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.lead_status = Some(status.to_string());
        self
    }

    /// Mark as soft-deleted.
    pub fn deleted(mut self) -> Self {
        self.is_deleted = true;
        self
    }

    /// Insert the row and return its `lead_id`.
    pub async fn insert(&self, pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO lead
                (client_id, first_name, last_name, email, company, company_size, lead_status, is_deleted)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING lead_id
            "#,
        )
        .bind(self.client_id)
        .bind(&self.first_name)
        .bind(&self.last_name)
        .bind(&self.email)
        .bind(&self.company)
        .bind(self.company_size)
        .bind(&self.lead_status)
        .bind(self.is_deleted)
        .fetch_one(pool)
        .await
    }
}

/// Create a test promo code with default values.
pub fn test_promo(client_id: i64, promo_code: &str) -> TestPromo {
    TestPromo {
        client_id,
        promo_code: promo_code.to_string(),
        discount_value: 0.0,
        is_percent: false,
        is_deleted: false,
    }
}

/// A promo row builder.
#[derive(Debug, Clone)]
pub struct TestPromo {
    pub client_id: i64,
    pub promo_code: String,
    pub discount_value: f64,
    pub is_percent: bool,
    pub is_deleted: bool,
}

impl TestPromo {
    pub fn with_discount(mut self, value: f64) -> Self {
        self.discount_value = value;
        self
    }

    pub fn percent(mut self) -> Self {
        self.is_percent = true;
        self
    }

    pub fn deleted(mut self) -> Self {
        self.is_deleted = true;
        self
    }

    /// Insert the row and return its `promo_id`.
    pub async fn insert(&self, pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO promo (client_id, promo_code, discount_value, is_percent, is_deleted)
            VALUES ($1, $2, $3::float8, $4, $5)
            RETURNING promo_id
            "#,
        )
        .bind(self.client_id)
        .bind(&self.promo_code)
        .bind(self.discount_value)
        .bind(self.is_percent)
        .bind(self.is_deleted)
        .fetch_one(pool)
        .await
    }
}

/// Create a test audit log entry for `user_id` within `client_id`.
pub fn test_user_log(user_id: i64, client_id: i64, action: &str) -> TestUserLog {
    TestUserLog {
        user_id,
        client_id: Some(client_id),
        action: action.to_string(),
    }
}

/// A user log row builder.
#[derive(Debug, Clone)]
pub struct TestUserLog {
    pub user_id: i64,
    /// `None` for entries shared across tenants.
    pub client_id: Option<i64>,
    pub action: String,
}

impl TestUserLog {
    /// Not tied to any tenant.
    pub fn shared(mut self) -> Self {
        self.client_id = None;
        self
    }

    /// Insert the row and return its `log_id`.
    pub async fn insert(&self, pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO user_log (user_id, client_id, action)
            VALUES ($1, $2, $3)
            RETURNING log_id
            "#,
        )
        .bind(self.user_id)
        .bind(self.client_id)
        .bind(&self.action)
        .fetch_one(pool)
        .await
    }
}

/// Remove every seeded log entry of a user, shared ones included.
pub async fn cleanup_user_logs(pool: &PgPool, user_id: i64) {
    sqlx::query("DELETE FROM user_log WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .ok();
}

/// Remove every seeded row owned by a tenant.
pub async fn cleanup_tenant(pool: &PgPool, client_id: i64) {
    for table in ["lead", "promo"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE client_id = $1"))
            .bind(client_id)
            .execute(pool)
            .await
            .ok();
    }
}

/// Listing request bodies.
pub mod requests {
    use serde_json::{Value, json};

    /// A single filter condition.
    pub fn condition(column: &str, operator: &str, value: impl Into<Value>) -> Value {
        json!({ "column": column, "operator": operator, "value": value.into() })
    }

    /// A condition for a value-less operator such as `isEmpty`.
    pub fn unary(column: &str, operator: &str) -> Value {
        json!({ "column": column, "operator": operator })
    }

    /// A page request combining `filters` with `logic`.
    pub fn page(logic: &str, filters: Vec<Value>, offset: i64, limit: i64) -> Value {
        json!({
            "logicOperator": logic,
            "filters": filters,
            "offset": offset,
            "limit": limit,
        })
    }

    /// First page of ten rows, no filters.
    pub fn first_page() -> Value {
        page("AND", Vec::new(), 0, 10)
    }
}

/// Assertion helpers for listing responses.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Collect `key` from every row of a page body.
    pub fn row_ids(page: &Value, key: &str) -> Vec<i64> {
        page.get("rows")
            .and_then(Value::as_array)
            .map(|rows| rows.iter().filter_map(|r| r.get(key)?.as_i64()).collect())
            .unwrap_or_default()
    }
}

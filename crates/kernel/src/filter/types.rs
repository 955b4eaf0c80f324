//! Filter engine types.
//!
//! Provides type definitions for the filter-to-query compiler:
//! - FilterCondition: one client-supplied predicate (column, operator, value)
//! - ColumnType: type classes that decide which clause builder runs
//! - CompiledPredicate: SQL fragment with named placeholders plus bound values
//! - PageRequest / Page: pagination input and output

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// String operators
pub const OP_CONTAINS: &str = "contains";
pub const OP_EQUALS: &str = "equals";
pub const OP_STARTS_WITH: &str = "startsWith";
pub const OP_ENDS_WITH: &str = "endsWith";
pub const OP_IS_EMPTY: &str = "isEmpty";
pub const OP_IS_NOT_EMPTY: &str = "isNotEmpty";
pub const OP_IS_ONE_OF: &str = "isOneOf";
pub const OP_IS_NOT_ONE_OF: &str = "isNotOneOf";
pub const OP_CONTAINS_ONE_OF: &str = "containsOneOf";

// Number operators (word form)
pub const OP_NOT_EQUALS: &str = "notEquals";
pub const OP_GREATER_THAN: &str = "greaterThan";
pub const OP_GREATER_THAN_OR_EQUAL: &str = "greaterThanOrEqual";
pub const OP_LESS_THAN: &str = "lessThan";
pub const OP_LESS_THAN_OR_EQUAL: &str = "lessThanOrEqual";

// Date operators
pub const OP_IS: &str = "is";
pub const OP_IS_NOT: &str = "isNot";
pub const OP_IS_AFTER: &str = "isAfter";
pub const OP_IS_ON_OR_AFTER: &str = "isOnOrAfter";
pub const OP_IS_BEFORE: &str = "isBefore";
pub const OP_IS_ON_OR_BEFORE: &str = "isOnOrBefore";

/// Operators accepted on string columns, in the order reported to clients.
pub const STRING_OPERATORS: &[&str] = &[
    OP_CONTAINS,
    OP_EQUALS,
    OP_STARTS_WITH,
    OP_ENDS_WITH,
    OP_IS_EMPTY,
    OP_IS_NOT_EMPTY,
    OP_IS_ONE_OF,
    OP_IS_NOT_ONE_OF,
    OP_CONTAINS_ONE_OF,
];

/// Operators accepted on number columns (after symbol normalization).
pub const NUMBER_OPERATORS: &[&str] = &[
    OP_EQUALS,
    OP_NOT_EQUALS,
    OP_GREATER_THAN,
    OP_GREATER_THAN_OR_EQUAL,
    OP_LESS_THAN,
    OP_LESS_THAN_OR_EQUAL,
    OP_IS_EMPTY,
    OP_IS_NOT_EMPTY,
    OP_IS_ONE_OF,
    OP_IS_NOT_ONE_OF,
];

/// Operators accepted on date columns.
pub const DATE_OPERATORS: &[&str] = &[
    OP_IS,
    OP_IS_NOT,
    OP_IS_AFTER,
    OP_IS_ON_OR_AFTER,
    OP_IS_BEFORE,
    OP_IS_ON_OR_BEFORE,
    OP_IS_EMPTY,
    OP_IS_NOT_EMPTY,
];

/// Operators accepted on boolean columns.
pub const BOOLEAN_OPERATORS: &[&str] = &[OP_IS];

/// Symbol spellings clients may send for number comparisons.
pub const SYMBOL_OPERATORS: &[&str] = &["=", "!=", ">", ">=", "<", "<="];

/// Map a symbol operator to its word form. Word forms pass through unchanged.
pub fn normalize_operator(operator: &str) -> &str {
    match operator {
        "=" => OP_EQUALS,
        "!=" => OP_NOT_EQUALS,
        ">" => OP_GREATER_THAN,
        ">=" => OP_GREATER_THAN_OR_EQUAL,
        "<" => OP_LESS_THAN,
        "<=" => OP_LESS_THAN_OR_EQUAL,
        other => other,
    }
}

/// Type class of a catalog column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Date,
    Boolean,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Number => "number",
            ColumnType::Date => "date",
            ColumnType::Boolean => "boolean",
        }
    }

    /// Operator vocabulary for this type.
    pub fn valid_operators(&self) -> &'static [&'static str] {
        match self {
            ColumnType::String => STRING_OPERATORS,
            ColumnType::Number => NUMBER_OPERATORS,
            ColumnType::Date => DATE_OPERATORS,
            ColumnType::Boolean => BOOLEAN_OPERATORS,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Joiner between the clauses of one filter group.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicOperator {
    #[default]
    And,
    Or,
}

impl LogicOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicOperator::And => "AND",
            LogicOperator::Or => "OR",
        }
    }
}

impl FromStr for LogicOperator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("and") {
            Ok(LogicOperator::And)
        } else if s.eq_ignore_ascii_case("or") {
            Ok(LogicOperator::Or)
        } else {
            Err(())
        }
    }
}

/// Raw filter value as decoded from a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FilterValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl FilterValue {
    /// String form used by string clauses and `;`-list splitting.
    pub fn as_text(&self) -> String {
        match self {
            FilterValue::Boolean(b) => b.to_string(),
            FilterValue::Integer(i) => i.to_string(),
            FilterValue::Float(f) => f.to_string(),
            FilterValue::String(s) => s.clone(),
        }
    }

    /// Numeric form for number columns. Booleans and non-numeric strings
    /// have none.
    pub fn as_number(&self) -> Option<BoundValue> {
        match self {
            FilterValue::Integer(i) => Some(BoundValue::Integer(*i)),
            FilterValue::Float(f) => Some(BoundValue::Float(*f)),
            FilterValue::Boolean(_) => None,
            FilterValue::String(s) => parse_number(s.trim()),
        }
    }
}

/// Parse an integer, falling back to a finite float.
pub(crate) fn parse_number(segment: &str) -> Option<BoundValue> {
    segment
        .parse::<i64>()
        .map(BoundValue::Integer)
        .ok()
        .or_else(|| {
            segment
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(BoundValue::Float)
        })
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::String(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::String(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Float(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Boolean(value)
    }
}

/// One user-specified predicate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterCondition {
    /// Public column name, resolved through the entity catalog.
    pub column: String,

    /// Operator token from the fixed vocabulary.
    pub operator: String,

    /// Scalar or `;`-delimited multi-value string. Absent for isEmpty/isNotEmpty.
    #[serde(default)]
    pub value: Option<FilterValue>,
}

impl FilterCondition {
    /// Create a condition, normalizing symbol operators to word form.
    pub fn new(
        column: impl Into<String>,
        operator: &str,
        value: Option<FilterValue>,
    ) -> Self {
        Self {
            column: column.into(),
            operator: normalize_operator(operator).to_string(),
            value,
        }
    }

    /// Return this condition with its operator in word form.
    pub fn normalized(self) -> Self {
        let operator = normalize_operator(&self.operator).to_string();
        Self { operator, ..self }
    }

    /// Whether the operator needs a value to compile into a real clause.
    pub fn requires_value(&self) -> bool {
        self.operator != OP_IS_EMPTY && self.operator != OP_IS_NOT_EMPTY
    }
}

/// A single bound parameter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BoundValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    /// Expands to one placeholder per element inside `IN (...)`.
    List(Vec<BoundValue>),
}

/// Output of [`FilterQueryBuilder::compile`](super::FilterQueryBuilder::compile).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompiledPredicate {
    /// Clauses joined by the logic operator. Empty when there were no filters.
    pub expression: String,

    /// Bound values keyed by placeholder name (`param0`, `param3_1`).
    pub parameters: BTreeMap<String, BoundValue>,
}

impl CompiledPredicate {
    pub fn has_conditions(&self) -> bool {
        !self.expression.is_empty()
    }

    /// Named placeholders referenced by the expression, in order of appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        split_placeholders(&self.expression)
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Placeholder(name) => Some(name),
                Segment::Sql(_) => None,
            })
            .collect()
    }
}

/// A piece of a compiled expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Sql(&'a str),
    /// Placeholder name without the leading `:`.
    Placeholder(&'a str),
}

/// Split `expression` at `:name` placeholders.
///
/// Quoted literals and `::` casts stay SQL text.
pub(crate) fn split_placeholders(expression: &str) -> Vec<Segment<'_>> {
    let bytes = expression.as_bytes();
    let mut segments = Vec::new();
    let mut quoted = false;
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => {
                quoted = !quoted;
                i += 1;
            }
            b':' if !quoted => {
                if bytes.get(i + 1) == Some(&b':') {
                    i += 2;
                    continue;
                }
                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
                {
                    end += 1;
                }
                if end == start {
                    i += 1;
                    continue;
                }
                if text_start < i {
                    segments.push(Segment::Sql(&expression[text_start..i]));
                }
                segments.push(Segment::Placeholder(&expression[start..end]));
                i = end;
                text_start = end;
            }
            _ => i += 1,
        }
    }

    if text_start < bytes.len() {
        segments.push(Segment::Sql(&expression[text_start..]));
    }
    segments
}

/// Who a listing is for: the tenant, and the acting user when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingScope {
    pub tenant_id: i64,
    pub user_id: Option<i64>,
}

impl ListingScope {
    pub fn tenant(tenant_id: i64) -> Self {
        Self {
            tenant_id,
            user_id: None,
        }
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// Requested window into the ordered result set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 10,
        }
    }
}

/// One page of results plus the total count before paging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T = serde_json::Value> {
    pub rows: Vec<T>,
    pub total_count: u64,
    pub offset: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn new(rows: Vec<T>, total_count: u64, page: PageRequest) -> Self {
        Self {
            rows,
            total_count,
            offset: page.offset,
            limit: page.limit,
        }
    }

    /// Whether rows exist beyond this page.
    pub fn has_next(&self) -> bool {
        self.offset + (self.rows.len() as u64) < self.total_count
    }
}

impl Page<serde_json::Value> {
    /// Deserialize JSON rows into a caller-defined entity type.
    pub fn try_into_typed<T: DeserializeOwned>(self) -> serde_json::Result<Page<T>> {
        let rows = self
            .rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<serde_json::Result<Vec<T>>>()?;
        Ok(Page {
            rows,
            total_count: self.total_count,
            offset: self.offset,
            limit: self.limit,
        })
    }
}

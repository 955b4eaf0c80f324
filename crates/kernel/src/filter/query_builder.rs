//! Filter query compiler.
//!
//! Translates a list of [`FilterCondition`]s and a logic operator into one
//! SQL boolean expression with named placeholders (`:param0`) and a map of
//! bound values. Column types come from the entity catalog and decide which
//! clause builder runs.
//!
//! Compilation is fail-open: a value that cannot be used (unparseable date,
//! non-numeric number value, multi-value list that is empty after cleaning,
//! operator the type does not know) turns that one clause into `1=1` instead
//! of failing the request. Operator/type mismatches and non-numeric number
//! comparisons are rejected earlier, by request validation.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

use super::catalog::EntityCatalog;
use super::types::{
    BoundValue, ColumnType, CompiledPredicate, FilterCondition, FilterValue, LogicOperator,
    OP_CONTAINS, OP_CONTAINS_ONE_OF, OP_ENDS_WITH, OP_EQUALS, OP_GREATER_THAN,
    OP_GREATER_THAN_OR_EQUAL, OP_IS, OP_IS_AFTER, OP_IS_BEFORE, OP_IS_EMPTY, OP_IS_NOT,
    OP_IS_NOT_EMPTY, OP_IS_NOT_ONE_OF, OP_IS_ON_OR_AFTER, OP_IS_ON_OR_BEFORE, OP_IS_ONE_OF,
    OP_LESS_THAN, OP_LESS_THAN_OR_EQUAL, OP_NOT_EQUALS, OP_STARTS_WITH, parse_number,
};

/// Always-true clause used when a condition cannot contribute anything.
pub const NO_OP_CLAUSE: &str = "1=1";

type Parameters = BTreeMap<String, BoundValue>;

/// Compiles filter conditions against one entity catalog.
#[derive(Debug, Clone, Copy)]
pub struct FilterQueryBuilder<'a> {
    catalog: &'a EntityCatalog,
}

impl<'a> FilterQueryBuilder<'a> {
    pub fn new(catalog: &'a EntityCatalog) -> Self {
        Self { catalog }
    }

    /// Compile `filters` into a single predicate joined by `logic`.
    ///
    /// Clause order follows input order. Condition `i` binds `param<i>`
    /// (`param<i>_<k>` for `containsOneOf` segments). An empty list yields an
    /// empty expression and no parameters.
    pub fn compile(&self, filters: &[FilterCondition], logic: LogicOperator) -> CompiledPredicate {
        if filters.is_empty() {
            return CompiledPredicate::default();
        }

        let joiner = format!(" {} ", logic.as_str());
        let mut expression = String::new();
        let mut parameters = Parameters::new();

        for (i, filter) in filters.iter().enumerate() {
            let field = self.catalog.resolve_field_path(&filter.column);
            let param = format!("param{i}");

            if i > 0 {
                expression.push_str(&joiner);
            }

            let clause = match self.catalog.column_type(&filter.column) {
                ColumnType::Date => build_date_condition(&field, filter, &param, &mut parameters),
                ColumnType::Boolean => {
                    build_boolean_condition(&field, filter, &param, &mut parameters)
                }
                ColumnType::Number => {
                    build_number_condition(&field, filter, &param, &mut parameters)
                }
                ColumnType::String => {
                    build_string_condition(&field, filter, &param, &mut parameters)
                }
            };
            expression.push_str(&clause);
        }

        tracing::debug!(
            entity = self.catalog.entity,
            clauses = filters.len(),
            parameters = parameters.len(),
            logic = logic.as_str(),
            "compiled filter predicate"
        );

        CompiledPredicate {
            expression,
            parameters,
        }
    }
}

fn no_op(filter: &FilterCondition, reason: &str) -> String {
    tracing::debug!(
        column = %filter.column,
        operator = %filter.operator,
        reason,
        "filter clause degraded to no-op"
    );
    NO_OP_CLAUSE.to_string()
}

/// String clauses compare case-insensitively: both sides are lower-cased.
fn build_string_condition(
    field: &str,
    filter: &FilterCondition,
    param: &str,
    parameters: &mut Parameters,
) -> String {
    match filter.operator.as_str() {
        OP_IS_EMPTY => return format!("({field} IS NULL OR {field} = '')"),
        OP_IS_NOT_EMPTY => return format!("({field} IS NOT NULL AND {field} != '')"),
        OP_IS_ONE_OF => return build_is_one_of_condition(field, filter, param, parameters, false),
        OP_IS_NOT_ONE_OF => {
            return build_is_one_of_condition(field, filter, param, parameters, true);
        }
        OP_CONTAINS_ONE_OF => {
            return build_contains_one_of_condition(field, filter, param, parameters);
        }
        _ => {}
    }

    let Some(value) = filter.value.as_ref().map(FilterValue::as_text) else {
        return no_op(filter, "missing value");
    };

    let (pattern, comparison) = match filter.operator.as_str() {
        OP_CONTAINS => (format!("%{}%", escape_like_wildcards(&value)), "LIKE"),
        OP_STARTS_WITH => (format!("{}%", escape_like_wildcards(&value)), "LIKE"),
        OP_ENDS_WITH => (format!("%{}", escape_like_wildcards(&value)), "LIKE"),
        OP_EQUALS => (value, "="),
        _ => return no_op(filter, "operator not supported for string column"),
    };

    parameters.insert(param.to_string(), BoundValue::Text(pattern));
    format!("LOWER({field}) {comparison} LOWER(:{param})")
}

/// `isOneOf` / `isNotOneOf`: one list parameter of trimmed, lower-cased segments.
fn build_is_one_of_condition(
    field: &str,
    filter: &FilterCondition,
    param: &str,
    parameters: &mut Parameters,
    negate: bool,
) -> String {
    let values: Vec<BoundValue> = split_multi_value(filter.value.as_ref())
        .into_iter()
        .map(|v| BoundValue::Text(v.to_lowercase()))
        .collect();

    if values.is_empty() {
        return no_op(filter, "empty value list");
    }

    parameters.insert(param.to_string(), BoundValue::List(values));
    let keyword = if negate { "NOT IN" } else { "IN" };
    format!("LOWER({field}) {keyword} (:{param})")
}

/// `containsOneOf`: an OR-group of `LIKE` clauses, one sub-parameter each.
fn build_contains_one_of_condition(
    field: &str,
    filter: &FilterCondition,
    param: &str,
    parameters: &mut Parameters,
) -> String {
    let segments = split_multi_value(filter.value.as_ref());
    if segments.is_empty() {
        return no_op(filter, "empty value list");
    }

    let clauses: Vec<String> = segments
        .iter()
        .enumerate()
        .map(|(k, segment)| {
            let sub_param = format!("{param}_{k}");
            parameters.insert(
                sub_param.clone(),
                BoundValue::Text(format!("%{}%", escape_like_wildcards(segment))),
            );
            format!("LOWER({field}) LIKE LOWER(:{sub_param})")
        })
        .collect();

    format!("({})", clauses.join(" OR "))
}

/// Number clauses bind the value directly. Symbol and word spellings are
/// both accepted.
fn build_number_condition(
    field: &str,
    filter: &FilterCondition,
    param: &str,
    parameters: &mut Parameters,
) -> String {
    let comparison = match filter.operator.as_str() {
        OP_EQUALS | "=" => "=",
        OP_NOT_EQUALS | "!=" => "!=",
        OP_GREATER_THAN | ">" => ">",
        OP_GREATER_THAN_OR_EQUAL | ">=" => ">=",
        OP_LESS_THAN | "<" => "<",
        OP_LESS_THAN_OR_EQUAL | "<=" => "<=",
        OP_IS_EMPTY => return format!("{field} IS NULL"),
        OP_IS_NOT_EMPTY => return format!("{field} IS NOT NULL"),
        OP_IS_ONE_OF | OP_IS_NOT_ONE_OF => {
            let values: Vec<BoundValue> = split_multi_value(filter.value.as_ref())
                .iter()
                .filter_map(|segment| parse_number(segment))
                .collect();
            if values.is_empty() {
                return no_op(filter, "empty value list");
            }
            parameters.insert(param.to_string(), BoundValue::List(values));
            let keyword = if filter.operator == OP_IS_NOT_ONE_OF {
                "NOT IN"
            } else {
                "IN"
            };
            return format!("{field} {keyword} (:{param})");
        }
        _ => return no_op(filter, "operator not supported for number column"),
    };

    let Some(value) = filter.value.as_ref() else {
        return no_op(filter, "missing value");
    };

    let Some(number) = value.as_number() else {
        return no_op(filter, "value is not a number");
    };

    parameters.insert(param.to_string(), number);
    format!("{field} {comparison} :{param}")
}

/// Date clauses compare the date-truncated column against a parsed date.
fn build_date_condition(
    field: &str,
    filter: &FilterCondition,
    param: &str,
    parameters: &mut Parameters,
) -> String {
    let comparison = match filter.operator.as_str() {
        OP_IS => "=",
        OP_IS_NOT => "!=",
        OP_IS_AFTER => ">",
        OP_IS_ON_OR_AFTER => ">=",
        OP_IS_BEFORE => "<",
        OP_IS_ON_OR_BEFORE => "<=",
        OP_IS_EMPTY => return format!("{field} IS NULL"),
        OP_IS_NOT_EMPTY => return format!("{field} IS NOT NULL"),
        _ => return no_op(filter, "operator not supported for date column"),
    };

    let Some(date) = filter.value.as_ref().and_then(parse_date) else {
        return no_op(filter, "unparseable date");
    };

    parameters.insert(param.to_string(), BoundValue::Date(date));
    format!("DATE({field}) {comparison} :{param}")
}

/// Boolean columns only support `is`.
fn build_boolean_condition(
    field: &str,
    filter: &FilterCondition,
    param: &str,
    parameters: &mut Parameters,
) -> String {
    if filter.operator != OP_IS {
        return no_op(filter, "operator not supported for boolean column");
    }

    let flag = match filter.value.as_ref() {
        Some(FilterValue::Boolean(b)) => Some(*b),
        Some(FilterValue::String(s)) => s.parse::<bool>().ok(),
        _ => None,
    };

    let Some(flag) = flag else {
        return no_op(filter, "value is not a boolean");
    };

    parameters.insert(param.to_string(), BoundValue::Boolean(flag));
    format!("{field} = :{param}")
}

/// Split a `;`-delimited value into trimmed, non-empty segments.
fn split_multi_value(value: Option<&FilterValue>) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };
    value
        .as_text()
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a date-only literal, falling back to a date-time truncated to its date.
fn parse_date(value: &FilterValue) -> Option<NaiveDate> {
    let FilterValue::String(raw) = value else {
        return None;
    };
    let raw = raw.trim();

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| raw.parse::<NaiveDateTime>().ok().map(|dt| dt.date()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

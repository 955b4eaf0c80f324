//! Request validation for listing queries.
//!
//! Validation is strict: every problem with the request shape is reported
//! with an exact, user-facing message and maps to a 400 response. Problems
//! with individual values that survive validation are handled fail-open by
//! the compiler instead.

use serde::Deserialize;

use super::catalog::EntityCatalog;
use super::types::{
    BOOLEAN_OPERATORS, ColumnType, DATE_OPERATORS, FilterCondition, LogicOperator,
    NUMBER_OPERATORS, OP_EQUALS, OP_GREATER_THAN, OP_GREATER_THAN_OR_EQUAL, OP_LESS_THAN,
    OP_LESS_THAN_OR_EQUAL, OP_NOT_EQUALS, PageRequest, STRING_OPERATORS,
};

/// Default page size when the request omits `limit`.
pub const DEFAULT_LIMIT: i64 = 10;

/// Upstream validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("Invalid operator '{operator}' for {column_type} column '{column}'. Valid operators: {}", .valid.join(", "))]
    OperatorNotValidForType {
        operator: String,
        column_type: ColumnType,
        column: String,
        valid: Vec<&'static str>,
    },

    #[error("Filter value is required for operator '{operator}' on column '{column}'")]
    MissingValue { operator: String, column: String },

    #[error("Invalid column '{column}' for {entity}. Valid columns: {}", .valid.join(", "))]
    UnknownColumn {
        column: String,
        entity: &'static str,
        valid: Vec<&'static str>,
    },

    #[error("Invalid operator '{operator}' for column '{column}'")]
    UnknownOperator { operator: String, column: String },

    #[error("Invalid value '{value}' for number column '{column}'")]
    InvalidNumber { value: String, column: String },

    #[error("Invalid logic operator '{0}'. Expected AND or OR")]
    InvalidLogicOperator(String),

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),
}

/// Reject an operator that is not part of `column_type`'s vocabulary.
///
/// `condition.operator` must already be in word form.
pub fn validate_operator_for_type(
    condition: &FilterCondition,
    column_type: ColumnType,
) -> Result<(), FilterError> {
    let valid = column_type.valid_operators();
    if valid.contains(&condition.operator.as_str()) {
        return Ok(());
    }

    let known = [
        STRING_OPERATORS,
        NUMBER_OPERATORS,
        DATE_OPERATORS,
        BOOLEAN_OPERATORS,
    ]
    .iter()
    .any(|vocab| vocab.contains(&condition.operator.as_str()));

    if !known {
        return Err(FilterError::UnknownOperator {
            operator: condition.operator.clone(),
            column: condition.column.clone(),
        });
    }

    Err(FilterError::OperatorNotValidForType {
        operator: condition.operator.clone(),
        column_type,
        column: condition.column.clone(),
        valid: valid.to_vec(),
    })
}

/// Reject a missing value for operators that need one.
pub fn validate_value_presence(condition: &FilterCondition) -> Result<(), FilterError> {
    if condition.requires_value() && condition.value.is_none() {
        return Err(FilterError::MissingValue {
            operator: condition.operator.clone(),
            column: condition.column.clone(),
        });
    }
    Ok(())
}

/// Reject a number comparison whose value is not numeric.
///
/// List operators skip unparseable segments instead, in the compiler.
pub fn validate_number_value(
    condition: &FilterCondition,
    column_type: ColumnType,
) -> Result<(), FilterError> {
    const COMPARISONS: &[&str] = &[
        OP_EQUALS,
        OP_NOT_EQUALS,
        OP_GREATER_THAN,
        OP_GREATER_THAN_OR_EQUAL,
        OP_LESS_THAN,
        OP_LESS_THAN_OR_EQUAL,
    ];

    if column_type != ColumnType::Number || !COMPARISONS.contains(&condition.operator.as_str()) {
        return Ok(());
    }
    match &condition.value {
        Some(value) if value.as_number().is_none() => Err(FilterError::InvalidNumber {
            value: value.as_text(),
            column: condition.column.clone(),
        }),
        _ => Ok(()),
    }
}

/// A listing request as decoded from the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default)]
    pub logic_operator: Option<String>,

    #[serde(default)]
    pub filters: Option<Vec<FilterCondition>>,

    #[serde(default)]
    pub include_deleted: bool,

    #[serde(default)]
    pub selected_ids: Option<Vec<i64>>,

    #[serde(default)]
    pub offset: Option<i64>,

    #[serde(default)]
    pub limit: Option<i64>,
}

/// A listing request that passed validation against one catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub logic_operator: LogicOperator,
    /// Conditions with operators normalized to word form.
    pub filters: Vec<FilterCondition>,
    pub include_deleted: bool,
    pub selected_ids: Option<Vec<i64>>,
    pub page: PageRequest,
}

impl PageQuery {
    /// Validate against `catalog`, normalizing operators once.
    pub fn validate(
        self,
        catalog: &EntityCatalog,
        max_page_size: u64,
    ) -> Result<ListingQuery, FilterError> {
        let logic_operator = match self.logic_operator.as_deref() {
            None => LogicOperator::default(),
            Some(raw) => raw
                .parse::<LogicOperator>()
                .map_err(|()| FilterError::InvalidLogicOperator(raw.to_string()))?,
        };

        let page = validate_page(self.offset, self.limit, max_page_size)?;

        let mut filters = Vec::new();
        for condition in self.filters.unwrap_or_default() {
            let condition = condition.normalized();

            if !catalog.has_column(&condition.column) {
                return Err(FilterError::UnknownColumn {
                    column: condition.column,
                    entity: catalog.entity,
                    valid: catalog.column_names(),
                });
            }

            let column_type = catalog.column_type(&condition.column);
            validate_operator_for_type(&condition, column_type)?;
            validate_value_presence(&condition)?;
            validate_number_value(&condition, column_type)?;
            filters.push(condition);
        }

        Ok(ListingQuery {
            logic_operator,
            filters,
            include_deleted: self.include_deleted,
            selected_ids: self.selected_ids,
            page,
        })
    }
}

fn validate_page(
    offset: Option<i64>,
    limit: Option<i64>,
    max_page_size: u64,
) -> Result<PageRequest, FilterError> {
    let offset = offset.unwrap_or(0);
    let limit = limit.unwrap_or(DEFAULT_LIMIT);

    let Ok(offset) = u64::try_from(offset) else {
        return Err(FilterError::InvalidPagination(format!(
            "offset must not be negative (got {offset})"
        )));
    };

    match u64::try_from(limit) {
        Ok(limit) if (1..=max_page_size).contains(&limit) => Ok(PageRequest::new(offset, limit)),
        _ => Err(FilterError::InvalidPagination(format!(
            "limit must be between 1 and {max_page_size} (got {limit})"
        ))),
    }
}

//! Filter engine module.
//!
//! This module provides:
//! - FilterQueryBuilder: compiles filter conditions into a SQL predicate
//! - EntityCatalog: per-entity column, type and tenant-scope declarations
//! - PaginatedQueryExecutor: runs the count and page queries for a listing
//! - PageQuery: listing request decoding and validation
//! - Types: FilterCondition, CompiledPredicate, Page, operator vocabularies

pub mod catalog;
pub mod entities;
mod executor;
mod query_builder;
pub mod types;
mod validation;

pub use catalog::{
    CatalogJoin, CatalogRegistry, ColumnDescription, Embed, EntityCatalog, JoinKind, TenantScope,
};
pub use executor::{PageStatementBuilder, PaginatedQueryExecutor};
pub use query_builder::{FilterQueryBuilder, NO_OP_CLAUSE};
pub use types::{
    BoundValue, ColumnType, CompiledPredicate, FilterCondition, FilterValue, ListingScope,
    LogicOperator, Page, PageRequest, normalize_operator,
};
pub use validation::{
    DEFAULT_LIMIT, FilterError, ListingQuery, PageQuery, validate_number_value,
    validate_operator_for_type, validate_value_presence,
};

//! Per-entity column catalogs.
//!
//! A catalog is static data: which public columns exist, how each resolves to
//! a physical SQL expression, which type class it belongs to, and how the
//! entity is scoped to a tenant. One generic engine serves every entity by
//! looking things up here.

use std::collections::HashMap;

use serde::Serialize;

use super::types::ColumnType;

/// How rows of an entity are restricted to one tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    /// `<alias>.<column> = :tenant`
    Column(&'static str),

    /// `(<alias>.<user_column> = :user AND (<alias>.<tenant_column> = :tenant OR
    /// <alias>.<tenant_column> IS NULL))`: the caller's own rows, in this
    /// tenant or shared across tenants. Listing needs a user id.
    UserWithinTenant {
        user_column: &'static str,
        tenant_column: &'static str,
    },

    /// `<alias>.<column> IN (SELECT <parent_key> FROM <parent_table> WHERE <tenant_column> = :tenant)`
    Parent {
        column: &'static str,
        parent_table: &'static str,
        parent_key: &'static str,
        tenant_column: &'static str,
    },

    /// `EXISTS (SELECT 1 FROM <table> WHERE <table>.<key> = <alias>.<primary key> AND <table>.<tenant_column> = :tenant)`
    Mapping {
        table: &'static str,
        key: &'static str,
        tenant_column: &'static str,
    },
}

/// SQL join kinds used by catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

/// A join required to evaluate field paths (used by count and page queries).
#[derive(Debug, Clone, Copy)]
pub struct CatalogJoin {
    pub kind: JoinKind,
    pub table: &'static str,
    pub alias: &'static str,
    /// Raw ON condition, written against catalog aliases.
    pub on: &'static str,
}

/// An eager association rendered as a nested JSON object in page rows.
#[derive(Debug, Clone, Copy)]
pub struct Embed {
    /// Key in the output row.
    pub name: &'static str,
    pub table: &'static str,
    pub alias: &'static str,
    pub on: &'static str,
    /// Column of the joined table that is NULL when no row matched.
    pub key: &'static str,
}

/// Static declaration of one listable entity.
#[derive(Debug, Clone, Copy)]
pub struct EntityCatalog {
    /// Entity key used in URLs (`lead`, `purchase_order`).
    pub entity: &'static str,
    pub table: &'static str,
    pub alias: &'static str,
    pub primary_key: &'static str,
    pub tenant_scope: TenantScope,
    /// Boolean column excluded unless deleted rows are requested.
    pub soft_delete: Option<&'static str>,
    /// Fixed predicates always ANDed into both queries.
    pub fixed_predicates: &'static [&'static str],
    /// Public column name to SQL expression.
    pub columns: &'static [(&'static str, &'static str)],
    pub date_columns: &'static [&'static str],
    pub boolean_columns: &'static [&'static str],
    pub number_columns: &'static [&'static str],
    pub joins: &'static [CatalogJoin],
    pub embeds: &'static [Embed],
}

/// Public description of a column, for filter UIs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescription {
    pub column: &'static str,
    pub column_type: ColumnType,
    pub operators: &'static [&'static str],
}

impl EntityCatalog {
    pub fn is_date_column(&self, column: &str) -> bool {
        self.date_columns.contains(&column)
    }

    pub fn is_boolean_column(&self, column: &str) -> bool {
        self.boolean_columns.contains(&column)
    }

    pub fn is_number_column(&self, column: &str) -> bool {
        self.number_columns.contains(&column)
    }

    /// Classify a column. Date wins over boolean over number; default is string.
    pub fn column_type(&self, column: &str) -> ColumnType {
        if self.is_date_column(column) {
            ColumnType::Date
        } else if self.is_boolean_column(column) {
            ColumnType::Boolean
        } else if self.is_number_column(column) {
            ColumnType::Number
        } else {
            ColumnType::String
        }
    }

    /// Whether listing this entity needs the acting user's id.
    pub fn requires_user(&self) -> bool {
        matches!(self.tenant_scope, TenantScope::UserWithinTenant { .. })
    }

    /// Whether the column is declared in this catalog.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|(name, _)| *name == column)
    }

    /// Resolve a public column to its SQL expression.
    ///
    /// Unknown columns fall back to `<alias>.<snake_case(column)>` so new
    /// physical columns work without a catalog change. Typos are only caught
    /// when the query runs; request validation rejects unknown columns before
    /// they get here.
    pub fn resolve_field_path(&self, column: &str) -> String {
        match self.columns.iter().find(|(name, _)| *name == column) {
            Some((_, path)) => (*path).to_string(),
            None => format!("{}.{}", self.alias, to_snake_case(column)),
        }
    }

    /// Qualified primary key (`l.lead_id`).
    pub fn qualified_primary_key(&self) -> String {
        format!("{}.{}", self.alias, self.primary_key)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|(name, _)| *name).collect()
    }

    pub fn describe_columns(&self) -> Vec<ColumnDescription> {
        self.columns
            .iter()
            .map(|(name, _)| {
                let column_type = self.column_type(name);
                ColumnDescription {
                    column: name,
                    column_type,
                    operators: column_type.valid_operators(),
                }
            })
            .collect()
    }

    /// Whether `alias` is already joined for filtering.
    pub fn joins_alias(&self, alias: &str) -> bool {
        alias == self.alias || self.joins.iter().any(|j| j.alias == alias)
    }
}

/// Convert a camelCase column name to a snake_case identifier.
///
/// Characters outside `[A-Za-z0-9_]` are dropped.
pub fn to_snake_case(column: &str) -> String {
    let mut out = String::with_capacity(column.len() + 4);
    for c in column.chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        }
    }
    out
}

/// Lookup table of every listable entity.
#[derive(Debug, Clone)]
pub struct CatalogRegistry {
    catalogs: HashMap<&'static str, &'static EntityCatalog>,
}

impl CatalogRegistry {
    pub fn new(catalogs: &[&'static EntityCatalog]) -> Self {
        Self {
            catalogs: catalogs.iter().map(|c| (c.entity, *c)).collect(),
        }
    }

    pub fn get(&self, entity: &str) -> Option<&'static EntityCatalog> {
        self.catalogs.get(entity).copied()
    }

    /// Entity keys, sorted.
    pub fn entities(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.catalogs.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for CatalogRegistry {
    fn default() -> Self {
        Self::new(super::entities::ALL)
    }
}

//! Paginated query execution.
//!
//! Combines a compiled filter predicate with the entity's mandatory
//! predicates (tenant scope, soft delete, fixed predicates, selected ids) and
//! runs one COUNT query and one page query. The user's filter group is always
//! ANDed in as a single parenthesized expression, so no filter can widen the
//! tenant scope.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use sea_query::{
    Alias, Asterisk, Expr, JoinType, Order, PostgresQueryBuilder, Query, SelectStatement,
    SimpleExpr, Value, Values,
};
use sqlx::postgres::PgArguments;
use sqlx::{Arguments, PgPool};

use super::catalog::{EntityCatalog, JoinKind, TenantScope};
use super::query_builder::FilterQueryBuilder;
use super::types::{
    BoundValue, CompiledPredicate, ListingScope, Page, Segment, split_placeholders,
};
use super::validation::ListingQuery;

/// Builds the count and page statements for one listing request.
pub struct PageStatementBuilder<'a> {
    catalog: &'a EntityCatalog,
    tenant_id: i64,
    user_id: Option<i64>,
    listing: &'a ListingQuery,
    predicate: CompiledPredicate,
    /// Compiled predicate with `$n` placeholders, plus its values.
    filter_sql: Option<(String, Vec<Value>)>,
}

impl<'a> PageStatementBuilder<'a> {
    /// Compile the listing's filters and prepare both statements.
    ///
    /// Fails when the entity is user-scoped and `scope` names no user.
    pub fn new(
        catalog: &'a EntityCatalog,
        scope: ListingScope,
        listing: &'a ListingQuery,
    ) -> Result<Self> {
        if catalog.requires_user() && scope.user_id.is_none() {
            bail!("{} listings require a user id", catalog.entity);
        }

        let predicate =
            FilterQueryBuilder::new(catalog).compile(&listing.filters, listing.logic_operator);

        let filter_sql = if predicate.has_conditions() {
            Some(positional_placeholders(&predicate)?)
        } else {
            None
        };

        Ok(Self {
            catalog,
            tenant_id: scope.tenant_id,
            user_id: scope.user_id,
            listing,
            predicate,
            filter_sql,
        })
    }

    pub fn predicate(&self) -> &CompiledPredicate {
        &self.predicate
    }

    /// `SELECT COUNT(DISTINCT <pk>)` over the filter joins only.
    pub fn count_statement(&self) -> SelectStatement {
        let mut query = Query::select();
        query.expr(Expr::cust(format!(
            "COUNT(DISTINCT {})",
            self.catalog.qualified_primary_key()
        )));
        query.from_as(
            Alias::new(self.catalog.table),
            Alias::new(self.catalog.alias),
        );
        self.add_joins(&mut query);
        self.add_conditions(&mut query);
        query
    }

    /// Page query: base row plus embedded associations, newest first, with
    /// offset/limit, wrapped so each row comes back as one JSON object.
    pub fn page_statement(&self) -> SelectStatement {
        let catalog = self.catalog;
        let alias = Alias::new(catalog.alias);
        let primary_key = Alias::new(catalog.primary_key);

        let mut inner = Query::select();
        inner.column((alias.clone(), Asterisk));

        for embed in catalog.embeds {
            inner.expr_as(
                Expr::cust(format!(
                    "CASE WHEN {a}.{key} IS NULL THEN NULL ELSE row_to_json({a}) END",
                    a = embed.alias,
                    key = embed.key
                )),
                Alias::new(embed.name),
            );
        }

        inner.from_as(Alias::new(catalog.table), alias.clone());
        self.add_joins(&mut inner);

        for embed in catalog.embeds {
            if catalog.joins_alias(embed.alias) {
                continue;
            }
            inner.join_as(
                JoinType::LeftJoin,
                Alias::new(embed.table),
                Alias::new(embed.alias),
                Expr::cust(embed.on),
            );
        }

        self.add_conditions(&mut inner);

        // Filter joins may fan out; keep one row per primary key.
        if !catalog.joins.is_empty() {
            inner.distinct_on([(alias.clone(), primary_key.clone())]);
        }

        inner
            .order_by((alias, primary_key), Order::Desc)
            .limit(self.listing.page.limit)
            .offset(self.listing.page.offset);

        let row = Alias::new("t");
        let mut outer = Query::select();
        outer
            .expr(Expr::cust("row_to_json(t)"))
            .from_subquery(inner, row.clone())
            .order_by((row, Alias::new(catalog.primary_key)), Order::Desc);
        outer
    }

    pub fn build_count(&self) -> (String, Values) {
        self.count_statement().build(PostgresQueryBuilder)
    }

    pub fn build_page(&self) -> (String, Values) {
        self.page_statement().build(PostgresQueryBuilder)
    }

    fn add_joins(&self, query: &mut SelectStatement) {
        for join in self.catalog.joins {
            let join_type = match join.kind {
                JoinKind::Inner => JoinType::InnerJoin,
                JoinKind::Left => JoinType::LeftJoin,
            };
            query.join_as(
                join_type,
                Alias::new(join.table),
                Alias::new(join.alias),
                Expr::cust(join.on),
            );
        }
    }

    /// Mandatory predicates first, then the user's filter group.
    fn add_conditions(&self, query: &mut SelectStatement) {
        let catalog = self.catalog;
        let alias = catalog.alias;

        query.and_where(self.tenant_condition());

        if let Some(column) = catalog.soft_delete
            && !self.listing.include_deleted
        {
            query.and_where(Expr::col((Alias::new(alias), Alias::new(column))).eq(false));
        }

        for predicate in catalog.fixed_predicates {
            query.and_where(Expr::cust(format!("({predicate})")));
        }

        if let Some(ids) = &self.listing.selected_ids
            && !ids.is_empty()
        {
            query.and_where(
                Expr::col((Alias::new(alias), Alias::new(catalog.primary_key)))
                    .is_in(ids.iter().copied()),
            );
        }

        if let Some((sql, values)) = &self.filter_sql {
            query.and_where(Expr::cust_with_values(format!("({sql})"), values.clone()));
        }
    }

    fn tenant_condition(&self) -> SimpleExpr {
        let alias = self.catalog.alias;
        let tenant = self.tenant_id;

        match self.catalog.tenant_scope {
            TenantScope::Column(column) => {
                Expr::col((Alias::new(alias), Alias::new(column))).eq(tenant)
            }
            TenantScope::UserWithinTenant {
                user_column,
                tenant_column,
            } => Expr::cust_with_values(
                format!(
                    "({alias}.{user_column} = $1 AND \
                     ({alias}.{tenant_column} = $2 OR {alias}.{tenant_column} IS NULL))"
                ),
                // `new` requires a user; NULL would match nothing.
                [Value::from(self.user_id), Value::from(tenant)],
            ),
            TenantScope::Parent {
                column,
                parent_table,
                parent_key,
                tenant_column,
            } => Expr::cust_with_values(
                format!(
                    "{alias}.{column} IN (SELECT {parent_key} FROM {parent_table} \
                     WHERE {tenant_column} = $1)"
                ),
                [tenant],
            ),
            TenantScope::Mapping {
                table,
                key,
                tenant_column,
            } => Expr::cust_with_values(
                format!(
                    "EXISTS (SELECT 1 FROM {table} WHERE {table}.{key} = {alias}.{pk} \
                     AND {table}.{tenant_column} = $1)",
                    pk = self.catalog.primary_key
                ),
                [tenant],
            ),
        }
    }
}

/// Rewrite `:name` placeholders to positional `$n`, expanding list values to
/// one placeholder per element.
///
/// Quoted literals and `::` casts are left untouched.
fn positional_placeholders(predicate: &CompiledPredicate) -> Result<(String, Vec<Value>)> {
    let mut sql = String::with_capacity(predicate.expression.len());
    let mut values = Vec::with_capacity(predicate.parameters.len());

    for segment in split_placeholders(&predicate.expression) {
        match segment {
            Segment::Sql(text) => sql.push_str(text),
            Segment::Placeholder(name) => {
                let value = predicate
                    .parameters
                    .get(name)
                    .with_context(|| format!("placeholder ':{name}' has no bound value"))?;
                push_value(value, &mut sql, &mut values);
            }
        }
    }

    Ok((sql, values))
}

fn push_value(value: &BoundValue, sql: &mut String, values: &mut Vec<Value>) {
    let single = match value {
        BoundValue::List(items) => {
            for (k, item) in items.iter().enumerate() {
                if k > 0 {
                    sql.push_str(", ");
                }
                push_value(item, sql, values);
            }
            return;
        }
        BoundValue::Text(s) => Value::from(s.clone()),
        BoundValue::Integer(i) => Value::from(*i),
        BoundValue::Float(f) => Value::from(*f),
        BoundValue::Boolean(b) => Value::from(*b),
        BoundValue::Date(d) => Value::from(*d),
    };
    values.push(single);
    sql.push_str(&format!("${}", values.len()));
}

/// Bind sea-query values into sqlx arguments.
fn bind_values(values: &Values) -> Result<PgArguments> {
    let mut args = PgArguments::default();
    for value in &values.0 {
        match value {
            Value::Bool(v) => args.add(*v),
            Value::Int(v) => args.add(*v),
            Value::BigInt(v) => args.add(*v),
            Value::Double(v) => args.add(*v),
            // LIMIT and OFFSET
            Value::BigUnsigned(v) => {
                let v = v
                    .map(i64::try_from)
                    .transpose()
                    .context("query parameter exceeds the BIGINT range")?;
                args.add(v)
            }
            Value::String(v) => args.add(v.as_deref().cloned()),
            Value::ChronoDate(v) => args.add(v.as_deref().copied()),
            other => bail!("unsupported query parameter type: {other:?}"),
        }
        .map_err(|e| anyhow!("failed to bind query parameter: {e}"))?;
    }
    Ok(args)
}

/// Runs listing queries against PostgreSQL.
#[derive(Clone)]
pub struct PaginatedQueryExecutor {
    pool: PgPool,
    statement_timeout: Duration,
}

impl PaginatedQueryExecutor {
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    /// Return one page of `catalog` rows visible to `scope`.
    ///
    /// Runs exactly two queries (count, then page) inside one read
    /// transaction with a statement timeout. Failures are returned as-is;
    /// nothing is retried here.
    pub async fn find_page(
        &self,
        catalog: &EntityCatalog,
        scope: ListingScope,
        listing: &ListingQuery,
    ) -> Result<Page> {
        let builder = PageStatementBuilder::new(catalog, scope, listing)?;
        let (count_sql, count_values) = builder.build_count();
        let (page_sql, page_values) = builder.build_page();

        tracing::debug!(
            entity = catalog.entity,
            tenant_id = scope.tenant_id,
            user_id = scope.user_id,
            clauses = listing.filters.len(),
            include_deleted = listing.include_deleted,
            "executing listing queries"
        );

        // SET LOCAL only lasts until the transaction ends.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;

        sqlx::query(&format!(
            "SET LOCAL statement_timeout = '{}ms'",
            self.statement_timeout.as_millis()
        ))
        .execute(&mut *tx)
        .await
        .context("failed to set statement timeout")?;

        let total: i64 = sqlx::query_scalar_with(&count_sql, bind_values(&count_values)?)
            .fetch_one(&mut *tx)
            .await
            .context("failed to execute count query")?;

        let rows: Vec<serde_json::Value> =
            sqlx::query_scalar_with(&page_sql, bind_values(&page_values)?)
                .fetch_all(&mut *tx)
                .await
                .context("failed to execute page query")?;

        tx.commit()
            .await
            .context("failed to commit listing transaction")?;

        let total = u64::try_from(total).unwrap_or_default();
        tracing::debug!(
            entity = catalog.entity,
            tenant_id = scope.tenant_id,
            total,
            returned = rows.len(),
            "listing query complete"
        );

        Ok(Page::new(rows, total, listing.page))
    }
}

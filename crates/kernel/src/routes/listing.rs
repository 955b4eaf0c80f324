//! Entity listing API routes.
//!
//! REST endpoints for paginated, filtered entity listings.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;

use crate::context::{RequestContext, USER_HEADER};
use crate::error::{AppError, AppResult};
use crate::filter::{ColumnDescription, EntityCatalog, Page, PageQuery};
use crate::state::AppState;

/// Create the listing router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/entities", get(list_entities))
        .route("/api/{entity}/columns", get(describe_columns))
        .route("/api/{entity}/page", post(find_page))
}

#[derive(Serialize)]
struct EntitiesResponse {
    entities: Vec<&'static str>,
}

#[derive(Serialize)]
struct ColumnsResponse {
    entity: &'static str,
    columns: Vec<ColumnDescription>,
}

fn lookup(state: &AppState, entity: &str) -> AppResult<&'static EntityCatalog> {
    state
        .catalogs()
        .get(entity)
        .ok_or_else(|| AppError::NotFound(format!("unknown entity '{entity}'")))
}

/// List the entity keys that support listing.
async fn list_entities(State(state): State<AppState>) -> Json<EntitiesResponse> {
    Json(EntitiesResponse {
        entities: state.catalogs().entities(),
    })
}

/// Describe the filterable columns of an entity.
async fn describe_columns(
    State(state): State<AppState>,
    Path(entity): Path<String>,
) -> AppResult<Json<ColumnsResponse>> {
    let catalog = lookup(&state, &entity)?;
    Ok(Json(ColumnsResponse {
        entity: catalog.entity,
        columns: catalog.describe_columns(),
    }))
}

/// Return one filtered page of an entity for the caller's tenant.
///
/// User-scoped entities also need the acting user's id.
async fn find_page(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    context: RequestContext,
    body: Result<Json<PageQuery>, JsonRejection>,
) -> AppResult<Json<Page>> {
    let catalog = lookup(&state, &entity)?;
    if catalog.requires_user() && context.user_id.is_none() {
        return Err(AppError::Unauthorized(format!(
            "{USER_HEADER} header is required for {} listings",
            catalog.entity
        )));
    }
    let Json(query) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let listing = query
        .validate(catalog, state.max_page_size())
        .inspect_err(|e| {
            tracing::debug!(entity = catalog.entity, error = %e, "rejected listing request");
        })?;

    let page = state
        .executor()
        .find_page(catalog, context.scope(), &listing)
        .await?;

    Ok(Json(page))
}

//! JSON API over interior records.

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::AppError;
use crate::forms;
use crate::importer::FileOutcome;
use crate::middleware::request_id::RequestId;

/// Query parameters for listing interiors.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListInteriorsParams {
    /// Case-insensitive substring of the name.
    pub q: Option<String>,
}

/// Interior response.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct InteriorResponse {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub created_at: String,
}

impl InteriorResponse {
    fn from_model(interior: &interiors_db::models::Interior, ctx: &AppContext) -> Self {
        Self {
            id: interior.id.get(),
            name: interior.name.clone(),
            image_url: interior
                .image_path
                .as_deref()
                .filter(|p| !p.is_empty())
                .map(|p| ctx.storage.url(p)),
            width: interior.width,
            height: interior.height,
            created_at: interior.created_at.clone(),
        }
    }
}

/// Outcome of an import request.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ImportResponse {
    /// Number of records created.
    pub created: usize,
    /// Ids of the created records, in file order.
    pub ids: Vec<i64>,
    /// One message per failed file, in file order.
    pub errors: Vec<String>,
}

/// GET /api/interiors
#[utoipa::path(
    get,
    path = "/api/interiors",
    params(ListInteriorsParams),
    responses(
        (status = 200, description = "List interiors ordered by id", body = Vec<InteriorResponse>)
    )
)]
pub async fn list_interiors(
    State(ctx): State<AppContext>,
    Query(params): Query<ListInteriorsParams>,
) -> Result<Json<Vec<InteriorResponse>>, AppError> {
    let conn = interiors_db::pool::get_conn(&ctx.db)?;
    let interiors = interiors_db::queries::interiors::list_interiors(&conn, params.q.as_deref())?;

    let responses = interiors
        .iter()
        .map(|i| InteriorResponse::from_model(i, &ctx))
        .collect();
    Ok(Json(responses))
}

/// GET /api/interiors/{id}
#[utoipa::path(
    get,
    path = "/api/interiors/{id}",
    params(("id" = i64, Path, description = "Interior ID")),
    responses(
        (status = 200, description = "Interior details", body = InteriorResponse),
        (status = 400, description = "Malformed ID"),
        (status = 404, description = "Interior not found")
    )
)]
pub async fn get_interior(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<InteriorResponse>, AppError> {
    let lookup = || -> interiors_core::Result<InteriorResponse> {
        let interior_id: interiors_core::InteriorId = id
            .parse()
            .map_err(|_| interiors_core::Error::Validation("Invalid interior ID".into()))?;

        let conn = interiors_db::pool::get_conn(&ctx.db)?;
        let interior = interiors_db::queries::interiors::get_interior(&conn, interior_id)?
            .ok_or_else(|| interiors_core::Error::not_found("interior", interior_id))?;

        Ok(InteriorResponse::from_model(&interior, &ctx))
    };

    lookup()
        .map(Json)
        .map_err(|e| AppError::new(e).with_request_id(request_id.0))
}

/// POST /api/interiors/import
///
/// Same validation and import rules as the admin upload form, reported as
/// JSON instead of flash messages.
#[utoipa::path(
    post,
    path = "/api/interiors/import",
    request_body(content_type = "multipart/form-data", description = "One or more files in the `images` field"),
    responses(
        (status = 200, description = "Import finished", body = ImportResponse),
        (status = 400, description = "Form rejected")
    )
)]
pub async fn import_interiors(
    State(ctx): State<AppContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let batch = match forms::parse_bulk_upload(multipart).await {
        Ok(batch) => batch,
        Err(errors) => {
            let body = serde_json::json!({
                "error": errors.messages.join(" "),
                "code": "validation_error",
                "fields": { "images": errors.messages },
            });
            return Ok((errors.status, Json(body)).into_response());
        }
    };

    let importer = ctx.importer();
    let result = tokio::task::spawn_blocking(move || importer.import(&batch))
        .await
        .map_err(|e| interiors_core::Error::Internal(format!("Import task failed: {e}")))?;

    let ids = result
        .outcomes
        .iter()
        .filter_map(|o| match o {
            FileOutcome::Created { id, .. } => Some(id.get()),
            FileOutcome::Failed { .. } => None,
        })
        .collect();

    Ok((
        StatusCode::OK,
        Json(ImportResponse {
            created: result.success_count(),
            ids,
            errors: result.errors().into_iter().map(String::from).collect(),
        }),
    )
        .into_response())
}

//! Admin pages: interiors changelist and bulk image upload.

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Extension;
use serde::Deserialize;

use crate::context::AppContext;
use crate::error::AppError;
use crate::forms;
use crate::messages;
use crate::middleware::session::Session;
use crate::session::resolve_view_mode;
use crate::templates::{self, ChangelistView, CHANGELIST_PATH};

/// Query parameters accepted by the changelist.
#[derive(Debug, Default, Deserialize)]
pub struct ChangelistQuery {
    /// Switch to and remember this view mode.
    pub view: Option<String>,
    /// Search term matched against names.
    pub q: Option<String>,
}

/// GET / and GET /admin/
pub async fn index() -> Redirect {
    Redirect::to(CHANGELIST_PATH)
}

/// GET /admin/interiors/
pub async fn changelist(
    State(ctx): State<AppContext>,
    Extension(session): Extension<Session>,
    Query(query): Query<ChangelistQuery>,
) -> Result<Html<String>, AppError> {
    let view_mode = resolve_view_mode(ctx.sessions.as_ref(), session.key(), query.view.as_deref())?;

    let conn = interiors_db::pool::get_conn(&ctx.db)?;
    let interiors = interiors_db::queries::interiors::list_interiors(&conn, query.q.as_deref())?;
    let pending = messages::drain(ctx.sessions.as_ref(), session.key())?;

    let html = templates::changelist_page(&ChangelistView {
        interiors: &interiors,
        storage: &ctx.storage,
        view_mode: &view_mode,
        search: query.q.as_deref(),
        messages: &pending,
    })?;
    Ok(Html(html))
}

/// GET /admin/interiors/bulk-upload/
pub async fn bulk_upload_form() -> Result<Html<String>, AppError> {
    Ok(Html(templates::bulk_upload_page(&[])?))
}

/// POST /admin/interiors/bulk-upload/
///
/// An invalid form is re-rendered with its errors. A valid one is imported
/// file by file, the outcome is queued as flash messages, and the browser is
/// redirected to the changelist.
pub async fn bulk_upload_submit(
    State(ctx): State<AppContext>,
    Extension(session): Extension<Session>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let batch = match forms::parse_bulk_upload(multipart).await {
        Ok(batch) => batch,
        Err(errors) => {
            tracing::debug!(errors = ?errors.messages, "Bulk upload form rejected");
            let html = templates::bulk_upload_page(&errors.messages)?;
            return Ok((errors.status, Html(html)).into_response());
        }
    };

    let importer = ctx.importer();
    let result = tokio::task::spawn_blocking(move || importer.import(&batch))
        .await
        .map_err(|e| interiors_core::Error::Internal(format!("Import task failed: {e}")))?;

    messages::push(ctx.sessions.as_ref(), session.key(), result.notifications())?;

    Ok(Redirect::to(CHANGELIST_PATH).into_response())
}

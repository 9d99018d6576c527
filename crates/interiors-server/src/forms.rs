//! Bulk upload form parsing and validation.
//!
//! The form has a single multi-file field, `images`. The field must be
//! present; a browser that had nothing selected still sends one empty part
//! for it, which counts as present but carries no file.

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::http::StatusCode;

use crate::importer::{UploadBatch, UploadedFile};

/// Name of the multi-file field.
pub const IMAGES_FIELD: &str = "images";

pub const REQUIRED: &str = "This field is required.";
pub const EMPTY_FILE: &str = "The submitted file is empty.";
pub const NO_FILE: &str = "No file was submitted. Check the encoding type on the form.";

/// Why a submitted form was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormErrors {
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl FormErrors {
    fn single(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            messages: vec![message.into()],
        }
    }
}

/// One part of the `images` field, before validation.
#[derive(Debug, Clone)]
pub struct ImagePart {
    /// `None` when the part is a plain value rather than a file.
    pub filename: Option<String>,
    pub data: bytes::Bytes,
}

/// Read the multipart body and validate the `images` field.
pub async fn parse_bulk_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadBatch, FormErrors> {
    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!("Bulk upload without multipart body: {rejection}");
        FormErrors::single(StatusCode::BAD_REQUEST, NO_FILE)
    })?;

    let mut parts = Vec::new();
    let mut field_present = false;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(FormErrors::single(e.status(), e.body_text())),
        };

        if field.name() != Some(IMAGES_FIELD) {
            continue;
        }
        field_present = true;

        let filename = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| FormErrors::single(e.status(), e.body_text()))?;
        parts.push(ImagePart { filename, data });
    }

    if !field_present {
        return Err(FormErrors::single(StatusCode::BAD_REQUEST, REQUIRED));
    }

    validate_images(parts)
}

/// Validate collected `images` parts into an upload batch.
pub fn validate_images(parts: Vec<ImagePart>) -> Result<UploadBatch, FormErrors> {
    let mut files = Vec::new();
    let mut messages = Vec::new();

    for part in parts {
        match part.filename {
            None => push_unique(&mut messages, NO_FILE),
            // Nothing selected in the browser.
            Some(name) if name.is_empty() && part.data.is_empty() => {}
            Some(name) if name.is_empty() => push_unique(&mut messages, NO_FILE),
            Some(_) if part.data.is_empty() => push_unique(&mut messages, EMPTY_FILE),
            Some(name) => files.push(UploadedFile::new(name, part.data)),
        }
    }

    if messages.is_empty() {
        Ok(UploadBatch::new(files))
    } else {
        Err(FormErrors {
            status: StatusCode::BAD_REQUEST,
            messages,
        })
    }
}

fn push_unique(messages: &mut Vec<String>, message: &str) {
    if !messages.iter().any(|m| m == message) {
        messages.push(message.to_string());
    }
}

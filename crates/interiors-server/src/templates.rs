//! Tera templates for the admin pages.
//!
//! Both pages extend `admin/base.html`, which renders the flash messages.
//! Templates are compiled into the binary and parsed once on first use;
//! Tera autoescapes every value except the preview markup built by
//! [`image_preview`].

use std::sync::LazyLock;

use html_escape::encode_double_quoted_attribute;
use interiors_core::{Error, Result};
use interiors_db::models::Interior;
use serde::Serialize;
use tera::{Context, Tera};

use crate::messages::FlashMessage;
use crate::storage::ImageStorage;

pub const CHANGELIST_PATH: &str = "/admin/interiors/";
pub const BULK_UPLOAD_PATH: &str = "/admin/interiors/bulk-upload/";

const BASE_TEMPLATE: &str = "admin/base.html";
const CHANGELIST_TEMPLATE: &str = "admin/interiors/change_list.html";
const BULK_UPLOAD_TEMPLATE: &str = "admin/interiors/bulk_upload.html";

static TEMPLATES: LazyLock<std::result::Result<Tera, String>> = LazyLock::new(load_templates);

fn load_templates() -> std::result::Result<Tera, String> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        (BASE_TEMPLATE, include_str!("../templates/admin/base.html")),
        (
            CHANGELIST_TEMPLATE,
            include_str!("../templates/admin/interiors/change_list.html"),
        ),
        (
            BULK_UPLOAD_TEMPLATE,
            include_str!("../templates/admin/interiors/bulk_upload.html"),
        ),
    ])
    .map_err(|e| format!("{e:?}"))?;
    Ok(tera)
}

fn render<T: Serialize>(template: &str, context: &T) -> Result<String> {
    let tera = TEMPLATES
        .as_ref()
        .map_err(|e| Error::Internal(format!("Failed to load templates: {e}")))?;
    let context = Context::from_serialize(context)
        .map_err(|e| Error::Internal(format!("Failed to build context for {template}: {e}")))?;
    tera.render(template, &context)
        .map_err(|e| Error::Internal(format!("Failed to render {template}: {e:?}")))
}

/// Inline preview of a record's image, or `No Image`.
pub fn image_preview(interior: &Interior, storage: &ImageStorage) -> String {
    match interior.image_path.as_deref() {
        Some(path) if !path.is_empty() => format!(
            "<img src=\"{}\" style=\"max-width: 100px; max-height: 100px; border-radius:5px;\" />",
            encode_double_quoted_attribute(&storage.url(path))
        ),
        _ => "No Image".to_string(),
    }
}

/// Everything the changelist page shows.
pub struct ChangelistView<'a> {
    pub interiors: &'a [Interior],
    pub storage: &'a ImageStorage,
    pub view_mode: &'a str,
    pub search: Option<&'a str>,
    pub messages: &'a [FlashMessage],
}

#[derive(Serialize)]
struct InteriorRow<'a> {
    id: i64,
    name: &'a str,
    preview: String,
}

#[derive(Serialize)]
struct ChangelistContext<'a> {
    interiors: Vec<InteriorRow<'a>>,
    view_mode: &'a str,
    search: &'a str,
    messages: &'a [FlashMessage],
    bulk_upload_path: &'static str,
}

#[derive(Serialize)]
struct BulkUploadContext<'a> {
    errors: &'a [String],
    messages: &'a [FlashMessage],
    changelist_path: &'static str,
    bulk_upload_path: &'static str,
}

/// Render the interiors changelist in list or grid mode.
///
/// Any view mode other than `grid` renders the table.
pub fn changelist_page(view: &ChangelistView<'_>) -> Result<String> {
    let interiors = view
        .interiors
        .iter()
        .map(|interior| InteriorRow {
            id: interior.id.get(),
            name: &interior.name,
            preview: image_preview(interior, view.storage),
        })
        .collect();

    render(
        CHANGELIST_TEMPLATE,
        &ChangelistContext {
            interiors,
            view_mode: view.view_mode,
            search: view.search.unwrap_or_default(),
            messages: view.messages,
            bulk_upload_path: BULK_UPLOAD_PATH,
        },
    )
}

/// Render the bulk upload form, with validation errors when present.
pub fn bulk_upload_page(errors: &[String]) -> Result<String> {
    render(
        BULK_UPLOAD_TEMPLATE,
        &BulkUploadContext {
            errors,
            messages: &[],
            changelist_path: CHANGELIST_PATH,
            bulk_upload_path: BULK_UPLOAD_PATH,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use interiors_core::InteriorId;
    use std::path::PathBuf;

    fn interior(id: i64, name: &str, path: Option<&str>) -> Interior {
        Interior {
            id: InteriorId::from(id),
            name: name.into(),
            image_path: path.map(String::from),
            width: None,
            height: None,
            created_at: "2024-01-01T00:00:00Z".into(),
        }
    }

    fn storage() -> ImageStorage {
        ImageStorage::new(PathBuf::from("/srv/media"), "/media")
    }

    #[test]
    fn preview_with_image() {
        let html = image_preview(&interior(1, "Sofa", Some("interiors/a_sofa.png")), &storage());
        assert_eq!(
            html,
            "<img src=\"/media/interiors/a_sofa.png\" style=\"max-width: 100px; max-height: 100px; border-radius:5px;\" />"
        );
    }

    #[test]
    fn preview_without_image() {
        assert_eq!(image_preview(&interior(1, "Sofa", None), &storage()), "No Image");
        assert_eq!(image_preview(&interior(1, "Sofa", Some("")), &storage()), "No Image");
    }

    #[test]
    fn preview_escapes_url() {
        let html = image_preview(&interior(1, "x", Some("interiors/\"onload=x.png")), &storage());
        assert!(!html.contains("\"onload"));
    }

    #[test]
    fn templates_parse() {
        assert!(TEMPLATES.is_ok(), "{:?}", TEMPLATES.as_ref().err());
    }

    #[test]
    fn list_mode_renders_table() {
        let rows = vec![interior(7, "<b>Loft</b>", Some("interiors/l.png"))];
        let html = changelist_page(&ChangelistView {
            interiors: &rows,
            storage: &storage(),
            view_mode: "list",
            search: None,
            messages: &[],
        })
        .unwrap();
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>7</td><td>&lt;b&gt;Loft&lt;&#x2F;b&gt;</td>"));
        assert!(html.contains("<img src=\"/media/interiors/l.png\""));
        assert!(html.contains("<p>1 interiors</p>"));
        assert!(html.contains("href=\"/admin/interiors/bulk-upload/\""));
        assert!(!html.contains("class=\"grid\""));
        assert!(!html.contains("class=\"messagelist\""));
    }

    #[test]
    fn grid_mode_renders_cards() {
        let rows = vec![interior(1, "Loft", Some("interiors/l.png"))];
        let html = changelist_page(&ChangelistView {
            interiors: &rows,
            storage: &storage(),
            view_mode: "grid",
            search: Some("lo"),
            messages: &[
                FlashMessage::success("Successfully created 1 interiors."),
                FlashMessage::error("Error creating interior 'Den': bad"),
            ],
        })
        .unwrap();
        assert!(html.contains("class=\"grid\""));
        assert!(!html.contains("<table>"));
        assert!(html.contains("value=\"lo\""));
        assert!(html.contains("<li class=\"success\">Successfully created 1 interiors.</li>"));
        assert!(html.contains(
            "<li class=\"error\">Error creating interior &#x27;Den&#x27;: bad</li>"
        ));
        assert!(html.contains("<div class=\"card\"><img src=\"/media/interiors/l.png\""));
    }

    #[test]
    fn search_value_is_escaped() {
        let html = changelist_page(&ChangelistView {
            interiors: &[],
            storage: &storage(),
            view_mode: "list",
            search: Some("\"><script>"),
            messages: &[],
        })
        .unwrap();
        assert!(html.contains("value=\"&quot;&gt;&lt;script&gt;\""));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn unknown_view_mode_falls_back_to_table() {
        let html = changelist_page(&ChangelistView {
            interiors: &[],
            storage: &storage(),
            view_mode: "mosaic",
            search: None,
            messages: &[],
        })
        .unwrap();
        assert!(html.contains("<table>"));
    }

    #[test]
    fn upload_page_lists_errors() {
        let html = bulk_upload_page(&["This field is required.".to_string()]).unwrap();
        assert!(html.contains("<title>Bulk Upload Images | Interiors admin</title>"));
        assert!(html.contains("action=\"/admin/interiors/bulk-upload/\""));
        assert!(html.contains("enctype=\"multipart/form-data\""));
        assert!(html.contains("name=\"images\""));
        assert!(html.contains("<li>This field is required.</li>"));
    }

    #[test]
    fn empty_upload_page_has_no_error_list() {
        let html = bulk_upload_page(&[]).unwrap();
        assert!(!html.contains("class=\"errorlist\""));
        assert!(html.contains("href=\"/admin/interiors/\""));
    }
}

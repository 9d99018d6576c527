//! Bulk image import.
//!
//! Each uploaded file becomes one interior record named after its filename.
//! Files are processed in order; a failing file is recorded and the batch
//! continues. Records created before a failure are kept.

use std::sync::Arc;

use bytes::Bytes;
use interiors_core::naming::{base_filename, display_name_from_filename};
use interiors_core::{Error, InteriorId, Result};
use interiors_db::pool::{get_conn, DbPool};
use interiors_db::queries::interiors;

use crate::messages::FlashMessage;
use crate::storage::ImageStorage;

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Filename as sent by the client.
    pub filename: String,
    pub data: Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// Files submitted in one request, in submission order.
#[derive(Debug, Clone, Default)]
pub struct UploadBatch {
    pub files: Vec<UploadedFile>,
}

impl UploadBatch {
    pub fn new(files: Vec<UploadedFile>) -> Self {
        Self { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Created { id: InteriorId, name: String },
    Failed { message: String },
}

/// Per-file outcomes of a batch, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub outcomes: Vec<FileOutcome>,
}

impl ImportResult {
    /// Number of records created.
    pub fn success_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Created { .. }))
            .count()
    }

    /// Error messages, one per failed file.
    pub fn errors(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                FileOutcome::Failed { message } => Some(message.as_str()),
                FileOutcome::Created { .. } => None,
            })
            .collect()
    }

    /// Notifications for the user: an aggregate success line when anything
    /// was created, then one error line per failure.
    pub fn notifications(&self) -> Vec<FlashMessage> {
        let mut out = Vec::new();
        let created = self.success_count();
        if created > 0 {
            out.push(FlashMessage::success(format!(
                "Successfully created {created} interiors."
            )));
        }
        out.extend(self.errors().into_iter().map(FlashMessage::error));
        out
    }
}

/// Creates interior records from uploaded files.
#[derive(Clone)]
pub struct BulkImporter {
    storage: Arc<ImageStorage>,
    db: DbPool,
}

impl BulkImporter {
    pub fn new(storage: Arc<ImageStorage>, db: DbPool) -> Self {
        Self { storage, db }
    }

    /// Import every file of the batch, in order.
    ///
    /// Blocking: performs filesystem and database writes.
    pub fn import(&self, batch: &UploadBatch) -> ImportResult {
        let outcomes: Vec<FileOutcome> = batch.files.iter().map(|f| self.import_one(f)).collect();
        let result = ImportResult { outcomes };

        tracing::info!(
            files = batch.len(),
            created = result.success_count(),
            failed = result.errors().len(),
            "Bulk import finished"
        );

        result
    }

    fn import_one(&self, file: &UploadedFile) -> FileOutcome {
        let name = display_name_from_filename(&file.filename);

        match self.create_record(&name, file) {
            Ok(id) => {
                tracing::debug!(%id, name = %name, "Created interior");
                FileOutcome::Created { id, name }
            }
            Err(e) => {
                // Empty names are reported by base filename.
                let label = if name.is_empty() {
                    base_filename(&file.filename).to_string()
                } else {
                    name
                };
                let message = format!("Error creating interior '{label}': {}", failure_detail(&e));
                tracing::warn!(filename = %file.filename, "{message}");
                FileOutcome::Failed { message }
            }
        }
    }

    fn create_record(&self, name: &str, file: &UploadedFile) -> Result<InteriorId> {
        if name.is_empty() {
            return Err(Error::Validation("display name is empty".into()));
        }

        let stored = self.storage.store(&file.filename, &file.data)?;

        let inserted = get_conn(&self.db).and_then(|conn| {
            interiors::create_interior(
                &conn,
                name,
                Some(&stored.path),
                Some(i64::from(stored.width)),
                Some(i64::from(stored.height)),
            )
        });

        match inserted {
            Ok(interior) => Ok(interior.id),
            Err(e) => {
                if stored.created {
                    if let Err(cleanup) = self.storage.delete(&stored.path) {
                        tracing::warn!("Failed to remove orphaned upload: {cleanup}");
                    }
                }
                Err(e)
            }
        }
    }
}

/// The part of an error worth showing to an admin user.
fn failure_detail(e: &Error) -> String {
    match e {
        Error::Validation(msg) => msg.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::png_bytes;
    use crate::storage::INVALID_IMAGE;
    use interiors_db::pool::init_memory_pool;

    fn importer() -> (BulkImporter, DbPool, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(ImageStorage::new(dir.path().to_path_buf(), "/media"));
        let db = init_memory_pool().unwrap();
        (BulkImporter::new(storage, db.clone()), db, dir)
    }

    fn count(db: &DbPool) -> i64 {
        interiors::count_interiors(&get_conn(db).unwrap()).unwrap()
    }

    #[test]
    fn all_files_succeed() {
        let (importer, db, _dir) = importer();
        let batch = UploadBatch::new(vec![
            UploadedFile::new("modern_living-room.jpg", png_bytes(2, 2)),
            UploadedFile::new("SOFA.png", png_bytes(3, 3)),
            UploadedFile::new("attic", png_bytes(4, 4)),
        ]);

        let result = importer.import(&batch);
        assert_eq!(result.success_count(), 3);
        assert!(result.errors().is_empty());
        assert_eq!(count(&db), 3);

        let conn = get_conn(&db).unwrap();
        let names: Vec<String> = interiors::list_interiors(&conn, None)
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Modern Living Room", "Sofa", "Attic"]);
    }

    #[test]
    fn one_failure_does_not_stop_the_batch() {
        let (importer, db, _dir) = importer();
        let batch = UploadBatch::new(vec![
            UploadedFile::new("kitchen.png", png_bytes(2, 2)),
            UploadedFile::new("broken_bath.jpg", &b"not an image"[..]),
            UploadedFile::new("hall.png", png_bytes(2, 2)),
        ]);

        let result = importer.import(&batch);
        assert_eq!(result.success_count(), 2);
        assert_eq!(
            result.errors(),
            vec![format!("Error creating interior 'Broken Bath': {INVALID_IMAGE}")]
        );
        assert_eq!(count(&db), 2);
        assert!(matches!(result.outcomes[1], FileOutcome::Failed { .. }));
    }

    #[test]
    fn empty_name_uses_filename_in_message() {
        let (importer, db, _dir) = importer();
        let batch = UploadBatch::new(vec![
            UploadedFile::new("porch.png", png_bytes(2, 2)),
            UploadedFile::new(".png", png_bytes(2, 2)),
        ]);

        let result = importer.import(&batch);
        assert_eq!(result.success_count(), 1);
        assert_eq!(
            result.errors(),
            vec!["Error creating interior '.png': display name is empty"]
        );
        assert_eq!(count(&db), 1);
    }

    #[test]
    fn empty_batch() {
        let (importer, db, _dir) = importer();
        let result = importer.import(&UploadBatch::default());
        assert_eq!(result.success_count(), 0);
        assert!(result.notifications().is_empty());
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn notifications_success_then_errors() {
        let result = ImportResult {
            outcomes: vec![
                FileOutcome::Failed {
                    message: "first".into(),
                },
                FileOutcome::Created {
                    id: InteriorId::from(1),
                    name: "A".into(),
                },
                FileOutcome::Failed {
                    message: "second".into(),
                },
            ],
        };

        let notes = result.notifications();
        assert_eq!(notes.len(), 3);
        assert_eq!(notes[0], FlashMessage::success("Successfully created 1 interiors."));
        assert_eq!(notes[1], FlashMessage::error("first"));
        assert_eq!(notes[2], FlashMessage::error("second"));
    }

    #[test]
    fn database_failure_removes_written_file() {
        let (importer, db, dir) = importer();
        get_conn(&db)
            .unwrap()
            .execute_batch("DROP TABLE interiors")
            .unwrap();

        let result = importer.import(&UploadBatch::new(vec![UploadedFile::new(
            "den.png",
            png_bytes(2, 2),
        )]));

        assert_eq!(result.success_count(), 0);
        let errors = result.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Error creating interior 'Den': Database error"));

        let upload_dir = dir.path().join("interiors");
        let leftover = std::fs::read_dir(&upload_dir).unwrap().count();
        assert_eq!(leftover, 0);
    }
}

use mime::Mime;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::backend::{
    collections, DocumentStore, FieldUpdate, ObjectStorage, StorageError, StoreError,
};
use crate::clock::Clock;
use crate::workflows::validation::ValidationErrors;

pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub request_id: String,
    pub key: String,
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Uploads tenant photos and receipts and links them to a ticket.
pub struct AttachmentService {
    documents: Arc<dyn DocumentStore>,
    storage: Arc<dyn ObjectStorage>,
    clock: Arc<dyn Clock>,
}

impl AttachmentService {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        storage: Arc<dyn ObjectStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            documents,
            storage,
            clock,
        }
    }

    pub fn attach_photo(
        &self,
        request_id: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<Attachment, AttachmentError> {
        let mime = validate_upload(bytes, content_type)?;

        if self
            .documents
            .get(collections::MAINTENANCE_REQUESTS, request_id)?
            .is_none()
        {
            return Err(StoreError::not_found(collections::MAINTENANCE_REQUESTS, request_id).into());
        }

        let key = format!(
            "maintenance/{request_id}/{}.{}",
            self.clock.now().timestamp_millis(),
            extension_for(&mime)
        );
        let stored = self.storage.upload(&key, bytes, mime.essence_str())?;
        let url = self.storage.download_url(&stored.key)?;

        self.documents.update(
            collections::MAINTENANCE_REQUESTS,
            request_id,
            &[FieldUpdate::array_union("photoUrls", url.clone())],
        )?;

        info!(request_id, key = %stored.key, size = stored.size, "attached maintenance photo");

        Ok(Attachment {
            request_id: request_id.to_string(),
            key: stored.key,
            url,
            content_type: stored.content_type,
            size: stored.size,
        })
    }
}

fn validate_upload(bytes: &[u8], content_type: &str) -> Result<Mime, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if bytes.is_empty() {
        errors.push("file", "is empty");
    } else if bytes.len() > MAX_ATTACHMENT_BYTES {
        errors.push("file", "exceeds the 10 MiB upload limit");
    }

    let mime = match content_type.trim().parse::<Mime>() {
        Ok(mime) if is_accepted(&mime) => Some(mime),
        Ok(_) => {
            errors.push("content_type", "must be an image or a PDF");
            None
        }
        Err(_) => {
            errors.push("content_type", "is not a valid media type");
            None
        }
    };

    errors.into_result()?;
    mime.ok_or_else(|| ValidationErrors::single("content_type", "is required"))
}

fn is_accepted(mime: &Mime) -> bool {
    mime.type_() == mime::IMAGE || mime.essence_str() == mime::APPLICATION_PDF.essence_str()
}

fn extension_for(mime: &Mime) -> &'static str {
    if mime.subtype() == mime::JPEG {
        return "jpg";
    }
    mime_guess::get_mime_extensions(mime)
        .and_then(|extensions| extensions.first().copied())
        .unwrap_or("bin")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{InMemoryDocumentStore, InMemoryObjectStorage};
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn service() -> (AttachmentService, InMemoryDocumentStore, InMemoryObjectStorage) {
        let documents = InMemoryDocumentStore::new();
        documents
            .set(
                collections::MAINTENANCE_REQUESTS,
                "r-1",
                json!({ "title": "Leaky faucet", "status": "submitted" }),
            )
            .expect("seed request");
        let storage = InMemoryObjectStorage::new("https://files.test");
        let clock = FixedClock(
            Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
        );
        let service = AttachmentService::new(
            Arc::new(documents.clone()),
            Arc::new(storage.clone()),
            Arc::new(clock),
        );
        (service, documents, storage)
    }

    #[test]
    fn uploads_and_links_photo() {
        let (service, documents, storage) = service();

        let attachment = service
            .attach_photo("r-1", b"\x89PNG fake", "image/png")
            .expect("attach succeeds");

        assert_eq!(attachment.key, "maintenance/r-1/1759320000000.png");
        assert!(storage.object(&attachment.key).is_some());

        let request = documents
            .get(collections::MAINTENANCE_REQUESTS, "r-1")
            .expect("read")
            .expect("request exists");
        assert_eq!(request.data["photoUrls"], json!([attachment.url]));
    }

    #[test]
    fn jpeg_uploads_use_jpg_extension() {
        let (service, _, _) = service();
        let attachment = service
            .attach_photo("r-1", b"jpeg bytes", "image/jpeg")
            .expect("attach succeeds");
        assert!(attachment.key.ends_with(".jpg"));
    }

    #[test]
    fn rejects_unsupported_content_and_empty_files() {
        let (service, documents, _) = service();

        let error = service
            .attach_photo("r-1", b"", "text/plain")
            .expect_err("invalid upload");
        match error {
            AttachmentError::Validation(errors) => {
                assert!(errors.for_field("file").is_some());
                assert!(errors.for_field("content_type").is_some());
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let request = documents
            .get(collections::MAINTENANCE_REQUESTS, "r-1")
            .expect("read")
            .expect("request exists");
        assert!(request.data.get("photoUrls").is_none());
    }

    #[test]
    fn unknown_request_is_not_found_and_uploads_nothing() {
        let (service, _, storage) = service();
        let error = service
            .attach_photo("missing", b"%PDF-1.7", "application/pdf")
            .expect_err("missing request");
        assert!(matches!(
            error,
            AttachmentError::Store(StoreError::NotFound { .. })
        ));
        assert!(storage
            .object("maintenance/missing/1759320000000.pdf")
            .is_none());
    }
}

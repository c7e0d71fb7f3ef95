use persistence::blob::order_file_path;
use persistence::store::Store;
use uuid::Uuid;

use domain::error::DomainError;
use domain::models::{AttachmentUpload, FileCategory, OrderFile};

use crate::middleware::metrics::record_file_uploaded;

/// Order-file uploads and the general file pool. Every write is a blob
/// plus a metadata row; failures compensate so the two never diverge
/// silently.
pub struct FileService {
    store: Store,
}

impl FileService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Stores the blob first, then the metadata row. If the row insert
    /// fails the blob is deleted again so no unreferenced file remains.
    pub async fn upload(
        &self,
        order_id: Option<Uuid>,
        category: FileCategory,
        uploaded_by: Uuid,
        upload: AttachmentUpload,
    ) -> Result<OrderFile, DomainError> {
        if upload.file_name.trim().is_empty() {
            return Err(DomainError::validation("File name is required"));
        }
        if let Some(order_id) = order_id {
            if self.store.orders.find(order_id).await?.is_none() {
                return Err(DomainError::not_found(format!("Order {order_id} not found")));
            }
        }

        let path = order_file_path(order_id, &upload.file_name);
        self.store.blobs.store(&path, &upload.bytes).await?;

        let file_type = upload.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(&upload.file_name)
                .first_or_octet_stream()
                .to_string()
        });

        let inserted = self
            .store
            .order_files
            .insert(
                order_id,
                &upload.file_name,
                &path,
                upload.bytes.len() as i64,
                &file_type,
                category,
                uploaded_by,
            )
            .await;

        match inserted {
            Ok(file) => {
                record_file_uploaded(category.as_str());
                Ok(file)
            }
            Err(e) => {
                if let Err(cleanup) = self.store.blobs.delete(&path).await {
                    tracing::warn!(path = %path, error = %cleanup, "Orphan blob left after metadata failure");
                }
                Err(e)
            }
        }
    }

    pub async fn list_for_order(&self, order_id: Uuid) -> Result<Vec<OrderFile>, DomainError> {
        if self.store.orders.find(order_id).await?.is_none() {
            return Err(DomainError::not_found(format!("Order {order_id} not found")));
        }
        self.store.order_files.list_for_order(order_id).await
    }

    pub async fn list_general(&self) -> Result<Vec<OrderFile>, DomainError> {
        self.store.order_files.list_general().await
    }

    pub async fn download(&self, id: Uuid) -> Result<(OrderFile, Vec<u8>), DomainError> {
        let file = self
            .store
            .order_files
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("File {id} not found")))?;
        let bytes = self.store.blobs.retrieve(&file.file_path).await?;
        Ok((file, bytes))
    }

    /// Removes the blob first. If the blob refuses to go the row stays
    /// so the file remains reachable; if the row removal then fails the
    /// dangling metadata is logged before the error propagates.
    pub async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let file = self
            .store
            .order_files
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("File {id} not found")))?;

        self.store.blobs.delete(&file.file_path).await?;

        if let Err(e) = self.store.order_files.delete(id).await {
            tracing::error!(
                file_id = %id,
                path = %file.file_path,
                error = %e,
                "File blob removed but metadata row remained"
            );
            return Err(e);
        }
        Ok(())
    }
}

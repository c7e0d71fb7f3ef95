//! Order file entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{FileCategory, OrderFile};

/// Database row mapping for the order_files table.
#[derive(Debug, Clone, FromRow)]
pub struct OrderFileEntity {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub file_type: String,
    pub category: String,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl OrderFileEntity {
    /// Convert to domain model.
    pub fn into_domain(self) -> OrderFile {
        let category = self
            .category
            .parse::<FileCategory>()
            .unwrap_or(FileCategory::Cliente);

        OrderFile {
            id: self.id,
            order_id: self.order_id,
            file_name: self.file_name,
            file_path: self.file_path,
            file_size: self.file_size,
            file_type: self.file_type,
            category,
            uploaded_by: self.uploaded_by,
            created_at: self.created_at,
        }
    }
}

impl From<OrderFileEntity> for OrderFile {
    fn from(entity: OrderFileEntity) -> Self {
        entity.into_domain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_category_defaults_to_cliente() {
        let entity = OrderFileEntity {
            id: Uuid::new_v4(),
            order_id: None,
            file_name: "arte.pdf".to_string(),
            file_path: "files/general/abc-arte.pdf".to_string(),
            file_size: 1024,
            file_type: "application/pdf".to_string(),
            category: "secret".to_string(),
            uploaded_by: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        assert_eq!(entity.into_domain().category, FileCategory::Cliente);
    }
}

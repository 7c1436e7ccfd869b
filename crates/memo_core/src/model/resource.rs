//! Attachment (`resource`) records.

use crate::access::{RowView, UserId};
use crate::model::common::{generate_uid, is_valid_uid, require_non_empty, ModelValidationError};
use crate::model::memo::MemoId;
use serde::{Deserialize, Serialize};

pub type ResourceId = i64;

/// Where the resource bytes live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageType {
    /// Bytes stored inline in `resource.blob`.
    #[default]
    Database,
    /// Path on the host file system in `resource.reference`.
    Local,
    /// External URL in `resource.reference`.
    External,
}

impl StorageType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Database => "DATABASE",
            Self::Local => "LOCAL",
            Self::External => "EXTERNAL",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DATABASE" => Some(Self::Database),
            "LOCAL" => Some(Self::Local),
            "EXTERNAL" => Some(Self::External),
            _ => None,
        }
    }
}

/// Persisted `resource` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub uid: String,
    pub creator_id: UserId,
    pub created_ts: i64,
    pub updated_ts: i64,
    pub filename: String,
    #[serde(skip)]
    pub blob: Option<Vec<u8>>,
    /// MIME type.
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: i64,
    pub memo_id: Option<MemoId>,
    pub storage_type: StorageType,
    pub reference: String,
}

impl Resource {
    pub fn row_view(&self) -> RowView {
        RowView::Resource {
            creator_id: self.creator_id,
        }
    }
}

/// Partial update for one attachment. `creator_id` is not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePatch {
    pub filename: Option<String>,
    /// `Some(None)` detaches the resource from its memo.
    pub memo_id: Option<Option<MemoId>>,
    pub reference: Option<String>,
}

impl ResourcePatch {
    pub fn apply_to(&self, resource: &Resource) -> Resource {
        let mut next = resource.clone();
        if let Some(filename) = &self.filename {
            next.filename = filename.clone();
        }
        if let Some(memo_id) = self.memo_id {
            next.memo_id = memo_id;
        }
        if let Some(reference) = &self.reference {
            next.reference = reference.clone();
        }
        next
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if let Some(filename) = &self.filename {
            require_non_empty(filename, "resource.filename")?;
        }
        Ok(())
    }
}

/// Creation input for one attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResource {
    pub uid: String,
    pub creator_id: UserId,
    pub filename: String,
    pub blob: Option<Vec<u8>>,
    pub mime_type: String,
    pub size: i64,
    pub memo_id: Option<MemoId>,
    pub storage_type: StorageType,
    pub reference: String,
}

impl NewResource {
    /// Inline database-stored attachment.
    pub fn inline(
        creator_id: UserId,
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        blob: Vec<u8>,
    ) -> Self {
        let size = i64::try_from(blob.len()).unwrap_or(i64::MAX);
        Self {
            uid: generate_uid(),
            creator_id,
            filename: filename.into(),
            blob: Some(blob),
            mime_type: mime_type.into(),
            size,
            memo_id: None,
            storage_type: StorageType::Database,
            reference: String::new(),
        }
    }

    pub fn attached_to(mut self, memo_id: MemoId) -> Self {
        self.memo_id = Some(memo_id);
        self
    }

    pub fn row_view(&self) -> RowView {
        RowView::Resource {
            creator_id: self.creator_id,
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if !is_valid_uid(&self.uid) {
            return Err(ModelValidationError::InvalidUid(self.uid.clone()));
        }
        require_non_empty(&self.filename, "resource.filename")?;
        if self.size < 0 {
            return Err(ModelValidationError::NegativeSize(self.size));
        }
        if self.storage_type != StorageType::Database {
            require_non_empty(&self.reference, "resource.reference")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{NewResource, StorageType};
    use crate::model::common::ModelValidationError;

    #[test]
    fn inline_resource_records_blob_size() {
        let resource = NewResource::inline(3, "a.txt", "text/plain", b"hello".to_vec());
        assert_eq!(resource.size, 5);
        assert_eq!(resource.storage_type, StorageType::Database);
        assert!(resource.validate().is_ok());
    }

    #[test]
    fn external_resource_requires_reference() {
        let mut resource = NewResource::inline(3, "a.png", "image/png", Vec::new());
        resource.storage_type = StorageType::External;
        resource.blob = None;
        assert_eq!(
            resource.validate(),
            Err(ModelValidationError::EmptyField("resource.reference"))
        );
    }
}

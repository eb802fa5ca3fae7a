use chrono::{DateTime, Utc};

use crate::ids::{EventId, ImageSourceId, ObjectId};

/// Audit event raised by the server for admin review.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdminEvent {
    pub id: EventId,
    #[cfg_attr(feature = "serde", serde(default))]
    pub object_id: Option<ObjectId>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_resolved: bool,
}

/// Text fields of the create/update record form.
///
/// The optional image file travels separately as a multipart part.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectForm {
    pub text_content: String,
    pub image_path: String,
    pub image_key: String,
    pub image_source_id: Option<ImageSourceId>,
    pub image_file_sha512: Option<String>,
}

impl ObjectForm {
    /// Form fields in submission order, skipping unset optionals.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("text_content", self.text_content.clone()),
            ("image_path", self.image_path.clone()),
            ("image_key", self.image_key.clone()),
        ];
        if let Some(source) = self.image_source_id {
            fields.push(("image_source_id", source.to_string()));
        }
        if let Some(hash) = &self.image_file_sha512 {
            fields.push(("image_file_sha512", hash.clone()));
        }
        fields
    }
}

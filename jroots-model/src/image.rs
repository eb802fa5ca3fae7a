use crate::error::ModelError;
use crate::ids::{ImageId, ImageSourceId};

/// Provenance collection an image belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageSource {
    pub id: ImageSourceId,
    pub source_name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
}

/// Scanned image metadata as returned alongside search records.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Image {
    pub id: ImageId,
    pub image_path: String,
    pub image_key: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub source: Option<ImageSource>,
    pub sha512_hash: String,
}

/// Opaque, server-issued version tag used for conditional retrieval.
///
/// Stored exactly as received in the `ETag` header (quotes and an optional
/// `W/` prefix included) so it can be echoed verbatim in `If-None-Match`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityTag(String);

impl EntityTag {
    /// Accepts any non-empty visible-ASCII header value.
    pub fn new(raw: impl Into<String>) -> Result<Self, ModelError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || !trimmed.bytes().all(|b| b.is_ascii_graphic() || b == b' ')
        {
            return Err(ModelError::InvalidEntityTag(raw));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_weak(&self) -> bool {
        self.0.starts_with("W/")
    }
}

impl std::fmt::Display for EntityTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for EntityTag {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_tag_is_kept_verbatim() {
        let tag = EntityTag::new("\"abc\"").unwrap();
        assert_eq!(tag.as_str(), "\"abc\"");
        assert!(!tag.is_weak());

        let weak: EntityTag = "W/\"v2\"".parse().unwrap();
        assert!(weak.is_weak());
        assert_eq!(weak.to_string(), "W/\"v2\"");
    }

    #[test]
    fn entity_tag_rejects_empty_and_control_bytes() {
        assert!(EntityTag::new("   ").is_err());
        assert!(EntityTag::new("\"a\nb\"").is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn image_without_source_deserializes() {
        let json = r#"{
            "id": 3,
            "image_path": "fond/1/page-12.png",
            "image_key": "F1-12",
            "sha512_hash": "deadbeef"
        }"#;
        let image: Image = serde_json::from_str(json).unwrap();
        assert_eq!(image.id.get(), 3);
        assert!(image.source.is_none());
    }
}

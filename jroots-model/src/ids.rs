//! Strongly typed numeric identifiers used by the archive API.
//!
//! The server issues positive integer keys for every resource; zero is never
//! a valid id, so constructors reject it.

use crate::error::ModelError;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(try_from = "u64", into = "u64"))]
        pub struct $name(u64);

        impl $name {
            pub fn new(value: u64) -> Result<Self, ModelError> {
                if value == 0 {
                    return Err(ModelError::InvalidId($kind));
                }
                Ok(Self(value))
            }

            pub fn get(&self) -> u64 {
                self.0
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }

        impl TryFrom<u64> for $name {
            type Error = ModelError;

            fn try_from(value: u64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ModelError::InvalidId($kind))?;
                Self::new(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Server-side image resource id (`/api/images/{id}`).
    ImageId,
    "image"
);
numeric_id!(
    /// Searchable archive record id.
    ObjectId,
    "object"
);
numeric_id!(
    /// Provenance collection an image was scanned from.
    ImageSourceId,
    "image source"
);
numeric_id!(
    /// Admin audit event id.
    EventId,
    "event"
);

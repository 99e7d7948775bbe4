//! Error types for grocery_catalog

use std::fmt;
use thiserror::Error;

/// Kind of catalog record an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Store,
    Product,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Store => write!(f, "Store"),
            Entity::Product => write!(f, "Product"),
        }
    }
}

/// Unified error type for catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Referenced store or product does not exist
    #[error("{entity} not found: {key}")]
    NotFound { entity: Entity, key: String },

    /// A create would break a uniqueness rule
    #[error("{entity} already exists: {key}")]
    DuplicateKey { entity: Entity, key: String },

    /// A value breaks a domain constraint (e.g. non-positive price)
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// Price comparison was handed no products
    #[error("Price comparison needs at least one product")]
    EmptyInput,

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Reading a seed file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a JSON document
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn not_found(entity: Entity, key: impl fmt::Display) -> Self {
        CatalogError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn duplicate(entity: Entity, key: impl fmt::Display) -> Self {
        CatalogError::DuplicateKey {
            entity,
            key: key.to_string(),
        }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        CatalogError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, CatalogError::DuplicateKey { .. })
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, CatalogError::InvalidValue { .. })
    }
}

/// Result alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

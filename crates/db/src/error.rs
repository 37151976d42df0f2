//! Error types for provisioning and a classifier for store-level
//! constraint rejections.
//!
//! Repositories return `sqlx::Error` unchanged. [`StoreViolation::classify`]
//! inspects such an error without consuming it, so callers can decide what
//! a rejected write means for them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Schema drift detected: {}", .0.join("; "))]
    Drift(Vec<String>),
}

/// PostgreSQL SQLSTATE codes for the constraint classes the schema relies on.
mod sqlstate {
    pub const UNIQUE_VIOLATION: &str = "23505";
    pub const FOREIGN_KEY_VIOLATION: &str = "23503";
    pub const NOT_NULL_VIOLATION: &str = "23502";
    pub const INVALID_TEXT_REPRESENTATION: &str = "22P02";
    pub const STRING_DATA_RIGHT_TRUNCATION: &str = "22001";
}

/// A write rejected by one of the schema's constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreViolation {
    /// Duplicate value under a unique constraint (e.g. `uq_users_email`).
    Unique { constraint: String },
    /// Reference to a parent row that does not exist.
    ForeignKey { constraint: String },
    /// Required column left empty.
    NotNull { column: String },
    /// Text that does not parse as the target type. Covers any text-to-type
    /// conversion, including a `chat_role` other than `user` or `assistant`
    /// and a malformed integer literal.
    InvalidTextRepresentation,
    /// String longer than its `VARCHAR(n)` column.
    StringTooLong,
}

impl StoreViolation {
    /// Classify a store error, or `None` if it is not a constraint rejection.
    pub fn classify(err: &sqlx::Error) -> Option<Self> {
        let sqlx::Error::Database(db_err) = err else {
            return None;
        };
        let code = db_err.code()?;
        let constraint = || db_err.constraint().unwrap_or("unknown").to_string();

        match &*code {
            sqlstate::UNIQUE_VIOLATION => Some(Self::Unique {
                constraint: constraint(),
            }),
            sqlstate::FOREIGN_KEY_VIOLATION => Some(Self::ForeignKey {
                constraint: constraint(),
            }),
            sqlstate::NOT_NULL_VIOLATION => {
                let column = db_err
                    .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                    .and_then(|pg| pg.column())
                    .unwrap_or("unknown")
                    .to_string();
                Some(Self::NotNull { column })
            }
            sqlstate::INVALID_TEXT_REPRESENTATION => Some(Self::InvalidTextRepresentation),
            sqlstate::STRING_DATA_RIGHT_TRUNCATION => Some(Self::StringTooLong),
            _ => None,
        }
    }

    pub fn is_unique(&self) -> bool {
        matches!(self, Self::Unique { .. })
    }

    pub fn is_foreign_key(&self) -> bool {
        matches!(self, Self::ForeignKey { .. })
    }
}

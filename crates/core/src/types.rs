/// All primary keys are PostgreSQL SERIAL (32-bit).
pub type DbId = i32;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

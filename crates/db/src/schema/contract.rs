//! The declared column/index/constraint contract and a catalog check
//! against it.

use sqlx::PgPool;

use crate::error::SchemaError;

/// Expected shape of one column, in `information_schema` terms.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    /// Postgres `udt_name` (`int4`, `varchar`, `text`, `timestamptz`, ...).
    pub udt: &'static str,
    pub max_len: Option<i32>,
    pub nullable: bool,
    /// Substring the column default must contain, if a default is declared.
    pub default_contains: Option<&'static str>,
}

#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
}

#[derive(Debug, Clone, Copy)]
pub struct IndexSpec {
    pub name: &'static str,
    pub table: &'static str,
    pub column: &'static str,
}

/// A cascading foreign key from `table.column` to `references(id)`.
#[derive(Debug, Clone, Copy)]
pub struct ForeignKeySpec {
    pub table: &'static str,
    pub column: &'static str,
    pub references: &'static str,
}

const fn col(
    name: &'static str,
    udt: &'static str,
    max_len: Option<i32>,
    nullable: bool,
    default_contains: Option<&'static str>,
) -> ColumnSpec {
    ColumnSpec {
        name,
        udt,
        max_len,
        nullable,
        default_contains,
    }
}

pub const TABLES: &[TableSpec] = &[
    TableSpec {
        name: "users",
        columns: &[
            col("id", "int4", None, false, Some("nextval")),
            col("username", "varchar", Some(50), false, None),
            col("email", "varchar", Some(100), false, None),
            col("password_hash", "varchar", Some(255), false, None),
            col("created_at", "timestamptz", None, false, Some("now()")),
        ],
    },
    TableSpec {
        name: "chat_titles",
        columns: &[
            col("id", "int4", None, false, Some("nextval")),
            col("user_id", "int4", None, false, None),
            col("title", "varchar", Some(100), false, Some("New Chat")),
            col("last_location", "varchar", Some(100), true, None),
            col("created_at", "timestamptz", None, false, Some("now()")),
            col("updated_at", "timestamptz", None, false, Some("now()")),
        ],
    },
    TableSpec {
        name: "chats",
        columns: &[
            col("id", "int4", None, false, Some("nextval")),
            col("user_id", "int4", None, false, None),
            col("chat_id", "int4", None, false, None),
            col("message", "text", None, false, None),
            col("role", "chat_role", None, false, None),
            col("created_at", "timestamptz", None, false, Some("now()")),
        ],
    },
    TableSpec {
        name: "password_reset_tokens",
        columns: &[
            col("id", "int4", None, false, Some("nextval")),
            col("user_id", "int4", None, false, None),
            col("token", "varchar", Some(255), false, None),
            col("expires_at", "timestamptz", None, false, None),
            col("used", "bool", None, false, Some("false")),
            col("created_at", "timestamptz", None, false, Some("now()")),
        ],
    },
];

pub const INDEXES: &[IndexSpec] = &[
    IndexSpec {
        name: "idx_chats_chat_id",
        table: "chats",
        column: "chat_id",
    },
    IndexSpec {
        name: "idx_chats_user_id",
        table: "chats",
        column: "user_id",
    },
    IndexSpec {
        name: "idx_chat_titles_user_id",
        table: "chat_titles",
        column: "user_id",
    },
];

pub const FOREIGN_KEYS: &[ForeignKeySpec] = &[
    ForeignKeySpec {
        table: "chat_titles",
        column: "user_id",
        references: "users",
    },
    ForeignKeySpec {
        table: "chats",
        column: "user_id",
        references: "users",
    },
    ForeignKeySpec {
        table: "chats",
        column: "chat_id",
        references: "chat_titles",
    },
    ForeignKeySpec {
        table: "password_reset_tokens",
        column: "user_id",
        references: "users",
    },
];

pub const UNIQUE_CONSTRAINTS: &[(&str, &str)] = &[
    ("users", "uq_users_username"),
    ("users", "uq_users_email"),
];

pub const CHAT_ROLE_LABELS: &[&str] = &["user", "assistant"];

/// One row of `information_schema.columns`, cast to plain SQL types.
#[derive(Debug, sqlx::FromRow)]
struct LiveColumn {
    column_name: String,
    udt_name: String,
    max_len: Option<i32>,
    is_nullable: String,
    column_default: Option<String>,
}

/// Compare the live catalog against the declared contract.
///
/// Returns [`SchemaError::Drift`] listing every mismatch found, or the
/// underlying store error if the catalog could not be read.
pub async fn verify(pool: &PgPool) -> Result<(), SchemaError> {
    let mut problems = Vec::new();

    for table in TABLES {
        check_table(pool, table, &mut problems).await?;
    }
    check_indexes(pool, &mut problems).await?;
    check_foreign_keys(pool, &mut problems).await?;
    check_unique_constraints(pool, &mut problems).await?;
    check_chat_role(pool, &mut problems).await?;
    check_updated_at_trigger(pool, &mut problems).await?;

    if problems.is_empty() {
        tracing::info!("Schema matches the declared contract");
        Ok(())
    } else {
        tracing::warn!(count = problems.len(), "Schema drift detected");
        Err(SchemaError::Drift(problems))
    }
}

async fn check_table(
    pool: &PgPool,
    table: &TableSpec,
    problems: &mut Vec<String>,
) -> Result<(), sqlx::Error> {
    let live: Vec<LiveColumn> = sqlx::query_as(
        "SELECT column_name::text AS column_name,
                udt_name::text AS udt_name,
                character_maximum_length::int4 AS max_len,
                is_nullable::text AS is_nullable,
                column_default::text AS column_default
         FROM information_schema.columns
         WHERE table_schema = current_schema()
           AND table_name = $1
         ORDER BY ordinal_position",
    )
    .bind(table.name)
    .fetch_all(pool)
    .await?;

    if live.is_empty() {
        problems.push(format!("table {} is missing", table.name));
        return Ok(());
    }

    for spec in table.columns {
        let Some(column) = live.iter().find(|c| c.column_name == spec.name) else {
            problems.push(format!("column {}.{} is missing", table.name, spec.name));
            continue;
        };

        if column.udt_name != spec.udt {
            problems.push(format!(
                "column {}.{} has type {}, expected {}",
                table.name, spec.name, column.udt_name, spec.udt
            ));
        }
        if column.max_len != spec.max_len {
            problems.push(format!(
                "column {}.{} has length {:?}, expected {:?}",
                table.name, spec.name, column.max_len, spec.max_len
            ));
        }
        let nullable = column.is_nullable == "YES";
        if nullable != spec.nullable {
            problems.push(format!(
                "column {}.{} nullable = {nullable}, expected {}",
                table.name, spec.name, spec.nullable
            ));
        }
        if let Some(expected) = spec.default_contains {
            let matches = column
                .column_default
                .as_deref()
                .is_some_and(|d| d.contains(expected));
            if !matches {
                problems.push(format!(
                    "column {}.{} default is {:?}, expected to contain {expected:?}",
                    table.name, spec.name, column.column_default
                ));
            }
        }
    }

    for column in &live {
        if !table.columns.iter().any(|c| c.name == column.column_name) {
            problems.push(format!(
                "column {}.{} is not part of the schema",
                table.name, column.column_name
            ));
        }
    }

    Ok(())
}

async fn check_indexes(pool: &PgPool, problems: &mut Vec<String>) -> Result<(), sqlx::Error> {
    let live: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT indexname::text, tablename::text, indexdef
         FROM pg_indexes
         WHERE schemaname = current_schema()",
    )
    .fetch_all(pool)
    .await?;

    for spec in INDEXES {
        match live.iter().find(|(name, _, _)| name == spec.name) {
            None => problems.push(format!("index {} is missing", spec.name)),
            Some((_, table, def)) => {
                let on_column = format!("({})", spec.column);
                if table != spec.table || !def.contains(&on_column) {
                    problems.push(format!(
                        "index {} is `{def}`, expected on {}{on_column}",
                        spec.name, spec.table
                    ));
                }
            }
        }
    }
    Ok(())
}

async fn check_foreign_keys(pool: &PgPool, problems: &mut Vec<String>) -> Result<(), sqlx::Error> {
    let live: Vec<(String, String, String, String)> = sqlx::query_as(
        "SELECT kcu.table_name::text,
                kcu.column_name::text,
                ccu.table_name::text,
                rc.delete_rule::text
         FROM information_schema.referential_constraints rc
         JOIN information_schema.key_column_usage kcu
             ON kcu.constraint_name = rc.constraint_name
             AND kcu.constraint_schema = rc.constraint_schema
         JOIN information_schema.constraint_column_usage ccu
             ON ccu.constraint_name = rc.constraint_name
             AND ccu.constraint_schema = rc.constraint_schema
         WHERE rc.constraint_schema = current_schema()",
    )
    .fetch_all(pool)
    .await?;

    for spec in FOREIGN_KEYS {
        let found = live
            .iter()
            .find(|(table, column, _, _)| table == spec.table && column == spec.column);
        match found {
            None => problems.push(format!(
                "foreign key {}.{} -> {} is missing",
                spec.table, spec.column, spec.references
            )),
            Some((_, _, references, rule)) => {
                if references != spec.references {
                    problems.push(format!(
                        "foreign key {}.{} references {references}, expected {}",
                        spec.table, spec.column, spec.references
                    ));
                }
                if rule != "CASCADE" {
                    problems.push(format!(
                        "foreign key {}.{} deletes with {rule}, expected CASCADE",
                        spec.table, spec.column
                    ));
                }
            }
        }
    }
    Ok(())
}

async fn check_unique_constraints(
    pool: &PgPool,
    problems: &mut Vec<String>,
) -> Result<(), sqlx::Error> {
    let live: Vec<(String, String)> = sqlx::query_as(
        "SELECT table_name::text, constraint_name::text
         FROM information_schema.table_constraints
         WHERE constraint_schema = current_schema()
           AND constraint_type = 'UNIQUE'",
    )
    .fetch_all(pool)
    .await?;

    for (table, name) in UNIQUE_CONSTRAINTS {
        if !live.iter().any(|(t, n)| t == table && n == name) {
            problems.push(format!("unique constraint {table}.{name} is missing"));
        }
    }
    Ok(())
}

async fn check_chat_role(pool: &PgPool, problems: &mut Vec<String>) -> Result<(), sqlx::Error> {
    let labels: Vec<(String,)> = sqlx::query_as(
        "SELECT e.enumlabel::text
         FROM pg_enum e
         JOIN pg_type t ON t.oid = e.enumtypid
         JOIN pg_namespace n ON n.oid = t.typnamespace
         WHERE t.typname = 'chat_role'
           AND n.nspname = current_schema()
         ORDER BY e.enumsortorder",
    )
    .fetch_all(pool)
    .await?;

    let labels: Vec<&str> = labels.iter().map(|(l,)| l.as_str()).collect();
    if labels != CHAT_ROLE_LABELS {
        problems.push(format!(
            "type chat_role has labels {labels:?}, expected {CHAT_ROLE_LABELS:?}"
        ));
    }
    Ok(())
}

async fn check_updated_at_trigger(
    pool: &PgPool,
    problems: &mut Vec<String>,
) -> Result<(), sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS (
             SELECT 1
             FROM information_schema.triggers
             WHERE trigger_schema = current_schema()
               AND event_object_table = 'chat_titles'
               AND trigger_name = 'trg_chat_titles_updated_at'
         )",
    )
    .fetch_one(pool)
    .await?;

    if !exists {
        problems.push("trigger trg_chat_titles_updated_at is missing".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ken_core::limits;

    use super::*;

    fn width(table: &str, column: &str) -> Option<i32> {
        TABLES
            .iter()
            .find(|t| t.name == table)
            .and_then(|t| t.columns.iter().find(|c| c.name == column))
            .and_then(|c| c.max_len)
    }

    #[test]
    fn widths_match_core_limits() {
        let expected = [
            ("users", "username", limits::USERNAME_MAX_LEN),
            ("users", "email", limits::EMAIL_MAX_LEN),
            ("users", "password_hash", limits::PASSWORD_HASH_MAX_LEN),
            ("chat_titles", "title", limits::CHAT_TITLE_MAX_LEN),
            ("chat_titles", "last_location", limits::LAST_LOCATION_MAX_LEN),
            ("password_reset_tokens", "token", limits::RESET_TOKEN_MAX_LEN),
        ];
        for (table, column, max) in expected {
            assert_eq!(width(table, column), Some(max as i32), "{table}.{column}");
        }
    }

    #[test]
    fn ddl_mentions_every_declared_index() {
        for index in INDEXES {
            assert!(
                crate::schema::ddl::INDEX_STATEMENTS
                    .iter()
                    .any(|(name, sql)| *name == index.name && sql.contains(index.name)),
                "{} has no DDL",
                index.name
            );
        }
    }
}

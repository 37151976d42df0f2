//! DDL statements, in execution order.
//!
//! Every statement is safe to run against an already-provisioned database.
//! Types and triggers have no `IF NOT EXISTS` form, so they are guarded by a
//! catalog lookup inside a `DO` block.

pub const CREATE_CHAT_ROLE_TYPE: &str = r#"
DO $$
BEGIN
    IF NOT EXISTS (
        SELECT 1
        FROM pg_type t
        JOIN pg_namespace n ON n.oid = t.typnamespace
        WHERE t.typname = 'chat_role'
          AND n.nspname = current_schema()
    ) THEN
        CREATE TYPE chat_role AS ENUM ('user', 'assistant');
    END IF;
END
$$;
"#;

pub const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            SERIAL       PRIMARY KEY,
    username      VARCHAR(50)  NOT NULL,
    email         VARCHAR(100) NOT NULL,
    password_hash VARCHAR(255) NOT NULL,
    created_at    TIMESTAMPTZ  NOT NULL DEFAULT NOW(),
    CONSTRAINT uq_users_username UNIQUE (username),
    CONSTRAINT uq_users_email UNIQUE (email)
);
"#;

pub const CREATE_CHAT_TITLES: &str = r#"
CREATE TABLE IF NOT EXISTS chat_titles (
    id            SERIAL       PRIMARY KEY,
    user_id       INTEGER      NOT NULL,
    title         VARCHAR(100) NOT NULL DEFAULT 'New Chat',
    last_location VARCHAR(100),
    created_at    TIMESTAMPTZ  NOT NULL DEFAULT NOW(),
    updated_at    TIMESTAMPTZ  NOT NULL DEFAULT NOW(),
    CONSTRAINT fk_chat_titles_user_id FOREIGN KEY (user_id)
        REFERENCES users (id) ON DELETE CASCADE
);
"#;

/// `chats.user_id` duplicates the owner of `chat_id`; both are kept so
/// per-user message queries need no join.
pub const CREATE_CHATS: &str = r#"
CREATE TABLE IF NOT EXISTS chats (
    id         SERIAL      PRIMARY KEY,
    user_id    INTEGER     NOT NULL,
    chat_id    INTEGER     NOT NULL,
    message    TEXT        NOT NULL,
    role       chat_role   NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT fk_chats_user_id FOREIGN KEY (user_id)
        REFERENCES users (id) ON DELETE CASCADE,
    CONSTRAINT fk_chats_chat_id FOREIGN KEY (chat_id)
        REFERENCES chat_titles (id) ON DELETE CASCADE
);
"#;

pub const CREATE_PASSWORD_RESET_TOKENS: &str = r#"
CREATE TABLE IF NOT EXISTS password_reset_tokens (
    id         SERIAL       PRIMARY KEY,
    user_id    INTEGER      NOT NULL,
    token      VARCHAR(255) NOT NULL,
    expires_at TIMESTAMPTZ  NOT NULL,
    used       BOOLEAN      NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ  NOT NULL DEFAULT NOW(),
    CONSTRAINT fk_password_reset_tokens_user_id FOREIGN KEY (user_id)
        REFERENCES users (id) ON DELETE CASCADE
);
"#;

/// Refreshes `updated_at` on every update that does not set it explicitly.
pub const CREATE_SET_UPDATED_AT_FUNCTION: &str = r#"
CREATE OR REPLACE FUNCTION trigger_set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    IF NEW.updated_at IS NOT DISTINCT FROM OLD.updated_at THEN
        NEW.updated_at = NOW();
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;
"#;

pub const CREATE_CHAT_TITLES_UPDATED_AT_TRIGGER: &str = r#"
DO $$
BEGIN
    IF NOT EXISTS (
        SELECT 1
        FROM pg_trigger
        WHERE tgname = 'trg_chat_titles_updated_at'
          AND tgrelid = 'chat_titles'::regclass
    ) THEN
        CREATE TRIGGER trg_chat_titles_updated_at
            BEFORE UPDATE ON chat_titles
            FOR EACH ROW EXECUTE FUNCTION trigger_set_updated_at();
    END IF;
END
$$;
"#;

pub const CREATE_IDX_CHATS_CHAT_ID: &str =
    "CREATE INDEX IF NOT EXISTS idx_chats_chat_id ON chats (chat_id);";

pub const CREATE_IDX_CHATS_USER_ID: &str =
    "CREATE INDEX IF NOT EXISTS idx_chats_user_id ON chats (user_id);";

pub const CREATE_IDX_CHAT_TITLES_USER_ID: &str =
    "CREATE INDEX IF NOT EXISTS idx_chat_titles_user_id ON chat_titles (user_id);";

/// Type, tables and trigger, parents before children.
pub const TABLE_STATEMENTS: &[(&str, &str)] = &[
    ("chat_role type", CREATE_CHAT_ROLE_TYPE),
    ("users", CREATE_USERS),
    ("chat_titles", CREATE_CHAT_TITLES),
    ("chats", CREATE_CHATS),
    ("password_reset_tokens", CREATE_PASSWORD_RESET_TOKENS),
    ("trigger_set_updated_at()", CREATE_SET_UPDATED_AT_FUNCTION),
    ("trg_chat_titles_updated_at", CREATE_CHAT_TITLES_UPDATED_AT_TRIGGER),
];

pub const INDEX_STATEMENTS: &[(&str, &str)] = &[
    ("idx_chats_chat_id", CREATE_IDX_CHATS_CHAT_ID),
    ("idx_chats_user_id", CREATE_IDX_CHATS_USER_ID),
    ("idx_chat_titles_user_id", CREATE_IDX_CHAT_TITLES_USER_ID),
];

//! Shared fixtures for the repository integration tests.

#![allow(dead_code)]

use ken_db::models::chat_title::{ChatTitle, CreateChatTitle};
use ken_db::models::message::{CreateMessage, Message, MessageRole};
use ken_db::models::user::{CreateUser, User};
use ken_db::repositories::{ChatTitleRepo, MessageRepo, UserRepo};
use ken_db::schema;
use sqlx::PgPool;

/// Provision the full schema on a fresh test database.
pub async fn provision(pool: &PgPool) {
    schema::apply(pool).await.expect("schema should provision");
}

pub fn new_user(username: &str) -> CreateUser {
    CreateUser {
        username: username.to_string(),
        email: format!("{username}@x.com"),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$opaque".to_string(),
    }
}

pub async fn seed_user(pool: &PgPool, username: &str) -> User {
    UserRepo::create(pool, &new_user(username)).await.unwrap()
}

pub async fn seed_chat(pool: &PgPool, user_id: i32, title: &str) -> ChatTitle {
    let input = CreateChatTitle {
        user_id,
        title: Some(title.to_string()),
        last_location: None,
    };
    ChatTitleRepo::create(pool, &input).await.unwrap()
}

/// Like [`seed_chat`], but hands back the store's verdict.
pub async fn seed_chat_result(pool: &PgPool, user_id: i32) -> Result<ChatTitle, sqlx::Error> {
    let input = CreateChatTitle {
        user_id,
        title: None,
        last_location: None,
    };
    ChatTitleRepo::create(pool, &input).await
}

pub async fn seed_message(
    pool: &PgPool,
    chat: &ChatTitle,
    role: MessageRole,
    text: &str,
) -> Message {
    let input = CreateMessage {
        user_id: chat.user_id,
        chat_id: chat.id,
        message: text.to_string(),
        role,
    };
    MessageRepo::create(pool, &input).await.unwrap()
}

/// Count rows in `table` matching `column = id`.
pub async fn count_where(pool: &PgPool, table: &str, column: &str, id: i32) -> i64 {
    let (count,): (i64,) =
        sqlx::query_as(&format!("SELECT COUNT(*) FROM {table} WHERE {column} = $1"))
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap_or_else(|e| panic!("{table} count failed: {e}"));
    count
}

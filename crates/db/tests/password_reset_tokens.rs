//! Integration tests for password reset token storage.
//!
//! - `used` starts false and only ever flips to true
//! - A token is redeemed at most once, even under concurrent redemption
//! - Expired tokens are never redeemable
//! - Stale rows are kept until explicitly purged

mod common;

use chrono::{Duration, Utc};
use ken_core::reset_token::{is_purgeable, TokenState};
use ken_db::models::password_reset_token::{CreatePasswordResetToken, PasswordResetToken};
use ken_db::repositories::{PasswordResetTokenRepo, UserRepo};
use sqlx::PgPool;

async fn seed_token(
    pool: &PgPool,
    user_id: i32,
    token: &str,
    expires_in: Duration,
) -> PasswordResetToken {
    let input = CreatePasswordResetToken {
        user_id,
        token: token.to_string(),
        expires_at: Utc::now() + expires_in,
    };
    PasswordResetTokenRepo::create(pool, &input).await.unwrap()
}

#[sqlx::test(migrations = false)]
async fn new_token_starts_unused(pool: PgPool) {
    common::provision(&pool).await;
    let alice = common::seed_user(&pool, "alice").await;

    let token = seed_token(&pool, alice.id, "abc", Duration::hours(1)).await;

    assert!(!token.used);
    assert_eq!(token.state_at(Utc::now()), TokenState::Redeemable);
    assert!(token.is_redeemable_at(Utc::now()));
    assert!(!token.is_redeemable_at(token.expires_at));
    let found = PasswordResetTokenRepo::find_by_token(&pool, "abc")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, token.id);
}

#[sqlx::test(migrations = false)]
async fn mark_used_flips_once(pool: PgPool) {
    common::provision(&pool).await;
    let alice = common::seed_user(&pool, "alice").await;
    let token = seed_token(&pool, alice.id, "abc", Duration::hours(1)).await;

    assert!(PasswordResetTokenRepo::mark_used(&pool, token.id).await.unwrap());
    assert!(!PasswordResetTokenRepo::mark_used(&pool, token.id).await.unwrap());

    let after = PasswordResetTokenRepo::find_by_token(&pool, "abc")
        .await
        .unwrap()
        .unwrap();
    assert!(after.used);
    assert_eq!(after.state_at(Utc::now()), TokenState::Used);
    assert!(!after.is_redeemable_at(Utc::now()));
    assert!(PasswordResetTokenRepo::find_redeemable(&pool, "abc", Utc::now())
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = false)]
async fn redeem_consumes_once(pool: PgPool) {
    common::provision(&pool).await;
    let alice = common::seed_user(&pool, "alice").await;
    seed_token(&pool, alice.id, "abc", Duration::hours(1)).await;

    let now = Utc::now();
    let first = PasswordResetTokenRepo::redeem(&pool, "abc", now).await.unwrap();
    let second = PasswordResetTokenRepo::redeem(&pool, "abc", now).await.unwrap();

    let first = first.expect("first redemption succeeds");
    assert!(first.used);
    assert_eq!(first.user_id, alice.id);
    assert!(second.is_none());
}

#[sqlx::test(migrations = false)]
async fn concurrent_redeem_has_one_winner(pool: PgPool) {
    common::provision(&pool).await;
    let alice = common::seed_user(&pool, "alice").await;
    seed_token(&pool, alice.id, "race", Duration::hours(1)).await;

    let now = Utc::now();
    let results = futures::future::join_all(
        (0..6).map(|_| PasswordResetTokenRepo::redeem(&pool, "race", now)),
    )
    .await;

    let winners = results
        .into_iter()
        .map(|r| r.unwrap())
        .filter(Option::is_some)
        .count();
    assert_eq!(winners, 1);
}

#[sqlx::test(migrations = false)]
async fn expired_token_is_never_redeemed(pool: PgPool) {
    common::provision(&pool).await;
    let alice = common::seed_user(&pool, "alice").await;
    let token = seed_token(&pool, alice.id, "old", -Duration::minutes(5)).await;

    assert_eq!(token.state_at(Utc::now()), TokenState::Expired);
    assert!(PasswordResetTokenRepo::find_redeemable(&pool, "old", Utc::now())
        .await
        .unwrap()
        .is_none());
    assert!(PasswordResetTokenRepo::redeem(&pool, "old", Utc::now())
        .await
        .unwrap()
        .is_none());

    // Still stored: nothing sweeps it automatically.
    let stored = PasswordResetTokenRepo::find_by_token(&pool, "old")
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.used);
}

#[sqlx::test(migrations = false)]
async fn redeemed_token_unlocks_password_change(pool: PgPool) {
    common::provision(&pool).await;
    let alice = common::seed_user(&pool, "alice").await;
    seed_token(&pool, alice.id, "reset-me", Duration::hours(1)).await;

    let redeemed = PasswordResetTokenRepo::redeem(&pool, "reset-me", Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert!(UserRepo::update_password(&pool, redeemed.user_id, "new-opaque-hash")
        .await
        .unwrap());

    let alice = UserRepo::find_by_id(&pool, alice.id).await.unwrap().unwrap();
    assert_eq!(alice.password_hash, "new-opaque-hash");
}

#[sqlx::test(migrations = false)]
async fn purge_removes_only_stale_rows(pool: PgPool) {
    common::provision(&pool).await;
    let alice = common::seed_user(&pool, "alice").await;

    let expired = seed_token(&pool, alice.id, "expired", -Duration::hours(3)).await;
    let used = seed_token(&pool, alice.id, "used", Duration::hours(3)).await;
    PasswordResetTokenRepo::mark_used(&pool, used.id).await.unwrap();
    let live = seed_token(&pool, alice.id, "live", Duration::hours(3)).await;

    // A cutoff in the past keeps everything but the long-expired row.
    let cutoff = Utc::now() - Duration::hours(1);
    let deleted = PasswordResetTokenRepo::purge_stale(&pool, cutoff).await.unwrap();
    assert_eq!(deleted, 1);

    // A cutoff in the future also takes the used row, but never the live one.
    let cutoff = Utc::now() + Duration::minutes(5);
    let deleted = PasswordResetTokenRepo::purge_stale(&pool, cutoff).await.unwrap();
    assert_eq!(deleted, 1);

    let remaining = PasswordResetTokenRepo::list_for_user(&pool, alice.id).await.unwrap();
    let ids: Vec<i32> = remaining.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![live.id]);
    assert!(!ids.contains(&expired.id));
    for token in &remaining {
        assert!(!is_purgeable(token.used, token.created_at, token.expires_at, cutoff));
    }
}

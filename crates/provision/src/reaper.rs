//! Periodic cleanup of stale password reset tokens.
//!
//! The store never sweeps tokens on its own; expired and redeemed rows stay
//! until something deletes them. This module is that something, run on
//! demand (`purge-tokens`) or as a loop (`purge-tokens --watch`).

use std::time::Duration;

use chrono::{DateTime, Utc};
use ken_core::types::Timestamp;
use ken_db::repositories::PasswordResetTokenRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Cutoff for a purge run: rows stale before this instant are deleted.
///
/// A retention too large to represent saturates to the earliest instant,
/// which purges nothing.
pub fn purge_cutoff(now: Timestamp, retention_hours: i64) -> Timestamp {
    chrono::Duration::try_hours(retention_hours)
        .and_then(|retention| now.checked_sub_signed(retention))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Delete token rows that went stale more than `retention_hours` ago.
pub async fn purge_once(pool: &PgPool, retention_hours: i64) -> Result<u64, sqlx::Error> {
    let cutoff = purge_cutoff(Utc::now(), retention_hours);
    let deleted = PasswordResetTokenRepo::purge_stale(pool, cutoff).await?;
    if deleted > 0 {
        tracing::info!(deleted, %cutoff, "Token reaper: purged stale rows");
    } else {
        tracing::debug!(%cutoff, "Token reaper: no rows to purge");
    }
    Ok(deleted)
}

/// Run the token reaper loop until `cancel` is triggered.
///
/// The first tick fires immediately. A failed run is logged and retried on
/// the next tick.
pub async fn run(
    pool: PgPool,
    interval: Duration,
    retention_hours: i64,
    cancel: CancellationToken,
) {
    tracing::info!(
        retention_hours,
        interval_secs = interval.as_secs(),
        "Token reaper started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Token reaper stopping");
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = purge_once(&pool, retention_hours).await {
                    tracing::error!(error = %e, "Token reaper: cleanup failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn cutoff_subtracts_retention() {
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();
        let cutoff = purge_cutoff(now, 24);
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn zero_retention_purges_up_to_now() {
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap();
        assert_eq!(purge_cutoff(now, 0), now);
    }

    #[test]
    fn unrepresentable_retention_saturates() {
        let now = Utc::now();
        assert_eq!(purge_cutoff(now, 10_000_000_000), DateTime::<Utc>::MIN_UTC);
        assert_eq!(purge_cutoff(now, i64::MAX), DateTime::<Utc>::MIN_UTC);
    }
}

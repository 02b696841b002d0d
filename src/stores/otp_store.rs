//! Password-reset session tracker.
//!
//! Maps an email to the pending one-time-passcode record issued for it. The
//! auth service only talks to the [`OtpStore`] trait, so the default
//! process-local map can be swapped for an expiring key-value store without
//! touching the reset flow.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::error::AppError;

/// A pending password-reset code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    /// Argon2 hash of the 6-digit code.
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    /// Verification attempts made so far, including the current one.
    pub attempts: u32,
    /// Id of the user the code was issued for.
    pub user_id: i32,
}

impl OtpRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Every operation is atomic per email. Attempt counting must not be a
/// read followed by a write, or concurrent guesses would share one count.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Store `record` under `email`, replacing any previous one. Backends with
    /// native expiry should drop the key after `ttl`.
    async fn put(&self, email: &str, record: OtpRecord, ttl: Duration) -> Result<(), AppError>;

    /// Increment the attempt counter and return the updated record, or
    /// `None` if nothing is pending. A remote backend maps this to `INCR`.
    async fn record_attempt(&self, email: &str) -> Result<Option<OtpRecord>, AppError>;

    /// Remove the record only if it still holds `code_hash`. Returns whether
    /// this call removed it, so a code can be consumed once and a newer
    /// code issued in between is left alone.
    async fn take(&self, email: &str, code_hash: &str) -> Result<bool, AppError>;
}

/// In-process [`OtpStore`]. Records do not survive a restart.
///
/// Expiry is checked by the reader; [`InMemoryOtpStore::purge_expired`]
/// removes records nobody came back for.
#[derive(Debug, Default)]
pub struct InMemoryOtpStore {
    records: DashMap<String, OtpRecord>,
}

impl InMemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every record that expired before `now`. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired(now));
        before.saturating_sub(self.records.len())
    }
}

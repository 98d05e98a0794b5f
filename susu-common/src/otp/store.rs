use async_trait::async_trait;
use std::time::SystemTime;
use uuid::Uuid;

use crate::db::DaoError;
use crate::models::otp_record::{NewOtpRecord, OtpRecord};
use crate::otp::OtpPurpose;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Replacement {
    /// Older unused records for the pair were invalidated and the new record stored.
    Issued,
    /// A record for the pair was created after the cooldown start. Nothing was written.
    CoolingDown { last_issued_at: SystemTime },
}

/// Persistence for OTP records. Each operation is atomic on its own; callers never hold
/// state between calls.
#[async_trait]
pub trait OtpRecordStore: Send + Sync {
    /// Checks the cooldown, invalidates every unused record for the new record's
    /// (identifier, purpose) and inserts the new record as one unit.
    async fn replace_live_record(
        &self,
        new_record: &NewOtpRecord<'_>,
        cooldown_start: SystemTime,
    ) -> Result<Replacement, DaoError>;

    /// Most recently created record for the pair that is unused and unexpired at `now`.
    async fn find_live_record(
        &self,
        identifier: &str,
        purpose: OtpPurpose,
        now: SystemTime,
    ) -> Result<Option<OtpRecord>, DaoError>;

    /// Marks the record used if it is still unused. Returns whether this call did so.
    async fn consume(&self, id: Uuid) -> Result<bool, DaoError>;

    /// Takes one attempt against an unused record whose attempts are still under the
    /// ceiling, in a single atomic step. Returns the attempt number taken, or `None` when
    /// no attempt is left. A code may only be compared after a successful claim.
    async fn claim_attempt(&self, id: Uuid) -> Result<Option<i32>, DaoError>;

    async fn delete_all_expired(&self, now: SystemTime) -> Result<usize, DaoError>;
}

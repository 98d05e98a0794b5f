use diesel::{Identifiable, Insertable, Queryable, Selectable};
use std::time::SystemTime;
use uuid::Uuid;

use crate::otp::OtpPurpose;
use crate::schema::otp_records;

#[derive(Clone, Debug, PartialEq, Eq, Identifiable, Queryable, Selectable)]
#[diesel(table_name = otp_records, primary_key(id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OtpRecord {
    pub id: Uuid,
    pub identifier: String,
    pub purpose: OtpPurpose,
    pub code_hash: String,
    pub expires_at: SystemTime,
    pub attempts: i32,
    pub max_attempts: i32,
    pub used: bool,
    pub created_at: SystemTime,
}

impl OtpRecord {
    /// Unused and not yet past its expiry. Expiry is exclusive: a record is dead at
    /// exactly `expires_at`.
    pub fn is_live_at(&self, now: SystemTime) -> bool {
        !self.used && self.expires_at > now
    }

    pub fn is_locked(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = otp_records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewOtpRecord<'a> {
    pub id: Uuid,
    pub identifier: &'a str,
    pub purpose: OtpPurpose,
    pub code_hash: &'a str,
    pub expires_at: SystemTime,
    pub attempts: i32,
    pub max_attempts: i32,
    pub used: bool,
    pub created_at: SystemTime,
}

impl From<&NewOtpRecord<'_>> for OtpRecord {
    fn from(new: &NewOtpRecord<'_>) -> Self {
        Self {
            id: new.id,
            identifier: new.identifier.to_owned(),
            purpose: new.purpose,
            code_hash: new.code_hash.to_owned(),
            expires_at: new.expires_at,
            attempts: new.attempts,
            max_attempts: new.max_attempts,
            used: new.used,
            created_at: new.created_at,
        }
    }
}

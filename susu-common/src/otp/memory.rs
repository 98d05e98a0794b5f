use async_trait::async_trait;
use std::time::SystemTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::DaoError;
use crate::models::otp_record::{NewOtpRecord, OtpRecord};
use crate::otp::{OtpPurpose, OtpRecordStore, Replacement};

/// Keeps OTP records in process memory behind a single lock. Records are lost when the
/// process exits. Suitable for tests and local development.
pub struct MemoryRecordStore {
    records: RwLock<Vec<OtpRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Every record ever stored for the pair, oldest first.
    pub async fn records_for(&self, identifier: &str, purpose: OtpPurpose) -> Vec<OtpRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.identifier == identifier && r.purpose == purpose)
            .cloned()
            .collect()
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OtpRecordStore for MemoryRecordStore {
    async fn replace_live_record(
        &self,
        new_record: &NewOtpRecord<'_>,
        cooldown_start: SystemTime,
    ) -> Result<Replacement, DaoError> {
        let mut records = self.records.write().await;

        let last_issued_at = records
            .iter()
            .filter(|r| r.identifier == new_record.identifier && r.purpose == new_record.purpose)
            .map(|r| r.created_at)
            .filter(|created_at| *created_at > cooldown_start)
            .max();

        if let Some(last_issued_at) = last_issued_at {
            return Ok(Replacement::CoolingDown { last_issued_at });
        }

        records
            .iter_mut()
            .filter(|r| {
                !r.used && r.identifier == new_record.identifier && r.purpose == new_record.purpose
            })
            .for_each(|r| r.used = true);

        records.push(OtpRecord::from(new_record));

        Ok(Replacement::Issued)
    }

    async fn find_live_record(
        &self,
        identifier: &str,
        purpose: OtpPurpose,
        now: SystemTime,
    ) -> Result<Option<OtpRecord>, DaoError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.identifier == identifier && r.purpose == purpose && r.is_live_at(now))
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn consume(&self, id: Uuid) -> Result<bool, DaoError> {
        let mut records = self.records.write().await;

        match records.iter_mut().find(|r| r.id == id && !r.used) {
            Some(record) => {
                record.used = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn claim_attempt(&self, id: Uuid) -> Result<Option<i32>, DaoError> {
        let mut records = self.records.write().await;

        let Some(record) = records
            .iter_mut()
            .find(|r| r.id == id && !r.used && r.attempts < r.max_attempts)
        else {
            return Ok(None);
        };

        record.attempts += 1;
        Ok(Some(record.attempts))
    }

    async fn delete_all_expired(&self, now: SystemTime) -> Result<usize, DaoError> {
        let mut records = self.records.write().await;

        let count_before = records.len();
        records.retain(|r| r.expires_at > now);

        Ok(count_before - records.len())
    }
}

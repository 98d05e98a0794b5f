use std::sync::Arc;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use crate::clock::Clock;
use crate::models::otp_record::NewOtpRecord;
use crate::otp::{Otp, OtpError, OtpHasher, OtpPurpose, OtpRecordStore, OtpSettings, Replacement};

/// Issues codes, leaving exactly one live record per (identifier, purpose). The plaintext
/// code is returned to the caller and never persisted.
pub struct OtpIssuer {
    store: Arc<dyn OtpRecordStore>,
    hasher: Arc<OtpHasher>,
    clock: Arc<dyn Clock>,
    settings: OtpSettings,
}

impl OtpIssuer {
    pub fn new(
        store: Arc<dyn OtpRecordStore>,
        hasher: Arc<OtpHasher>,
        clock: Arc<dyn Clock>,
        settings: OtpSettings,
    ) -> Self {
        Self {
            store,
            hasher,
            clock,
            settings,
        }
    }

    pub async fn issue(&self, identifier: &str, purpose: OtpPurpose) -> Result<String, OtpError> {
        let now = self.clock.now();
        let code = Otp::generate(self.settings.length);
        let code_hash = self.hasher.hash(&code);

        let new_record = NewOtpRecord {
            id: Uuid::now_v7(),
            identifier,
            purpose,
            code_hash: &code_hash,
            expires_at: now + self.settings.lifetime,
            attempts: 0,
            max_attempts: self.settings.max_attempts,
            used: false,
            created_at: now,
        };

        let cooldown_start = now
            .checked_sub(self.settings.resend_cooldown)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        match self
            .store
            .replace_live_record(&new_record, cooldown_start)
            .await?
        {
            Replacement::Issued => {
                log::info!("Issued {purpose} OTP {}", new_record.id);
                Ok(code)
            }
            Replacement::CoolingDown { last_issued_at } => Err(OtpError::RateLimited {
                retry_after_secs: retry_after_secs(
                    last_issued_at + self.settings.resend_cooldown,
                    now,
                ),
            }),
        }
    }
}

/// Whole seconds until `allowed_at`, rounded up and never below one.
fn retry_after_secs(allowed_at: SystemTime, now: SystemTime) -> u64 {
    let remaining = allowed_at.duration_since(now).unwrap_or(Duration::ZERO);
    let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
    secs.max(1)
}

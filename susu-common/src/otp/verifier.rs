use std::sync::Arc;

use crate::clock::Clock;
use crate::otp::{OtpError, OtpHasher, OtpPurpose, OtpRecordStore};

/// Checks supplied codes against the live record for a pair.
///
/// Returns `Ok(false)` for every kind of verification failure (never issued, expired,
/// already used, locked out, wrong code) so callers cannot tell them apart. Only store
/// failures are errors.
pub struct OtpVerifier {
    store: Arc<dyn OtpRecordStore>,
    hasher: Arc<OtpHasher>,
    clock: Arc<dyn Clock>,
}

impl OtpVerifier {
    pub fn new(
        store: Arc<dyn OtpRecordStore>,
        hasher: Arc<OtpHasher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            hasher,
            clock,
        }
    }

    pub async fn verify(
        &self,
        identifier: &str,
        purpose: OtpPurpose,
        supplied: &str,
    ) -> Result<bool, OtpError> {
        let now = self.clock.now();

        let Some(record) = self
            .store
            .find_live_record(identifier, purpose, now)
            .await?
        else {
            return Ok(false);
        };

        if record.is_locked() {
            if let Err(e) = self.store.consume(record.id).await {
                log::error!("Failed to retire locked OTP {}: {e}", record.id);
            }

            return Ok(false);
        }

        // Concurrent guesses each need their own attempt, so no more than `max_attempts`
        // comparisons are ever made against one record
        let Some(attempt) = self.store.claim_attempt(record.id).await? else {
            return Ok(false);
        };

        if self.hasher.verify(supplied, &record.code_hash) {
            // Only the caller whose update flips `used` wins a concurrent race
            let consumed = self.store.consume(record.id).await?;
            if consumed {
                log::info!("Verified {purpose} OTP {}", record.id);
            }

            return Ok(consumed);
        }

        if attempt >= record.max_attempts {
            if let Err(e) = self.store.consume(record.id).await {
                log::error!("Failed to retire locked OTP {}: {e}", record.id);
            }
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, SystemTime};
    use tokio::sync::Barrier;
    use uuid::Uuid;

    use crate::clock::ManualClock;
    use crate::db::DaoError;
    use crate::models::otp_record::{NewOtpRecord, OtpRecord};
    use crate::otp::memory::MemoryRecordStore;
    use crate::otp::{OtpIssuer, OtpSettings, Replacement};

    struct Harness {
        store: Arc<MemoryRecordStore>,
        clock: Arc<ManualClock>,
        issuer: OtpIssuer,
        verifier: OtpVerifier,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryRecordStore::new());
        let clock = Arc::new(ManualClock::new(
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        ));
        let hasher = Arc::new(OtpHasher::new(&[9; 32]).unwrap());

        let issuer = OtpIssuer::new(
            store.clone(),
            hasher.clone(),
            clock.clone(),
            OtpSettings::default(),
        );
        let verifier = OtpVerifier::new(store.clone(), hasher, clock.clone());

        Harness {
            store,
            clock,
            issuer,
            verifier,
        }
    }

    fn wrong_code(code: &str) -> String {
        code.chars()
            .map(|c| if c == '9' { '0' } else { (c as u8 + 1) as char })
            .collect()
    }

    #[tokio::test]
    async fn test_fresh_code_verifies() {
        let h = harness();
        let code = h
            .issuer
            .issue("ama@example.com", OtpPurpose::EmailVerification)
            .await
            .unwrap();

        h.clock.advance(Duration::from_secs(30));

        assert!(h
            .verifier
            .verify("ama@example.com", OtpPurpose::EmailVerification, &code)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_code_is_single_use() {
        let h = harness();
        let code = h
            .issuer
            .issue("ama@example.com", OtpPurpose::EmailVerification)
            .await
            .unwrap();

        assert!(h
            .verifier
            .verify("ama@example.com", OtpPurpose::EmailVerification, &code)
            .await
            .unwrap());
        assert!(!h
            .verifier
            .verify("ama@example.com", OtpPurpose::EmailVerification, &code)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_three_wrong_attempts_lock_out_correct_code() {
        let h = harness();
        let code = h
            .issuer
            .issue("+233201234567", OtpPurpose::TwoFactor)
            .await
            .unwrap();
        let wrong = wrong_code(&code);

        for _ in 0..3 {
            assert!(!h
                .verifier
                .verify("+233201234567", OtpPurpose::TwoFactor, &wrong)
                .await
                .unwrap());
        }

        assert!(!h
            .verifier
            .verify("+233201234567", OtpPurpose::TwoFactor, &code)
            .await
            .unwrap());

        let records = h
            .store
            .records_for("+233201234567", OtpPurpose::TwoFactor)
            .await;
        assert_eq!(records[0].attempts, 3);
        assert!(records[0].used);
    }

    #[tokio::test]
    async fn test_two_wrong_attempts_then_correct_code_verifies() {
        let h = harness();
        let code = h
            .issuer
            .issue("+233201234567", OtpPurpose::TwoFactor)
            .await
            .unwrap();
        let wrong = wrong_code(&code);

        for _ in 0..2 {
            assert!(!h
                .verifier
                .verify("+233201234567", OtpPurpose::TwoFactor, &wrong)
                .await
                .unwrap());
        }

        assert!(h
            .verifier
            .verify("+233201234567", OtpPurpose::TwoFactor, &code)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_expired_code_is_rejected() {
        let h = harness();
        let code = h
            .issuer
            .issue("ama@example.com", OtpPurpose::PasswordReset)
            .await
            .unwrap();

        h.clock.advance(Duration::from_secs(11 * 60));

        assert!(!h
            .verifier
            .verify("ama@example.com", OtpPurpose::PasswordReset, &code)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_code_expires_exactly_at_lifetime() {
        let h = harness();
        let code = h
            .issuer
            .issue("ama@example.com", OtpPurpose::PasswordReset)
            .await
            .unwrap();

        h.clock.advance(Duration::from_secs(600));

        assert!(!h
            .verifier
            .verify("ama@example.com", OtpPurpose::PasswordReset, &code)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_reissue_invalidates_previous_code() {
        let h = harness();
        let first = h
            .issuer
            .issue("ama@example.com", OtpPurpose::EmailVerification)
            .await
            .unwrap();

        h.clock.advance(Duration::from_secs(61));
        let mut second = h
            .issuer
            .issue("ama@example.com", OtpPurpose::EmailVerification)
            .await
            .unwrap();

        // Both codes being equal is a one in a million chance; issue again until they
        // differ so the old code can be checked on its own
        while second == first {
            h.clock.advance(Duration::from_secs(61));
            second = h
                .issuer
                .issue("ama@example.com", OtpPurpose::EmailVerification)
                .await
                .unwrap();
        }

        assert!(!h
            .verifier
            .verify("ama@example.com", OtpPurpose::EmailVerification, &first)
            .await
            .unwrap());
        assert!(h
            .verifier
            .verify("ama@example.com", OtpPurpose::EmailVerification, &second)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_code_does_not_cross_purposes_or_identifiers() {
        let h = harness();
        let code = h
            .issuer
            .issue("ama@example.com", OtpPurpose::EmailVerification)
            .await
            .unwrap();

        assert!(!h
            .verifier
            .verify("ama@example.com", OtpPurpose::PasswordReset, &code)
            .await
            .unwrap());
        assert!(!h
            .verifier
            .verify("kofi@example.com", OtpPurpose::EmailVerification, &code)
            .await
            .unwrap());
        assert!(h
            .verifier
            .verify("ama@example.com", OtpPurpose::EmailVerification, &code)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_never_issued_is_false() {
        let h = harness();

        assert!(!h
            .verifier
            .verify("nobody@example.com", OtpPurpose::TwoFactor, "123456")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_oversized_and_empty_input_is_incorrect() {
        let h = harness();
        let code = h
            .issuer
            .issue("ama@example.com", OtpPurpose::TwoFactor)
            .await
            .unwrap();

        let oversized = format!("{code}{}", "0".repeat(4096));
        assert!(!h
            .verifier
            .verify("ama@example.com", OtpPurpose::TwoFactor, &oversized)
            .await
            .unwrap());
        assert!(!h
            .verifier
            .verify("ama@example.com", OtpPurpose::TwoFactor, "")
            .await
            .unwrap());
        assert!(h
            .verifier
            .verify("ama@example.com", OtpPurpose::TwoFactor, &code)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_correct_verifications_have_one_winner() {
        let h = Arc::new(harness());
        let code = h
            .issuer
            .issue("ama@example.com", OtpPurpose::TwoFactor)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let h = h.clone();
            let code = code.clone();
            handles.push(tokio::spawn(async move {
                h.verifier
                    .verify("ama@example.com", OtpPurpose::TwoFactor, &code)
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
    }

    /// Holds every reader until all of them have fetched the record, so each one sees
    /// the same untouched attempt count.
    struct LockstepStore {
        inner: MemoryRecordStore,
        readers: Barrier,
        attempts_granted: AtomicUsize,
    }

    #[async_trait]
    impl OtpRecordStore for LockstepStore {
        async fn replace_live_record(
            &self,
            new_record: &NewOtpRecord<'_>,
            cooldown_start: SystemTime,
        ) -> Result<Replacement, DaoError> {
            self.inner
                .replace_live_record(new_record, cooldown_start)
                .await
        }

        async fn find_live_record(
            &self,
            identifier: &str,
            purpose: OtpPurpose,
            now: SystemTime,
        ) -> Result<Option<OtpRecord>, DaoError> {
            let record = self.inner.find_live_record(identifier, purpose, now).await;
            self.readers.wait().await;
            record
        }

        async fn consume(&self, id: Uuid) -> Result<bool, DaoError> {
            self.inner.consume(id).await
        }

        async fn claim_attempt(&self, id: Uuid) -> Result<Option<i32>, DaoError> {
            let claimed = self.inner.claim_attempt(id).await?;
            if claimed.is_some() {
                self.attempts_granted.fetch_add(1, Ordering::SeqCst);
            }

            Ok(claimed)
        }

        async fn delete_all_expired(&self, now: SystemTime) -> Result<usize, DaoError> {
            self.inner.delete_all_expired(now).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_guesses_cannot_exceed_attempt_ceiling() {
        const GUESSES: usize = 20;

        let store = Arc::new(LockstepStore {
            inner: MemoryRecordStore::new(),
            readers: Barrier::new(GUESSES),
            attempts_granted: AtomicUsize::new(0),
        });
        let clock = Arc::new(ManualClock::new(
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        ));
        let hasher = Arc::new(OtpHasher::new(&[9; 32]).unwrap());

        let issuer = OtpIssuer::new(
            store.clone(),
            hasher.clone(),
            clock.clone(),
            OtpSettings::default(),
        );
        let verifier = Arc::new(OtpVerifier::new(store.clone(), hasher, clock));

        let code = issuer
            .issue("ama@example.com", OtpPurpose::TwoFactor)
            .await
            .unwrap();
        let code_num: u32 = code.parse().unwrap();

        let mut guesses: Vec<String> = (1..GUESSES as u32)
            .map(|i| format!("{:06}", (code_num + i) % 1_000_000))
            .collect();
        guesses.push(code.clone());

        let mut handles = Vec::new();
        for guess in guesses {
            let verifier = verifier.clone();
            handles.push(tokio::spawn(async move {
                verifier
                    .verify("ama@example.com", OtpPurpose::TwoFactor, &guess)
                    .await
                    .unwrap()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        assert!(successes <= 1);
        assert_eq!(store.attempts_granted.load(Ordering::SeqCst), 3);

        let records = store
            .inner
            .records_for("ama@example.com", OtpPurpose::TwoFactor)
            .await;
        assert_eq!(records[0].attempts, 3);
        assert!(records[0].used);

        // Whatever the race decided, the code cannot be used afterwards
        assert!(!verifier
            .verify("ama@example.com", OtpPurpose::TwoFactor, &code)
            .await
            .unwrap());
    }

    struct UnavailableStore;

    #[async_trait]
    impl OtpRecordStore for UnavailableStore {
        async fn replace_live_record(
            &self,
            _new_record: &NewOtpRecord<'_>,
            _cooldown_start: SystemTime,
        ) -> Result<Replacement, DaoError> {
            Err(DaoError::DbAsyncPoolFailure(String::from("connection refused")))
        }

        async fn find_live_record(
            &self,
            _identifier: &str,
            _purpose: OtpPurpose,
            _now: SystemTime,
        ) -> Result<Option<OtpRecord>, DaoError> {
            Err(DaoError::DbAsyncPoolFailure(String::from("connection refused")))
        }

        async fn consume(&self, _id: Uuid) -> Result<bool, DaoError> {
            Err(DaoError::DbAsyncPoolFailure(String::from("connection refused")))
        }

        async fn claim_attempt(&self, _id: Uuid) -> Result<Option<i32>, DaoError> {
            Err(DaoError::DbAsyncPoolFailure(String::from("connection refused")))
        }

        async fn delete_all_expired(&self, _now: SystemTime) -> Result<usize, DaoError> {
            Err(DaoError::DbAsyncPoolFailure(String::from("connection refused")))
        }
    }

    #[tokio::test]
    async fn test_store_failures_are_errors_not_false() {
        let store = Arc::new(UnavailableStore);
        let hasher = Arc::new(OtpHasher::new(&[9; 32]).unwrap());
        let clock = Arc::new(ManualClock::default());

        let issuer = OtpIssuer::new(
            store.clone(),
            hasher.clone(),
            clock.clone(),
            OtpSettings::default(),
        );
        let verifier = OtpVerifier::new(store, hasher, clock);

        assert!(matches!(
            issuer
                .issue("ama@example.com", OtpPurpose::TwoFactor)
                .await,
            Err(OtpError::StoreUnavailable(_))
        ));
        assert!(matches!(
            verifier
                .verify("ama@example.com", OtpPurpose::TwoFactor, "123456")
                .await,
            Err(OtpError::StoreUnavailable(_))
        ));
    }
}

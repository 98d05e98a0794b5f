use rand::Rng;
use std::fmt;
use std::time::Duration;

use crate::db::DaoError;
use crate::threadrand::SecureRng;

mod purpose;

pub mod hasher;
pub mod issuer;
pub mod memory;
pub mod store;
pub mod verifier;

pub use hasher::OtpHasher;
pub use issuer::OtpIssuer;
pub use purpose::{OtpPurpose, UnknownPurpose};
pub use store::{OtpRecordStore, Replacement};
pub use verifier::OtpVerifier;

pub const OTP_LENGTH: usize = 6;
pub const OTP_LIFETIME: Duration = Duration::from_secs(10 * 60);
pub const OTP_RESEND_COOLDOWN: Duration = Duration::from_secs(60);
pub const OTP_MAX_ATTEMPTS: i32 = 3;

pub struct Otp {}

impl Otp {
    /// Decimal digits drawn uniformly from a CSPRNG. Leading zeros are kept.
    pub fn generate(length: usize) -> String {
        let mut rng = SecureRng;
        (0..length)
            .map(|_| (b'0' + rng.gen_range(0..10)) as char)
            .collect()
    }
}

/// Tunables shared by the issuer and verifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OtpSettings {
    pub length: usize,
    pub lifetime: Duration,
    pub resend_cooldown: Duration,
    pub max_attempts: i32,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self {
            length: OTP_LENGTH,
            lifetime: OTP_LIFETIME,
            resend_cooldown: OTP_RESEND_COOLDOWN,
            max_attempts: OTP_MAX_ATTEMPTS,
        }
    }
}

#[derive(Debug)]
pub enum OtpError {
    RateLimited { retry_after_secs: u64 },
    StoreUnavailable(DaoError),
}

impl std::error::Error for OtpError {}

impl fmt::Display for OtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OtpError::RateLimited { retry_after_secs } => {
                write!(
                    f,
                    "OtpError: A code was sent recently, retry in {retry_after_secs} seconds"
                )
            }
            OtpError::StoreUnavailable(e) => write!(f, "OtpError: Store unavailable: {e}"),
        }
    }
}

impl From<DaoError> for OtpError {
    fn from(error: DaoError) -> Self {
        OtpError::StoreUnavailable(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_produces_digits_of_requested_length() {
        for length in [1, 4, 6, 8, 12] {
            let otp = Otp::generate(length);
            assert_eq!(otp.len(), length);
            assert!(otp.bytes().all(|b| b.is_ascii_digit()));
        }

        assert_eq!(Otp::generate(0), "");
    }

    #[test]
    fn test_generate_covers_every_digit() {
        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.extend(Otp::generate(OTP_LENGTH).chars());
        }

        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn test_generate_keeps_leading_zeros() {
        let found_leading_zero = (0..5000).any(|_| Otp::generate(OTP_LENGTH).starts_with('0'));
        assert!(found_leading_zero);
    }

    #[test]
    fn test_default_settings() {
        let settings = OtpSettings::default();

        assert_eq!(settings.length, 6);
        assert_eq!(settings.lifetime, Duration::from_secs(600));
        assert_eq!(settings.resend_cooldown, Duration::from_secs(60));
        assert_eq!(settings.max_attempts, 3);
    }
}

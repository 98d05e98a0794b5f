use base64::engine::general_purpose::STANDARD as b64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

pub const MIN_OTP_HASHING_KEY_LEN: usize = 32;

#[derive(Debug)]
pub struct KeyTooShort(pub usize);

impl std::error::Error for KeyTooShort {}

impl fmt::Display for KeyTooShort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OTP hashing key is {} bytes, must be at least {MIN_OTP_HASHING_KEY_LEN}",
            self.0
        )
    }
}

/// Keyed HMAC-SHA256 over OTP codes. Hashes are stored as base64 text.
#[derive(Clone)]
pub struct OtpHasher {
    mac: Hmac<Sha256>,
}

impl OtpHasher {
    pub fn new(key: &[u8]) -> Result<Self, KeyTooShort> {
        if key.len() < MIN_OTP_HASHING_KEY_LEN {
            return Err(KeyTooShort(key.len()));
        }

        // HMAC accepts keys of any length
        let mac = Hmac::<Sha256>::new_from_slice(key).map_err(|_| KeyTooShort(key.len()))?;
        Ok(Self { mac })
    }

    pub fn hash(&self, code: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(code.as_bytes());
        b64.encode(mac.finalize().into_bytes())
    }

    /// Constant-time comparison of `code`'s hash against a stored hash.
    pub fn verify(&self, code: &str, code_hash: &str) -> bool {
        let Ok(expected) = b64.decode(code_hash) else {
            return false;
        };

        let mut mac = self.mac.clone();
        mac.update(code.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}

impl fmt::Debug for OtpHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpHasher { .. }")
    }
}

use std::time::Duration;

use crate::otp::OtpPurpose;

pub struct OtpText {}

impl OtpText {
    pub fn generate(otp: &str, purpose: OtpPurpose, otp_lifetime: Duration) -> String {
        format!(
            "Your Susu code to {} is {}. It expires in {} minutes. Never share this code.",
            purpose.description(),
            otp,
            otp_lifetime.as_secs() / 60,
        )
    }
}

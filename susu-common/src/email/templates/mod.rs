use std::time::Duration;

use crate::otp::OtpPurpose;

pub struct OtpMessage {}

impl OtpMessage {
    pub fn subject(purpose: OtpPurpose) -> &'static str {
        match purpose {
            OtpPurpose::EmailVerification => "Verify your email address",
            OtpPurpose::PhoneVerification => "Verify your phone number",
            OtpPurpose::PasswordReset => "Reset your password",
            OtpPurpose::TwoFactor => "Your sign-in code",
        }
    }

    pub fn generate(otp: &str, purpose: OtpPurpose, otp_lifetime: Duration) -> String {
        let (otp_part1, otp_part2) = otp.split_at(otp.len() / 2);

        format!(
            "<html>
               <head>
                 <style>
                   body {{
                     font-family: Arial, sans-serif;
                     text-align: center;
                   }}
                 </style>
               </head>
             <body>
               <h1>Susu Verification Code</h1>
               <p>Use this code to {}.</p>
               <h2 style=\"font-family: 'Courier New', monospace; user-select: all; \
               -webkit-user-select: all;\"><b>{} {}</b></h2>
               <p>We will never ask you for this code over the phone or email. \
               <b>Your code expires in {} minutes.</b></p>
               <p><i>Didn't ask for a code? You can ignore this email.</i></p>
             </body>
             </html>",
            purpose.description(),
            otp_part1,
            otp_part2,
            otp_lifetime.as_secs() / 60,
        )
    }
}

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// The verification context a code is scoped to. A code issued for one purpose never
/// satisfies another.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    EmailVerification,
    PhoneVerification,
    PasswordReset,
    TwoFactor,
}

impl OtpPurpose {
    pub const ALL: [OtpPurpose; 4] = [
        OtpPurpose::EmailVerification,
        OtpPurpose::PhoneVerification,
        OtpPurpose::PasswordReset,
        OtpPurpose::TwoFactor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::EmailVerification => "email_verification",
            OtpPurpose::PhoneVerification => "phone_verification",
            OtpPurpose::PasswordReset => "password_reset",
            OtpPurpose::TwoFactor => "two_factor",
        }
    }

    /// Human-readable wording used in delivered messages.
    pub fn description(&self) -> &'static str {
        match self {
            OtpPurpose::EmailVerification => "verify your email address",
            OtpPurpose::PhoneVerification => "verify your phone number",
            OtpPurpose::PasswordReset => "reset your password",
            OtpPurpose::TwoFactor => "finish signing in",
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnknownPurpose;

impl std::error::Error for UnknownPurpose {}

impl fmt::Display for UnknownPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown OTP purpose")
    }
}

impl FromStr for OtpPurpose {
    type Err = UnknownPurpose;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email_verification" => Ok(OtpPurpose::EmailVerification),
            "phone_verification" => Ok(OtpPurpose::PhoneVerification),
            "password_reset" => Ok(OtpPurpose::PasswordReset),
            "two_factor" => Ok(OtpPurpose::TwoFactor),
            _ => Err(UnknownPurpose),
        }
    }
}

impl ToSql<Text, Pg> for OtpPurpose {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for OtpPurpose {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        let value = std::str::from_utf8(bytes.as_bytes())?;
        value
            .parse()
            .map_err(|_| format!("Unrecognized OTP purpose '{value}'").into())
    }
}

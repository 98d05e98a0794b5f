use base64::engine::general_purpose::STANDARD as b64;
use base64::Engine;
use lettre::message::Mailbox;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use susu_common::otp::hasher::MIN_OTP_HASHING_KEY_LEN;
use susu_common::otp::{OtpSettings, OTP_LENGTH, OTP_MAX_ATTEMPTS};
use zeroize::{Zeroize, ZeroizeOnDrop};

const DB_USERNAME_VAR: &str = "SUSU_DB_USERNAME";
const DB_PASSWORD_VAR: &str = "SUSU_DB_PASSWORD";
const DB_HOSTNAME_VAR: &str = "SUSU_DB_HOSTNAME";
const DB_PORT_VAR: &str = "SUSU_DB_PORT";
const DB_NAME_VAR: &str = "SUSU_DB_NAME";
const DB_MAX_CONNECTIONS_VAR: &str = "SUSU_DB_MAX_CONNECTIONS";

const OTP_HASHING_KEY_VAR: &str = "SUSU_OTP_HASHING_KEY_B64";
const OTP_LIFETIME_MINS_VAR: &str = "SUSU_OTP_LIFETIME_MINS";
const OTP_RESEND_COOLDOWN_SECS_VAR: &str = "SUSU_OTP_RESEND_COOLDOWN_SECS";

const EMAIL_ENABLED_VAR: &str = "SUSU_EMAIL_ENABLED";
const EMAIL_FROM_ADDR_VAR: &str = "SUSU_EMAIL_FROM_ADDR";
const EMAIL_REPLY_TO_ADDR_VAR: &str = "SUSU_EMAIL_REPLY_TO_ADDR";
const SMTP_ADDRESS_VAR: &str = "SUSU_SMTP_ADDRESS";
const SMTP_USERNAME_VAR: &str = "SUSU_SMTP_USERNAME";
const SMTP_PASSWORD_VAR: &str = "SUSU_SMTP_PASSWORD";
const SMS_ENABLED_VAR: &str = "SUSU_SMS_ENABLED";

const HEALTH_ENDPOINT_KEY_VAR: &str = "SUSU_HEALTH_ENDPOINT_KEY";
const ACTIX_WORKER_COUNT_VAR: &str = "SUSU_ACTIX_WORKER_COUNT";
const LOG_LEVEL_VAR: &str = "SUSU_LOG_LEVEL";

#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Config {
    pub db_username: String,
    pub db_password: String,
    pub db_hostname: String,
    #[zeroize(skip)]
    pub db_port: u16,
    pub db_name: String,
    #[zeroize(skip)]
    pub db_max_connections: u32,

    pub otp_hashing_key: Vec<u8>,
    #[zeroize(skip)]
    pub otp_lifetime: Duration,
    #[zeroize(skip)]
    pub otp_resend_cooldown: Duration,

    #[zeroize(skip)]
    pub email_enabled: bool,
    #[zeroize(skip)]
    pub email_from_address: Mailbox,
    #[zeroize(skip)]
    pub email_reply_to_address: Mailbox,
    pub smtp_address: String,
    pub smtp_username: String,
    pub smtp_password: String,
    #[zeroize(skip)]
    pub sms_enabled: bool,

    pub health_endpoint_key: String,
    #[zeroize(skip)]
    pub actix_worker_count: usize,
    #[zeroize(skip)]
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let otp_hashing_key = b64
            .decode(vars.get::<String>(OTP_HASHING_KEY_VAR)?.as_bytes())
            .map_err(|_| ConfigError::InvalidVar(OTP_HASHING_KEY_VAR))?;
        if otp_hashing_key.len() < MIN_OTP_HASHING_KEY_LEN {
            return Err(ConfigError::InvalidVar(OTP_HASHING_KEY_VAR));
        }

        let otp_lifetime_mins: u64 = vars.get_or(OTP_LIFETIME_MINS_VAR, 10);
        if otp_lifetime_mins == 0 {
            return Err(ConfigError::InvalidVar(OTP_LIFETIME_MINS_VAR));
        }

        let email_enabled: bool = if cfg!(test) {
            false
        } else {
            vars.get(EMAIL_ENABLED_VAR)?
        };

        let email_from_address: Mailbox = vars
            .get::<String>(EMAIL_FROM_ADDR_VAR)?
            .parse()
            .map_err(|_| ConfigError::InvalidVar(EMAIL_FROM_ADDR_VAR))?;
        let email_reply_to_address: Mailbox = vars
            .get::<String>(EMAIL_REPLY_TO_ADDR_VAR)?
            .parse()
            .map_err(|_| ConfigError::InvalidVar(EMAIL_REPLY_TO_ADDR_VAR))?;

        // The relay is only needed when mail actually goes out
        let smtp_var = |key: &'static str| -> Result<String, ConfigError> {
            if email_enabled {
                vars.get(key)
            } else {
                Ok(vars.get_or(key, String::new()))
            }
        };

        Ok(Config {
            db_username: vars.get(DB_USERNAME_VAR)?,
            db_password: vars.get(DB_PASSWORD_VAR)?,
            db_hostname: vars.get(DB_HOSTNAME_VAR)?,
            db_port: vars.get(DB_PORT_VAR)?,
            db_name: vars.get(DB_NAME_VAR)?,
            db_max_connections: vars.get_or(DB_MAX_CONNECTIONS_VAR, 48),

            otp_hashing_key,
            otp_lifetime: Duration::from_secs(otp_lifetime_mins * 60),
            otp_resend_cooldown: Duration::from_secs(vars.get_or(OTP_RESEND_COOLDOWN_SECS_VAR, 60)),

            email_enabled,
            email_from_address,
            email_reply_to_address,
            smtp_address: smtp_var(SMTP_ADDRESS_VAR)?,
            smtp_username: smtp_var(SMTP_USERNAME_VAR)?,
            smtp_password: smtp_var(SMTP_PASSWORD_VAR)?,
            sms_enabled: vars.get_or(SMS_ENABLED_VAR, false),

            health_endpoint_key: vars.get(HEALTH_ENDPOINT_KEY_VAR)?,
            actix_worker_count: vars.get_or(ACTIX_WORKER_COUNT_VAR, num_cpus::get()),
            log_level: vars.get_or(LOG_LEVEL_VAR, String::from("info")),
        })
    }

    pub fn database_uri(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_username, self.db_password, self.db_hostname, self.db_port, self.db_name,
        )
    }

    pub fn otp_settings(&self) -> OtpSettings {
        OtpSettings {
            length: OTP_LENGTH,
            lifetime: self.otp_lifetime,
            resend_cooldown: self.otp_resend_cooldown,
            max_attempts: OTP_MAX_ATTEMPTS,
        }
    }
}

struct Vars<F: Fn(&str) -> Option<String>>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get<T: FromStr>(&self, key: &'static str) -> Result<T, ConfigError> {
        let var = (self.0)(key).ok_or(ConfigError::missing(key))?;
        let var: T = var.parse().map_err(|_| ConfigError::invalid(key))?;
        Ok(var)
    }

    fn get_or<T: FromStr>(&self, key: &'static str, default: T) -> T {
        let Some(var) = (self.0)(key) else {
            return default;
        };

        var.parse().unwrap_or(default)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    MissingVar(&'static str),
    InvalidVar(&'static str),
}

impl ConfigError {
    fn missing(var_name: &'static str) -> Self {
        Self::MissingVar(var_name)
    }

    fn invalid(var_name: &'static str) -> Self {
        Self::InvalidVar(var_name)
    }
}

impl std::error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVar(key) => write!(f, "Missing environment variable '{}'", key),
            Self::InvalidVar(key) => write!(f, "Environment variable '{}' is invalid", key),
        }
    }
}

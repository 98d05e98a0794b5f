use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

const DB_USERNAME_VAR: &str = "SUSU_DB_USERNAME";
const DB_PASSWORD_VAR: &str = "SUSU_DB_PASSWORD";
const DB_HOSTNAME_VAR: &str = "SUSU_DB_HOSTNAME";
const DB_PORT_VAR: &str = "SUSU_DB_PORT";
const DB_NAME_VAR: &str = "SUSU_DB_NAME";
const DB_MAX_CONNECTIONS_VAR: &str = "SUSU_DB_MAX_CONNECTIONS";

const RUNNER_UPDATE_FREQUENCY_SECS_VAR: &str = "SUSU_RUNNER_UPDATE_FREQUENCY_SECS";
const RUNNER_WORKER_THREADS_VAR: &str = "SUSU_RUNNER_WORKER_THREADS";

const CLEAR_EXPIRED_OTPS_JOB_FREQUENCY_SECS_VAR: &str =
    "SUSU_CLEAR_EXPIRED_OTPS_JOB_FREQUENCY_SECS";

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

    #[zeroize(skip)]
    pub update_frequency: Duration,
    #[zeroize(skip)]
    pub worker_threads: usize,

    #[zeroize(skip)]
    pub clear_expired_otps_job_frequency: Duration,

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

        let update_frequency_secs: u64 = vars.get_or(RUNNER_UPDATE_FREQUENCY_SECS_VAR, 15);
        if update_frequency_secs == 0 {
            return Err(ConfigError::InvalidVar(RUNNER_UPDATE_FREQUENCY_SECS_VAR));
        }

        let worker_threads: usize = vars.get_or(RUNNER_WORKER_THREADS_VAR, num_cpus::get());
        if worker_threads == 0 {
            return Err(ConfigError::InvalidVar(RUNNER_WORKER_THREADS_VAR));
        }

        Ok(Config {
            db_username: vars.get(DB_USERNAME_VAR)?,
            db_password: vars.get(DB_PASSWORD_VAR)?,
            db_hostname: vars.get(DB_HOSTNAME_VAR)?,
            db_port: vars.get(DB_PORT_VAR)?,
            db_name: vars.get(DB_NAME_VAR)?,
            db_max_connections: vars.get_or(DB_MAX_CONNECTIONS_VAR, 4),

            update_frequency: Duration::from_secs(update_frequency_secs),
            worker_threads,

            clear_expired_otps_job_frequency: Duration::from_secs(
                vars.get_or(CLEAR_EXPIRED_OTPS_JOB_FREQUENCY_SECS_VAR, 3600),
            ),

            log_level: vars.get_or(LOG_LEVEL_VAR, String::from("info")),
        })
    }

    pub fn database_uri(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.db_username, self.db_password, self.db_hostname, self.db_port, self.db_name,
        )
    }
}

struct Vars<F: Fn(&str) -> Option<String>>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get<T: FromStr>(&self, key: &'static str) -> Result<T, ConfigError> {
        let var = (self.0)(key).ok_or(ConfigError::MissingVar(key))?;
        var.parse().map_err(|_| ConfigError::InvalidVar(key))
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

impl std::error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVar(key) => write!(f, "Missing environment variable '{}'", key),
            Self::InvalidVar(key) => write!(f, "Environment variable '{}' is invalid", key),
        }
    }
}

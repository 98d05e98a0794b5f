pub mod senders;
pub mod templates;

use async_trait::async_trait;
use std::fmt;

#[derive(Debug)]
pub enum SmsError {
    FailedToSend(String),
}

impl std::error::Error for SmsError {}

impl fmt::Display for SmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmsError::FailedToSend(e) => write!(f, "SmsError: Failed to send: {e}"),
        }
    }
}

#[derive(Debug)]
pub struct SmsMessage<'a> {
    pub body: String,
    pub destination: &'a str,
}

/// Seam for an SMS gateway. Implementations own their transport and credentials.
#[async_trait]
pub trait SendSms: Send + Sync {
    async fn send<'a>(&self, message: SmsMessage<'a>) -> Result<(), SmsError>;
}

pub type SmsSender = Box<dyn SendSms>;

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::sms::{SendSms, SmsError, SmsMessage};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentSms {
    pub destination: String,
    pub body: String,
}

/// Prints messages. Only a sender built with [`MockSmsSender::recording`] keeps them.
#[derive(Clone, Default)]
pub struct MockSmsSender {
    outbox: Option<Arc<Mutex<Vec<SentSms>>>>,
}

impl MockSmsSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recording() -> Self {
        Self {
            outbox: Some(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    pub fn sent(&self) -> Vec<SentSms> {
        match &self.outbox {
            Some(outbox) => outbox.lock().unwrap_or_else(|e| e.into_inner()).clone(),
            None => Vec::new(),
        }
    }
}

#[async_trait]
impl SendSms for MockSmsSender {
    async fn send<'a>(&self, message: SmsMessage<'a>) -> Result<(), SmsError> {
        println!("\n\n{:#?}\n\n", message);

        if let Some(outbox) = &self.outbox {
            outbox
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(SentSms {
                    destination: String::from(message.destination),
                    body: message.body,
                });
        }

        Ok(())
    }
}

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::email::{EmailError, EmailMessage, SendEmail};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentEmail {
    pub destination: String,
    pub subject: String,
    pub body: String,
}

/// Prints messages instead of sending them. Nothing is kept unless the sender was built
/// with [`MockSender::recording`], in which case clones share one outbox so a handle kept
/// before boxing the sender can read what was sent.
#[derive(Clone, Default)]
pub struct MockSender {
    outbox: Option<Arc<Mutex<Vec<SentEmail>>>>,
}

impl MockSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recording() -> Self {
        Self {
            outbox: Some(Arc::new(Mutex::new(Vec::new()))),
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        match &self.outbox {
            Some(outbox) => outbox.lock().unwrap_or_else(|e| e.into_inner()).clone(),
            None => Vec::new(),
        }
    }
}

#[async_trait]
impl SendEmail for MockSender {
    async fn send<'a>(&self, message: EmailMessage<'a>) -> Result<(), EmailError> {
        println!("\n\n{:#?}\n\n", message);

        if let Some(outbox) = &self.outbox {
            outbox
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(SentEmail {
                    destination: String::from(message.destination),
                    subject: String::from(message.subject),
                    body: message.body,
                });
        }

        Ok(())
    }
}

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::email::{EmailError, EmailMessage, SendEmail};

pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpSender {
    /// STARTTLS relay on the submission port with username/password auth.
    pub fn new(relay_address: &str, username: &str, password: &str) -> Result<Self, EmailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(relay_address)
            .map_err(|e| EmailError::RelayConnectionFailed(e.to_string()))?
            .credentials(Credentials::new(
                String::from(username),
                String::from(password),
            ))
            .build();

        Ok(Self { transport })
    }
}

#[async_trait]
impl SendEmail for SmtpSender {
    async fn send<'a>(&self, message: EmailMessage<'a>) -> Result<(), EmailError> {
        let destination: Mailbox = message
            .destination
            .parse()
            .map_err(|_| EmailError::InvalidDestination)?;

        let content_type = if message.is_html {
            ContentType::TEXT_HTML
        } else {
            ContentType::TEXT_PLAIN
        };

        let email = Message::builder()
            .from(message.from)
            .reply_to(message.reply_to)
            .to(destination)
            .subject(message.subject)
            .header(content_type)
            .body(message.body)
            .map_err(EmailError::InvalidMessage)?;

        self.transport
            .send(email)
            .await
            .map_err(EmailError::FailedToSend)?;

        Ok(())
    }
}

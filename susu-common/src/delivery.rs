use lettre::message::Mailbox;
use std::fmt;
use std::time::Duration;

use crate::email::templates::OtpMessage;
use crate::email::{EmailError, EmailMessage, EmailSender};
use crate::otp::OtpPurpose;
use crate::sms::templates::OtpText;
use crate::sms::{SmsError, SmsMessage, SmsSender};
use crate::validators::Identifier;

#[derive(Debug)]
pub enum DeliveryError {
    Email(EmailError),
    Sms(SmsError),
    SmsDisabled,
}

impl std::error::Error for DeliveryError {}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::Email(e) => write!(f, "DeliveryError: {e}"),
            DeliveryError::Sms(e) => write!(f, "DeliveryError: {e}"),
            DeliveryError::SmsDisabled => write!(f, "DeliveryError: SMS delivery is disabled"),
        }
    }
}

impl From<EmailError> for DeliveryError {
    fn from(error: EmailError) -> Self {
        DeliveryError::Email(error)
    }
}

impl From<SmsError> for DeliveryError {
    fn from(error: SmsError) -> Self {
        DeliveryError::Sms(error)
    }
}

/// Renders an issued code for its channel and hands it to the matching sender.
pub struct OtpDispatcher {
    email_sender: EmailSender,
    sms_sender: Option<SmsSender>,
    from: Mailbox,
    reply_to: Mailbox,
    otp_lifetime: Duration,
}

impl OtpDispatcher {
    pub fn new(
        email_sender: EmailSender,
        sms_sender: Option<SmsSender>,
        from: Mailbox,
        reply_to: Mailbox,
        otp_lifetime: Duration,
    ) -> Self {
        Self {
            email_sender,
            sms_sender,
            from,
            reply_to,
            otp_lifetime,
        }
    }

    pub fn can_deliver_to(&self, identifier: &Identifier) -> bool {
        match identifier {
            Identifier::Email(_) => true,
            Identifier::Phone(_) => self.sms_sender.is_some(),
        }
    }

    pub async fn deliver(
        &self,
        identifier: &Identifier,
        purpose: OtpPurpose,
        otp: &str,
    ) -> Result<(), DeliveryError> {
        match identifier {
            Identifier::Email(email) => {
                let message = EmailMessage {
                    body: OtpMessage::generate(otp, purpose, self.otp_lifetime),
                    subject: OtpMessage::subject(purpose),
                    from: self.from.clone(),
                    reply_to: self.reply_to.clone(),
                    destination: email,
                    is_html: true,
                };

                self.email_sender.send(message).await?;
            }
            Identifier::Phone(phone) => {
                let Some(sms_sender) = &self.sms_sender else {
                    return Err(DeliveryError::SmsDisabled);
                };

                let message = SmsMessage {
                    body: OtpText::generate(otp, purpose, self.otp_lifetime),
                    destination: phone,
                };

                sms_sender.send(message).await?;
            }
        }

        Ok(())
    }
}

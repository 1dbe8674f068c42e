//! Outbound email.
//!
//! [`Mailer::Smtp`] delivers through `lettre`, [`Mailer::Log`] only writes
//! the message to the log (local development), and [`Mailer::Memory`]
//! keeps every message in an [`Outbox`] for tests to inspect.

use std::sync::{Arc, Mutex};

use lettre::{
    Message, SmtpTransport, Transport,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

#[derive(Error, Debug)]
pub enum MailError {
    #[error("bad address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("smtp: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("delivery task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Messages captured by [`Mailer::Memory`].
#[derive(Clone, Default)]
pub struct Outbox(Arc<Mutex<Vec<Mail>>>);

impl Outbox {
    pub fn sent(&self) -> Vec<Mail> {
        self.0.lock().map(|mails| mails.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut mails) = self.0.lock() {
            mails.clear();
        }
    }

    fn push(&self, mail: Mail) {
        if let Ok(mut mails) = self.0.lock() {
            mails.push(mail);
        }
    }
}

#[derive(Clone)]
pub enum Mailer {
    Smtp { transport: SmtpTransport, from: Mailbox },
    Log,
    Memory(Outbox),
}

impl Mailer {
    pub fn from_config(config: &Config) -> Result<Mailer, MailError> {
        let Some(host) = &config.smtp_host else {
            tracing::warn!("SMTP_HOST not set, notification emails will only be logged");
            return Ok(Mailer::Log);
        };

        let transport = match (&config.smtp_username, &config.smtp_password) {
            (Some(username), Some(password)) => SmtpTransport::starttls_relay(host)?
                .port(config.smtp_port)
                .credentials(Credentials::new(username.clone(), password.clone()))
                .build(),
            _ => SmtpTransport::builder_dangerous(host)
                .port(config.smtp_port)
                .build(),
        };

        Ok(Mailer::Smtp {
            transport,
            from: config.mail_from.parse()?,
        })
    }

    pub fn memory() -> (Mailer, Outbox) {
        let outbox = Outbox::default();
        (Mailer::Memory(outbox.clone()), outbox)
    }

    pub async fn send(&self, mail: Mail) -> Result<(), MailError> {
        match self {
            Mailer::Smtp { transport, from } => {
                let mut builder = Message::builder()
                    .from(from.clone())
                    .to(mail.to.parse()?)
                    .subject(&mail.subject)
                    .header(ContentType::TEXT_PLAIN);
                if let Some(reply_to) = &mail.reply_to {
                    builder = builder.reply_to(reply_to.parse()?);
                }
                let message = builder.body(mail.body)?;

                let transport = transport.clone();
                tokio::task::spawn_blocking(move || transport.send(&message)).await??;
                tracing::info!(to = %mail.to, subject = %mail.subject, "mail sent");
            }
            Mailer::Log => {
                tracing::info!(
                    to = %mail.to,
                    subject = %mail.subject,
                    body = %mail.body,
                    "mail (not sent)"
                );
            }
            Mailer::Memory(outbox) => outbox.push(mail),
        }
        Ok(())
    }
}

/// Notification delivery.
///
/// `Notifier` is the seam the monitor sends through: one subject, one body,
/// one recipient, one attempt. Any error means the message is unconfirmed
/// and the caller must not act as if it was delivered.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use serde::Serialize;
use tracing::info;

use crate::config::NotifyConfig;
use crate::model::NotifyError;

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Delivers notifications to a recipient.
pub trait Notifier {
    fn send(&self, notification: &Notification, recipient: &str) -> Result<(), NotifyError>;

    /// Human-readable channel name for logs (e.g. "email").
    fn channel_name(&self) -> &str;
}

/// Build the notifier for this run. Dry runs log instead of sending.
pub fn build_notifier(config: &NotifyConfig, dry_run: bool) -> Result<Box<dyn Notifier>, NotifyError> {
    if dry_run {
        return Ok(Box::new(LogNotifier));
    }
    if config.recipient.trim().is_empty() {
        return Err(NotifyError::Config(
            "no recipient configured (set RAINMON_RECIPIENT or [notify].recipient)".to_string(),
        ));
    }
    Ok(Box::new(EmailNotifier::from_config(config)?))
}

// ---------------------------------------------------------------------------
// SMTP
// ---------------------------------------------------------------------------

/// Sends notifications as plain-text email over SMTP.
pub struct EmailNotifier {
    transport: SmtpTransport,
    from: Mailbox,
}

impl EmailNotifier {
    /// Port 465 uses implicit TLS; other ports use STARTTLS unless `smtp_tls`
    /// is off. Credentials are attached only when both username and
    /// password are present.
    pub fn from_config(config: &NotifyConfig) -> Result<Self, NotifyError> {
        if config.smtp_host.trim().is_empty() {
            return Err(NotifyError::Config(
                "SMTP host not configured (set SMTP_HOST or [notify].smtp_host)".to_string(),
            ));
        }

        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Address(e.to_string()))?;

        let host = config.smtp_host.as_str();
        let port = config.smtp_port.unwrap_or(if config.smtp_tls { 587 } else { 25 });

        let mut builder = if port == 465 {
            SmtpTransport::relay(host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else if config.smtp_tls {
            SmtpTransport::starttls_relay(host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else {
            SmtpTransport::builder_dangerous(host).port(port)
        };

        if let (Some(user), Some(pass)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

impl Notifier for EmailNotifier {
    fn send(&self, notification: &Notification, recipient: &str) -> Result<(), NotifyError> {
        let to: Mailbox = recipient
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Address(e.to_string()))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&notification.subject)
            .body(notification.body.clone())
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        self.transport
            .send(&email)
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        info!(channel = "email", subject = %notification.subject, "notification delivered");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

/// Logs notifications instead of delivering them. Always succeeds.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, notification: &Notification, recipient: &str) -> Result<(), NotifyError> {
        info!(
            channel = "log",
            recipient = %recipient,
            subject = %notification.subject,
            body = %notification.body,
            "dry run: notification not sent"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}

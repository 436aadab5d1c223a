use anyhow::{Context, Result};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use serde::Deserialize;

use crate::settings::Settings;

pub const ALERT_SUBJECT: &str = "Medication Missed Alert";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlertRequest {
    pub user_email: Option<String>,
    pub caretaker_email: Option<String>,
    pub medicine_name: Option<String>,
}

/// A validated missed-dose alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissedDoseAlert {
    pub user_email: String,
    pub caretaker_email: String,
    pub medicine_name: String,
}

impl AlertRequest {
    /// True for a body that carried none of the alert fields, such as `{}`.
    pub fn is_empty(&self) -> bool {
        self.user_email.is_none() && self.caretaker_email.is_none() && self.medicine_name.is_none()
    }

    /// Every field must be present and non-empty. Whitespace counts as a value.
    pub fn validate(self) -> Option<MissedDoseAlert> {
        let present = |value: Option<String>| value.filter(|value| !value.is_empty());
        Some(MissedDoseAlert {
            user_email: present(self.user_email)?,
            caretaker_email: present(self.caretaker_email)?,
            medicine_name: present(self.medicine_name)?,
        })
    }
}

impl MissedDoseAlert {
    pub fn body(&self) -> String {
        format!(
            "The patient has postponed or skipped the medicine [{}] three consecutive times.",
            self.medicine_name
        )
    }
}

pub trait Mailer: Send + Sync {
    fn send(&self, from: &str, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// STARTTLS relay with login credentials.
pub struct SmtpMailer {
    server: String,
    port: u16,
    user: String,
    password: String,
}

impl SmtpMailer {
    /// `None` when no credentials are configured; alerts are then simulated.
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let (user, password) = settings.smtp_credentials()?;
        Some(Self {
            server: settings.smtp_server.clone(),
            port: settings.smtp_port,
            user: user.to_string(),
            password: password.to_string(),
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, from: &str, to: &str, subject: &str, body: &str) -> Result<()> {
        let email = Message::builder()
            .from(from.parse::<Mailbox>().with_context(|| format!("invalid sender: {}", from))?)
            .to(to.parse::<Mailbox>().with_context(|| format!("invalid recipient: {}", to))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .with_context(|| "failed to build alert email")?;
        let transport = SmtpTransport::starttls_relay(&self.server)
            .with_context(|| format!("failed to configure SMTP relay: {}", self.server))?
            .port(self.port)
            .credentials(Credentials::new(self.user.clone(), self.password.clone()))
            .build();
        transport
            .send(&email)
            .with_context(|| format!("failed to send alert via {}:{}", self.server, self.port))?;
        Ok(())
    }
}

/// Sends the alert from `sender` to the caretaker.
pub fn send_missed_dose_alert(
    mailer: &dyn Mailer,
    sender: &str,
    alert: &MissedDoseAlert,
) -> Result<()> {
    mailer.send(sender, &alert.caretaker_email, ALERT_SUBJECT, &alert.body())
}

//! Outbound mail for the password-reset flow.
//!
//! [`SmtpMailer`] delivers through an SMTP relay with `lettre`. When no
//! `SMTP_HOST` is configured, [`LogMailer`] writes the code and link to the
//! log instead so the flow stays usable in development.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use crate::config::Config;

/// Password-reset email: one-time code plus reset link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetMail {
    pub to: String,
    pub username: String,
    pub otp: String,
    pub reset_url: String,
}

impl ResetMail {
    pub const SUBJECT: &'static str = "Your password reset OTP";

    pub fn html_body(&self) -> String {
        format!(
            concat!(
                "<p>Hi {username},</p>\n",
                "<p>Use this OTP to reset your password (valid for 10 minutes):</p>\n",
                "<p style=\"font-size:20px;font-weight:700;letter-spacing:3px\">{otp}</p>\n",
                "<p>Or click the link to reset without OTP (valid for 1 hour):</p>\n",
                "<p><a href=\"{url}\">{url}</a></p>\n",
                "<p>If you didn't request this, you can ignore this email.</p>\n",
            ),
            username = html_escape::encode_text(&self.username),
            otp = self.otp,
            url = html_escape::encode_double_quoted_attribute(&self.reset_url),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("smtp transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_reset(&self, mail: &ResetMail) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Port 465 uses implicit TLS; any other port upgrades with STARTTLS.
    /// Credentials are only sent when both user and password are set.
    pub fn new(
        host: &str,
        port: u16,
        user: Option<&str>,
        pass: Option<&str>,
        from: &str,
    ) -> Result<Self, MailError> {
        // The pooled transport spawns on build, so reject a bad sender first.
        let from: Mailbox = from.parse()?;

        let builder = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        };
        let mut builder = builder.port(port);

        if let (Some(user), Some(pass)) = (user, pass) {
            builder = builder.credentials(Credentials::new(user.to_owned(), pass.to_owned()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_reset(&self, mail: &ResetMail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(mail.to.parse()?)
            .subject(ResetMail::SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(mail.html_body())?;

        self.transport.send(message).await?;
        tracing::info!(to = %mail.to, "Password reset email sent");
        Ok(())
    }
}

/// Development fallback: logs the reset link and code.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_reset(&self, mail: &ResetMail) -> Result<(), MailError> {
        tracing::info!(
            to = %mail.to,
            reset_url = %mail.reset_url,
            otp = %mail.otp,
            "SMTP not configured; password reset details"
        );
        Ok(())
    }
}

/// Pick the transport from configuration.
pub fn from_config(config: &Config) -> Result<Arc<dyn Mailer>, MailError> {
    match config.smtp_host.as_deref().filter(|host| !host.is_empty()) {
        Some(host) => {
            let mailer = SmtpMailer::new(
                host,
                config.smtp_port,
                config.smtp_user.as_deref(),
                config.smtp_pass.as_deref(),
                &config.smtp_from,
            )?;
            tracing::info!(host, port = config.smtp_port, "SMTP mailer configured");
            Ok(Arc::new(mailer))
        }
        None => {
            tracing::warn!("SMTP_HOST not set; reset emails will be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

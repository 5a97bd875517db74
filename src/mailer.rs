use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::EmailConfig;

/// Outbound email dispatch. A black box that may fail; callers decide how
/// a failure propagates.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()>;
}

/// SMTP-backed mailer.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: lettre::message::Mailbox,
}

impl SmtpMailer {
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let from = format!("{} <{}>", config.from_name, config.from_address)
            .parse()
            .context("Invalid from address")?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .context("Failed to create SMTP transport")?
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .port(config.smtp_port)
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(to.parse().context("Invalid to address")?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .context("Failed to build email")?;

        self.transport
            .send(email)
            .await
            .context("SMTP send failed")?;

        info!("Email sent to {to}");
        Ok(())
    }
}

/// Mailer used when outbound email is disabled: logs the dispatch and
/// records it for inspection in tests.
#[derive(Default)]
pub struct LogMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<()> {
        info!("Email delivery disabled; would send '{subject}' to {to}");
        self.sent
            .lock()
            .await
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

/// HTML body for the password reset email.
#[must_use]
pub fn password_reset_email(reset_url: &str) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2 style="color: #333;">Password Reset Request</h2>
    <p style="color: #666; line-height: 1.6;">
        You requested to reset your password. Click the button below to proceed:
    </p>
    <div style="text-align: center; margin: 30px 0;">
        <a href="{reset_url}"
           style="display: inline-block; padding: 12px 24px; background-color: #007bff;
                  color: white; text-decoration: none; border-radius: 4px; font-weight: bold;">
            Reset Password
        </a>
    </div>
    <p style="color: #666; line-height: 1.6;">
        Or copy and paste this link in your browser:
    </p>
    <p style="background-color: #f5f5f5; padding: 10px; border-radius: 4px; word-break: break-all;">
        <a href="{reset_url}" style="color: #007bff;">{reset_url}</a>
    </p>
    <p style="color: #999; font-size: 14px; margin-top: 30px;">
        <strong>This link will expire in 1 hour.</strong>
    </p>
    <p style="color: #999; font-size: 14px;">
        If you didn't request this, please ignore this email.
    </p>
</div>"#
    )
}

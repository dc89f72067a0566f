use crate::config::Settings;
use crate::domain::period::Period;
use anyhow::{Context, Result};
use chrono::Local;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::path::Path;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// SMTP delivery of finished reports. Only built when sender, password and recipient are all set.
#[derive(Debug, Clone)]
pub struct Mailer {
    sender: Mailbox,
    recipient: Mailbox,
    username: String,
    password: String,
    smtp_server: String,
    smtp_port: u16,
}

impl Mailer {
    pub fn from_settings(settings: &Settings) -> Result<Option<Self>> {
        let (Some(sender), Some(password), Some(recipient)) = (
            settings.email_sender.as_deref(),
            settings.email_password.as_deref(),
            settings.email_recipient.as_deref(),
        ) else {
            tracing::info!("email credentials incomplete; delivery disabled");
            return Ok(None);
        };

        Ok(Some(Self {
            sender: sender
                .parse::<Mailbox>()
                .with_context(|| format!("EMAIL_SENDER is not a valid address: {sender}"))?,
            recipient: recipient
                .parse::<Mailbox>()
                .with_context(|| format!("EMAIL_RECIPIENT is not a valid address: {recipient}"))?,
            username: sender.to_string(),
            password: password.to_string(),
            smtp_server: settings.smtp_server.clone(),
            smtp_port: settings.smtp_port,
        }))
    }

    pub fn build_message(&self, report_path: &Path, period: Period) -> Result<Message> {
        let now = Local::now();
        let filename = report_path
            .file_name()
            .and_then(|s| s.to_str())
            .context("report path has no file name")?
            .to_string();
        let bytes = std::fs::read(report_path)
            .with_context(|| format!("failed to read report {}", report_path.display()))?;

        let body = render_body(period, &now.format("%Y-%m-%d at %H:%M:%S").to_string());
        let content_type = ContentType::parse(XLSX_CONTENT_TYPE).context("invalid xlsx content type")?;

        Message::builder()
            .from(self.sender.clone())
            .to(self.recipient.clone())
            .subject(subject(period, &now.format("%Y-%m-%d").to_string()))
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::html(body))
                    .singlepart(Attachment::new(filename).body(bytes, content_type)),
            )
            .context("failed to build report email")
    }

    pub async fn send_report(&self, report_path: &Path, period: Period) -> Result<()> {
        tracing::info!(%period, path = %report_path.display(), "sending report email");
        let message = self.build_message(report_path, period)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp_server)
            .with_context(|| format!("invalid SMTP relay {}", self.smtp_server))?
            .port(self.smtp_port)
            .credentials(Credentials::new(self.username.clone(), self.password.clone()))
            .build();

        transport
            .send(message)
            .await
            .with_context(|| format!("SMTP delivery via {} failed", self.smtp_server))?;

        tracing::info!(recipient = %self.recipient, "report email sent");
        Ok(())
    }
}

fn subject(period: Period, date: &str) -> String {
    format!("Google Trends {} Report - {date}", period.label())
}

fn render_body(period: Period, generated_at: &str) -> String {
    format!(
        "<html>\n<body>\n\
         <h2>Google Trends Report</h2>\n\
         <p>Please find attached the {period} Google Trends report.</p>\n\
         <p>This report includes:</p>\n\
         <ul>\n\
         <li>Top trending searches for the past day, week, and month</li>\n\
         <li>Stock market and trading related search trends</li>\n\
         <li>Related queries and rising search terms</li>\n\
         </ul>\n\
         <p>This report was automatically generated on {generated_at}.</p>\n\
         <p>Regards,<br>Google Trends Tracker</p>\n\
         </body>\n</html>\n"
    )
}

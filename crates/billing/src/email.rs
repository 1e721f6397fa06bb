//! Invoice email notifications
//!
//! Sends transactional emails via Resend API when a recurring invoice is
//! generated.

use rust_decimal::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::BillingResult;

/// Email configuration
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Resend API key
    pub resend_api_key: String,
    /// From address for emails
    pub email_from: String,
    /// App name for branding
    pub app_name: String,
    /// Dashboard URL
    pub dashboard_url: String,
}

impl EmailConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self {
            resend_api_key: std::env::var("RESEND_API_KEY").unwrap_or_default(),
            email_from: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Opsbooks <billing@opsbooks.app>".to_string()),
            app_name: std::env::var("APP_NAME").unwrap_or_else(|_| "Opsbooks".to_string()),
            dashboard_url: std::env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "https://opsbooks.app".to_string()),
        }
    }

    /// Check if email sending is enabled
    pub fn is_enabled(&self) -> bool {
        !self.resend_api_key.is_empty()
    }
}

/// Invoice email notification service
#[derive(Clone)]
pub struct InvoiceEmailService {
    config: EmailConfig,
    client: reqwest::Client,
}

impl InvoiceEmailService {
    /// Create a new email service
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::new(EmailConfig::from_env())
    }

    /// Send an email via Resend API
    ///
    /// Returns `Ok(true)` if the email was sent successfully,
    /// `Ok(false)` if sending failed (non-fatal - doesn't propagate
    /// error). Invoice generation must never fail on a notification
    /// error, so callers can ignore the flag.
    async fn send_email(&self, to: &str, subject: &str, html: &str) -> BillingResult<bool> {
        if !self.config.is_enabled() {
            tracing::warn!(
                to = %to,
                subject = %subject,
                "Email not configured, skipping"
            );
            return Ok(false);
        }

        let body = serde_json::json!({
            "from": self.config.email_from,
            "to": [to],
            "subject": subject,
            "html": html
        });

        let response = self
            .client
            .post("https://api.resend.com/emails")
            .header(
                "Authorization",
                format!("Bearer {}", self.config.resend_api_key),
            )
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(to = %to, subject = %subject, "Invoice email sent");
                Ok(true)
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                tracing::error!(
                    to = %to,
                    subject = %subject,
                    status = %status,
                    body = %body,
                    "Failed to send invoice email - non-fatal"
                );
                Ok(false)
            }
            Err(e) => {
                tracing::error!(
                    to = %to,
                    subject = %subject,
                    error = %e,
                    "Failed to send invoice email - non-fatal"
                );
                Ok(false)
            }
        }
    }

    /// Notify a subscriber that their recurring invoice is ready.
    ///
    /// `item_lines` carries one pre-rendered description per invoice
    /// item; `payment_link` may be absent when the gateway degraded.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_invoice_notification(
        &self,
        to: &str,
        invoice_id: Uuid,
        amount: Decimal,
        currency: &str,
        due_date: OffsetDateTime,
        item_lines: &[String],
        payment_link: Option<&str>,
    ) -> BillingResult<bool> {
        let subject = format!("Your {} invoice is ready", self.config.app_name);

        let items_html: String = item_lines
            .iter()
            .map(|line| format!("<li>{}</li>", line))
            .collect();

        let due = due_date.date();
        let due_formatted = format!("{:04}-{:02}-{:02}", due.year(), u8::from(due.month()), due.day());

        let pay_section = match payment_link {
            Some(link) => format!(
                r#"<p><a href="{}" style="background:#1a56db;color:#fff;padding:10px 18px;border-radius:6px;text-decoration:none;">Pay now</a></p>"#,
                link
            ),
            None => format!(
                r#"<p>Visit your <a href="{}/billing">billing dashboard</a> to complete payment.</p>"#,
                self.config.dashboard_url
            ),
        };

        let html = format!(
            r#"<h2>Invoice {invoice_id}</h2>
<p>Your subscription invoice of <strong>{currency} {amount:.2}</strong> is due on <strong>{due}</strong>.</p>
<ul>{items}</ul>
{pay_section}
<p>The {app_name} team</p>"#,
            invoice_id = invoice_id,
            currency = currency,
            amount = amount,
            due = due_formatted,
            items = items_html,
            pay_section = pay_section,
            app_name = self.config.app_name,
        );

        self.send_email(to, &subject, &html).await
    }
}

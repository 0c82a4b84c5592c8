//! Passcode email dispatchers
//!
//! `HttpEmailDispatcher` invokes the backend's `send-otp-email` function over
//! HTTP; `ConsoleDispatcher` only logs, for local runs.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::traits::PasscodeDispatcher;
use crate::models::transfer_types::TransferSummary;

/// Rendered passcode message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasscodeEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl PasscodeEmail {
    pub fn render(address: &str, code: &str, summary: &TransferSummary, valid_for: Duration) -> Self {
        let minutes = (valid_for.as_secs() / 60).max(1);
        let body = format!(
            "Your transfer verification code is {code}.\n\n\
             Amount: {amount}\n\
             Recipient: {recipient}\n\
             Bank: {bank} ({account})\n\n\
             This code expires in {minutes} minutes. Never share this code with anyone.\n\
             If you did not request this transfer, contact support immediately.",
            code = code,
            amount = summary.amount,
            recipient = summary.recipient,
            bank = summary.bank_name,
            account = summary.account_hint,
            minutes = minutes,
        );

        Self {
            to: address.to_string(),
            subject: "Your Transfer OTP Code".to_string(),
            body,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendOtpPayload<'a> {
    email: &'a str,
    otp: &'a str,
    transfer_data: &'a TransferSummary,
    subject: &'a str,
    text: &'a str,
}

/// Posts `{email, otp, transferData}` to the email function endpoint
pub struct HttpEmailDispatcher {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    valid_for: Duration,
}

impl HttpEmailDispatcher {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, valid_for: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build email HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
            valid_for,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PasscodeDispatcher for HttpEmailDispatcher {
    async fn send(&self, address: &str, code: &str, summary: &TransferSummary) -> Result<()> {
        let email = PasscodeEmail::render(address, code, summary, self.valid_for);
        let payload = SendOtpPayload {
            email: address,
            otp: code,
            transfer_data: summary,
            subject: &email.subject,
            text: &email.body,
        };

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach email endpoint {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Email endpoint returned {}: {}", status, body);
        }

        log::info!("Passcode email dispatched to {}", address);
        Ok(())
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Logs the rendered email instead of sending it
#[derive(Debug, Default)]
pub struct ConsoleDispatcher {
    valid_for: Duration,
}

impl ConsoleDispatcher {
    pub fn new(valid_for: Duration) -> Self {
        Self { valid_for }
    }
}

#[async_trait]
impl PasscodeDispatcher for ConsoleDispatcher {
    async fn send(&self, address: &str, code: &str, summary: &TransferSummary) -> Result<()> {
        let email = PasscodeEmail::render(address, code, summary, self.valid_for);
        log::info!("To: {}\nSubject: {}\n\n{}", email.to, email.subject, email.body);
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn summary() -> TransferSummary {
        TransferSummary {
            amount: Decimal::new(10_000, 2),
            recipient: "Jane Doe".to_string(),
            bank_name: "First Bank".to_string(),
            account_hint: "****6789".to_string(),
        }
    }

    #[test]
    fn test_render_contains_code_and_summary() {
        let email = PasscodeEmail::render("jane@bank.test", "482913", &summary(), Duration::from_secs(180));

        assert_eq!(email.to, "jane@bank.test");
        assert!(email.body.contains("482913"));
        assert!(email.body.contains("100.00"));
        assert!(email.body.contains("****6789"));
        assert!(email.body.contains("expires in 3 minutes"));
    }

    #[test]
    fn test_payload_json_shape() {
        let s = summary();
        let payload = SendOtpPayload {
            email: "jane@bank.test",
            otp: "482913",
            transfer_data: &s,
            subject: "s",
            text: "t",
        };
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["email"], "jane@bank.test");
        assert_eq!(json["otp"], "482913");
        assert_eq!(json["transferData"]["recipient"], "Jane Doe");
    }

    #[tokio::test]
    async fn test_console_dispatcher_succeeds() {
        let dispatcher = ConsoleDispatcher::new(Duration::from_secs(180));
        assert!(dispatcher.send("jane@bank.test", "123456", &summary()).await.is_ok());
        assert_eq!(dispatcher.name(), "console");
    }

    #[tokio::test]
    async fn test_http_dispatcher_unreachable_endpoint_fails() {
        let dispatcher = HttpEmailDispatcher::new(
            "http://127.0.0.1:9/functions/v1/send-otp-email",
            None,
            Duration::from_secs(180),
        )
        .unwrap();
        assert_eq!(dispatcher.endpoint(), "http://127.0.0.1:9/functions/v1/send-otp-email");

        assert!(dispatcher.send("jane@bank.test", "123456", &summary()).await.is_err());
    }
}

//! Client for the transactional email provider.
//! Speaks the Resend-style JSON API: `POST /emails` with a bearer token.

use crate::{configuration::EmailClientSettings, domain::WaitlistEmail};
use anyhow::Context;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, Secret};
use std::time::Duration;

/// Which of the waitlist emails a message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    AdminNotification,
    Welcome,
}

impl EmailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailKind::AdminNotification => "admin_notification",
            EmailKind::Welcome => "welcome",
        }
    }
}

/// A fully rendered email ready to be handed to the provider.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub kind: EmailKind,
    pub recipient: WaitlistEmail,
    pub subject: String,
    pub html_body: String,
}

#[derive(Debug)]
pub struct EmailClient {
    base_url: Url,
    sender: WaitlistEmail,
    sender_name: String,
    http_client: Client,
    authorization_token: Secret<String>,
}

impl EmailClient {
    /// Create a new email client. Every request is bounded by `timeout`.
    pub fn new(
        base_url: Url,
        sender: WaitlistEmail,
        sender_name: String,
        authorization_token: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            sender,
            sender_name,
            http_client,
            authorization_token,
        })
    }

    /// The `from` header, e.g. `LootLook Beta <hello@lootlook.app>`.
    fn from_header(&self) -> String {
        format!("{} <{}>", self.sender_name, self.sender)
    }

    #[tracing::instrument(
        name = "Send email",
        skip(self, message),
        fields(email_kind = message.kind.as_str(), recipient = %message.recipient)
    )]
    pub async fn send_email(&self, message: &EmailMessage) -> Result<(), DeliveryError> {
        let url = self.base_url.join("emails")?;
        let from = self.from_header();
        let request_body = SendEmailRequest {
            from: &from,
            to: message.recipient.as_ref(),
            subject: &message.subject,
            html: &message.html_body,
        };

        self.http_client
            .post(url)
            .bearer_auth(self.authorization_token.expose_secret())
            .json(&request_body)
            .send()
            .await
            .map_err(DeliveryError::Request)?
            .error_for_status()
            .map_err(DeliveryError::Rejected)?;

        tracing::debug!("Email accepted by the provider");
        Ok(())
    }
}

impl TryFrom<&EmailClientSettings> for EmailClient {
    type Error = anyhow::Error;

    fn try_from(config: &EmailClientSettings) -> Result<Self, Self::Error> {
        let base_url = config
            .base_url()
            .context("Email client's base url is invalid")?;
        let sender = config.sender().map_err(anyhow::Error::msg)?;

        Self::new(
            base_url,
            sender,
            config.sender_name.clone(),
            config.authorization_token.clone(),
            config.timeout(),
        )
        .context("Failed to build the email http client")
    }
}

#[derive(Debug, serde::Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Errors from handing a message to the email provider.
#[derive(thiserror::Error)]
pub enum DeliveryError {
    #[error("Email provider url is invalid")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Failed to reach the email provider")]
    Request(#[source] reqwest::Error),
    #[error("Email provider rejected the message")]
    Rejected(#[source] reqwest::Error),
}

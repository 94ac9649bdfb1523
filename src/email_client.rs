use crate::domain::ContactEmail;
use anyhow::Context;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};

/// A fully composed message, ready to be handed to a mail provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: ContactEmail,
    pub to: ContactEmail,
    pub reply_to: ContactEmail,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Something that can deliver an [`OutgoingEmail`].
///
/// Implementations must fail if the provider did not accept the message.
#[async_trait::async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), anyhow::Error>;
}

/// Client for an HTTP mail API speaking the Postmark wire format.
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    authorization_token: Secret<String>,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        authorization_token: Secret<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            authorization_token,
        })
    }

    #[tracing::instrument(
        name = "Sending an email through the mail API",
        skip(self, email),
        fields(reply_to = %email.reply_to)
    )]
    pub async fn send_email(&self, email: &OutgoingEmail) -> Result<(), reqwest::Error> {
        let url = format!("{}/email", self.base_url);
        let request_body = SendEmailRequest {
            from: email.from.as_ref(),
            to: email.to.as_ref(),
            reply_to: email.reply_to.as_ref(),
            subject: &email.subject,
            html_body: &email.html_body,
            text_body: &email.text_body,
        };
        self.http_client
            .post(&url)
            .header(
                "X-Postmark-Server-Token",
                self.authorization_token.expose_secret(),
            )
            .json(&request_body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl MailSender for EmailClient {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), anyhow::Error> {
        self.send_email(email)
            .await
            .context("The mail API did not accept the message")
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    reply_to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
}

use crate::email_client::{MailSender, OutgoingEmail};
use anyhow::Context;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, Secret};

#[derive(serde::Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Plain connection upgraded with STARTTLS (port 587).
    #[default]
    Starttls,
    /// TLS from the first byte (port 465).
    Tls,
    /// No encryption and no credentials. Local relays and tests only.
    None,
}

/// Delivers mail through an SMTP account, e.g. a Gmail app password.
pub struct SmtpClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpClient {
    pub fn new(
        host: &str,
        port: u16,
        username: String,
        password: Secret<String>,
        security: SmtpSecurity,
        timeout: std::time::Duration,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let credentials = Credentials::new(username, password.expose_secret().to_owned());
        let builder = match security {
            SmtpSecurity::Starttls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?.credentials(credentials)
            }
            SmtpSecurity::Tls => {
                AsyncSmtpTransport::<Tokio1Executor>::relay(host)?.credentials(credentials)
            }
            SmtpSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        };
        let transport = builder.port(port).timeout(Some(timeout)).build();
        Ok(Self { transport })
    }
}

pub fn build_message(email: &OutgoingEmail) -> Result<Message, anyhow::Error> {
    let from: Mailbox = email
        .from
        .as_ref()
        .parse()
        .context("The sender address is not a valid mailbox")?;
    let to: Mailbox = email
        .to
        .as_ref()
        .parse()
        .context("The recipient address is not a valid mailbox")?;
    let mut builder = Message::builder().from(from).to(to);
    // The submitter address is repeated in both bodies, so the header is optional.
    match email.reply_to.as_ref().parse::<Mailbox>() {
        Ok(reply_to) => builder = builder.reply_to(reply_to),
        Err(e) => tracing::warn!(
            error = %e,
            reply_to = %email.reply_to,
            "Sending without Reply-To: the address is not a valid mailbox"
        ),
    }
    builder
        .subject(email.subject.as_str())
        .multipart(MultiPart::alternative_plain_html(
            email.text_body.clone(),
            email.html_body.clone(),
        ))
        .context("Failed to build the email message")
}

#[async_trait::async_trait]
impl MailSender for SmtpClient {
    #[tracing::instrument(
        name = "Sending an email over SMTP",
        skip(self, email),
        fields(reply_to = %email.reply_to)
    )]
    async fn send(&self, email: &OutgoingEmail) -> Result<(), anyhow::Error> {
        let message = build_message(email)?;
        self.transport
            .send(message)
            .await
            .context("The SMTP server did not accept the message")?;
        Ok(())
    }
}

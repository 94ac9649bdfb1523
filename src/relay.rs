use crate::captcha::CaptchaVerifier;
use crate::domain::{CaptchaToken, ContactEmail, Submission, SubmissionError, SubmissionForm};
use crate::email_client::{MailSender, OutgoingEmail};
use crate::routes::error_chain_fmt;
use anyhow::Context;
use std::fmt::Formatter;
use std::sync::Arc;

#[derive(thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    ValidationError(#[from] SubmissionError),
    #[error("Captcha verification failed")]
    CaptchaRejected,
    #[error("Failed to deliver the contact message")]
    DeliveryError(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for RelayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

struct CaptchaCheck {
    verifier: Arc<dyn CaptchaVerifier>,
    require_token: bool,
}

/// Validates contact form submissions and forwards them to a fixed inbox.
///
/// The mail sender and the optional captcha verifier are supplied once, at
/// construction; a relay built without a verifier never verifies anything.
pub struct ContactRelay {
    mail_sender: Arc<dyn MailSender>,
    captcha: Option<CaptchaCheck>,
    sender: ContactEmail,
    recipient: ContactEmail,
}

impl ContactRelay {
    pub fn new(
        mail_sender: Arc<dyn MailSender>,
        sender: ContactEmail,
        recipient: ContactEmail,
    ) -> Self {
        Self {
            mail_sender,
            captcha: None,
            sender,
            recipient,
        }
    }

    /// With `require_token` set, a submission without a token is rejected
    /// instead of skipping verification.
    pub fn with_captcha(mut self, verifier: Arc<dyn CaptchaVerifier>, require_token: bool) -> Self {
        self.captcha = Some(CaptchaCheck {
            verifier,
            require_token,
        });
        self
    }

    pub fn captcha_enabled(&self) -> bool {
        self.captcha.is_some()
    }

    #[tracing::instrument(
        name = "Relaying a contact form submission",
        skip(self, form),
        fields(
            submitter_email = tracing::field::Empty,
            token_present = form.token.is_some(),
        )
    )]
    pub async fn handle(&self, form: SubmissionForm) -> Result<(), RelayError> {
        let submission = Submission::try_from(form)?;
        tracing::Span::current().record(
            "submitter_email",
            &tracing::field::display(&submission.email),
        );

        self.check_captcha(submission.token.as_ref()).await?;

        let email = self.compose(&submission);
        self.mail_sender
            .send(&email)
            .await
            .map_err(RelayError::DeliveryError)?;
        tracing::info!("Contact message relayed");
        Ok(())
    }

    async fn check_captcha(&self, token: Option<&CaptchaToken>) -> Result<(), RelayError> {
        match (&self.captcha, token) {
            (None, _) => Ok(()),
            (Some(captcha), None) if captcha.require_token => {
                tracing::info!("Rejecting a submission without a captcha token");
                Err(RelayError::CaptchaRejected)
            }
            (Some(_), None) => Ok(()),
            (Some(captcha), Some(token)) => {
                let accepted = captcha
                    .verifier
                    .verify(token)
                    .await
                    .context("Failed to verify the captcha token")?;
                if accepted {
                    Ok(())
                } else {
                    Err(RelayError::CaptchaRejected)
                }
            }
        }
    }

    pub fn compose(&self, submission: &Submission) -> OutgoingEmail {
        let email = submission.email.as_ref();
        let message = submission.message.as_ref();
        let text_body = format!(
            "You received a new message from your contact form:\n\nFrom: {}\n\nMessage:\n{}",
            email, message
        );
        let html_body = format!(
            "<h2>New Contact Form Submission</h2>\n\
             <p><strong>From:</strong> {}</p>\n\
             <p><strong>Message:</strong></p>\n\
             <p>{}</p>",
            htmlescape::encode_minimal(email),
            html_paragraph(message)
        );
        OutgoingEmail {
            from: self.sender.clone(),
            to: self.recipient.clone(),
            reply_to: submission.email.clone(),
            subject: format!("New Contact Form Message from {}", email),
            html_body,
            text_body,
        }
    }
}

/// Escapes `text` and turns its line breaks into `<br>`.
fn html_paragraph(text: &str) -> String {
    htmlescape::encode_minimal(text)
        .replace("\r\n", "\n")
        .replace('\n', "<br>")
}

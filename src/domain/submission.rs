use crate::domain::{ContactEmail, MessageBody};

/// The contact form as it arrives on the wire.
///
/// Every field is optional here so that a missing field is reported by
/// [`Submission::try_from`] instead of the JSON extractor.
#[derive(Debug, Default, serde::Deserialize)]
pub struct SubmissionForm {
    pub email: Option<String>,
    pub message: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug)]
pub struct Submission {
    pub email: ContactEmail,
    pub message: MessageBody,
    pub token: Option<CaptchaToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaToken(String);

impl CaptchaToken {
    /// Blank tokens count as no token at all.
    pub fn parse(s: String) -> Option<CaptchaToken> {
        if s.trim().is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }
}

impl AsRef<str> for CaptchaToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Email and message are required")]
    MissingFields,
    #[error("Invalid email format")]
    InvalidEmail,
}

impl TryFrom<SubmissionForm> for Submission {
    type Error = SubmissionError;

    fn try_from(form: SubmissionForm) -> Result<Self, Self::Error> {
        let (email, message) = match (form.email, form.message) {
            (Some(email), Some(message)) if !email.is_empty() => (email, message),
            _ => return Err(SubmissionError::MissingFields),
        };
        let message = MessageBody::parse(message).map_err(|_| SubmissionError::MissingFields)?;
        let email = ContactEmail::parse(email).map_err(|_| SubmissionError::InvalidEmail)?;
        Ok(Submission {
            email,
            message,
            token: form.token.and_then(CaptchaToken::parse),
        })
    }
}

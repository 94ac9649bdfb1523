use crate::domain::CaptchaToken;
use anyhow::Context;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};

/// Confirms that a CAPTCHA token was issued to a real visitor.
#[async_trait::async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// `Ok(false)` means the verifier answered and rejected the token.
    /// Transport and decoding problems are errors.
    async fn verify(&self, token: &CaptchaToken) -> Result<bool, anyhow::Error>;
}

/// Client for Google's reCAPTCHA `siteverify` endpoint.
pub struct RecaptchaClient {
    http_client: Client,
    base_url: String,
    secret_key: Secret<String>,
}

#[derive(Debug, serde::Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

impl RecaptchaClient {
    pub fn new(
        base_url: String,
        secret_key: Secret<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            secret_key,
        })
    }
}

#[async_trait::async_trait]
impl CaptchaVerifier for RecaptchaClient {
    #[tracing::instrument(name = "Verifying a captcha token", skip(self, token))]
    async fn verify(&self, token: &CaptchaToken) -> Result<bool, anyhow::Error> {
        let url = format!("{}/siteverify", self.base_url);
        let response: SiteVerifyResponse = self
            .http_client
            .post(&url)
            .form(&[
                ("secret", self.secret_key.expose_secret().as_str()),
                ("response", token.as_ref()),
            ])
            .send()
            .await
            .context("Failed to reach the captcha verifier")?
            .error_for_status()
            .context("The captcha verifier returned an error status")?
            .json()
            .await
            .context("Failed to decode the captcha verifier response")?;

        if !response.success {
            tracing::info!(
                error_codes = ?response.error_codes,
                "The captcha verifier rejected the token"
            );
        }
        Ok(response.success)
    }
}

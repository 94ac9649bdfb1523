use crate::captcha::{CaptchaVerifier, RecaptchaClient};
use crate::domain::ContactEmail;
use crate::email_client::{EmailClient, MailSender};
use crate::relay::ContactRelay;
use crate::smtp_client::{SmtpClient, SmtpSecurity};
use anyhow::Context;
use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;
use std::sync::Arc;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub email_client: EmailClientSettings,
    pub captcha: CaptchaSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    #[serde(default = "any_origin")]
    pub allowed_origins: Vec<String>,
}

fn any_origin() -> Vec<String> {
    vec!["*".to_string()]
}

impl ApplicationSettings {
    /// Every entry must be `*` or an absolute origin such as `https://example.com`.
    pub fn validate_allowed_origins(&self) -> Result<(), anyhow::Error> {
        for origin in self.allowed_origins.iter().filter(|o| o.as_str() != "*") {
            let uri: actix_web::http::Uri = origin
                .parse()
                .with_context(|| format!("`{}` is not a valid CORS origin", origin))?;
            if uri.scheme().is_none() || uri.host().is_none() {
                anyhow::bail!(
                    "`{}` is not a valid CORS origin: expected scheme and host",
                    origin
                );
            }
        }
        Ok(())
    }
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    Http,
    Smtp,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct EmailClientSettings {
    pub provider: MailProvider,
    pub base_url: String,
    pub sender_email: String,
    pub recipient_email: Option<String>,
    pub authorization_token: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
    pub smtp: SmtpSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct SmtpSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub username: String,
    pub password: Secret<String>,
    #[serde(default)]
    pub security: SmtpSecurity,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct CaptchaSettings {
    pub base_url: String,
    pub secret_key: Option<Secret<String>>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
    #[serde(default)]
    pub require_token: bool,
}

impl EmailClientSettings {
    pub fn sender(&self) -> Result<ContactEmail, String> {
        ContactEmail::parse(self.sender_email.clone())
    }

    /// Messages go to the sender's own inbox unless a recipient is set.
    pub fn recipient(&self) -> Result<ContactEmail, String> {
        match &self.recipient_email {
            Some(recipient) => ContactEmail::parse(recipient.clone()),
            None => self.sender(),
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }

    pub fn client(&self) -> Result<Arc<dyn MailSender>, anyhow::Error> {
        let client: Arc<dyn MailSender> = match self.provider {
            MailProvider::Http => Arc::new(
                EmailClient::new(
                    self.base_url.clone(),
                    self.authorization_token.clone(),
                    self.timeout(),
                )
                .context("Failed to build the mail API client")?,
            ),
            MailProvider::Smtp => Arc::new(
                SmtpClient::new(
                    &self.smtp.host,
                    self.smtp.port,
                    self.smtp.username.clone(),
                    self.smtp.password.clone(),
                    self.smtp.security,
                    self.timeout(),
                )
                .context("Failed to build the SMTP transport")?,
            ),
        };
        Ok(client)
    }
}

impl CaptchaSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }

    /// `None` when no secret key is configured: verification is then skipped.
    /// A blank key counts as not configured.
    pub fn verifier(&self) -> Result<Option<Arc<dyn CaptchaVerifier>>, anyhow::Error> {
        match &self.secret_key {
            None => Ok(None),
            Some(secret_key) if secret_key.expose_secret().trim().is_empty() => Ok(None),
            Some(secret_key) => {
                let verifier: Arc<dyn CaptchaVerifier> = Arc::new(
                    RecaptchaClient::new(self.base_url.clone(), secret_key.clone(), self.timeout())
                        .context("Failed to build the captcha client")?,
                );
                Ok(Some(verifier))
            }
        }
    }
}

impl Settings {
    pub fn relay(&self) -> Result<ContactRelay, anyhow::Error> {
        let sender = self
            .email_client
            .sender()
            .map_err(|e| anyhow::anyhow!("Invalid sender email: {}", e))?;
        let recipient = self
            .email_client
            .recipient()
            .map_err(|e| anyhow::anyhow!("Invalid recipient email: {}", e))?;
        let relay = ContactRelay::new(self.email_client.client()?, sender, recipient);
        let relay = match self.captcha.verifier()? {
            Some(verifier) => relay.with_captcha(verifier, self.captcha.require_token),
            None => relay,
        };
        Ok(relay)
    }
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path =
        std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // E.g. `APP_CAPTCHA__SECRET_KEY=...` sets `Settings.captcha.secret_key`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override_option("application.port", std::env::var("PORT").ok())?
        .build()?;

    settings.try_deserialize::<Settings>()
}

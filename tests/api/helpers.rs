use contact_relay::configuration::{get_configuration, MailProvider, Settings};
use contact_relay::startup::Application;
use contact_relay::telemetry::{get_subscriber, init_subscriber};
use once_cell::sync::Lazy;
use secrecy::Secret;
use wiremock::MockServer;

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub const INBOX: &str = "inbox@example.com";

pub struct TestApp {
    pub address: String,
    pub email_server: MockServer,
    pub captcha_server: MockServer,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_send_email(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/send-email", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_raw_send_email(&self, body: &'static str) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/send-email", &self.address))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// The JSON body of the single request the mail API received.
    pub async fn sent_email(&self) -> serde_json::Value {
        let requests = self.email_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        serde_json::from_slice(&requests[0].body).unwrap()
    }
}

pub enum Captcha {
    Disabled,
    Enabled { require_token: bool },
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(Captcha::Disabled).await
}

pub async fn spawn_app_with_captcha() -> TestApp {
    spawn_app_with(Captcha::Enabled {
        require_token: false,
    })
    .await
}

// Launch our application in the background ~somehow~
pub async fn spawn_app_with(captcha: Captcha) -> TestApp {
    Lazy::force(&TRACING);

    let email_server = MockServer::start().await;
    let captcha_server = MockServer::start().await;

    let settings: Settings = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.application.port = 0; // Random OS port
        c.email_client.provider = MailProvider::Http;
        c.email_client.base_url = email_server.uri();
        c.email_client.sender_email = INBOX.to_string();
        c.email_client.recipient_email = None;
        c.captcha.base_url = captcha_server.uri();
        match captcha {
            Captcha::Disabled => c.captcha.secret_key = None,
            Captcha::Enabled { require_token } => {
                c.captcha.secret_key = Some(Secret::new("captcha-secret".to_string()));
                c.captcha.require_token = require_token;
            }
        }
        c
    };

    let application = Application::build(settings)
        .await
        .expect("Failed to build application.");
    let port = application.port();
    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        email_server,
        captcha_server,
        api_client: reqwest::Client::new(),
    }
}

use crate::configuration::Settings;
use crate::relay::ContactRelay;
use crate::routes::{health_check, home, json_error_handler, send_email};
use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::http::header;
use actix_web::web::Data;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        configuration.application.validate_allowed_origins()?;
        let relay = configuration.relay()?;
        tracing::info!(
            mail_provider = ?configuration.email_client.provider,
            captcha_enabled = relay.captcha_enabled(),
            require_captcha_token = configuration.captcha.require_token,
            "Contact relay configured"
        );

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );

        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();
        let server = run(listener, relay, configuration.application.allowed_origins)?;
        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

fn cors(allowed_origins: &[String]) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .max_age(3600);
    if allowed_origins.iter().any(|origin| origin == "*") {
        cors.allow_any_origin()
    } else {
        allowed_origins
            .iter()
            .fold(cors, |cors, origin| cors.allowed_origin(origin))
    }
}

pub fn run(
    listener: TcpListener,
    relay: ContactRelay,
    allowed_origins: Vec<String>,
) -> Result<Server, anyhow::Error> {
    let relay = Data::new(relay);
    let server = HttpServer::new(move || {
        App::new()
            // Middleware
            .wrap(cors(&allowed_origins))
            .wrap(TracingLogger::default())
            .route("/", web::get().to(home))
            .route("/health_check", web::get().to(health_check))
            .route("/send-email", web::post().to(send_email))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(relay.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}

pub mod captcha;
pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod relay;
pub mod routes;
pub mod smtp_client;
pub mod startup;
pub mod telemetry;

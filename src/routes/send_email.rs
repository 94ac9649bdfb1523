use crate::domain::SubmissionForm;
use crate::relay::{ContactRelay, RelayError};
use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};

const DELIVERY_FAILURE: &str = "Failed to send email. Please try again later.";

//region Structs & Implementations
/// Body of every `/send-email` response.
#[derive(Debug, serde::Serialize)]
pub struct ContactResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ContactResponse {
    fn sent() -> Self {
        Self {
            success: true,
            error: None,
            message: Some("Email sent successfully".into()),
        }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            message: None,
        }
    }
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::ValidationError(_) | RelayError::CaptchaRejected => {
                StatusCode::BAD_REQUEST
            }
            RelayError::DeliveryError(_) | RelayError::UnexpectedError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Server-side causes stay in the logs.
        let error = match self {
            RelayError::ValidationError(_) | RelayError::CaptchaRejected => self.to_string(),
            RelayError::DeliveryError(_) | RelayError::UnexpectedError(_) => {
                DELIVERY_FAILURE.to_string()
            }
        };
        HttpResponse::build(self.status_code()).json(ContactResponse::failure(error))
    }
}
//endregion

//region HTTP handlers
pub async fn send_email(
    form: web::Json<SubmissionForm>,
    relay: web::Data<ContactRelay>,
) -> Result<HttpResponse, RelayError> {
    relay.handle(form.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ContactResponse::sent()))
}

/// Answers unreadable JSON bodies in the same shape as every other failure.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::warn!(error = %err, "Rejecting an unreadable contact form payload");
    let response =
        HttpResponse::BadRequest().json(ContactResponse::failure("Invalid request body"));
    InternalError::from_response(err, response).into()
}
//endregion

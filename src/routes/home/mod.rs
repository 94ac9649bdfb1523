use actix_web::HttpResponse;

#[derive(serde::Serialize)]
struct Status {
    message: &'static str,
}

pub async fn home() -> HttpResponse {
    HttpResponse::Ok().json(Status {
        message: "Backend is running!",
    })
}

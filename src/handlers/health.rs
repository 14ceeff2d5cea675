use actix_web::{web, HttpResponse, Result};
use serde::Serialize;
use crate::models::{get_market_time, ApiResponse};

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
    market_time: String,
}

pub async fn health_check() -> Result<HttpResponse> {
    let response = ApiResponse::success(HealthStatus {
        status: "Service is healthy",
        version: env!("CARGO_PKG_VERSION"),
        market_time: get_market_time().format("%Y-%m-%d %H:%M %Z").to_string(),
    });
    Ok(HttpResponse::Ok().json(response))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}

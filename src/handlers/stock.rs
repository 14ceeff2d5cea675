//! 股票行情与新闻接口
//!
//! - GET /stocks/trending - 热门股票
//! - GET /stocks/{symbol}/history?period=3mo - 日K线
//! - GET /stocks/{symbol}/news?limit=10 - 相关新闻

use actix_web::{web, HttpResponse, Result};
use crate::models::{normalize_symbol, ApiResponse, HistoryQuery, NewsItem, NewsQuery, PriceSeries};
use crate::services::stock::TRENDING_SYMBOLS;
use crate::services::stock_service::StockService;

pub async fn list_trending() -> Result<HttpResponse> {
    let symbols: Vec<&str> = TRENDING_SYMBOLS.to_vec();
    Ok(HttpResponse::Ok().json(ApiResponse::success(symbols)))
}

pub async fn get_stock_history(
    service: web::Data<StockService>,
    path: web::Path<String>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse> {
    let symbol = normalize_symbol(&path.into_inner());
    let period = query.period.unwrap_or_else(|| service.default_period());

    match service.get_price_history(&symbol, period).await {
        Ok(series) => {
            let response = ApiResponse::success(series);
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            let response = ApiResponse::<PriceSeries>::error(e.to_string());
            Ok(HttpResponse::InternalServerError().json(response))
        }
    }
}

pub async fn get_stock_news(
    service: web::Data<StockService>,
    path: web::Path<String>,
    query: web::Query<NewsQuery>,
) -> Result<HttpResponse> {
    let symbol = normalize_symbol(&path.into_inner());

    match service.get_news(&symbol, query.limit).await {
        Ok(items) => {
            let response = ApiResponse::success(items);
            Ok(HttpResponse::Ok().json(response))
        }
        Err(e) => {
            let response = ApiResponse::<Vec<NewsItem>>::error(e.to_string());
            Ok(HttpResponse::InternalServerError().json(response))
        }
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/stocks")
            .route("/trending", web::get().to(list_trending))
            .route("/{symbol}/history", web::get().to(get_stock_history))
            .route("/{symbol}/news", web::get().to(get_stock_news))
    );
}

//! 分析接口处理器
//!
//! ## API 列表
//! - GET /analysis/{symbol}?period=3mo&risk=moderate - 综合评分、指标、新闻情感
//! - GET /analysis/{symbol}/mood - 当日情绪
//!
//! 两个接口在数据源不可用时也返回 200，内容为中性、零置信度的结果

use actix_web::{web, HttpResponse, Result};
use crate::models::{normalize_symbol, AnalysisQuery, ApiResponse};
use crate::services::stock_service::StockService;

/// 综合分析
///
/// GET /api/v1/analysis/{symbol}
///
/// # 参数
/// - period: 回看区间（5d / 1mo / 3mo / 6mo / 1y）
/// - risk: 风险偏好（conservative / moderate / aggressive）
pub async fn evaluate(
    service: web::Data<StockService>,
    path: web::Path<String>,
    query: web::Query<AnalysisQuery>,
) -> Result<HttpResponse> {
    let symbol = normalize_symbol(&path.into_inner());
    let evaluation = service
        .evaluate(&symbol, query.period, query.risk.unwrap_or_default())
        .await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(evaluation)))
}

pub async fn mood(service: web::Data<StockService>, path: web::Path<String>) -> Result<HttpResponse> {
    let symbol = normalize_symbol(&path.into_inner());
    let report = service.mood(&symbol).await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(report)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/analysis")
            .route("/{symbol}", web::get().to(evaluate))
            .route("/{symbol}/mood", web::get().to(mood))
    );
}

//! 股票情绪看板后端服务
//!
//! 提供股票行情、新闻以及综合评分的 RESTful API 服务
//! 数据来源：Yahoo Finance、Google News

mod config;     // 配置加载
mod handlers;   // HTTP 请求处理器
mod middleware; // 中间件
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

use actix_web::{web, App, HttpServer, middleware::Logger};
use env_logger::Env;

use crate::config::AppConfig;
use crate::middleware::ApiKeyMiddleware;
use crate::services::stock_service::StockService;

/// 应用程序入口
///
/// 启动 HTTP 服务器，监听地址来自配置文件
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let (config, notes) = AppConfig::load();

    // 初始化日志系统，RUST_LOG 优先于配置文件
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));
    for note in notes {
        log::log!(note.level, "{}", note.message);
    }

    let service = StockService::new(&config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    let service = web::Data::new(service);

    let bind_addr = config.bind_addr();
    let api_key = config.api.api_key.clone();
    log::info!("启动股票情绪看板后端服务: {}", bind_addr);
    log::info!(
        "默认区间 {}，新闻上限 {}，缓存 {} 秒",
        config.analysis.default_period.as_str(),
        config.analysis.news_limit,
        config.analysis.cache_ttl_secs
    );

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(ApiKeyMiddleware::new(&api_key))  // API Key 认证
            .wrap(Logger::default())  // 请求日志
            .configure(handlers::config)  // 配置路由
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(bind_addr)?.run().await
}

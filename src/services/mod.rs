//! 业务逻辑服务模块
//!
//! 封装数据获取和评分流水线

pub mod analysis;         // 指标、情感、评分、建议、情绪
pub mod stock;            // 行情与新闻数据源
pub mod stock_service;    // 对外服务入口

//! 股票分析服务
//!
//! 负责取数（带缓存）并调用评分流水线。
//! 行情和新闻互相独立，并发获取；任何一方失败都只当作"没有数据"，
//! 分析接口本身从不返回错误。

use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::Utc;
use reqwest::Client;

use crate::config::{AnalysisConfig, AppConfig, ProviderConfig};
use crate::models::{
    normalize_symbol, Evaluation, MoodReport, NewsItem, Period, PriceSeries, RiskTolerance,
};
use crate::services::analysis::{self, SentimentAnalyzer};
use crate::services::stock::{self, TtlCache};

/// 股票分析服务
///
/// ## 功能
/// - 历史行情：Yahoo Finance 日K线
/// - 新闻：Google News RSS
/// - 综合评分：技术面 + 新闻情感 + 成交量 + 趋势
/// - 当日情绪：表情 + 一句话
pub struct StockService {
    /// HTTP 客户端
    client: Client,
    providers: ProviderConfig,
    analysis: AnalysisConfig,
    /// 情感词典，加载后只读
    analyzer: SentimentAnalyzer,
    price_cache: TtlCache<PriceSeries>,
    news_cache: TtlCache<Vec<NewsItem>>,
}

impl StockService {
    /// 创建新的服务实例
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .connect_timeout(Duration::from_secs(config.api.connect_timeout_secs))
            .gzip(true)
            .build()
            .map_err(|e| anyhow!("创建 HTTP 客户端失败: {}", e))?;

        let analyzer = SentimentAnalyzer::with_threshold(config.analysis.relevance_threshold);
        log::debug!("情感词典加载完成，生效阈值 {:.2}", analyzer.relevance_threshold());

        Ok(Self {
            client,
            providers: config.providers.clone(),
            analysis: config.analysis.clone(),
            analyzer,
            price_cache: TtlCache::new(config.analysis.cache_ttl_secs),
            news_cache: TtlCache::new(config.analysis.cache_ttl_secs),
        })
    }

    pub fn default_period(&self) -> Period {
        self.analysis.default_period
    }

    // ==================== 取数 ====================

    /// 获取历史行情
    pub async fn get_price_history(&self, symbol: &str, period: Period) -> Result<PriceSeries> {
        let key = format!("{}|{}", symbol, period.as_str());
        let now = Utc::now().timestamp();
        if let Some(series) = self.price_cache.get(&key, now) {
            log::debug!("行情缓存命中: {}", key);
            return Ok(series);
        }

        let series = stock::get_price_history(
            &self.client,
            &self.providers.market_data_url,
            &self.providers.user_agent,
            symbol,
            period,
        )
        .await?;
        self.price_cache.insert(&key, now, series.clone());
        Ok(series)
    }

    /// 获取相关新闻
    ///
    /// # 参数
    /// - limit: 返回数量上限，为空时使用配置值
    pub async fn get_news(&self, symbol: &str, limit: Option<usize>) -> Result<Vec<NewsItem>> {
        let limit = limit.unwrap_or(self.analysis.news_limit);
        let key = format!("{}|{}", symbol, limit);
        let now = Utc::now().timestamp();
        if let Some(items) = self.news_cache.get(&key, now) {
            log::debug!("新闻缓存命中: {}", key);
            return Ok(items);
        }

        let items = stock::search_news(
            &self.client,
            &self.providers.news_feed_url,
            &self.providers.user_agent,
            symbol,
            limit,
        )
        .await?;
        self.news_cache.insert(&key, now, items.clone());
        Ok(items)
    }

    /// 并发获取行情和新闻，新闻失败降级为空，行情错误交给调用方
    async fn fetch_inputs(&self, symbol: &str, period: Period) -> (Result<PriceSeries>, Vec<NewsItem>) {
        let (prices, news) = futures::join!(
            self.get_price_history(symbol, period),
            self.get_news(symbol, None)
        );

        if let Err(e) = &prices {
            log::warn!("{} 行情获取失败，按无数据处理: {}", symbol, e);
        }
        let news = news.unwrap_or_else(|e| {
            log::warn!("{} 新闻获取失败，按无新闻处理: {}", symbol, e);
            Vec::new()
        });
        (prices, news)
    }

    // ==================== 分析 ====================

    /// 对一只股票做完整分析
    pub async fn evaluate(&self, symbol: &str, period: Option<Period>, risk: RiskTolerance) -> Evaluation {
        let symbol = normalize_symbol(symbol);
        let period = period.unwrap_or(self.analysis.default_period);
        let (prices, news) = self.fetch_inputs(&symbol, period).await;

        let mut evaluation =
            analysis::analyze(&symbol, period, prices.as_ref().ok(), &news, risk, &self.analyzer);
        if prices.is_err() {
            evaluation.mood = analysis::mood::fetch_error(&symbol);
        }
        log::info!(
            "{} 分析完成: 得分 {:.1}, 置信度 {:.0}%, 建议 {}",
            evaluation.symbol,
            evaluation.score.overall_score,
            evaluation.score.confidence,
            evaluation.score.recommendation.action
        );
        evaluation
    }

    /// 最近 5 日的当日情绪
    pub async fn mood(&self, symbol: &str) -> MoodReport {
        let symbol = normalize_symbol(symbol);
        let (prices, news) = self.fetch_inputs(&symbol, Period::FiveDays).await;
        match prices {
            Ok(series) => analysis::mood::mood_from(&symbol, Some(&series), &news, &self.analyzer),
            Err(_) => analysis::mood::fetch_error(&symbol),
        }
    }
}

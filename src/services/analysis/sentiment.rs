//! 新闻情感汇总
//!
//! 对一组新闻逐条计算相关度和极性，过滤掉与股票无关的新闻后，
//! 按 来源权重 × 相关度 × 时效 加权平均得到整体情感。
//!
//! 极性打分使用 VADER 词典，并叠加一组金融领域关键词修正。

use chrono::{DateTime, Duration, Utc};
use vader_sentiment::SentimentIntensityAnalyzer;

use crate::models::{ArticleSentiment, NewsItem, SentimentLabel, SentimentResult};

use super::indicators::{mean, population_std};

/// 默认相关度阈值
pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 0.4;

const TITLE_SYMBOL_BONUS: f64 = 0.4;
const SUMMARY_SYMBOL_BONUS: f64 = 0.2;
const TITLE_COMPANY_BONUS: f64 = 0.35;
const SUMMARY_COMPANY_BONUS: f64 = 0.15;
/// 仅靠行业关键词无法达到阈值
const CATEGORY_CAP: f64 = 0.3;

/// 业绩、指引类关键词
const HIGH_IMPACT_TERMS: &[&str] = &[
    "earnings", "revenue", "guidance", "profit", "eps", "forecast", "outlook",
    "quarterly", "dividend", "buyback", "acquisition",
];
/// 交易类关键词
const TRADING_TERMS: &[&str] = &[
    "upgrade", "downgrade", "analyst", "price target", "rating", "shares", "stock", "investors",
];
/// 大盘类关键词
const MARKET_TERMS: &[&str] = &[
    "market", "index", "sector", "economy", "wall street", "nasdaq", "s&p", "dow",
];

/// 股票代码 → 公司名、产品、管理层等同义词
const COMPANY_TERMS: &[(&str, &[&str])] = &[
    ("AAPL", &["apple", "iphone", "ipad", "macbook", "tim cook"]),
    ("TSLA", &["tesla", "elon musk", "cybertruck", "model y"]),
    ("MSFT", &["microsoft", "azure", "windows", "satya nadella"]),
    ("GOOG", &["google", "alphabet", "youtube", "android", "sundar pichai"]),
    ("GOOGL", &["google", "alphabet", "youtube", "android", "sundar pichai"]),
    ("NVDA", &["nvidia", "geforce", "jensen huang"]),
    ("AMZN", &["amazon", "aws", "andy jassy", "prime video"]),
    ("META", &["meta platforms", "facebook", "instagram", "whatsapp", "zuckerberg"]),
];

/// 来源媒体权重，未列出的为 0.6
const SOURCE_WEIGHTS: &[(&str, f64)] = &[
    ("reuters", 1.0),
    ("bloomberg", 1.0),
    ("wall street journal", 1.0),
    ("wsj", 1.0),
    ("financial times", 1.0),
    ("cnbc", 1.0),
    ("associated press", 1.0),
    ("marketwatch", 0.9),
    ("barron", 0.9),
    ("yahoo finance", 0.8),
    ("the motley fool", 0.8),
    ("seeking alpha", 0.8),
    ("benzinga", 0.8),
    ("investopedia", 0.8),
    ("investor's business daily", 0.8),
];
const DEFAULT_SOURCE_WEIGHT: f64 = 0.6;

const BULLISH_TERMS: &[(&str, f64)] = &[
    ("beats", 0.3),
    ("beat estimates", 0.4),
    ("surge", 0.4),
    ("soar", 0.5),
    ("rally", 0.4),
    ("record high", 0.4),
    ("all-time high", 0.4),
    ("upgrade", 0.3),
    ("outperform", 0.3),
    ("raises guidance", 0.4),
    ("buyback", 0.2),
    ("breakthrough", 0.3),
];

const BEARISH_TERMS: &[(&str, f64)] = &[
    ("misses", -0.3),
    ("plunge", -0.5),
    ("crash", -0.5),
    ("tumble", -0.4),
    ("downgrade", -0.3),
    ("lawsuit", -0.4),
    ("recall", -0.3),
    ("layoffs", -0.3),
    ("cuts guidance", -0.4),
    ("probe", -0.3),
    ("sell-off", -0.4),
    ("selloff", -0.4),
    ("bankruptcy", -0.6),
];

/// 新闻情感分析器
///
/// 词典加载后只读，可在多个请求间共享引用
pub struct SentimentAnalyzer {
    analyzer: SentimentIntensityAnalyzer<'static>,
    relevance_threshold: f64,
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_RELEVANCE_THRESHOLD)
    }

    pub fn with_threshold(relevance_threshold: f64) -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
            relevance_threshold: relevance_threshold.clamp(0.0, 1.0),
        }
    }

    pub fn relevance_threshold(&self) -> f64 {
        self.relevance_threshold
    }

    /// VADER compound 得分，不含金融关键词修正
    pub fn compound(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        let compound = self
            .analyzer
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or(0.0);
        if compound.is_finite() {
            compound
        } else {
            0.0
        }
    }

    /// 前 n 条标题的 compound 平均值，不做相关度过滤，没有标题时为 0
    pub fn headline_average(&self, items: &[NewsItem], n: usize) -> f64 {
        let scores: Vec<f64> = items.iter().take(n).map(|i| self.compound(&i.headline)).collect();
        mean(&scores)
    }

    /// 文本极性 [-1, 1]
    pub fn polarity(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        let combined = self.compound(text) + financial_boost(text) * 0.5;
        if combined.is_finite() {
            combined.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }

    /// 新闻与股票的相关度 [0, 1]
    pub fn relevance(&self, symbol: &str, item: &NewsItem) -> f64 {
        let symbol = symbol.trim().to_uppercase();
        let title = item.headline.to_lowercase();
        let summary = item.summary.to_lowercase();
        let title_tokens = tokens(&item.headline);
        let summary_tokens = tokens(&item.summary);

        let mut score = 0.0;

        if title_tokens.iter().any(|t| t.eq_ignore_ascii_case(&symbol)) {
            score += TITLE_SYMBOL_BONUS;
        }
        if summary_tokens.iter().any(|t| t.eq_ignore_ascii_case(&symbol)) {
            score += SUMMARY_SYMBOL_BONUS;
        }

        let company = company_terms(&symbol);
        if company.iter().any(|term| contains_term(&title, &title_tokens, term)) {
            score += TITLE_COMPANY_BONUS;
        }
        if company.iter().any(|term| contains_term(&summary, &summary_tokens, term)) {
            score += SUMMARY_COMPANY_BONUS;
        }

        let text = format!("{} {}", title, summary);
        let text_tokens: Vec<String> = title_tokens.into_iter().chain(summary_tokens).collect();
        let hits = |terms: &[&str]| {
            terms
                .iter()
                .filter(|term| contains_term(&text, &text_tokens, term))
                .count() as f64
        };
        let category = hits(HIGH_IMPACT_TERMS) * 0.15 + hits(TRADING_TERMS) * 0.08 + hits(MARKET_TERMS) * 0.03;
        score += category.min(CATEGORY_CAP);

        score.clamp(0.0, 1.0)
    }

    /// 汇总一组新闻的情感
    ///
    /// 没有任何新闻通过相关度过滤时返回 [`SentimentResult::empty`]
    pub fn aggregate(&self, symbol: &str, items: &[NewsItem]) -> SentimentResult {
        let newest = items.iter().filter_map(|i| i.published_at).max();

        let articles: Vec<ArticleSentiment> = items
            .iter()
            .filter_map(|item| {
                let relevance = self.relevance(symbol, item);
                if relevance < self.relevance_threshold {
                    log::debug!("过滤低相关新闻 ({:.2}): {}", relevance, item.headline);
                    return None;
                }
                let polarity = self.polarity(&format!("{}. {}", item.headline, item.summary));
                let weight = source_weight(&item.source) * relevance * recency(item.published_at, newest);
                Some(ArticleSentiment {
                    headline: item.headline.clone(),
                    source: item.source.clone(),
                    url: item.url.clone(),
                    published_at: item.published_at,
                    polarity,
                    relevance,
                    weight,
                    label: SentimentLabel::classify(polarity),
                })
            })
            .collect();

        if articles.is_empty() {
            return SentimentResult::empty();
        }

        let total_weight: f64 = articles.iter().map(|a| a.weight).sum();
        let score = if total_weight > 0.0 {
            articles.iter().map(|a| a.polarity * a.weight).sum::<f64>() / total_weight
        } else {
            0.0
        };

        let count = |label: SentimentLabel| articles.iter().filter(|a| a.label == label).count();
        let polarities: Vec<f64> = articles.iter().map(|a| a.polarity).collect();
        let relevances: Vec<f64> = articles.iter().map(|a| a.relevance).collect();
        let average_relevance = mean(&relevances);

        let confidence = (articles.len() as f64 * 10.0).min(60.0)
            + average_relevance * 25.0
            + (15.0 - population_std(&polarities) * 30.0).max(0.0);

        SentimentResult {
            score: if score.is_finite() { score.clamp(-1.0, 1.0) } else { 0.0 },
            confidence: confidence.clamp(0.0, 100.0),
            article_count: articles.len(),
            positive_count: count(SentimentLabel::Positive),
            negative_count: count(SentimentLabel::Negative),
            neutral_count: count(SentimentLabel::Neutral),
            average_relevance,
            articles,
        }
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn financial_boost(text: &str) -> f64 {
    let lower = text.to_lowercase();
    BULLISH_TERMS
        .iter()
        .chain(BEARISH_TERMS)
        .filter(|(term, _)| lower.contains(term))
        .map(|(_, score)| score)
        .sum()
}

/// 按非字母数字切词，保留 "BRK.B" 这类带点的代码
fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '.'))
        .map(|t| t.trim_matches('.'))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// 单词按整词匹配，短语按子串匹配
fn contains_term(lower_text: &str, tokens: &[String], term: &str) -> bool {
    if term.contains(' ') || term.contains('&') {
        lower_text.contains(term)
    } else {
        tokens.iter().any(|t| t == term)
    }
}

fn company_terms(symbol: &str) -> &'static [&'static str] {
    COMPANY_TERMS
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, terms)| *terms)
        .unwrap_or(&[])
}

pub fn source_weight(source: &str) -> f64 {
    let lower = source.to_lowercase();
    SOURCE_WEIGHTS
        .iter()
        .find(|(name, _)| lower.contains(name))
        .map(|(_, w)| *w)
        .unwrap_or(DEFAULT_SOURCE_WEIGHT)
}

/// 相对本批最新一条新闻的时效系数
fn recency(published: Option<DateTime<Utc>>, newest: Option<DateTime<Utc>>) -> f64 {
    match (published, newest) {
        (Some(p), Some(n)) => {
            let age = n - p;
            if age <= Duration::hours(24) {
                1.0
            } else if age <= Duration::hours(72) {
                0.8
            } else {
                0.6
            }
        }
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn news(headline: &str, summary: &str, source: &str) -> NewsItem {
        NewsItem {
            headline: headline.to_string(),
            summary: summary.to_string(),
            published_at: Some(Utc.with_ymd_and_hms(2024, 5, 2, 20, 0, 0).unwrap()),
            source: source.to_string(),
            url: "https://example.com/a".to_string(),
        }
    }

    #[test]
    fn test_empty_input_is_neutral() {
        let analyzer = SentimentAnalyzer::new();
        let result = analyzer.aggregate("AAPL", &[]);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.article_count, 0);
        assert!(result.articles.is_empty());
    }

    #[test]
    fn test_irrelevant_article_filtered() {
        let analyzer = SentimentAnalyzer::new();
        let item = news(
            "Stock market rallies as economy shows strength, analysts upgrade outlook",
            "Wall Street index gains on earnings season optimism",
            "Reuters",
        );
        let relevance = analyzer.relevance("AAPL", &item);
        println!("  无关新闻相关度: {:.2}", relevance);
        assert!(relevance < DEFAULT_RELEVANCE_THRESHOLD);

        let result = analyzer.aggregate("AAPL", &[item]);
        assert_eq!(result.article_count, 0);
    }

    #[test]
    fn test_symbol_and_company_raise_relevance() {
        let analyzer = SentimentAnalyzer::new();
        let by_symbol = news("AAPL shares climb after earnings", "", "CNBC");
        let by_name = news("Apple unveils new iPhone lineup", "Apple stock reacts", "CNBC");
        assert!(analyzer.relevance("AAPL", &by_symbol) >= DEFAULT_RELEVANCE_THRESHOLD);
        assert!(analyzer.relevance("aapl", &by_name) >= DEFAULT_RELEVANCE_THRESHOLD);
        // "snapple" 不是 apple
        let lookalike = news("Snapple launches new flavor", "", "CNBC");
        assert!(analyzer.relevance("AAPL", &lookalike) < DEFAULT_RELEVANCE_THRESHOLD);
    }

    #[test]
    fn test_polarity_direction() {
        let analyzer = SentimentAnalyzer::new();
        let good = analyzer.polarity("Tesla beats estimates, stock soars to record high");
        let bad = analyzer.polarity("Tesla faces lawsuit as shares plunge after recall");
        println!("  正面: {:.3} 负面: {:.3}", good, bad);
        assert!(good > 0.05);
        assert!(bad < -0.05);
        assert_eq!(analyzer.polarity("   "), 0.0);
    }

    #[test]
    fn test_aggregate_counts_and_confidence() {
        let analyzer = SentimentAnalyzer::new();
        let items = vec![
            news("NVDA soars to record high on strong earnings", "Nvidia beats estimates", "Reuters"),
            news("NVDA shares surge as analysts upgrade", "Nvidia rally continues", "Bloomberg"),
            news("Nvidia faces probe, NVDA shares tumble", "Regulators open lawsuit", "Some Blog"),
            news("Weather is nice today", "Nothing about stocks", "Some Blog"),
        ];
        let result = analyzer.aggregate("NVDA", &items);
        println!(
            "  情感: {:.3} 置信度: {:.1} 正/负/中: {}/{}/{}",
            result.score, result.confidence, result.positive_count, result.negative_count, result.neutral_count
        );
        assert_eq!(result.article_count, 3);
        assert_eq!(result.positive_count + result.negative_count + result.neutral_count, 3);
        assert!(result.positive_count >= 2);
        assert!(result.negative_count >= 1);
        assert!(result.score > 0.0);
        assert!(result.confidence > 0.0 && result.confidence <= 100.0);
    }

    #[test]
    fn test_confidence_grows_with_articles() {
        let analyzer = SentimentAnalyzer::new();
        let one = vec![news("MSFT earnings beat estimates", "Microsoft revenue grows", "Reuters")];
        let many: Vec<NewsItem> = (0..5).map(|_| one[0].clone()).collect();
        let c1 = analyzer.aggregate("MSFT", &one).confidence;
        let c5 = analyzer.aggregate("MSFT", &many).confidence;
        assert!(c5 > c1);
    }

    #[test]
    fn test_headline_average_uses_first_headlines_only() {
        let analyzer = SentimentAnalyzer::new();
        assert_eq!(analyzer.headline_average(&[], 3), 0.0);

        let happy = news("Great wonderful amazing day", "", "Blog");
        let sad = news("Terrible awful horrible disaster", "", "Blog");
        // 与股票无关的标题同样参与平均
        let first_three = vec![happy.clone(), happy.clone(), happy.clone(), sad.clone()];
        let avg = analyzer.headline_average(&first_three, 3);
        println!("  前三条平均: {:.3}", avg);
        assert!(avg > 0.3);
        assert!((avg - analyzer.compound(&happy.headline)).abs() < 1e-12);
        assert!(analyzer.headline_average(&[sad], 3) < -0.3);
    }

    #[test]
    fn test_source_weight_and_recency() {
        assert_eq!(source_weight("Reuters"), 1.0);
        assert_eq!(source_weight("Yahoo Finance"), 0.8);
        assert_eq!(source_weight("Random Blog"), DEFAULT_SOURCE_WEIGHT);

        let newest = Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap();
        assert_eq!(recency(Some(newest - Duration::hours(2)), Some(newest)), 1.0);
        assert_eq!(recency(Some(newest - Duration::hours(48)), Some(newest)), 0.8);
        assert_eq!(recency(Some(newest - Duration::days(7)), Some(newest)), 0.6);
        assert_eq!(recency(None, Some(newest)), 1.0);
    }
}

//! Google News RSS 新闻接口实现
//!
//! 对接 https://news.google.com/rss/search?q=<SYMBOL>+stock
//! 条目中的描述是转义过的 HTML 片段，需要两次解析才能得到纯文本

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::Html;
use url::Url;

use crate::models::NewsItem;

static ITEM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<item>(.*?)</item>").expect("ITEM_RE"));
static TITLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<title>(.*?)</title>").expect("TITLE_RE"));
static LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<link>(.*?)</link>").expect("LINK_RE"));
static DESC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<description>(.*?)</description>").expect("DESC_RE"));
static PUB_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<pubDate>(.*?)</pubDate>").expect("PUB_DATE_RE"));
static SOURCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<source[^>]*>(.*?)</source>").expect("SOURCE_RE"));

/// 拼接新闻搜索地址，查询词为 "<SYMBOL> stock"
pub fn search_url(base: &str, symbol: &str) -> Result<Url> {
    let query = format!("{} stock", symbol);
    Url::parse_with_params(
        base,
        &[
            ("q", query.as_str()),
            ("hl", "en-US"),
            ("gl", "US"),
            ("ceid", "US:en"),
        ],
    )
    .map_err(|e| anyhow!("新闻接口地址无效 {}: {}", base, e))
}

/// 搜索股票相关新闻
///
/// # 参数
/// - limit: 最多返回条数
pub async fn search_news(
    client: &Client,
    base: &str,
    user_agent: &str,
    symbol: &str,
    limit: usize,
) -> Result<Vec<NewsItem>> {
    let url = search_url(base, symbol)?;
    log::debug!("📡 请求新闻 URL: {}", url);

    let response = client
        .get(url)
        .header("User-Agent", user_agent)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(anyhow!("获取新闻失败: {}", response.status()));
    }

    let text = response.text().await?;
    Ok(parse_feed(&text, limit))
}

/// 解析 RSS 文本，无法识别的条目跳过
pub fn parse_feed(xml: &str, limit: usize) -> Vec<NewsItem> {
    ITEM_RE
        .captures_iter(xml)
        .filter_map(|cap| cap.get(1).map(|m| parse_item(m.as_str())))
        .flatten()
        .take(limit)
        .collect()
}

fn parse_item(block: &str) -> Option<NewsItem> {
    let raw_title = clean_text(capture(&TITLE_RE, block)?);
    if raw_title.is_empty() {
        return None;
    }

    let source = capture(&SOURCE_RE, block).map(clean_text).unwrap_or_default();
    // Google News 的标题形如 "Headline - Reuters"
    let headline = if !source.is_empty() {
        raw_title
            .strip_suffix(&format!(" - {}", source))
            .map(str::to_string)
            .unwrap_or(raw_title)
    } else {
        raw_title
    };

    let published_at = capture(&PUB_DATE_RE, block)
        .and_then(|s| DateTime::parse_from_rfc2822(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Some(NewsItem {
        headline,
        summary: capture(&DESC_RE, block).map(clean_text).unwrap_or_default(),
        published_at,
        source,
        url: capture(&LINK_RE, block).map(|s| s.trim().to_string()).unwrap_or_default(),
    })
}

fn capture<'a>(re: &Regex, block: &'a str) -> Option<&'a str> {
    re.captures(block).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// 去掉 CDATA、解码实体并剥离 HTML 标签，合并空白
pub fn clean_text(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
        .unwrap_or(trimmed);

    let mut text = html_to_text(inner);
    // 实体解码后又出现了标签，说明原文是转义过的 HTML
    if text.contains('<') && text.contains('>') {
        text = html_to_text(&text);
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn html_to_text(fragment: &str) -> String {
    Html::parse_fragment(fragment)
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
}

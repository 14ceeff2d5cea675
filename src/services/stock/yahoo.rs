//! Yahoo Finance 行情接口实现
//!
//! 对接 chart API: {market_data_url}/{symbol}?range=3mo&interval=1d

use anyhow::{anyhow, Result};
use chrono::{TimeZone, Utc};
use reqwest::Client;
use url::Url;

use crate::models::{Period, PricePoint, PriceSeries};

/// 拼接行情请求地址
pub fn chart_url(base: &str, symbol: &str, period: Period) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| anyhow!("行情接口地址无效 {}: {}", base, e))?;
    url.path_segments_mut()
        .map_err(|_| anyhow!("行情接口地址不能作为基础路径: {}", base))?
        .pop_if_empty()
        .push(symbol);
    url.query_pairs_mut()
        .append_pair("range", period.as_str())
        .append_pair("interval", "1d");
    Ok(url)
}

/// 获取日K线历史
pub async fn get_price_history(
    client: &Client,
    base: &str,
    user_agent: &str,
    symbol: &str,
    period: Period,
) -> Result<PriceSeries> {
    let url = chart_url(base, symbol, period)?;
    log::debug!("📡 请求行情数据 URL: {}", url);

    let response = client
        .get(url)
        .header("User-Agent", user_agent)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(anyhow!("获取行情数据失败: {}", response.status()));
    }

    let text = response.text().await?;
    parse_chart(&text, symbol)
}

/// 解析 chart 接口响应
///
/// 格式: {"chart":{"result":[{"timestamp":[...],"indicators":{"quote":[{"open":[...],...}]}}],"error":null}}
/// 收盘价为 null 的行（停牌、未收盘）直接跳过
pub fn parse_chart(data: &str, symbol: &str) -> Result<PriceSeries> {
    let json: serde_json::Value =
        serde_json::from_str(data).map_err(|e| anyhow!("解析行情JSON失败: {}", e))?;
    let chart = &json["chart"];

    if !chart["error"].is_null() {
        let desc = chart["error"]["description"].as_str().unwrap_or("未知错误");
        return Err(anyhow!("行情接口返回错误: {}", desc));
    }

    let result = chart["result"]
        .get(0)
        .ok_or_else(|| anyhow!("股票代码 {} 没有行情数据", symbol))?;
    let timestamps = result["timestamp"]
        .as_array()
        .ok_or_else(|| anyhow!("股票代码 {} 缺少时间序列", symbol))?;
    let quote = &result["indicators"]["quote"][0];

    let mut points = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let Some(close) = quote["close"][i].as_f64() else {
            continue;
        };
        let Some(timestamp) = ts.as_i64().and_then(|t| Utc.timestamp_opt(t, 0).single()) else {
            continue;
        };
        let volume = quote["volume"][i]
            .as_u64()
            .or_else(|| quote["volume"][i].as_f64().map(|v| v.max(0.0) as u64))
            .unwrap_or(0);

        points.push(PricePoint {
            timestamp,
            open: quote["open"][i].as_f64().unwrap_or(close),
            high: quote["high"][i].as_f64().unwrap_or(close),
            low: quote["low"][i].as_f64().unwrap_or(close),
            close,
            volume,
        });
    }

    if points.is_empty() {
        return Err(anyhow!("股票代码 {} 行情为空", symbol));
    }

    log::debug!("📈 {} 解析到 {} 条K线数据", symbol, points.len());
    Ok(PriceSeries::new(symbol, points))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"chart":{"result":[{"meta":{"symbol":"AAPL"},
        "timestamp":[1704378600,1704205800,1704292200],
        "indicators":{"quote":[{
            "open":[181.9,187.1,184.2],
            "high":[182.7,188.4,185.8],
            "low":[180.1,183.8,182.7],
            "close":[181.2,185.6,null],
            "volume":[71983600,82488700,58414500]}]}}],"error":null}}"#;

    #[test]
    fn test_parse_chart_sorts_and_skips_nulls() {
        let series = parse_chart(SAMPLE, "aapl").unwrap();
        println!("  解析结果: {:?}", series.closes());
        assert_eq!(series.symbol, "AAPL");
        assert_eq!(series.len(), 2);
        // 1704205800 (01-02) 在 1704378600 (01-04) 之前
        assert_eq!(series.closes(), vec![185.6, 181.2]);
        assert_eq!(series.points[0].volume, 82_488_700);
    }

    #[test]
    fn test_parse_chart_error_payload() {
        let data = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = parse_chart(data, "ZZZZ").unwrap_err();
        assert!(err.to_string().contains("delisted"));
        assert!(parse_chart("not json", "AAPL").is_err());
    }

    #[test]
    fn test_chart_url() {
        let url = chart_url("https://query1.finance.yahoo.com/v8/finance/chart", "MSFT", Period::OneYear).unwrap();
        assert_eq!(
            url.as_str(),
            "https://query1.finance.yahoo.com/v8/finance/chart/MSFT?range=1y&interval=1d"
        );
        let trailing = chart_url("https://example.com/chart/", "MSFT", Period::FiveDays).unwrap();
        assert_eq!(trailing.path(), "/chart/MSFT");
    }

    #[tokio::test]
    async fn test_fetch_live_history() {
        println!("\n========== 测试获取 Yahoo 日K线 ==========");
        let client = Client::new();
        match get_price_history(
            &client,
            "https://query1.finance.yahoo.com/v8/finance/chart",
            "Mozilla/5.0",
            "AAPL",
            Period::OneMonth,
        )
        .await
        {
            Ok(series) => {
                println!("✅ 获取成功！共 {} 条", series.len());
                for p in series.points.iter().rev().take(3) {
                    println!("    {} C:{:.2} V:{}", p.timestamp, p.close, p.volume);
                }
            }
            Err(e) => {
                println!("❌ 获取失败: {}", e);
            }
        }
    }
}
